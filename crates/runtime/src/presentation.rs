//! Headless presentation that acknowledges every rendezvous at once.
//!
//! Useful for tests, batch simulation and servers that have no views to
//! animate. A real frontend replaces this with its own subscribers and
//! signals the barrier when its animations finish.

use battle_core::CombatantId;
use tracing::trace;

use crate::barrier::{BarrierPhase, BarrierToken, InteractionBarrier};
use crate::events::{
    ActionSelected, CardEffectResolved, CombatantSpawned, EventBus, Subscription, ViewReady,
};

/// Answers spawn, hit, end and step rendezvous without delay.
///
/// Signals arrive before the orchestrator starts waiting, so they are
/// buffered by the barrier and consumed by the wait. Dropping the presenter
/// detaches it from the bus.
#[derive(Debug)]
pub struct AutoPresenter {
    _subscriptions: Vec<Subscription>,
}

impl AutoPresenter {
    pub fn attach(bus: &EventBus, barrier: &InteractionBarrier) -> Self {
        let mut subscriptions = Vec::with_capacity(3);

        let views = bus.clone();
        subscriptions.push(bus.subscribe::<CombatantSpawned, _>(move |spawned| {
            announce_ready(&views, spawned.token, spawned.combatant.id);
        }));

        let actions = barrier.clone();
        subscriptions.push(bus.subscribe::<ActionSelected, _>(move |action| {
            trace!(
                target: "runtime::presentation",
                token = %action.token,
                "Auto-acknowledging action"
            );
            actions.signal(action.token.key(BarrierPhase::Hit));
            actions.signal(action.token.key(BarrierPhase::End));
        }));

        let steps = barrier.clone();
        subscriptions.push(bus.subscribe::<CardEffectResolved, _>(move |resolved| {
            if resolved.awaits_signal() {
                let step = u16::try_from(resolved.step).unwrap_or(u16::MAX);
                steps.signal(resolved.token.key(BarrierPhase::Step(step)));
            }
        }));

        Self {
            _subscriptions: subscriptions,
        }
    }
}

fn announce_ready(bus: &EventBus, token: BarrierToken, combatant: CombatantId) {
    trace!(target: "runtime::presentation", %token, %combatant, "View ready");
    bus.publish(ViewReady { token, combatant });
}

#[cfg(test)]
mod tests {
    use battle_core::{Combatant, Side};

    use super::*;
    use crate::barrier::CancelToken;
    use crate::events::CombatantView;

    #[tokio::test]
    async fn spawn_announcements_are_answered_with_view_ready() {
        let bus = EventBus::new();
        let barrier = InteractionBarrier::new();
        let _presenter = AutoPresenter::attach(&bus, &barrier);
        let token = barrier.mint_token();
        let acknowledger =
            crate::orchestrator::SpawnAcknowledger::install(&bus, &barrier, token, 1, []);

        bus.publish(CombatantSpawned {
            token,
            combatant: CombatantView::from(&Combatant::new("Slime", 5, 1)),
            expected_total: 1,
        });

        assert_eq!(acknowledger.acknowledged(), 1);
        barrier
            .wait(token.key(BarrierPhase::Spawn), &CancelToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn action_hit_and_end_are_pre_signalled() {
        let bus = EventBus::new();
        let barrier = InteractionBarrier::new();
        let _presenter = AutoPresenter::attach(&bus, &barrier);
        let token = barrier.mint_token();

        bus.publish(ActionSelected {
            token,
            round: 1,
            attacker: CombatantId::new(Side::Player, 0),
            target: CombatantId::new(Side::Enemy, 0),
            card: "Attack".to_owned(),
        });

        let cancel = CancelToken::new();
        barrier.wait(token.key(BarrierPhase::Hit), &cancel).await.unwrap();
        barrier.wait(token.key(BarrierPhase::End), &cancel).await.unwrap();
    }
}
