//! Counts spawn acknowledgements until every view is ready.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use battle_core::CombatantId;
use tracing::trace;

use crate::barrier::{BarrierPhase, BarrierToken, InteractionBarrier};
use crate::events::{EventBus, Subscription, ViewReady};

#[derive(Debug)]
struct AckState {
    acknowledged: HashSet<CombatantId>,
    expected: usize,
    signalled: bool,
}

/// Signals `(token, Spawn)` once `expected_total` distinct combatants have
/// been acknowledged.
///
/// Combatants that are already dead get no view, so they are credited up
/// front. Duplicate acknowledgements and acknowledgements for other tokens
/// are ignored. Dropping the acknowledger unsubscribes it.
#[derive(Debug)]
pub struct SpawnAcknowledger {
    state: Arc<Mutex<AckState>>,
    _subscription: Subscription,
}

impl SpawnAcknowledger {
    pub fn install(
        bus: &EventBus,
        barrier: &InteractionBarrier,
        token: BarrierToken,
        expected_total: usize,
        pre_acknowledged: impl IntoIterator<Item = CombatantId>,
    ) -> Self {
        let key = token.key(BarrierPhase::Spawn);
        let acknowledged: HashSet<_> = pre_acknowledged.into_iter().collect();
        let complete = acknowledged.len() >= expected_total;
        if complete {
            barrier.signal(key);
        }
        let state = Arc::new(Mutex::new(AckState {
            acknowledged,
            expected: expected_total,
            signalled: complete,
        }));

        let shared = Arc::clone(&state);
        let barrier = barrier.clone();
        let subscription = bus.subscribe::<ViewReady, _>(move |ready| {
            if ready.token != token {
                return;
            }
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if !state.acknowledged.insert(ready.combatant) || state.signalled {
                return;
            }
            trace!(
                target: "runtime::orchestrator",
                combatant = %ready.combatant,
                acknowledged = state.acknowledged.len(),
                expected = state.expected,
                "View ready"
            );
            if state.acknowledged.len() >= state.expected {
                state.signalled = true;
                drop(state);
                barrier.signal(key);
            }
        });

        Self {
            state,
            _subscription: subscription,
        }
    }

    pub fn acknowledged(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .acknowledged
            .len()
    }
}

#[cfg(test)]
mod tests {
    use battle_core::Side;

    use super::*;
    use crate::barrier::SignalOutcome;

    #[test]
    fn signals_once_all_distinct_views_are_ready() {
        let bus = EventBus::new();
        let barrier = InteractionBarrier::new();
        let token = barrier.mint_token();
        let dead = CombatantId::new(Side::Enemy, 1);
        let acks = SpawnAcknowledger::install(&bus, &barrier, token, 3, [dead]);

        let first = CombatantId::new(Side::Player, 0);
        bus.publish(ViewReady { token, combatant: first });
        bus.publish(ViewReady { token, combatant: first });
        bus.publish(ViewReady {
            token: barrier.mint_token(),
            combatant: CombatantId::new(Side::Enemy, 0),
        });
        assert_eq!(acks.acknowledged(), 2);
        assert_eq!(barrier.buffered_signals(), 0);

        bus.publish(ViewReady {
            token,
            combatant: CombatantId::new(Side::Enemy, 0),
        });
        assert_eq!(barrier.buffered_signals(), 1);
        assert_eq!(barrier.signal(token.key(BarrierPhase::Spawn)), SignalOutcome::Ignored);
    }

    #[test]
    fn all_dead_signals_immediately() {
        let bus = EventBus::new();
        let barrier = InteractionBarrier::new();
        let token = barrier.mint_token();
        let _acks = SpawnAcknowledger::install(
            &bus,
            &barrier,
            token,
            1,
            [CombatantId::new(Side::Player, 0)],
        );
        assert_eq!(barrier.buffered_signals(), 1);
    }
}
