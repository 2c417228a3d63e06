//! Simulated presentation layer.
//!
//! Stands in for a renderer: every rendezvous is answered after a fake
//! animation delay, and what a renderer would draw is logged instead.

use std::time::Duration;

use runtime::events::{
    ActionPrevented, ActionSelected, BattleEnded, BattleStarted, CardEffectResolved,
    CombatantFainted, CombatantSpawned, DamageApplied, DamageReflected, Healed, StatusApplied,
    StatusExpired, StatusTicked, TurnStarted, ViewReady,
};
use runtime::{BarrierPhase, EventBus, InteractionBarrier, Subscription};
use tracing::{debug, info};

/// Paces the battle like an animated frontend would.
pub struct SimulatedPresenter {
    _subscriptions: Vec<Subscription>,
}

impl SimulatedPresenter {
    /// Must be attached from within a Tokio runtime.
    pub fn attach(bus: &EventBus, barrier: &InteractionBarrier, animation: Duration) -> Self {
        let impact = animation / 2;
        let mut subs = Vec::new();

        let views = bus.clone();
        subs.push(bus.subscribe::<CombatantSpawned, _>(move |spawned| {
            let bus = views.clone();
            let token = spawned.token;
            let combatant = spawned.combatant.id;
            debug!(
                target: "client::presenter",
                %combatant,
                kind = %spawned.combatant.monster_type,
                "Spawning view"
            );
            tokio::spawn(async move {
                tokio::time::sleep(impact).await;
                bus.publish(ViewReady { token, combatant });
            });
        }));

        let actions = barrier.clone();
        subs.push(bus.subscribe::<ActionSelected, _>(move |action| {
            info!(
                target: "client::presenter",
                round = action.round,
                attacker = %action.attacker,
                target = %action.target,
                card = %action.card,
                "Action"
            );
            actions.signal_after_delay(action.token.key(BarrierPhase::Hit), impact);
            actions.signal_after_delay(action.token.key(BarrierPhase::End), animation);
        }));

        let steps = barrier.clone();
        subs.push(bus.subscribe::<CardEffectResolved, _>(move |resolved| {
            debug!(
                target: "client::presenter",
                card = %resolved.card,
                step = resolved.step + 1,
                total = resolved.total,
                targets = resolved.targets.len(),
                "Card step"
            );
            if resolved.awaits_signal() {
                let step = u16::try_from(resolved.step).unwrap_or(u16::MAX);
                steps.signal_after_delay(resolved.token.key(BarrierPhase::Step(step)), impact);
            }
        }));

        subs.push(bus.subscribe::<BattleStarted, _>(|started| {
            info!(
                target: "client::presenter",
                room = %started.room_id,
                players = started.players.len(),
                enemies = started.enemies.len(),
                "Battle started"
            );
        }));
        subs.push(bus.subscribe::<TurnStarted, _>(|turn| {
            debug!(target: "client::presenter", round = turn.round, side = %turn.side, "Turn");
        }));
        subs.push(bus.subscribe::<ActionPrevented, _>(|prevented| {
            info!(
                target: "client::presenter",
                attacker = %prevented.attacker,
                reason = %prevented.reason,
                "Action prevented"
            );
        }));
        subs.push(bus.subscribe::<DamageApplied, _>(|hit| {
            info!(
                target: "client::presenter",
                target = %hit.target,
                damage = hit.report.applied,
                blocked = hit.report.blocked,
                hp = hit.hp_after,
                source = %hit.damage_source,
                "Damage"
            );
        }));
        subs.push(bus.subscribe::<Healed, _>(|healed| {
            info!(
                target: "client::presenter",
                target = %healed.target,
                amount = healed.amount,
                hp = healed.hp_after,
                "Healed"
            );
        }));
        subs.push(bus.subscribe::<DamageReflected, _>(|reflected| {
            debug!(
                target: "client::presenter",
                from = %reflected.from,
                to = %reflected.to,
                amount = reflected.amount,
                "Reflected"
            );
        }));
        subs.push(bus.subscribe::<CombatantFainted, _>(|fainted| {
            info!(target: "client::presenter", combatant = %fainted.combatant, "Fainted");
        }));
        subs.push(bus.subscribe::<StatusApplied, _>(|applied| {
            debug!(
                target: "client::presenter",
                target = %applied.target,
                effect = ?applied.effect,
                "Status applied"
            );
        }));
        subs.push(bus.subscribe::<StatusTicked, _>(|tick| {
            debug!(
                target: "client::presenter",
                owner = %tick.owner,
                kind = %tick.kind,
                damage = tick.damage,
                healed = tick.healed,
                "Status ticked"
            );
        }));
        subs.push(bus.subscribe::<StatusExpired, _>(|expired| {
            debug!(
                target: "client::presenter",
                owner = %expired.owner,
                kind = %expired.kind,
                "Status expired"
            );
        }));
        subs.push(bus.subscribe::<BattleEnded, _>(|ended| {
            info!(
                target: "client::presenter",
                room = %ended.room_id,
                outcome = ?ended.outcome,
                rounds = ended.turn_count,
                "Battle ended"
            );
        }));

        Self {
            _subscriptions: subs,
        }
    }
}
