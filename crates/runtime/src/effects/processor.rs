//! Effect processor: kind → behavior table and trigger dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use battle_core::{Card, Combatant, CombatantId, EffectKind, StatusEffect};
use tracing::{debug, trace, warn};

use super::behaviors::{
    FortifyBehavior, PoisonBehavior, RegenerationBehavior, ShieldBehavior, StrengthBehavior,
    StunBehavior, ThornsBehavior,
};
use super::{
    CardPlayVerdict, DamageContext, DamageModification, DamageSource, EffectBehavior, OwnerView,
    Reaction, Triggers, TurnEndOutcome,
};
use crate::events::{
    CombatantFainted, DamageModified, EventBus, StatusApplied, StatusExpired, StatusTicked,
    StatusTransformed,
};

/// Builder for [`EffectProcessor`].
///
/// Registration is explicit; registering a second behavior for the same kind
/// replaces the first.
pub struct EffectProcessorBuilder {
    bus: EventBus,
    behaviors: HashMap<EffectKind, Arc<dyn EffectBehavior>>,
}

impl EffectProcessorBuilder {
    pub fn register(self, behavior: impl EffectBehavior + 'static) -> Self {
        self.register_shared(Arc::new(behavior))
    }

    pub fn register_shared(mut self, behavior: Arc<dyn EffectBehavior>) -> Self {
        let kind = behavior.kind();
        if self.behaviors.insert(kind, behavior).is_some() {
            warn!(
                target: "runtime::effects",
                %kind,
                "Replacing previously registered effect behavior"
            );
        }
        self
    }

    /// Registers every built-in behavior.
    pub fn with_defaults(self) -> Self {
        self.register(ShieldBehavior)
            .register(FortifyBehavior)
            .register(ThornsBehavior)
            .register(StrengthBehavior)
            .register(PoisonBehavior)
            .register(RegenerationBehavior)
            .register(StunBehavior)
    }

    pub fn build(self) -> EffectProcessor {
        debug!(
            target: "runtime::effects",
            behaviors = self.behaviors.len(),
            "Effect processor ready"
        );
        EffectProcessor {
            bus: self.bus,
            behaviors: self.behaviors,
        }
    }
}

/// Runs effect behaviors at the six trigger points.
///
/// Effects of a combatant are consulted in behavior priority order, ties
/// broken by the order the effects were attached. Expired effects are skipped
/// and pruned from the owner once the trigger finished.
pub struct EffectProcessor {
    bus: EventBus,
    behaviors: HashMap<EffectKind, Arc<dyn EffectBehavior>>,
}

impl EffectProcessor {
    pub fn builder(bus: EventBus) -> EffectProcessorBuilder {
        EffectProcessorBuilder {
            bus,
            behaviors: HashMap::new(),
        }
    }

    pub fn with_default_behaviors(bus: EventBus) -> Self {
        Self::builder(bus).with_defaults().build()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn behavior(&self, kind: EffectKind) -> Option<&Arc<dyn EffectBehavior>> {
        self.behaviors.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Indices of the live effects that take part in `trigger`, in call order.
    fn consulted(
        &self,
        effects: &[StatusEffect],
        trigger: Triggers,
    ) -> Vec<(usize, &dyn EffectBehavior)> {
        let mut order: Vec<(usize, &dyn EffectBehavior)> = effects
            .iter()
            .enumerate()
            .filter(|(_, effect)| !effect.is_expired())
            .filter_map(|(index, effect)| {
                let behavior = self.behaviors.get(&effect.kind)?;
                behavior
                    .triggers()
                    .contains(trigger)
                    .then_some((index, behavior.as_ref()))
            })
            .collect();
        // Stable: equal priorities keep attachment order.
        order.sort_by_key(|(_, behavior)| behavior.priority());
        order
    }

    fn prune(&self, owner: &mut Combatant) {
        let id = owner.id();
        for kind in owner.prune_expired() {
            trace!(target: "runtime::effects", combatant = %id, %kind, "Effect expired");
            self.bus.publish(StatusExpired { owner: id, kind });
        }
    }

    // ========================================================================
    // Trigger points
    // ========================================================================

    /// Threads `incoming` through the target's incoming-damage modifiers.
    pub fn on_damage_taken(
        &self,
        target: &mut Combatant,
        incoming: u32,
        source: Option<CombatantId>,
        damage_source: DamageSource,
    ) -> DamageModification {
        let ctx = DamageContext {
            owner: target.id(),
            source,
            target: target.id(),
            damage_source,
        };
        let order = self.consulted(target.effects(), Triggers::DAMAGE_TAKEN);

        let mut running = incoming;
        let effects = target.effects_mut();
        for (index, behavior) in order {
            let effect = &mut effects[index];
            let before = running;
            running = behavior.on_damage_taken(&ctx, running, effect).min(before);
            if running != before {
                self.bus.publish(DamageModified {
                    owner: ctx.owner,
                    kind: effect.kind,
                    before,
                    after: running,
                });
            }
        }
        self.prune(target);

        DamageModification {
            raw: incoming,
            blocked: incoming - running,
            final_damage: running,
        }
    }

    /// Threads `base` through the attacker's outgoing-damage modifiers.
    pub fn on_damage_dealt(
        &self,
        attacker: &mut Combatant,
        target: CombatantId,
        base: u32,
        damage_source: DamageSource,
    ) -> u32 {
        let ctx = DamageContext {
            owner: attacker.id(),
            source: Some(attacker.id()),
            target,
            damage_source,
        };
        let order = self.consulted(attacker.effects(), Triggers::DAMAGE_DEALT);

        let mut running = base;
        let effects = attacker.effects_mut();
        for (index, behavior) in order {
            let effect = &mut effects[index];
            let before = running;
            running = behavior.on_damage_dealt(&ctx, running, effect);
            if running != before {
                self.bus.publish(DamageModified {
                    owner: ctx.owner,
                    kind: effect.kind,
                    before,
                    after: running,
                });
            }
        }
        self.prune(attacker);
        running
    }

    /// Asks the actor's effects whether `card` may be played. The first veto
    /// wins.
    pub fn on_card_played(&self, actor: &Combatant, card: &Card) -> CardPlayVerdict {
        for (index, behavior) in self.consulted(actor.effects(), Triggers::CARD_PLAYED) {
            let verdict = behavior.on_card_played(actor, card, &actor.effects()[index]);
            if let CardPlayVerdict::Prevented { by, reason } = &verdict {
                debug!(
                    target: "runtime::effects",
                    actor = %actor.id(),
                    card = %card.name,
                    by = %by,
                    reason = %reason,
                    "Card play prevented"
                );
                return verdict;
            }
        }
        CardPlayVerdict::Allowed
    }

    /// Ticks the owner's periodic effects and applies their damage and
    /// healing directly to HP.
    pub fn on_turn_end(&self, owner: &mut Combatant) -> TurnEndOutcome {
        if owner.is_dead() {
            return TurnEndOutcome::default();
        }
        let view = OwnerView::from(&*owner);
        let order = self.consulted(owner.effects(), Triggers::TURN_END);

        let mut ticks = Vec::with_capacity(order.len());
        let effects = owner.effects_mut();
        for (index, behavior) in order {
            let effect = &mut effects[index];
            let outcome = behavior.on_turn_end(view, effect);
            ticks.push((effect.kind, outcome, effect.magnitude));
        }

        let mut total = TurnEndOutcome::default();
        for (kind, outcome, remaining) in ticks {
            let damage = owner.take_damage(outcome.damage);
            let healed = owner.heal(outcome.heal);
            total.damage += damage;
            total.heal += healed;
            self.bus.publish(StatusTicked {
                owner: view.id,
                kind,
                damage,
                healed,
                remaining,
            });
        }

        if owner.is_dead() {
            debug!(
                target: "runtime::effects",
                combatant = %view.id,
                "Combatant succumbed to status effects"
            );
            self.bus.publish(CombatantFainted {
                combatant: view.id,
                killer: None,
            });
        }
        self.prune(owner);
        total
    }

    /// Lets the target's effects transform `incoming`, then attaches it
    /// (merging with an effect of the same kind). Returns what was attached.
    pub fn on_effect_applied(
        &self,
        target: &mut Combatant,
        incoming: StatusEffect,
        source: Option<CombatantId>,
    ) -> StatusEffect {
        let id = target.id();
        let mut effect = incoming;
        for (index, behavior) in self.consulted(target.effects(), Triggers::EFFECT_APPLIED) {
            let existing = target.effects()[index];
            let before = effect;
            behavior.on_effect_applied(&mut effect, &existing);
            if effect != before {
                self.bus.publish(StatusTransformed {
                    target: id,
                    by: existing.kind,
                    before,
                    after: effect,
                });
            }
        }

        target.add_effect(effect);
        trace!(
            target: "runtime::effects",
            combatant = %id,
            kind = %effect.kind,
            magnitude = effect.magnitude,
            duration = effect.duration,
            "Effect applied"
        );
        self.bus.publish(StatusApplied {
            target: id,
            source,
            effect,
        });
        self.prune(target);
        effect
    }

    /// Collects reactions of the target's effects to damage it just took.
    pub fn after_damage_taken(
        &self,
        target: &Combatant,
        damage: u32,
        source: Option<CombatantId>,
        damage_source: DamageSource,
    ) -> Vec<Reaction> {
        let ctx = DamageContext {
            owner: target.id(),
            source,
            target: target.id(),
            damage_source,
        };
        self.consulted(target.effects(), Triggers::AFTER_DAMAGE_TAKEN)
            .into_iter()
            .filter_map(|(index, behavior)| {
                behavior.after_damage_taken(&ctx, damage, &target.effects()[index])
            })
            .collect()
    }
}

impl std::fmt::Debug for EffectProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.behaviors.keys().copied().collect();
        kinds.sort();
        f.debug_struct("EffectProcessor")
            .field("behaviors", &kinds)
            .finish()
    }
}
