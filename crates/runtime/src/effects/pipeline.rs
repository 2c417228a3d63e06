//! Damage, healing and status application against the battlefield.
//!
//! Every HP change made by an action goes through here so that modifiers,
//! reactions and bus announcements happen in one fixed order:
//!
//! 1. outgoing modifiers of the source
//! 2. incoming modifiers of the target
//! 3. HP loss, reported as a [`DamageReport`]
//! 4. `DamageApplied` (and `CombatantFainted` on a kill)
//! 5. after-damage reactions; reflected damage re-enters at step 1 as
//!    [`DamageSource::Reflect`]

use battle_core::{Battlefield, CombatantId, DamageReport, StatusEffect};
use tracing::{info, trace};

use super::{DamageSource, EffectError, EffectProcessor, Reaction};
use crate::barrier::BarrierToken;
use crate::events::{CombatantFainted, DamageApplied, DamageReflected, Healed, PublishOptions};

/// One hit of damage travelling through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub source: Option<CombatantId>,
    pub target: CombatantId,
    pub amount: u32,
    pub damage_source: DamageSource,
    /// Rendezvous the hit belongs to; copied onto the announcements.
    pub token: Option<BarrierToken>,
}

impl Hit {
    pub fn new(
        source: Option<CombatantId>,
        target: CombatantId,
        amount: u32,
        damage_source: DamageSource,
    ) -> Self {
        Self {
            source,
            target,
            amount,
            damage_source,
            token: None,
        }
    }

    pub fn attack(attacker: CombatantId, target: CombatantId, amount: u32) -> Self {
        Self::new(Some(attacker), target, amount, DamageSource::Attack)
    }

    pub fn with_token(mut self, token: BarrierToken) -> Self {
        self.token = Some(token);
        self
    }
}

fn correlated(token: Option<BarrierToken>) -> PublishOptions {
    match token {
        Some(token) => PublishOptions::new().correlate(token),
        None => PublishOptions::new(),
    }
}

impl EffectProcessor {
    /// Runs one hit through the pipeline.
    ///
    /// Hits on dead targets are dropped and report zero damage. The returned
    /// report covers the primary hit only; reflected damage is announced
    /// separately.
    pub fn deal_damage(
        &self,
        field: &mut Battlefield,
        hit: Hit,
    ) -> Result<DamageReport, EffectError> {
        let target_alive = field
            .get(hit.target)
            .ok_or(EffectError::UnknownCombatant(hit.target))?
            .is_alive();
        if !target_alive {
            trace!(
                target: "runtime::combat",
                target = %hit.target,
                "Hit on dead combatant dropped"
            );
            return Ok(DamageReport::default());
        }

        let mut amount = hit.amount;
        if hit.damage_source.is_direct()
            && let Some(source) = hit.source
            && let Some(attacker) = field.get_mut(source)
        {
            amount = self.on_damage_dealt(attacker, hit.target, amount, hit.damage_source);
        }

        let target = field
            .get_mut(hit.target)
            .ok_or(EffectError::UnknownCombatant(hit.target))?;
        let modification = self.on_damage_taken(target, amount, hit.source, hit.damage_source);
        let applied = target.take_damage(modification.final_damage);
        let report = DamageReport::new(amount, modification.blocked, applied);
        let fainted = target.is_dead();

        trace!(
            target: "runtime::combat",
            source = ?hit.source,
            target = %hit.target,
            damage_source = %hit.damage_source,
            raw = report.raw,
            blocked = report.blocked,
            applied = report.applied,
            overkill = report.overkill,
            "Damage applied"
        );
        self.bus().publish_with(
            DamageApplied {
                token: hit.token,
                source: hit.source,
                target: hit.target,
                damage_source: hit.damage_source,
                report,
                hp_after: target.hp(),
            },
            correlated(hit.token),
        );
        if fainted {
            info!(
                target: "runtime::combat",
                combatant = %hit.target,
                killer = ?hit.source,
                "Combatant fainted"
            );
            self.bus().publish_with(
                CombatantFainted {
                    combatant: hit.target,
                    killer: hit.source,
                },
                correlated(hit.token),
            );
        }

        let reactions = if modification.final_damage > 0 {
            self.after_damage_taken(
                target,
                modification.final_damage,
                hit.source,
                hit.damage_source,
            )
        } else {
            Vec::new()
        };
        for reaction in reactions {
            match reaction {
                Reaction::Reflect { to, amount } => {
                    self.bus().publish(DamageReflected {
                        from: hit.target,
                        to,
                        amount,
                    });
                    let reflected = Hit {
                        source: Some(hit.target),
                        target: to,
                        amount,
                        damage_source: DamageSource::Reflect,
                        token: hit.token,
                    };
                    self.deal_damage(field, reflected)?;
                }
            }
        }

        Ok(report)
    }

    /// Heals a living target, clamped at max HP. Returns the HP gained.
    pub fn heal(
        &self,
        field: &mut Battlefield,
        target: CombatantId,
        amount: u32,
        source: Option<CombatantId>,
        token: Option<BarrierToken>,
    ) -> Result<u32, EffectError> {
        let combatant = field
            .get_mut(target)
            .ok_or(EffectError::UnknownCombatant(target))?;
        if combatant.is_dead() {
            return Ok(0);
        }

        let healed = combatant.heal(amount);
        self.bus().publish_with(
            Healed {
                token,
                source,
                target,
                amount: healed,
                hp_after: combatant.hp(),
            },
            correlated(token),
        );
        Ok(healed)
    }

    /// Attaches a status effect to a living target through
    /// [`EffectProcessor::on_effect_applied`]. Returns the effect as it
    /// landed, or `None` for a dead target.
    pub fn apply_status(
        &self,
        field: &mut Battlefield,
        target: CombatantId,
        effect: StatusEffect,
        source: Option<CombatantId>,
    ) -> Result<Option<StatusEffect>, EffectError> {
        let combatant = field
            .get_mut(target)
            .ok_or(EffectError::UnknownCombatant(target))?;
        if combatant.is_dead() {
            return Ok(None);
        }
        Ok(Some(self.on_effect_applied(combatant, effect, source)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use battle_core::{Combatant, EffectKind, Side};

    use super::*;
    use crate::events::EventBus;

    const PLAYER: CombatantId = CombatantId::new(Side::Player, 0);
    const ENEMY: CombatantId = CombatantId::new(Side::Enemy, 0);

    fn duel(player: Combatant, enemy: Combatant) -> Battlefield {
        Battlefield::new(vec![player], vec![enemy]).unwrap()
    }

    #[test]
    fn report_conserves_raw_damage() {
        let processor = EffectProcessor::with_default_behaviors(EventBus::new());
        let mut field = duel(
            Combatant::new("Wolf", 10, 9),
            Combatant::new("Slime", 10, 1)
                .with_hp(4)
                .with_effect(StatusEffect::permanent(EffectKind::Shield, 3)),
        );

        let report = processor
            .deal_damage(&mut field, Hit::attack(PLAYER, ENEMY, 9))
            .unwrap();
        assert_eq!(
            report,
            DamageReport {
                raw: 9,
                blocked: 3,
                applied: 4,
                overkill: 2
            }
        );
        assert_eq!(report.blocked + report.applied + report.overkill, report.raw);
        assert!(!field.is_alive(ENEMY));
    }

    #[test]
    fn thorns_reflects_once() {
        let processor = EffectProcessor::with_default_behaviors(EventBus::new());
        let mut field = duel(
            Combatant::new("Wolf", 10, 2)
                .with_effect(StatusEffect::permanent(EffectKind::Thorns, 1)),
            Combatant::new("Skeleton", 20, 3)
                .with_effect(StatusEffect::permanent(EffectKind::Thorns, 2)),
        );

        processor
            .deal_damage(&mut field, Hit::attack(PLAYER, ENEMY, 2))
            .unwrap();

        // Wolf takes the skeleton's 2 thorns; its own thorns do not bounce back.
        assert_eq!(field.get(PLAYER).unwrap().hp(), 8);
        assert_eq!(field.get(ENEMY).unwrap().hp(), 18);
    }

    #[test]
    fn fully_blocked_hit_does_not_trigger_thorns() {
        let processor = EffectProcessor::with_default_behaviors(EventBus::new());
        let mut field = duel(
            Combatant::new("Wolf", 10, 2),
            Combatant::new("Skeleton", 20, 3)
                .with_effect(StatusEffect::permanent(EffectKind::Shield, 5))
                .with_effect(StatusEffect::permanent(EffectKind::Thorns, 2)),
        );

        processor
            .deal_damage(&mut field, Hit::attack(PLAYER, ENEMY, 2))
            .unwrap();
        assert_eq!(field.get(PLAYER).unwrap().hp(), 10);
    }

    #[test]
    fn hits_on_the_dead_are_dropped() {
        let bus = EventBus::new();
        let processor = EffectProcessor::with_default_behaviors(bus.clone());
        let mut field = duel(
            Combatant::new("Wolf", 10, 2),
            Combatant::new("Slime", 5, 1).with_hp(0),
        );

        let report = processor
            .deal_damage(&mut field, Hit::attack(PLAYER, ENEMY, 4))
            .unwrap();
        assert_eq!(report, DamageReport::default());
        assert_eq!(bus.pending(), (0, 0));
    }

    #[test]
    fn heal_clamps_and_skips_the_dead() {
        let processor = EffectProcessor::with_default_behaviors(EventBus::new());
        let mut field = duel(
            Combatant::new("Wolf", 10, 2).with_hp(7),
            Combatant::new("Slime", 5, 1).with_hp(0),
        );

        assert_eq!(processor.heal(&mut field, PLAYER, 10, None, None).unwrap(), 3);
        assert_eq!(field.get(PLAYER).unwrap().hp(), 10);
        assert_eq!(processor.heal(&mut field, ENEMY, 10, None, None).unwrap(), 0);
        assert!(!field.is_alive(ENEMY));
    }

    #[test]
    fn damage_and_faint_are_announced_in_queue_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let damage_log = Arc::clone(&log);
        let faint_log = Arc::clone(&log);
        let _damage = bus.subscribe::<DamageApplied, _>(move |e| {
            damage_log.lock().unwrap().push(format!("damage {}", e.report.applied))
        });
        let _faint = bus.subscribe::<CombatantFainted, _>(move |e| {
            faint_log.lock().unwrap().push(format!("faint {}", e.combatant))
        });
        let processor = EffectProcessor::with_default_behaviors(bus.clone());
        let mut field = duel(Combatant::new("Wolf", 10, 5), Combatant::new("Slime", 3, 1));

        processor
            .deal_damage(&mut field, Hit::attack(PLAYER, ENEMY, 5))
            .unwrap();
        while bus.drain_pending(8).total() > 0 {}

        assert_eq!(*log.lock().unwrap(), vec!["damage 3", "faint enemy#0"]);
    }

    #[test]
    fn unknown_target_is_an_error() {
        let processor = EffectProcessor::with_default_behaviors(EventBus::new());
        let mut field = duel(Combatant::new("Wolf", 10, 2), Combatant::new("Slime", 5, 1));
        let ghost = CombatantId::new(Side::Enemy, 4);

        assert_eq!(
            processor.deal_damage(&mut field, Hit::attack(PLAYER, ghost, 1)),
            Err(EffectError::UnknownCombatant(ghost))
        );
    }
}
