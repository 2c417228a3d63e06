//! Thorns: reflects damage back at direct attackers.

use battle_core::{EffectKind, StatusEffect};

use super::amount;
use crate::effects::{DamageContext, EffectBehavior, OwnerView, Reaction, TurnEndOutcome, Triggers};

/// Reflects its magnitude to whoever hit the owner directly.
///
/// Reflected damage and status ticks never trigger thorns, and a combatant
/// never reflects onto itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThornsBehavior;

impl EffectBehavior for ThornsBehavior {
    fn kind(&self) -> EffectKind {
        EffectKind::Thorns
    }

    fn triggers(&self) -> Triggers {
        Triggers::AFTER_DAMAGE_TAKEN | Triggers::TURN_END
    }

    fn after_damage_taken(
        &self,
        ctx: &DamageContext,
        _damage: u32,
        effect: &StatusEffect,
    ) -> Option<Reaction> {
        if !ctx.damage_source.is_direct() {
            return None;
        }
        let attacker = ctx.source.filter(|&source| source != ctx.owner)?;
        let reflected = amount(effect.magnitude);
        (reflected > 0).then_some(Reaction::Reflect {
            to: attacker,
            amount: reflected,
        })
    }

    fn on_turn_end(&self, _owner: OwnerView, effect: &mut StatusEffect) -> TurnEndOutcome {
        effect.tick_duration();
        TurnEndOutcome::default()
    }
}
