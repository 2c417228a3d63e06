//! Strength: flat bonus to outgoing damage.

use battle_core::{EffectKind, StatusEffect};

use super::amount;
use crate::effects::{DamageContext, EffectBehavior, OwnerView, TurnEndOutcome, Triggers};

#[derive(Debug, Clone, Copy, Default)]
pub struct StrengthBehavior;

impl EffectBehavior for StrengthBehavior {
    fn kind(&self) -> EffectKind {
        EffectKind::Strength
    }

    fn triggers(&self) -> Triggers {
        Triggers::DAMAGE_DEALT | Triggers::TURN_END
    }

    fn on_damage_dealt(
        &self,
        _ctx: &DamageContext,
        outgoing: u32,
        effect: &mut StatusEffect,
    ) -> u32 {
        outgoing.saturating_add(amount(effect.magnitude))
    }

    fn on_turn_end(&self, _owner: OwnerView, effect: &mut StatusEffect) -> TurnEndOutcome {
        effect.tick_duration();
        TurnEndOutcome::default()
    }
}
