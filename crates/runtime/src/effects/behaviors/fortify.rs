//! Fortify: strengthens shields as they land.

use battle_core::{EffectKind, StatusEffect};

use crate::effects::{EffectBehavior, OwnerView, TurnEndOutcome, Triggers};

#[derive(Debug, Clone, Copy, Default)]
pub struct FortifyBehavior;

impl EffectBehavior for FortifyBehavior {
    fn kind(&self) -> EffectKind {
        EffectKind::Fortify
    }

    fn triggers(&self) -> Triggers {
        Triggers::EFFECT_APPLIED | Triggers::TURN_END
    }

    fn on_effect_applied(&self, incoming: &mut StatusEffect, existing: &StatusEffect) {
        if incoming.kind == EffectKind::Shield && existing.magnitude > 0 {
            incoming.magnitude = incoming.magnitude.saturating_add(existing.magnitude);
        }
    }

    fn on_turn_end(&self, _owner: OwnerView, effect: &mut StatusEffect) -> TurnEndOutcome {
        effect.tick_duration();
        TurnEndOutcome::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_boosts_shields() {
        let fortify = StatusEffect::new(EffectKind::Fortify, 2, 3);

        let mut shield = StatusEffect::permanent(EffectKind::Shield, 5);
        FortifyBehavior.on_effect_applied(&mut shield, &fortify);
        assert_eq!(shield.magnitude, 7);

        let mut poison = StatusEffect::permanent(EffectKind::Poison, 5);
        FortifyBehavior.on_effect_applied(&mut poison, &fortify);
        assert_eq!(poison.magnitude, 5);
    }
}
