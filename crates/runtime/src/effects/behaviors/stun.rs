//! Stun: skips the owner's actions while it lasts.

use battle_core::{Card, Combatant, EffectKind, StatusEffect};

use crate::effects::{CardPlayVerdict, EffectBehavior, OwnerView, TurnEndOutcome, Triggers};

/// Vetoes every card while its magnitude is positive; loses one point at
/// each of the owner's turn ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct StunBehavior;

impl EffectBehavior for StunBehavior {
    fn kind(&self) -> EffectKind {
        EffectKind::Stun
    }

    fn triggers(&self) -> Triggers {
        Triggers::CARD_PLAYED | Triggers::TURN_END
    }

    fn on_card_played(
        &self,
        actor: &Combatant,
        card: &Card,
        effect: &StatusEffect,
    ) -> CardPlayVerdict {
        if effect.magnitude <= 0 {
            return CardPlayVerdict::Allowed;
        }
        CardPlayVerdict::Prevented {
            by: EffectKind::Stun,
            reason: format!(
                "{} is stunned and cannot play {} ({} turn(s) left)",
                actor.monster_type(),
                card.name,
                effect.magnitude
            ),
        }
    }

    fn on_turn_end(&self, _owner: OwnerView, effect: &mut StatusEffect) -> TurnEndOutcome {
        effect.magnitude = (effect.magnitude - 1).max(0);
        TurnEndOutcome::default()
    }
}
