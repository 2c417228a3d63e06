//! Poison: damage over time.

use battle_core::{EffectKind, StatusEffect};

use super::amount;
use crate::effects::{EffectBehavior, OwnerView, TurnEndOutcome, Triggers};

/// Damage dealt per poison stack at each turn end.
pub const POISON_DAMAGE_PER_STACK: u32 = 1;

/// Hits the owner for one point per stack at turn end, then loses a stack.
///
/// Poison damage bypasses shields.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoisonBehavior;

impl EffectBehavior for PoisonBehavior {
    fn kind(&self) -> EffectKind {
        EffectKind::Poison
    }

    fn triggers(&self) -> Triggers {
        Triggers::TURN_END
    }

    fn on_turn_end(&self, _owner: OwnerView, effect: &mut StatusEffect) -> TurnEndOutcome {
        let damage = amount(effect.magnitude).saturating_mul(POISON_DAMAGE_PER_STACK);
        effect.magnitude = (effect.magnitude - 1).max(0);
        TurnEndOutcome { damage, heal: 0 }
    }
}

#[cfg(test)]
mod tests {
    use battle_core::{CombatantId, Side};

    use super::*;

    #[test]
    fn stacks_fall_off_one_per_tick() {
        let owner = OwnerView {
            id: CombatantId::new(Side::Enemy, 0),
            hp: 10,
            max_hp: 10,
        };
        let mut poison = StatusEffect::permanent(EffectKind::Poison, 3);

        let ticks: Vec<u32> = (0..4)
            .map(|_| PoisonBehavior.on_turn_end(owner, &mut poison).damage)
            .collect();
        assert_eq!(ticks, vec![3, 2, 1, 0]);
        assert!(poison.is_expired());
    }
}
