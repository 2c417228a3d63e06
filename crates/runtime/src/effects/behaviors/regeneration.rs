//! Regeneration: healing over time with halving decay.

use battle_core::{EffectKind, StatusEffect};

use super::amount;
use crate::effects::{EffectBehavior, OwnerView, TurnEndOutcome, Triggers};

/// Heals the owner by its value at turn end, then decays.
///
/// The value halves rounding up (5 → 3 → 2 → 1), and a value of 1 drops
/// straight to 0 instead of sticking at 1 forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegenerationBehavior;

impl RegenerationBehavior {
    pub const fn decay(value: i32) -> i32 {
        match value {
            i32::MIN..=1 => 0,
            _ => (value + 1) / 2,
        }
    }
}

impl EffectBehavior for RegenerationBehavior {
    fn kind(&self) -> EffectKind {
        EffectKind::Regeneration
    }

    fn triggers(&self) -> Triggers {
        Triggers::TURN_END
    }

    fn on_turn_end(&self, _owner: OwnerView, effect: &mut StatusEffect) -> TurnEndOutcome {
        let heal = amount(effect.magnitude);
        effect.magnitude = Self::decay(effect.magnitude);
        TurnEndOutcome { damage: 0, heal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_rounds_up_except_at_one() {
        assert_eq!(RegenerationBehavior::decay(5), 3);
        assert_eq!(RegenerationBehavior::decay(3), 2);
        assert_eq!(RegenerationBehavior::decay(2), 1);
        assert_eq!(RegenerationBehavior::decay(1), 0);
        assert_eq!(RegenerationBehavior::decay(0), 0);
    }
}
