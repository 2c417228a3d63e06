//! Status effect system for combatants.
//!
//! Status effects are conditions attached to a single combatant that modify
//! incoming or outgoing damage, restrict actions, or tick every turn.
//!
//! # Magnitude and Duration
//!
//! Every effect carries two counters whose meaning depends on the kind:
//!
//! - `magnitude`: stacks or a scalar value (shield points, poison stacks,
//!   stun turns, ...). An effect whose magnitude reaches zero is spent.
//! - `duration`: remaining turns. Negative means permanent, zero means expired.
//!
//! Effects never expire on their own. The behavior bound to the kind decides
//! how the counters move and the owning combatant prunes expired entries.

use strum::{Display, EnumString};

/// Duration value used for effects that never time out.
pub const PERMANENT: i32 = -1;

/// Types of status effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    // ========================================================================
    // Defensive
    // ========================================================================
    /// Absorbs incoming damage up to its magnitude (Block/Defend).
    #[strum(to_string = "Shield", serialize = "Block", serialize = "Defend")]
    Shield,

    /// Adds its stacks to every shield applied to the owner.
    Fortify,

    /// Reflects a fixed amount of damage back to attackers.
    Thorns,

    // ========================================================================
    // Offensive
    // ========================================================================
    /// Adds its stacks as flat bonus damage to outgoing attacks.
    Strength,

    // ========================================================================
    // Periodic
    // ========================================================================
    /// Deals damage per stack at turn end, then loses one stack.
    Poison,

    /// Heals by its value at turn end, then roughly halves.
    Regeneration,

    // ========================================================================
    // Crowd Control
    // ========================================================================
    /// Prevents card play while its value is above zero.
    Stun,
}

/// A single status effect instance owned by one combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffect {
    pub kind: EffectKind,
    /// Stack count or scalar value, interpreted per kind.
    pub magnitude: i32,
    /// Remaining turns. Negative = permanent, zero = expired.
    pub duration: i32,
}

impl StatusEffect {
    /// Creates an effect with an explicit duration.
    pub const fn new(kind: EffectKind, magnitude: i32, duration: i32) -> Self {
        Self {
            kind,
            magnitude,
            duration,
        }
    }

    /// Creates an effect that only ends when its magnitude is used up.
    pub const fn permanent(kind: EffectKind, magnitude: i32) -> Self {
        Self::new(kind, magnitude, PERMANENT)
    }

    pub const fn is_permanent(&self) -> bool {
        self.duration < 0
    }

    /// Returns true once the effect has no remaining duration or magnitude.
    pub const fn is_expired(&self) -> bool {
        self.duration == 0 || self.magnitude <= 0
    }

    /// Counts a positive duration down by one turn. Permanent effects are untouched.
    pub fn tick_duration(&mut self) {
        if self.duration > 0 {
            self.duration -= 1;
        }
    }

    /// Folds another effect of the same kind into this one.
    ///
    /// Magnitudes add up and the longer duration wins; permanent beats any
    /// finite duration.
    pub fn merge(&mut self, other: &StatusEffect) {
        debug_assert_eq!(self.kind, other.kind);
        self.magnitude = self.magnitude.saturating_add(other.magnitude);
        self.duration = if self.is_permanent() || other.is_permanent() {
            PERMANENT
        } else {
            self.duration.max(other.duration)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_or_magnitude_is_expired() {
        assert!(StatusEffect::new(EffectKind::Strength, 2, 0).is_expired());
        assert!(StatusEffect::permanent(EffectKind::Shield, 0).is_expired());
        assert!(!StatusEffect::permanent(EffectKind::Shield, 1).is_expired());
    }

    #[test]
    fn permanent_duration_never_ticks() {
        let mut effect = StatusEffect::permanent(EffectKind::Thorns, 3);
        effect.tick_duration();
        assert_eq!(effect.duration, PERMANENT);

        let mut timed = StatusEffect::new(EffectKind::Thorns, 3, 2);
        timed.tick_duration();
        timed.tick_duration();
        timed.tick_duration();
        assert_eq!(timed.duration, 0);
    }

    #[test]
    fn merge_adds_magnitude_and_keeps_longest_duration() {
        let mut effect = StatusEffect::new(EffectKind::Poison, 2, 3);
        effect.merge(&StatusEffect::new(EffectKind::Poison, 4, 1));
        assert_eq!(effect.magnitude, 6);
        assert_eq!(effect.duration, 3);

        effect.merge(&StatusEffect::permanent(EffectKind::Poison, 1));
        assert_eq!(effect.duration, PERMANENT);
    }

    #[test]
    fn block_and_defend_parse_as_shield() {
        assert_eq!("Block".parse::<EffectKind>().unwrap(), EffectKind::Shield);
        assert_eq!("Defend".parse::<EffectKind>().unwrap(), EffectKind::Shield);
        assert_eq!(EffectKind::Shield.to_string(), "Shield");
    }
}
