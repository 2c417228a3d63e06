//! Cards and the effects they resolve.
//!
//! A card is an ordered list of [`CardEffect`]s. Each effect names what it does
//! ([`CardEffectKind`]), how strong it is, and who it lands on
//! ([`TargetPolicy`]). Resolution order and presentation pacing are handled by
//! the runtime's card resolver.

use core::fmt;

use crate::status::EffectKind;

/// An ability card played by a combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Card {
    pub name: String,
    pub effects: Vec<CardEffect>,
}

impl Card {
    pub fn new(name: impl Into<String>, effects: Vec<CardEffect>) -> Self {
        Self {
            name: name.into(),
            effects,
        }
    }

    /// The implicit card behind every basic attack.
    pub fn basic_attack() -> Self {
        Self::new("Attack", Vec::new())
    }
}

/// One step of a card.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardEffect {
    pub kind: CardEffectKind,
    pub amount: u32,
    /// Duration for status effects; ignored by damage and heal.
    #[cfg_attr(feature = "serde", serde(default = "default_duration"))]
    pub duration: i32,
    pub target: TargetPolicy,
}

#[cfg(feature = "serde")]
fn default_duration() -> i32 {
    crate::status::PERMANENT
}

impl CardEffect {
    pub fn new(kind: CardEffectKind, amount: u32, target: TargetPolicy) -> Self {
        Self {
            kind,
            amount,
            duration: crate::status::PERMANENT,
            target,
        }
    }

    pub fn damage(amount: u32, target: TargetPolicy) -> Self {
        Self::new(CardEffectKind::Damage, amount, target)
    }

    pub fn heal(amount: u32, target: TargetPolicy) -> Self {
        Self::new(CardEffectKind::Heal, amount, target)
    }

    pub fn block(amount: u32, target: TargetPolicy) -> Self {
        Self::new(CardEffectKind::Block, amount, target)
    }

    pub fn status(kind: EffectKind, amount: u32, duration: i32, target: TargetPolicy) -> Self {
        Self {
            kind: CardEffectKind::ApplyStatus(kind),
            amount,
            duration,
            target,
        }
    }
}

/// What a card effect does when it lands.
///
/// Content files name kinds by string. `"Damage"`, `"Heal"` and `"Block"`
/// map to their variants, any [`EffectKind`] name applies that status, and
/// everything else is kept as [`CardEffectKind::Unknown`] so resolution can
/// skip it with a diagnostic instead of failing the whole card.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "String", into = "String")
)]
pub enum CardEffectKind {
    Damage,
    Heal,
    Block,
    ApplyStatus(EffectKind),
    Unknown(String),
}

impl From<String> for CardEffectKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Damage" => Self::Damage,
            "Heal" => Self::Heal,
            // Block and Defend are card-level names for installing a shield.
            "Block" | "Defend" => Self::Block,
            other => match other.parse::<EffectKind>() {
                Ok(kind) => Self::ApplyStatus(kind),
                Err(_) => Self::Unknown(name),
            },
        }
    }
}

impl From<&str> for CardEffectKind {
    fn from(name: &str) -> Self {
        Self::from(name.to_owned())
    }
}

impl From<CardEffectKind> for String {
    fn from(kind: CardEffectKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for CardEffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Damage => f.write_str("Damage"),
            Self::Heal => f.write_str("Heal"),
            Self::Block => f.write_str("Block"),
            Self::ApplyStatus(kind) => write!(f, "{kind}"),
            Self::Unknown(name) => f.write_str(name),
        }
    }
}

/// Fixed target-selection policies for card effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetPolicy {
    /// The caster itself.
    Caster,
    /// The primary target, if it is a living enemy of the caster.
    SingleEnemy,
    /// The primary target, if it is a living ally of the caster.
    SingleAlly,
    /// Every living enemy.
    AllEnemies,
    /// Every living ally, caster included.
    AllAllies,
    /// One living enemy drawn uniformly at random.
    RandomEnemy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_kind_names_parse_into_variants() {
        assert_eq!(CardEffectKind::from("Damage"), CardEffectKind::Damage);
        assert_eq!(CardEffectKind::from("Defend"), CardEffectKind::Block);
        assert_eq!(
            CardEffectKind::from("Poison"),
            CardEffectKind::ApplyStatus(EffectKind::Poison)
        );
        assert_eq!(
            CardEffectKind::from("Teleport"),
            CardEffectKind::Unknown("Teleport".into())
        );
    }

    #[test]
    fn display_round_trips_through_from_string() {
        for kind in [
            CardEffectKind::Damage,
            CardEffectKind::Heal,
            CardEffectKind::Block,
            CardEffectKind::ApplyStatus(EffectKind::Stun),
            CardEffectKind::Unknown("Mystery".into()),
        ] {
            assert_eq!(CardEffectKind::from(kind.to_string()), kind);
        }
    }
}
