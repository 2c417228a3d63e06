//! Encounter data interface.
//!
//! An [`EncounterProvider`] answers three questions during battle setup:
//! which biome and difficulty a room belongs to, which monster types that
//! biome fields at that difficulty, and how to build a combatant for a
//! monster type. Any of them may fail; callers degrade to the
//! [`crate::FALLBACK_MONSTER_TYPE`] instead of aborting.

use crate::combatant::Combatant;

/// Encounter parameters of a room.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomInfo {
    pub biome: String,
    pub difficulty: u32,
}

impl RoomInfo {
    pub fn new(biome: impl Into<String>, difficulty: u32) -> Self {
        Self {
            biome: biome.into(),
            difficulty,
        }
    }
}

/// Errors surfaced by encounter lookups. All of them are recoverable.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EncounterError {
    #[error("unknown room '{0}'")]
    UnknownRoom(String),

    #[error("no encounters defined for biome '{0}'")]
    UnknownBiome(String),

    #[error("unknown monster type '{0}'")]
    UnknownMonster(String),
}

/// Read-only source of encounter data.
pub trait EncounterProvider: Send + Sync {
    /// Looks up the biome and difficulty of a room.
    fn room(&self, room_id: &str) -> Result<RoomInfo, EncounterError>;

    /// Monster types fielded by a biome at a difficulty. May be empty.
    fn monster_types(&self, biome: &str, difficulty: u32) -> Result<Vec<String>, EncounterError>;

    /// Builds a fresh, independently owned combatant of the given type.
    fn create_monster(&self, monster_type: &str) -> Result<Combatant, EncounterError>;
}
