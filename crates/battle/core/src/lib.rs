//! Deterministic battle model shared by the runtime and content crates.
//!
//! `battle-core` defines the canonical data of a turn-based battle: combatants
//! and their status effects, cards and target policies, the battlefield that
//! owns both teams, and the outcome types produced when a battle ends. All APIs
//! here are synchronous and side-effect free apart from mutating the values
//! they are called on; scheduling, events and presentation rendezvous live in
//! the `runtime` crate.
pub mod battlefield;
pub mod card;
pub mod combatant;
pub mod config;
pub mod env;
pub mod outcome;
pub mod status;

pub use battlefield::{Battlefield, BattlefieldError, MAX_TEAM_SIZE};
pub use card::{Card, CardEffect, CardEffectKind, TargetPolicy};
pub use config::BattleConfig;
pub use combatant::{
    Combatant, CombatantEvent, CombatantId, FALLBACK_MONSTER_TYPE, ObserverId, Side,
};
pub use env::{
    EncounterError, EncounterProvider, PcgRandom, RandomSource, RoomInfo, SequenceRandom, pick,
};
pub use outcome::{BattleOutcome, BattleResult, DamageReport};
pub use status::{EffectKind, PERMANENT, StatusEffect};
