//! Data-driven battle content and loaders.
//!
//! This crate houses static battle content and the loaders that read it:
//! - Encounter tables (rooms, biome encounters, monster templates) via RON
//! - Battle configuration via TOML
//!
//! Content is consumed by the runtime through [`battle_core::EncounterProvider`]
//! and never appears in battle state directly.

pub mod encounters;
pub mod loaders;

pub use encounters::{EncounterTable, EncounterTier, MonsterTemplate};
pub use loaders::{ConfigLoader, EncounterLoader, LoadResult};
