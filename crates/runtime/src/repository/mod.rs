//! Repository layer for state that outlives a single battle.
//!
//! Battles read the player team at setup and write it back only after they
//! complete. Static content (monsters, rooms) comes from an
//! [`battle_core::EncounterProvider`], not from here.

mod error;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use memory::InMemoryTeamRepository;
pub use traits::TeamRepository;
