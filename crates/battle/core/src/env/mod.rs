//! Traits describing data the battle reads from the outside world.
//!
//! Encounter data decides which monsters a room spawns; the randomness source
//! drives every random decision. Both are injected so battles stay
//! deterministic under test.
mod encounter;
mod rng;

pub use encounter::{EncounterError, EncounterProvider, RoomInfo};
pub use rng::{PcgRandom, RandomSource, SequenceRandom, pick};
