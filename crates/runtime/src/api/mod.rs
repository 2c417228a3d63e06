//! Public runtime API surface.
//!
//! Gathers the error types battle callers match on so the orchestration,
//! effect and barrier modules can keep their own local error enums.

pub mod errors;

pub use errors::{BattleError, BattleFault, Result};
