//! Headless battle client.
//!
//! The client is the composition root: it loads content and configuration,
//! builds the battle orchestrator, attaches a simulated presenter that paces
//! the battle like an animated frontend, and drives the event bus on a fixed
//! tick.

pub mod config;
pub mod logging;
pub mod presenter;
pub mod session;

pub use config::ClientConfig;
pub use presenter::SimulatedPresenter;
pub use session::{BattleReport, SurvivorReport, run_battle, starter_team};
