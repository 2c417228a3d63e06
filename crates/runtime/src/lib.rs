//! Async battle runtime: orchestration, events, effects and presentation
//! rendezvous.
//!
//! This crate drives battles modelled by `battle-core`. The orchestrator owns
//! the battle state and suspends only at barrier waits, where the
//! presentation layer decides when the battle may continue. Everything a
//! frontend needs to animate a battle is published on the [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`orchestrator`] runs a battle through its phases
//! - [`events`] provides the typed event bus and the battle event payloads
//! - [`barrier`] pairs battle waits with presentation signals
//! - [`effects`] binds status effects to behaviors and applies damage
//! - [`resolver`] applies card effects step by step
//! - [`repository`] persists the player team between battles
//! - [`presentation`] is a headless presenter for tests and batch runs
//! - [`api`] exposes the error types callers match on
pub mod api;
pub mod barrier;
pub mod config;
pub mod effects;
pub mod events;
pub mod orchestrator;
pub mod presentation;
pub mod repository;
pub mod resolver;

pub use api::{BattleError, BattleFault, Result};
pub use barrier::{
    BarrierError, BarrierKey, BarrierPhase, BarrierToken, CancelToken, InteractionBarrier,
    SignalOutcome,
};
pub use config::RuntimeConfig;
pub use effects::{EffectBehavior, EffectProcessor, EffectProcessorBuilder, Triggers};
pub use events::{BusMessage, DispatchMode, DrainStats, Envelope, EventBus, Subscription, Topic};
pub use orchestrator::{BattleOrchestrator, BattleOrchestratorBuilder, BattlePhase};
pub use presentation::AutoPresenter;
pub use repository::{InMemoryTeamRepository, RepositoryError, TeamRepository};
pub use resolver::{CardEffectResolver, ResolutionSummary, ResolveError};
