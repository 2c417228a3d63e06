//! Typed event bus for battle events.
//!
//! Producers publish plain structs; each type declares its default topic,
//! dispatch mode and priority through [`BusMessage`]. Consumers subscribe per
//! type and topic and receive [`Envelope`]s.

mod bus;
mod message;
mod types;

pub use bus::{DrainStats, EventBus, Subscription};
pub use message::{BusMessage, CorrelationId, DispatchMode, Envelope, PublishOptions, Topic};
pub use types::{
    ActionPrevented, ActionSelected, BattleEnded, BattleStarted, CardEffectResolved,
    CombatantFainted, CombatantSpawned, CombatantView, DamageApplied, DamageModified,
    DamageReflected, Healed, PhaseChanged, StatusApplied, StatusExpired, StatusTicked,
    StatusTransformed, TurnEnded, TurnStarted, ViewReady,
};
