//! Runtime configuration.

use std::time::Duration;

use battle_core::BattleConfig;

/// Settings shared by the orchestrator and whoever drives the event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub battle: BattleConfig,
    /// Maximum deferred messages delivered per [`crate::EventBus::drain_pending`] call.
    pub drain_budget: usize,
    /// How often the driver drains the bus.
    pub tick_interval: Duration,
}

impl RuntimeConfig {
    pub const DEFAULT_DRAIN_BUDGET: usize = 32;
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

    pub fn with_battle(mut self, battle: BattleConfig) -> Self {
        self.battle = battle;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            drain_budget: Self::DEFAULT_DRAIN_BUDGET,
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
        }
    }
}
