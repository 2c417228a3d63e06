//! Client configuration read from the process environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use battle_core::BattleConfig;
use runtime::RuntimeConfig;

/// Settings for one headless battle session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub room_id: String,
    pub seed: Option<u64>,
    /// How often the bus is drained.
    pub tick_interval: Duration,
    /// Length of one simulated attack animation.
    pub animation: Duration,
    pub drain_budget: usize,
    /// Encounter table to load instead of the built-in one.
    pub content_path: Option<PathBuf>,
    /// TOML battle config to load instead of the defaults.
    pub config_path: Option<PathBuf>,
    /// Directory for a log file in addition to stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            room_id: Self::DEFAULT_ROOM.to_owned(),
            seed: None,
            tick_interval: RuntimeConfig::DEFAULT_TICK_INTERVAL,
            animation: Duration::from_millis(40),
            drain_budget: RuntimeConfig::DEFAULT_DRAIN_BUDGET,
            content_path: None,
            config_path: None,
            log_dir: None,
        }
    }
}

impl ClientConfig {
    pub const DEFAULT_ROOM: &'static str = "meadow-2";

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_ROOM` - Room to fight in (default: meadow-2)
    /// - `BATTLE_SEED` - Seed for target selection (default: random)
    /// - `BATTLE_TICK_MS` - Bus drain interval in milliseconds (default: 16)
    /// - `BATTLE_ANIMATION_MS` - Simulated animation length (default: 40)
    /// - `BATTLE_DRAIN_BUDGET` - Deferred events per drain (default: 32)
    /// - `BATTLE_CONTENT` - Path to an encounter table (RON)
    /// - `BATTLE_CONFIG` - Path to a battle config (TOML)
    /// - `BATTLE_LOG_DIR` - Directory for `battle.log`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let parse = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        if let Some(room) = parse("BATTLE_ROOM") {
            config.room_id = room;
        }
        config.seed = parse("BATTLE_SEED").and_then(|v| v.parse().ok());
        if let Some(ms) = parse("BATTLE_TICK_MS").and_then(|v| v.parse::<u64>().ok()) {
            config.tick_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = parse("BATTLE_ANIMATION_MS").and_then(|v| v.parse().ok()) {
            config.animation = Duration::from_millis(ms);
        }
        if let Some(budget) = parse("BATTLE_DRAIN_BUDGET").and_then(|v| v.parse::<usize>().ok()) {
            config.drain_budget = budget.max(1);
        }
        config.content_path = parse("BATTLE_CONTENT").map(PathBuf::from);
        config.config_path = parse("BATTLE_CONFIG").map(PathBuf::from);
        config.log_dir = parse("BATTLE_LOG_DIR").map(PathBuf::from);

        config
    }

    /// Runtime settings for this session on top of a loaded battle config.
    /// An explicit seed wins over the file's.
    pub fn runtime_config(&self, mut battle: BattleConfig) -> RuntimeConfig {
        if let Some(seed) = self.seed {
            battle.seed = Some(seed);
        }
        RuntimeConfig {
            battle,
            drain_budget: self.drain_budget,
            tick_interval: self.tick_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config(&[]), ClientConfig::default());
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let config = config(&[
            ("BATTLE_ROOM", " crypt-3 "),
            ("BATTLE_SEED", "42"),
            ("BATTLE_TICK_MS", "0"),
            ("BATTLE_ANIMATION_MS", "soon"),
            ("BATTLE_LOG_DIR", ""),
        ]);

        assert_eq!(config.room_id, "crypt-3");
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.tick_interval, Duration::from_millis(1));
        assert_eq!(config.animation, ClientConfig::default().animation);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn explicit_seed_overrides_battle_config() {
        let config = config(&[("BATTLE_SEED", "9")]);
        let runtime = config.runtime_config(BattleConfig::new().with_seed(1));
        assert_eq!(runtime.battle.seed, Some(9));
        assert_eq!(runtime.drain_budget, RuntimeConfig::DEFAULT_DRAIN_BUDGET);
    }
}
