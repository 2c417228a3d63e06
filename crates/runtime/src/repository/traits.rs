//! Repository contracts for the persistent player team.

use battle_core::Combatant;

use super::Result;

/// Store for the player's team between battles.
pub trait TeamRepository: Send + Sync {
    /// Returns independent copies of the stored team; mutating them never
    /// touches the stored state.
    fn load_player_team(&self) -> Result<Vec<Combatant>>;

    /// Replaces the stored team.
    fn save_player_team(&self, team: &[Combatant]) -> Result<()>;
}
