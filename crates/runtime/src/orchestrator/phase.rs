use strum::Display;

/// Stage of a battle, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BattlePhase {
    /// Teams are loaded and placed.
    Setup,
    /// Waiting for the presentation to show every combatant.
    AwaitSpawnBarrier,
    /// Rounds of player and enemy turns.
    TurnLoop,
    /// Outcome decided and the player team persisted.
    Resolution,
}
