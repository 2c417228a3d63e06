//! Battle outcomes and damage accounting.

use crate::combatant::Combatant;

/// Final outcome of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleOutcome {
    PlayerVictory,
    EnemyVictory,
    Draw,
}

impl BattleOutcome {
    /// Decides the outcome from which sides still have living members.
    ///
    /// Both sides alive can only happen when the turn loop was cut short; it is
    /// treated as a draw.
    pub const fn decide(players_alive: bool, enemies_alive: bool) -> Self {
        match (players_alive, enemies_alive) {
            (true, false) => Self::PlayerVictory,
            (false, true) => Self::EnemyVictory,
            _ => Self::Draw,
        }
    }
}

/// Immutable summary produced once when a battle ends.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleResult {
    room_id: String,
    outcome: BattleOutcome,
    turn_count: u32,
    survivors: Vec<Combatant>,
    battle_number: u64,
}

impl BattleResult {
    pub fn new(
        room_id: impl Into<String>,
        outcome: BattleOutcome,
        turn_count: u32,
        survivors: Vec<Combatant>,
        battle_number: u64,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            outcome,
            turn_count,
            survivors,
            battle_number,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn outcome(&self) -> BattleOutcome {
        self.outcome
    }

    /// Number of completed rounds (one player turn plus one enemy turn each).
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn survivors(&self) -> &[Combatant] {
        &self.survivors
    }

    /// Monotonic counter of battles finished by the same orchestrator.
    pub fn battle_number(&self) -> u64 {
        self.battle_number
    }
}

/// How one hit of incoming damage was distributed.
///
/// `blocked + applied + overkill == raw` always holds; `overkill` is only
/// non-zero when the target had less HP left than the unblocked damage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageReport {
    pub raw: u32,
    pub blocked: u32,
    pub applied: u32,
    pub overkill: u32,
}

impl DamageReport {
    pub const fn new(raw: u32, blocked: u32, applied: u32) -> Self {
        Self {
            raw,
            blocked,
            applied,
            overkill: raw.saturating_sub(blocked).saturating_sub(applied),
        }
    }
}
