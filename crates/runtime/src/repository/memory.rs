//! In-memory TeamRepository implementation for tests and local runs.

use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use battle_core::Combatant;

use super::{RepositoryError, Result, TeamRepository};

/// In-memory implementation of [`TeamRepository`].
///
/// Observers are not persisted: stored and loaded combatants never carry
/// them.
#[derive(Debug, Default)]
pub struct InMemoryTeamRepository {
    team: RwLock<Option<Vec<Combatant>>>,
    saves: AtomicUsize,
}

impl InMemoryTeamRepository {
    /// Create an empty repository; loading fails until a team is saved.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(team: Vec<Combatant>) -> Self {
        Self {
            team: RwLock::new(Some(team)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Acquire)
    }

    /// Copy of the stored team, if any.
    pub fn snapshot(&self) -> Result<Option<Vec<Combatant>>> {
        let team = self.team.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(team.clone())
    }
}

impl TeamRepository for InMemoryTeamRepository {
    fn load_player_team(&self) -> Result<Vec<Combatant>> {
        let team = self.team.read().map_err(|_| RepositoryError::LockPoisoned)?;
        team.clone()
            .ok_or_else(|| RepositoryError::NotFound("player team".to_owned()))
    }

    fn save_player_team(&self, team: &[Combatant]) -> Result<()> {
        let mut stored = self
            .team
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut copy = team.to_vec();
        for combatant in &mut copy {
            combatant.clear_observers();
        }
        *stored = Some(copy);
        self.saves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
