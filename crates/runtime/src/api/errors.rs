//! Unified error types surfaced by the battle API.
//!
//! Setup problems the caller can fix are reported directly. Failures in the
//! middle of a battle are wrapped in [`BattleError::Aborted`] with the room
//! they happened in, except cancellation, which always surfaces as
//! [`BattleError::Cancelled`].

use battle_core::{BattlefieldError, CombatantId, Side};
use thiserror::Error;

pub use crate::barrier::BarrierError;
pub use crate::effects::EffectError;
pub use crate::repository::RepositoryError;
pub use crate::resolver::ResolveError;

pub type Result<T> = std::result::Result<T, BattleError>;

#[derive(Debug, Error)]
pub enum BattleError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("battle orchestrator requires {0} to be configured before building")]
    MissingCollaborator(&'static str),

    #[error("{side} team is empty")]
    EmptyTeam { side: Side },

    #[error(transparent)]
    Battlefield(#[from] BattlefieldError),

    #[error("battle was cancelled")]
    Cancelled,

    #[error("battle in room '{room_id}' aborted")]
    Aborted {
        room_id: String,
        #[source]
        source: BattleFault,
    },
}

impl BattleError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Root cause of an aborted battle.
#[derive(Debug, Error)]
pub enum BattleFault {
    #[error(transparent)]
    Barrier(BarrierError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Resolve(ResolveError),

    #[error("combatant {0} is not on the battlefield")]
    UnknownCombatant(CombatantId),
}

impl From<EffectError> for BattleFault {
    fn from(error: EffectError) -> Self {
        match error {
            EffectError::UnknownCombatant(id) => Self::UnknownCombatant(id),
        }
    }
}
