//! Error types raised by repository implementations.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("team repository lock was poisoned")]
    LockPoisoned,

    #[error("{0} not found")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
