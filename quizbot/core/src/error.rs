//! Trainer errors
//!
//! Everything except [`TrainerError::Persistence`] is recovered inside the
//! trainer with a short message to the user. A persistence failure aborts the
//! event that caused it.

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while handling a chat event
#[derive(Debug, Error)]
pub enum TrainerError {
    /// Fewer than four cards with distinct answers are visible
    #[error("not enough cards for a quiz: {available} available")]
    InsufficientCards {
        /// Number of usable cards found
        available: usize,
    },

    /// Delete dialogue input is not one of the listed card ids
    #[error("invalid card id: {0:?}")]
    InvalidDeleteIdentifier(String),

    /// Cancel requested while no dialogue is running
    #[error("no active dialogue to cancel")]
    NoActiveDialogue,

    /// The card store failed
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}
