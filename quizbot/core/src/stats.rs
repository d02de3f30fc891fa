//! Answer Statistics
//!
//! Two kinds of counters exist. Lifetime counters live in the card store and
//! only ever grow. Session counters live inside a running quiz and vanish when
//! it ends.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::events::UserId;
use crate::store::{CardStore, StoreError};

/// Percentage of correct answers, rounded to two decimals
///
/// Skipped cards are not part of the denominator. Returns 0 when nothing was
/// answered.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn accuracy(correct: u64, incorrect: u64) -> f64 {
    let answered = correct + incorrect;
    if answered == 0 {
        return 0.0;
    }
    let percent = correct as f64 / answered as f64 * 100.0;
    (percent * 100.0).round() / 100.0
}

/// Persisted per-user counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeStats {
    /// Correct answers over all quizzes
    pub correct: u64,
    /// Incorrect answers over all quizzes
    pub incorrect: u64,
}

impl LifetimeStats {
    /// Lifetime accuracy in percent
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        accuracy(self.correct, self.incorrect)
    }
}

/// Counters of the quiz currently running in a conversation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTally {
    /// Correct answers in this quiz
    pub correct: u64,
    /// Incorrect answers in this quiz
    pub incorrect: u64,
    /// Cards skipped without answering
    pub skipped: u64,
}

impl SessionTally {
    /// Count one scored answer
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    /// Count one skipped card
    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    /// Session accuracy in percent (skips excluded)
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        accuracy(self.correct, self.incorrect)
    }
}

/// Reads and updates lifetime counters through the card store
pub struct StatsAggregator<S: ?Sized> {
    store: Arc<S>,
}

impl<S: CardStore + ?Sized> StatsAggregator<S> {
    /// Create an aggregator over `store`
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist one scored answer
    pub async fn record_answer(&self, user: UserId, correct: bool) -> Result<(), StoreError> {
        self.store.record_answer(user, correct).await?;
        tracing::debug!(user_id = %user, correct, "Recorded answer");
        Ok(())
    }

    /// Lifetime counters, `None` before the first scored answer
    pub async fn lifetime_stats(&self, user: UserId) -> Result<Option<LifetimeStats>, StoreError> {
        self.store.lifetime_stats(user).await
    }
}
