//! Card Store
//!
//! Persistence gateway for users, vocabulary cards, card ownership and answer
//! statistics. The store owns no dialogue logic: it answers typed queries and
//! applies typed mutations, each as one short transaction.
//!
//! # Visibility
//!
//! A card with no ownership link is shared and visible to everyone. A card
//! linked to a user is personal and visible only to that user.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::{ChatUser, UserId};
use crate::stats::LifetimeStats;

/// Database-assigned card identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub i64);

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A word pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Card id
    pub id: CardId,
    /// Word shown as the prompt
    pub source: String,
    /// Expected answer
    pub target: String,
}

/// A shared card inserted on first start
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedCard {
    /// Prompt word
    pub source: &'static str,
    /// Answer word
    pub target: &'static str,
}

impl SeedCard {
    /// Pair a prompt with its answer
    pub const fn new(source: &'static str, target: &'static str) -> Self {
        Self { source, target }
    }
}

/// Shared vocabulary every user starts with
pub const SHARED_CARDS: &[SeedCard] = &[
    SeedCard::new("Привет", "Hello"),
    SeedCard::new("Я", "I"),
    SeedCard::new("Ты", "You"),
    SeedCard::new("Он", "He"),
    SeedCard::new("Она", "She"),
    SeedCard::new("Они", "They"),
    SeedCard::new("Синий", "Blue"),
    SeedCard::new("Красный", "Red"),
    SeedCard::new("Машина", "Car"),
    SeedCard::new("Дом", "House"),
];

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// A query or mutation failed
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The database file could not be opened
    #[error("failed to open database at {path}: {source}")]
    Open {
        /// Path that was being opened
        path: String,
        /// Underlying error
        source: rusqlite::Error,
    },

    /// Filesystem error while preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store cannot serve requests (worker thread lost, backend down)
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Typed access to users, cards and statistics
///
/// Every method is one transaction. Implementations must be safe to share
/// between tasks.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Record a user on first contact
    ///
    /// Returns `true` when the user was new. Existing users are left untouched.
    async fn register_user(&self, user: &ChatUser) -> Result<bool, StoreError>;

    /// Insert the shared cards unless any unowned card already exists
    ///
    /// Returns how many cards were inserted (0 when seeding was skipped).
    async fn seed_shared_cards(&self, cards: &'static [SeedCard]) -> Result<usize, StoreError>;

    /// Up to `limit` cards visible to `user`, in random order, with distinct answers
    async fn random_visible_cards(&self, user: UserId, limit: usize)
        -> Result<Vec<Card>, StoreError>;

    /// Create a personal card and its ownership link together
    async fn add_personal_card(
        &self,
        user: UserId,
        source: &str,
        target: &str,
    ) -> Result<Card, StoreError>;

    /// Personal cards of `user`, oldest first
    async fn personal_cards(&self, user: UserId) -> Result<Vec<Card>, StoreError>;

    /// Delete a card owned by `user`
    ///
    /// Returns `false` if no such card is owned by the user (anymore).
    async fn delete_personal_card(&self, user: UserId, card: CardId) -> Result<bool, StoreError>;

    /// Increment the lifetime correct or incorrect counter
    async fn record_answer(&self, user: UserId, correct: bool) -> Result<(), StoreError>;

    /// Lifetime counters, or `None` if the user never answered
    async fn lifetime_stats(&self, user: UserId) -> Result<Option<LifetimeStats>, StoreError>;
}
