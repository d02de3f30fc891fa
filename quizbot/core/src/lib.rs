//! Quizbot Core - Flashcard Quiz Dialogues
//!
//! This crate holds everything the quizbot does, independent of any chat
//! platform. It can drive a Telegram bot, a test harness, or any other
//! surface that speaks [`ChatEvent`] and [`BotMessage`].
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        Chat Surfaces                            │
//! │        ┌──────────────┐              ┌───────────────────┐      │
//! │        │   Telegram   │              │  Tests / Headless │      │
//! │        │  (teloxide)  │              │                   │      │
//! │        └──────┬───────┘              └─────────┬─────────┘      │
//! │               └───────────────┬────────────────┘                │
//! │                      ChatEvent (up)                             │
//! │                     BotMessage (down)                           │
//! └───────────────────────────────┼─────────────────────────────────┘
//!                                 │
//! ┌───────────────────────────────┼─────────────────────────────────┐
//! │                          QUIZBOT CORE                           │
//! │  ┌────────────────────────────┴──────────────────────────────┐  │
//! │  │                         Trainer                           │  │
//! │  │  ┌────────┐  ┌──────────┐  ┌───────────┐  ┌────────────┐  │  │
//! │  │  │ Router │  │ Sessions │  │ Selection │  │   Stats    │  │  │
//! │  │  └────────┘  └──────────┘  └─────┬─────┘  └─────┬──────┘  │  │
//! │  └──────────────────────────────────┼──────────────┼─────────┘  │
//! │                              ┌──────┴──────────────┴──────┐     │
//! │                              │   CardStore (SQLite)       │     │
//! │                              └────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Trainer`]: handles chat events one at a time and emits replies
//! - [`ChatEvent`]: what a user did
//! - [`BotMessage`]: what the bot shows
//! - [`CardStore`]: persistence seam, implemented by [`SqliteStore`]
//! - [`Router`]: menu labels, keyboards and event classification
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use quizbot_core::{InProcessTransport, Router, SqliteStore, Trainer, SHARED_CARDS};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(SqliteStore::open_in_memory()?);
//!     store.seed_shared_cards(SHARED_CARDS).await?;
//!
//!     let (transport, event_rx, msg_tx) = InProcessTransport::new_pair();
//!     let trainer = Trainer::new(store, Router::default(), msg_tx);
//!     tokio::spawn(async move { trainer.run(event_rx).await });
//!
//!     // Feed ChatEvents through `transport`, render what `transport.recv()` yields
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`config`]: TOML/env/CLI configuration
//! - [`error`]: trainer errors
//! - [`events`]: events from chat surfaces
//! - [`messages`]: messages to chat surfaces
//! - [`replies`]: user-facing texts
//! - [`router`]: labels, keyboards, event classification
//! - [`selection`]: quiz question selection
//! - [`session`]: per-conversation dialogue state
//! - [`stats`]: answer counters
//! - [`store`]: card persistence
//! - [`trainer`]: the dialogue core
//! - [`transport`]: surface/trainer channels

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod events;
pub mod messages;
pub mod replies;
pub mod router;
pub mod selection;
pub mod session;
pub mod stats;
pub mod store;
pub mod trainer;
pub mod transport;

// Re-exports for convenience
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, QuizbotConfig,
};
pub use error::TrainerError;
pub use events::{ChatEvent, ChatUser, UserId};
pub use messages::{BotMessage, ChatId, EventId, InlineButton, Keyboard};
pub use router::{MenuAction, MenuLabels, Route, Router};
pub use selection::{CardSelector, QuizItem, QUIZ_OPTIONS};
pub use session::{ConversationKey, DialogueState, InMemorySessionStore, SessionStore};
pub use stats::{accuracy, LifetimeStats, SessionTally, StatsAggregator};
pub use store::{Card, CardId, CardStore, SeedCard, SqliteStore, StoreError, SHARED_CARDS};
pub use trainer::Trainer;
pub use transport::{EventSender, InProcessTransport, TransportError};
