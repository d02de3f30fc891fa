//! Transport Layer
//!
//! Carries [`ChatEvent`]s from a chat surface to the trainer and
//! [`BotMessage`]s back.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ChatEvent    ┌──────────────┐
//! │ Chat surface │ ─────────────► │   Trainer    │
//! │  (Telegram)  │ ◄───────────── │              │
//! └──────────────┘   BotMessage   └──────────────┘
//! ```
//!
//! The trainer only ever sees the channel ends; it does not know which
//! surface is on the other side.
//!
//! [`ChatEvent`]: crate::events::ChatEvent
//! [`BotMessage`]: crate::messages::BotMessage

pub mod in_process;

pub use in_process::{EventSender, InProcessTransport};

use thiserror::Error;

/// Errors from a surface transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// The trainer side is gone
    #[error("Connection closed")]
    ConnectionClosed,

    /// An event could not be delivered
    #[error("Send failed: {0}")]
    SendFailed(String),
}
