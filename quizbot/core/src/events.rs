//! Chat Events
//!
//! Events sent from a chat surface to the trainer. These represent everything
//! a user can do: send a command, type text (including pressing a reply
//! keyboard button, which arrives as its label), or press an inline button.
//!
//! # Design Philosophy
//!
//! Surfaces are "dumb" forwarders. They don't interpret what a text means in
//! the current dialogue; they report what happened and who did it. The
//! [`Router`](crate::router::Router) and the [`Trainer`](crate::trainer::Trainer)
//! decide how to respond.

use serde::{Deserialize, Serialize};

use crate::messages::{ChatId, EventId};

/// Platform-assigned user identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user behind an event, as reported by the platform
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    /// Platform user id
    pub id: UserId,
    /// Handle (`@username`), if the user has one
    pub username: Option<String>,
    /// First and last name joined
    pub full_name: String,
}

impl ChatUser {
    /// Create a user record
    pub fn new(id: i64, username: Option<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            username,
            full_name: full_name.into(),
        }
    }
}

/// Events from a chat surface to the trainer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ChatEvent {
    /// User sent a slash command (e.g. `/start`)
    Command {
        /// Event ID for log correlation
        event_id: EventId,
        /// Conversation the command was sent in
        chat_id: ChatId,
        /// Sender
        from: ChatUser,
        /// Command name (without leading /)
        command: String,
        /// Command arguments
        args: Vec<String>,
    },

    /// User sent plain text or pressed a reply keyboard button
    Text {
        /// Event ID for log correlation
        event_id: EventId,
        /// Conversation the text was sent in
        chat_id: ChatId,
        /// Sender
        from: ChatUser,
        /// Message text, verbatim
        text: String,
    },

    /// User pressed an inline button
    Callback {
        /// Event ID for log correlation
        event_id: EventId,
        /// Conversation holding the pressed button
        chat_id: ChatId,
        /// Sender
        from: ChatUser,
        /// Platform id of the callback (needed to answer it)
        callback_id: String,
        /// Data attached to the button
        data: String,
        /// Message the button belongs to, when the platform still has it
        message_id: Option<i32>,
    },
}

impl ChatEvent {
    /// Generate a new event ID
    pub fn new_event_id() -> EventId {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        EventId(format!("evt_{id}"))
    }

    /// Build an event from an incoming text message
    ///
    /// Text starting with `/` becomes a [`ChatEvent::Command`]; a `@botname`
    /// suffix on the command is dropped.
    pub fn from_text(chat_id: ChatId, from: ChatUser, text: impl Into<String>) -> Self {
        let text = text.into();
        if let Some(rest) = text.strip_prefix('/') {
            let mut parts = rest.split_whitespace();
            if let Some(head) = parts.next() {
                let command = head.split('@').next().unwrap_or(head).to_string();
                return Self::Command {
                    event_id: Self::new_event_id(),
                    chat_id,
                    from,
                    command,
                    args: parts.map(str::to_string).collect(),
                };
            }
        }
        Self::Text {
            event_id: Self::new_event_id(),
            chat_id,
            from,
            text,
        }
    }

    /// Build a callback event
    pub fn callback(
        chat_id: ChatId,
        from: ChatUser,
        callback_id: impl Into<String>,
        data: impl Into<String>,
        message_id: Option<i32>,
    ) -> Self {
        Self::Callback {
            event_id: Self::new_event_id(),
            chat_id,
            from,
            callback_id: callback_id.into(),
            data: data.into(),
            message_id,
        }
    }

    /// Get the event ID
    #[must_use]
    pub fn event_id(&self) -> &EventId {
        match self {
            Self::Command { event_id, .. }
            | Self::Text { event_id, .. }
            | Self::Callback { event_id, .. } => event_id,
        }
    }

    /// Conversation the event belongs to
    #[must_use]
    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::Command { chat_id, .. }
            | Self::Text { chat_id, .. }
            | Self::Callback { chat_id, .. } => *chat_id,
        }
    }

    /// User who caused the event
    #[must_use]
    pub fn from(&self) -> &ChatUser {
        match self {
            Self::Command { from, .. } | Self::Text { from, .. } | Self::Callback { from, .. } => {
                from
            }
        }
    }
}
