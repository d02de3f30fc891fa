//! Bot Messages
//!
//! Messages sent from the trainer to the chat surface. The surface is a
//! renderer: it turns a [`BotMessage`] into whatever the chat platform needs
//! (a Telegram `sendMessage`, a callback toast, a markup edit) and nothing more.
//!
//! # Design Philosophy
//!
//! The trainer decides what is said and which buttons are offered. Keyboards
//! therefore travel as plain rows of labels, so a surface never has to know
//! which dialogue is running in order to draw them.

use serde::{Deserialize, Serialize};

/// Conversation identifier assigned by the chat platform
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event identifier (for log correlation)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A button attached to a single message that answers with callback data
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    /// Label shown on the button
    pub text: String,
    /// Data delivered back as a callback event when pressed
    pub callback_data: String,
}

impl InlineButton {
    /// Create a callback button
    pub fn callback(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Keyboard to show alongside a text message
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyboard {
    /// Leave whatever keyboard the user currently sees
    #[default]
    Unchanged,
    /// Hide the reply keyboard
    Remove,
    /// Persistent reply keyboard; pressing a button sends its label as text
    Reply {
        /// Button labels, row by row
        rows: Vec<Vec<String>>,
    },
    /// Buttons attached to the message itself
    Inline {
        /// Buttons, row by row
        rows: Vec<Vec<InlineButton>>,
    },
}

impl Keyboard {
    /// All labels of a reply keyboard, flattened (empty for other kinds)
    #[must_use]
    pub fn reply_labels(&self) -> Vec<&str> {
        match self {
            Self::Reply { rows } => rows.iter().flatten().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// Messages from the trainer to the chat surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotMessage {
    /// A text message in a conversation
    Text {
        /// Target conversation
        chat_id: ChatId,
        /// Message body
        text: String,
        /// Keyboard to show with it
        keyboard: Keyboard,
    },

    /// Answer to a pressed inline button (toast or modal alert)
    CallbackAnswer {
        /// Platform id of the callback being answered
        callback_id: String,
        /// Text of the notification
        text: String,
        /// Show as a modal alert instead of a toast
        show_alert: bool,
    },

    /// Strip the inline keyboard from an earlier message
    ClearInlineKeyboard {
        /// Conversation holding the message
        chat_id: ChatId,
        /// Platform id of the message
        message_id: i32,
    },
}

impl BotMessage {
    /// Create a text message
    pub fn text(chat_id: ChatId, text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self::Text {
            chat_id,
            text: text.into(),
            keyboard,
        }
    }

    /// Conversation this message is addressed to, if it has one
    #[must_use]
    pub fn chat_id(&self) -> Option<ChatId> {
        match self {
            Self::Text { chat_id, .. } | Self::ClearInlineKeyboard { chat_id, .. } => {
                Some(*chat_id)
            }
            Self::CallbackAnswer { .. } => None,
        }
    }

    /// Visible text of the message
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } | Self::CallbackAnswer { text, .. } => Some(text),
            Self::ClearInlineKeyboard { .. } => None,
        }
    }

    /// Keyboard carried by a text message
    #[must_use]
    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Self::Text { keyboard, .. } => Some(keyboard),
            _ => None,
        }
    }
}
