//! Dialogue Sessions
//!
//! Tracks which dialogue each conversation is in: idle, answering a quiz,
//! adding a card or deleting one. A conversation is one user in one chat, so
//! members of a group each run their own dialogue.
//!
//! # Design Philosophy
//!
//! A session is a value. The trainer reads it, computes the next state and
//! writes it back only after every side effect of the event succeeded, so a
//! failed event leaves the conversation exactly where it was. Idle sessions
//! are not stored at all.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::TrainerError;
use crate::events::{ChatEvent, UserId};
use crate::messages::ChatId;
use crate::selection::QuizItem;
use crate::stats::SessionTally;

/// Identifies a conversation: who is talking, and where
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    /// Chat the messages arrive in
    pub chat: ChatId,
    /// Sender
    pub user: UserId,
}

impl ConversationKey {
    /// Key for `user` in `chat`
    #[must_use]
    pub const fn new(chat: ChatId, user: UserId) -> Self {
        Self { chat, user }
    }

    /// Key of the conversation an event belongs to
    #[must_use]
    pub fn of(event: &ChatEvent) -> Self {
        Self::new(event.chat_id(), event.from().id)
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.chat, self.user)
    }
}

/// A running quiz
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    /// Counters since the quiz started
    pub tally: SessionTally,
    /// Question awaiting an answer
    pub current: QuizItem,
}

/// Progress of the add-card dialogue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddCardDraft {
    /// Waiting for the word to learn
    AwaitingSource,
    /// Waiting for its translation
    AwaitingTarget {
        /// Word entered in the first step
        source: String,
    },
}

/// The delete-card dialogue: ids that were listed to the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCardPrompt {
    /// Card ids accepted as input
    pub card_ids: Vec<i64>,
}

impl DeleteCardPrompt {
    /// Whether `id` was among the listed cards
    #[must_use]
    pub fn lists(&self, id: i64) -> bool {
        self.card_ids.contains(&id)
    }
}

/// Dialogue state of one conversation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueState {
    /// Main menu
    #[default]
    Idle,
    /// Quiz waiting for an answer
    Quiz(QuizSession),
    /// Adding a personal card
    AddCard(AddCardDraft),
    /// Choosing a personal card to delete
    DeleteCard(DeleteCardPrompt),
}

impl DialogueState {
    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Quiz(_) => "quiz",
            Self::AddCard(_) => "add_card",
            Self::DeleteCard(_) => "delete_card",
        }
    }

    /// Whether no dialogue is running
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Name of the running dialogue, or [`TrainerError::NoActiveDialogue`]
    pub fn ensure_active(&self) -> Result<&'static str, TrainerError> {
        if self.is_idle() {
            Err(TrainerError::NoActiveDialogue)
        } else {
            Ok(self.name())
        }
    }
}

/// Storage for per-conversation dialogue state
///
/// Only the trainer's event loop writes here, one event at a time.
pub trait SessionStore: Send + Sync {
    /// Current state (`Idle` when nothing is stored)
    fn get(&self, key: ConversationKey) -> DialogueState;

    /// Replace the state; storing `Idle` is the same as [`SessionStore::clear`]
    fn put(&self, key: ConversationKey, state: DialogueState);

    /// Forget the conversation's state
    fn clear(&self, key: ConversationKey);
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<ConversationKey, DialogueState>,
}

impl InMemorySessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations with a running dialogue
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: ConversationKey) -> DialogueState {
        self.sessions
            .get(&key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn put(&self, key: ConversationKey, state: DialogueState) {
        if state.is_idle() {
            self.sessions.remove(&key);
        } else {
            self.sessions.insert(key, state);
        }
    }

    fn clear(&self, key: ConversationKey) {
        self.sessions.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CardId;
    use pretty_assertions::assert_eq;

    fn key(chat: i64, user: i64) -> ConversationKey {
        ConversationKey::new(ChatId(chat), UserId(user))
    }

    fn quiz() -> DialogueState {
        DialogueState::Quiz(QuizSession {
            tally: SessionTally::default(),
            current: QuizItem {
                card_id: CardId(1),
                prompt: "Дом".to_string(),
                answer: "House".to_string(),
                distractors: vec!["Car".into(), "Red".into(), "Blue".into()],
            },
        })
    }

    #[test]
    fn test_unknown_chat_is_idle() {
        let store = InMemorySessionStore::new();
        assert_eq!(store.get(key(1, 1)), DialogueState::Idle);
    }

    #[test]
    fn test_put_get_clear() {
        let store = InMemorySessionStore::new();
        store.put(key(1, 1), quiz());
        store.put(key(2, 2), DialogueState::AddCard(AddCardDraft::AwaitingSource));
        assert_eq!(store.get(key(1, 1)), quiz());
        assert_eq!(store.active_count(), 2);

        store.clear(key(1, 1));
        assert_eq!(store.get(key(1, 1)), DialogueState::Idle);
        assert_eq!(store.active_count(), 1);
    }

    #[test]
    fn test_putting_idle_removes_entry() {
        let store = InMemorySessionStore::new();
        store.put(key(1, 1), quiz());
        store.put(key(1, 1), DialogueState::Idle);
        assert_eq!(store.active_count(), 0);
    }

    #[test]
    fn test_group_members_have_separate_dialogues() {
        let store = InMemorySessionStore::new();
        store.put(key(-500, 1), quiz());

        assert_eq!(store.get(key(-500, 1)), quiz());
        assert_eq!(store.get(key(-500, 2)), DialogueState::Idle);
        assert_eq!(store.get(key(1, 1)), DialogueState::Idle);
    }

    #[test]
    fn test_ensure_active() {
        assert!(matches!(
            DialogueState::Idle.ensure_active(),
            Err(TrainerError::NoActiveDialogue)
        ));
        assert_eq!(quiz().ensure_active().unwrap(), "quiz");
        let delete = DialogueState::DeleteCard(DeleteCardPrompt { card_ids: vec![3, 5] });
        assert_eq!(delete.ensure_active().unwrap(), "delete_card");
    }

    #[test]
    fn test_delete_prompt_lists() {
        let prompt = DeleteCardPrompt { card_ids: vec![3, 5] };
        assert!(prompt.lists(5));
        assert!(!prompt.lists(4));
    }
}
