//! Event Routing
//!
//! Maps chat events onto trainer actions. Menu buttons arrive as plain text
//! carrying their label, so the same [`MenuLabels`] value that classifies text
//! also draws the keyboards. Changing a label in one place keeps both sides
//! in sync.
//!
//! The router does not know which dialogue a conversation is in. It reports
//! which menu action (if any) a text names; the trainer decides whether that
//! action applies in the current state.

use serde::{Deserialize, Serialize};

use crate::events::ChatEvent;
use crate::messages::{InlineButton, Keyboard};

/// Callback data of the inline cancel button
pub const CANCEL_CALLBACK: &str = "cancel";

/// Command that opens the main menu
pub const START_COMMAND: &str = "start";

/// Button labels shown to users
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuLabels {
    /// Show lifetime statistics
    pub stats: String,
    /// Begin the add-card dialogue
    pub add_card: String,
    /// Begin the delete-card dialogue
    pub delete_card: String,
    /// Start a quiz
    pub start_quiz: String,
    /// Skip the current question
    pub skip: String,
    /// End the quiz and show results
    pub finish: String,
    /// Inline button that cancels the running dialogue
    pub cancel: String,
}

impl Default for MenuLabels {
    fn default() -> Self {
        Self {
            stats: "📈 Статистика 📈".to_string(),
            add_card: "➕ Добавить карточку 📝".to_string(),
            delete_card: "❌ Удалить карточку 📝".to_string(),
            start_quiz: "📚 Запустить тест (случайные карточки) 📚".to_string(),
            skip: "⏭ Пропустить".to_string(),
            finish: "🔚 Завершить".to_string(),
            cancel: "❌ Отменить".to_string(),
        }
    }
}

/// Action named by a menu or quiz-control button
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuAction {
    /// Lifetime statistics
    ShowStats,
    /// Add a personal card
    AddCard,
    /// Delete a personal card
    DeleteCard,
    /// Start (or restart) a quiz
    StartQuiz,
    /// Skip the current question
    Skip,
    /// Finish the quiz
    Finish,
}

/// Classified chat event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// `/start`
    Start,
    /// Inline cancel button
    Cancel {
        /// Callback to answer
        callback_id: String,
        /// Message carrying the pressed button
        message_id: Option<i32>,
    },
    /// Inline button with data nobody handles
    UnknownCallback {
        /// Callback to answer
        callback_id: String,
    },
    /// Text (typed, a pressed reply button, or an unhandled command)
    Text {
        /// The text verbatim
        text: String,
        /// Menu action whose label matches the text exactly
        action: Option<MenuAction>,
    },
}

/// Dispatch table built once at startup
#[derive(Clone, Debug, Default)]
pub struct Router {
    labels: MenuLabels,
}

impl Router {
    /// Router over the given labels
    #[must_use]
    pub fn new(labels: MenuLabels) -> Self {
        Self { labels }
    }

    /// Labels this router matches and draws
    #[must_use]
    pub fn labels(&self) -> &MenuLabels {
        &self.labels
    }

    /// Classify an event
    #[must_use]
    pub fn classify(&self, event: &ChatEvent) -> Route {
        match event {
            ChatEvent::Command { command, .. } if command == START_COMMAND => Route::Start,
            ChatEvent::Command { command, args, .. } => {
                let mut text = format!("/{command}");
                for arg in args {
                    text.push(' ');
                    text.push_str(arg);
                }
                Route::Text { text, action: None }
            }
            ChatEvent::Text { text, .. } => Route::Text {
                action: self.action_for(text),
                text: text.clone(),
            },
            ChatEvent::Callback {
                callback_id,
                data,
                message_id,
                ..
            } => {
                if data == CANCEL_CALLBACK {
                    Route::Cancel {
                        callback_id: callback_id.clone(),
                        message_id: *message_id,
                    }
                } else {
                    Route::UnknownCallback {
                        callback_id: callback_id.clone(),
                    }
                }
            }
        }
    }

    /// Menu action whose label equals `text`
    #[must_use]
    pub fn action_for(&self, text: &str) -> Option<MenuAction> {
        let labels = &self.labels;
        [
            (&labels.stats, MenuAction::ShowStats),
            (&labels.add_card, MenuAction::AddCard),
            (&labels.delete_card, MenuAction::DeleteCard),
            (&labels.start_quiz, MenuAction::StartQuiz),
            (&labels.skip, MenuAction::Skip),
            (&labels.finish, MenuAction::Finish),
        ]
        .into_iter()
        .find(|(label, _)| label.as_str() == text)
        .map(|(_, action)| action)
    }

    /// Main menu reply keyboard
    #[must_use]
    pub fn main_menu(&self) -> Keyboard {
        let labels = &self.labels;
        Keyboard::Reply {
            rows: vec![
                vec![labels.stats.clone()],
                vec![labels.add_card.clone(), labels.delete_card.clone()],
                vec![labels.start_quiz.clone()],
            ],
        }
    }

    /// Quiz keyboard: options two per row, then skip and finish
    #[must_use]
    pub fn answer_keyboard(&self, options: &[String]) -> Keyboard {
        let mut rows: Vec<Vec<String>> = options.chunks(2).map(<[String]>::to_vec).collect();
        rows.push(vec![self.labels.skip.clone(), self.labels.finish.clone()]);
        Keyboard::Reply { rows }
    }

    /// Inline cancel button for multi-step dialogues
    #[must_use]
    pub fn cancel_keyboard(&self) -> Keyboard {
        Keyboard::Inline {
            rows: vec![vec![InlineButton::callback(
                self.labels.cancel.clone(),
                CANCEL_CALLBACK,
            )]],
        }
    }
}
