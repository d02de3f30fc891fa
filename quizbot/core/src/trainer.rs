//! Trainer - The Dialogue Core
//!
//! The trainer drives every conversation:
//! - quizzes (question, answer, skip, finish)
//! - adding and deleting personal cards
//! - lifetime statistics
//!
//! # Design Philosophy
//!
//! The trainer is surface-agnostic. It never talks to Telegram directly; it
//! communicates through:
//! - [`ChatEvent`]: what a user did, received FROM the surface
//! - [`BotMessage`]: what to show, sent TO the surface
//!
//! Events are handled one at a time. Replies for an event are collected first
//! and only sent, together with the new dialogue state, once every store call
//! for that event has succeeded. A failed event leaves the conversation where
//! it was and sends nothing.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::TrainerError;
use crate::events::{ChatEvent, ChatUser, UserId};
use crate::messages::{BotMessage, ChatId, Keyboard};
use crate::replies;
use crate::router::{MenuAction, Route, Router};
use crate::selection::CardSelector;
use crate::session::{
    AddCardDraft, ConversationKey, DeleteCardPrompt, DialogueState, InMemorySessionStore,
    QuizSession, SessionStore,
};
use crate::stats::{SessionTally, StatsAggregator};
use crate::store::{CardId, CardStore};

/// Replies collected while handling one event
struct Outbox {
    chat: ChatId,
    messages: Vec<BotMessage>,
}

impl Outbox {
    fn new(chat: ChatId) -> Self {
        Self {
            chat,
            messages: Vec::new(),
        }
    }

    fn text(&mut self, text: impl Into<String>, keyboard: Keyboard) {
        self.messages.push(BotMessage::text(self.chat, text, keyboard));
    }

    fn answer_callback(&mut self, callback_id: String, text: &str, show_alert: bool) {
        self.messages.push(BotMessage::CallbackAnswer {
            callback_id,
            text: text.to_string(),
            show_alert,
        });
    }

    fn clear_inline_keyboard(&mut self, message_id: i32) {
        self.messages.push(BotMessage::ClearInlineKeyboard {
            chat_id: self.chat,
            message_id,
        });
    }
}

/// Parse delete dialogue input into one of the listed card ids
///
/// Only plain ASCII digits are accepted; signs, spaces and other numerals are
/// rejected along with ids that were not listed.
///
/// # Errors
///
/// [`TrainerError::InvalidDeleteIdentifier`] for anything else.
pub fn parse_card_id(input: &str, prompt: &DeleteCardPrompt) -> Result<CardId, TrainerError> {
    let invalid = || TrainerError::InvalidDeleteIdentifier(input.to_string());

    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let id: i64 = input.parse().map_err(|_| invalid())?;
    if prompt.lists(id) {
        Ok(CardId(id))
    } else {
        Err(invalid())
    }
}

/// The flashcard trainer
pub struct Trainer<S, K = InMemorySessionStore> {
    /// Card store
    store: Arc<S>,
    /// Picks quiz questions
    selector: CardSelector<S>,
    /// Lifetime counters
    stats: StatsAggregator<S>,
    /// Dialogue state per conversation
    sessions: K,
    /// Labels, keyboards and event classification
    router: Router,
    /// Channel to the chat surface
    tx: mpsc::Sender<BotMessage>,
}

impl<S: CardStore> Trainer<S> {
    /// Create a trainer keeping sessions in memory
    pub fn new(store: Arc<S>, router: Router, tx: mpsc::Sender<BotMessage>) -> Self {
        Self::with_session_store(store, router, InMemorySessionStore::new(), tx)
    }
}

impl<S: CardStore, K: SessionStore> Trainer<S, K> {
    /// Create a trainer over a custom session store
    pub fn with_session_store(
        store: Arc<S>,
        router: Router,
        sessions: K,
        tx: mpsc::Sender<BotMessage>,
    ) -> Self {
        Self {
            selector: CardSelector::new(Arc::clone(&store)),
            stats: StatsAggregator::new(Arc::clone(&store)),
            store,
            sessions,
            router,
            tx,
        }
    }

    /// Session store
    #[must_use]
    pub fn sessions(&self) -> &K {
        &self.sessions
    }

    /// Router
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Handle events until the channel closes
    ///
    /// Failed events are logged and skipped; the loop only ends when every
    /// sender is gone.
    pub async fn run(&self, mut events: mpsc::Receiver<ChatEvent>) {
        tracing::info!("Trainer started");
        while let Some(event) = events.recv().await {
            let event_id = event.event_id().clone();
            let chat_id = event.chat_id();
            if let Err(e) = self.handle_event(event).await {
                tracing::error!(
                    event_id = %event_id,
                    chat_id = %chat_id,
                    error = %e,
                    "Failed to handle chat event"
                );
            }
        }
        tracing::info!("Event channel closed, trainer stopping");
    }

    /// Handle one event from the chat surface
    ///
    /// # Errors
    ///
    /// [`TrainerError::Persistence`] when the card store fails; the
    /// conversation keeps its previous state and nothing is sent.
    pub async fn handle_event(&self, event: ChatEvent) -> Result<(), TrainerError> {
        let chat = event.chat_id();
        let key = ConversationKey::of(&event);
        let user = event.from().clone();

        if self.store.register_user(&user).await? {
            tracing::info!(user_id = %user.id, "Registered new user");
        }

        let state = self.sessions.get(key);
        let route = self.router.classify(&event);
        tracing::debug!(
            event_id = %event.event_id(),
            chat_id = %chat,
            state = state.name(),
            route = ?route,
            "Dispatching chat event"
        );

        let mut out = Outbox::new(chat);
        let next = self.dispatch(&user, state, route, &mut out).await?;

        self.sessions.put(key, next);
        for msg in out.messages {
            self.send(msg).await;
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        user: &ChatUser,
        state: DialogueState,
        route: Route,
        out: &mut Outbox,
    ) -> Result<DialogueState, TrainerError> {
        match (state, route) {
            (state, Route::Start) => {
                out.text(replies::greeting(&user.full_name), self.router.main_menu());
                tracing::info!(user_id = %user.id, "User started the bot");
                Ok(state)
            }

            (state, Route::Cancel {
                callback_id,
                message_id,
            }) => Ok(self.cancel(user.id, &state, callback_id, message_id, out)),

            (state, Route::UnknownCallback { callback_id }) => {
                out.answer_callback(callback_id, "", false);
                tracing::debug!(user_id = %user.id, "Ignored unknown callback");
                Ok(state)
            }

            (DialogueState::Quiz(quiz), Route::Text { text, action }) => match action {
                Some(MenuAction::Skip) => self.skip(user.id, quiz, out).await,
                Some(MenuAction::Finish) => Ok(self.finish(user.id, quiz, out)),
                Some(MenuAction::StartQuiz) => self.next_question(user.id, quiz.tally, out).await,
                _ => self.answer(user.id, quiz, &text, out).await,
            },

            (DialogueState::AddCard(draft), Route::Text { text, .. }) => {
                self.add_card_step(user.id, draft, text, out).await
            }

            (DialogueState::DeleteCard(prompt), Route::Text { text, .. }) => {
                self.delete_card_step(user.id, prompt, &text, out).await
            }

            (DialogueState::Idle, Route::Text { text, action }) => match action {
                Some(MenuAction::ShowStats) => self.show_stats(user.id, out).await,
                Some(MenuAction::AddCard) => Ok(self.start_add_card(user.id, out)),
                Some(MenuAction::DeleteCard) => self.start_delete(user.id, out).await,
                Some(MenuAction::StartQuiz) => {
                    tracing::info!(user_id = %user.id, "Started quiz");
                    self.next_question(user.id, SessionTally::default(), out)
                        .await
                }
                Some(MenuAction::Skip | MenuAction::Finish) | None => {
                    out.text(replies::UNKNOWN_COMMAND, self.router.main_menu());
                    tracing::warn!(user_id = %user.id, text = %text, "Unknown command");
                    Ok(DialogueState::Idle)
                }
            },
        }
    }

    // =========================================================================
    // Quiz
    // =========================================================================

    /// Ask the next question, carrying `tally` over
    async fn next_question(
        &self,
        user: UserId,
        tally: SessionTally,
        out: &mut Outbox,
    ) -> Result<DialogueState, TrainerError> {
        match self.selector.select_quiz_item(user).await {
            Ok(item) => {
                let options = item.shuffled_options(&mut rand::thread_rng());
                out.text(
                    replies::question(&item.prompt),
                    self.router.answer_keyboard(&options),
                );
                Ok(DialogueState::Quiz(QuizSession {
                    tally,
                    current: item,
                }))
            }
            Err(TrainerError::InsufficientCards { available }) => {
                tracing::warn!(user_id = %user, available, "Not enough cards for a quiz");
                out.text(replies::NO_QUIZ_CARDS, self.router.main_menu());
                Ok(DialogueState::Idle)
            }
            Err(e) => Err(e),
        }
    }

    async fn answer(
        &self,
        user: UserId,
        quiz: QuizSession,
        reply: &str,
        out: &mut Outbox,
    ) -> Result<DialogueState, TrainerError> {
        let QuizSession { mut tally, current } = quiz;
        let correct = current.is_correct(reply);
        tally.record(correct);

        let text = if correct {
            replies::praise(&mut rand::thread_rng())
        } else {
            replies::reproach(&mut rand::thread_rng(), &current.answer)
        };
        out.text(text, Keyboard::Remove);

        // Lifetime counters are written last so a failed redraw leaves them untouched.
        let next = self.next_question(user, tally, out).await?;
        self.stats.record_answer(user, correct).await?;
        tracing::info!(
            user_id = %user,
            card_id = %current.card_id,
            correct,
            "Answered quiz question"
        );
        Ok(next)
    }

    async fn skip(
        &self,
        user: UserId,
        quiz: QuizSession,
        out: &mut Outbox,
    ) -> Result<DialogueState, TrainerError> {
        let QuizSession { mut tally, current } = quiz;
        tally.skip();
        tracing::info!(user_id = %user, card_id = %current.card_id, "Skipped quiz question");
        self.next_question(user, tally, out).await
    }

    fn finish(&self, user: UserId, quiz: QuizSession, out: &mut Outbox) -> DialogueState {
        let tally = quiz.tally;
        out.text(replies::quiz_results(&tally), self.router.main_menu());
        tracing::info!(
            user_id = %user,
            correct = tally.correct,
            incorrect = tally.incorrect,
            skipped = tally.skipped,
            "Finished quiz"
        );
        DialogueState::Idle
    }

    // =========================================================================
    // Personal cards
    // =========================================================================

    fn start_add_card(&self, user: UserId, out: &mut Outbox) -> DialogueState {
        out.text(replies::ASK_SOURCE, self.router.cancel_keyboard());
        tracing::info!(user_id = %user, "Started adding a card");
        DialogueState::AddCard(AddCardDraft::AwaitingSource)
    }

    async fn add_card_step(
        &self,
        user: UserId,
        draft: AddCardDraft,
        text: String,
        out: &mut Outbox,
    ) -> Result<DialogueState, TrainerError> {
        match draft {
            AddCardDraft::AwaitingSource => {
                out.text(replies::ASK_TARGET, self.router.cancel_keyboard());
                Ok(DialogueState::AddCard(AddCardDraft::AwaitingTarget {
                    source: text,
                }))
            }
            AddCardDraft::AwaitingTarget { source } => {
                let card = self.store.add_personal_card(user, &source, &text).await?;
                out.text(replies::card_added(&card.source), self.router.main_menu());
                tracing::info!(user_id = %user, card_id = %card.id, "Added a card");
                Ok(DialogueState::Idle)
            }
        }
    }

    async fn start_delete(
        &self,
        user: UserId,
        out: &mut Outbox,
    ) -> Result<DialogueState, TrainerError> {
        let cards = self.store.personal_cards(user).await?;
        if cards.is_empty() {
            out.text(replies::NO_CARDS_TO_DELETE, self.router.main_menu());
            tracing::warn!(user_id = %user, "Delete requested without personal cards");
            return Ok(DialogueState::Idle);
        }

        out.text(replies::delete_listing(&cards), self.router.cancel_keyboard());
        Ok(DialogueState::DeleteCard(DeleteCardPrompt {
            card_ids: cards.iter().map(|card| card.id.0).collect(),
        }))
    }

    async fn delete_card_step(
        &self,
        user: UserId,
        prompt: DeleteCardPrompt,
        input: &str,
        out: &mut Outbox,
    ) -> Result<DialogueState, TrainerError> {
        let card = match parse_card_id(input, &prompt) {
            Ok(card) => card,
            Err(TrainerError::InvalidDeleteIdentifier(input)) => {
                out.text(replies::INVALID_CARD_ID, self.router.cancel_keyboard());
                tracing::warn!(user_id = %user, input = %input, "Invalid card id for deletion");
                return Ok(DialogueState::DeleteCard(prompt));
            }
            Err(e) => return Err(e),
        };

        if self.store.delete_personal_card(user, card).await? {
            out.text(replies::CARD_DELETED, self.router.main_menu());
            tracing::info!(user_id = %user, card_id = %card, "Deleted a card");
        } else {
            out.text(replies::CARD_NOT_FOUND, self.router.main_menu());
            tracing::warn!(user_id = %user, card_id = %card, "Card vanished before deletion");
        }
        Ok(DialogueState::Idle)
    }

    // =========================================================================
    // Stats and cancel
    // =========================================================================

    async fn show_stats(
        &self,
        user: UserId,
        out: &mut Outbox,
    ) -> Result<DialogueState, TrainerError> {
        match self.stats.lifetime_stats(user).await? {
            Some(stats) => {
                out.text(replies::lifetime_stats(&stats), self.router.main_menu());
                tracing::info!(
                    user_id = %user,
                    correct = stats.correct,
                    incorrect = stats.incorrect,
                    "Showed statistics"
                );
            }
            None => {
                out.text(replies::NO_STATS, self.router.main_menu());
                tracing::warn!(user_id = %user, "No statistics yet");
            }
        }
        Ok(DialogueState::Idle)
    }

    fn cancel(
        &self,
        user: UserId,
        state: &DialogueState,
        callback_id: String,
        message_id: Option<i32>,
        out: &mut Outbox,
    ) -> DialogueState {
        let dialogue = match state.ensure_active() {
            Ok(name) => name,
            Err(e) => {
                out.answer_callback(callback_id, replies::NOTHING_TO_CANCEL, true);
                tracing::warn!(user_id = %user, reason = %e, "Cancel without a running dialogue");
                return DialogueState::Idle;
            }
        };

        if let Some(message_id) = message_id {
            out.clear_inline_keyboard(message_id);
        }
        out.answer_callback(callback_id, replies::CANCEL_TOAST, false);
        out.text(replies::CANCELLED, self.router.main_menu());
        tracing::info!(user_id = %user, dialogue, "Cancelled dialogue");
        DialogueState::Idle
    }

    /// Send a message to the chat surface
    async fn send(&self, msg: BotMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
