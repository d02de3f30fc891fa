//! Telegram Surface
//!
//! Bridges teloxide updates and the trainer channels:
//!
//! - incoming messages and callback queries become [`ChatEvent`]s
//! - every [`BotMessage`] from the trainer is rendered as a Bot API call
//!
//! The surface holds no dialogue state of its own.

use anyhow::{anyhow, Result};
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    MessageId, ReplyMarkup, User,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use quizbot_core::{BotMessage, ChatEvent, ChatUser, EventSender, InlineButton, Keyboard};

/// Run the long-polling dispatcher until Ctrl+C
pub async fn run(bot: Bot, events: EventSender) {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    info!("Telegram dispatcher starting");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![events])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    info!("Telegram dispatcher stopped");
}

/// Render trainer output until the trainer drops its sender
pub async fn render(bot: Bot, mut messages: mpsc::Receiver<BotMessage>) {
    while let Some(msg) = messages.recv().await {
        if let Err(e) = render_one(&bot, msg).await {
            warn!(error = %e, "Failed to deliver message to Telegram");
        }
    }
    debug!("Trainer output closed, renderer stopping");
}

async fn handle_message(msg: Message, events: EventSender) -> Result<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        debug!(chat_id = msg.chat.id.0, "Ignoring non-text message");
        return Ok(());
    };

    let event = ChatEvent::from_text(chat_id(msg.chat.id), chat_user(user)?, text);
    events.send(event).await?;
    Ok(())
}

async fn handle_callback(q: CallbackQuery, events: EventSender) -> Result<()> {
    let Some(message) = q.message.as_ref() else {
        debug!(callback_id = %q.id, "Callback without message, ignoring");
        return Ok(());
    };

    let event = ChatEvent::callback(
        chat_id(message.chat.id),
        chat_user(&q.from)?,
        q.id.clone(),
        q.data.clone().unwrap_or_default(),
        Some(message.id.0),
    );
    events.send(event).await?;
    Ok(())
}

async fn render_one(bot: &Bot, msg: BotMessage) -> Result<()> {
    match msg {
        BotMessage::Text {
            chat_id,
            text,
            keyboard,
        } => {
            let request = bot.send_message(teloxide::types::ChatId(chat_id.0), text);
            match reply_markup(keyboard) {
                Some(markup) => request.reply_markup(markup).await?,
                None => request.await?,
            };
        }
        BotMessage::CallbackAnswer {
            callback_id,
            text,
            show_alert,
        } => {
            let mut request = bot.answer_callback_query(callback_id);
            if !text.is_empty() {
                request = request.text(text).show_alert(show_alert);
            }
            request.await?;
        }
        BotMessage::ClearInlineKeyboard {
            chat_id,
            message_id,
        } => {
            bot.edit_message_reply_markup(
                teloxide::types::ChatId(chat_id.0),
                MessageId(message_id),
            )
            .await?;
        }
    }
    Ok(())
}

fn reply_markup(keyboard: Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::Unchanged => None,
        Keyboard::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
        Keyboard::Reply { rows } => {
            let rows = rows
                .into_iter()
                .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>());
            Some(ReplyMarkup::Keyboard(
                KeyboardMarkup::new(rows).resize_keyboard(true),
            ))
        }
        Keyboard::Inline { rows } => {
            let rows = rows
                .into_iter()
                .map(|row| row.into_iter().map(inline_button).collect::<Vec<_>>());
            Some(ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows)))
        }
    }
}

fn inline_button(button: InlineButton) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(button.text, button.callback_data)
}

fn chat_id(id: teloxide::types::ChatId) -> quizbot_core::ChatId {
    quizbot_core::ChatId(id.0)
}

fn chat_user(user: &User) -> Result<ChatUser> {
    let id = i64::try_from(user.id.0)
        .map_err(|_| anyhow!("Telegram user id {} out of range", user.id.0))?;
    Ok(ChatUser::new(id, user.username.clone(), user.full_name()))
}
