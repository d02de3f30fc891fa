//! Quizbot Daemon
//!
//! Runs the flashcard trainer behind a Telegram bot.
//!
//! # Usage
//!
//! ```bash
//! # Token from the environment, everything else from defaults
//! QUIZBOT_BOT_TOKEN=123:abc quizbot
//!
//! # Custom config and database
//! quizbot --config ./quizbot.toml --database ./cards.db
//!
//! # With verbose logging
//! RUST_LOG=debug quizbot
//!
//! # Also write daily-rotated log files
//! quizbot --log-dir /var/log/quizbot
//! ```
//!
//! # Environment Variables
//!
//! - `QUIZBOT_CONFIG`: Config file path
//! - `QUIZBOT_DATABASE`: SQLite database path
//! - `QUIZBOT_BUSY_TIMEOUT_MS`: SQLite busy timeout
//! - `QUIZBOT_SEED`: Seed the shared cards on startup (`true`/`false`)
//! - `QUIZBOT_BOT_TOKEN` / `TELOXIDE_TOKEN`: Telegram bot token
//! - `QUIZBOT_LOG_DIR`: Directory for `quizbot.log.<date>` files
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

mod telegram;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use teloxide::Bot;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quizbot_core::{
    load_config_from_path, CardStore, ConfigOverrides, InProcessTransport, Router, SqliteStore,
    Trainer, SHARED_CARDS,
};

#[derive(Parser, Debug)]
#[command(name = "quizbot", version, about = "Flashcard quiz bot for Telegram")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, env = "QUIZBOT_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long)]
    database: Option<PathBuf>,

    /// Telegram bot token
    #[arg(long)]
    token: Option<String>,

    /// Do not insert the shared starter cards
    #[arg(long)]
    no_seed: bool,

    /// Directory for daily-rotated log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(path) = &self.database {
            overrides = overrides.with_database_path(path.clone());
        }
        if let Some(token) = &self.token {
            overrides = overrides.with_bot_token(token.clone());
        }
        if self.no_seed {
            overrides = overrides.with_seed_shared_cards(false);
        }
        if let Some(dir) = &self.log_dir {
            overrides = overrides.with_log_dir(dir.clone());
        }
        overrides
    }
}

/// Console logging, plus a daily-rotated file when `log_dir` is set.
///
/// The returned guard flushes the file writer on drop and must outlive `main`.
fn init_logging(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::from_default_env()
        .add_directive("quizbot=info".parse()?)
        .add_directive("quizbot_core=info".parse()?);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "quizbot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config_from_path(args.config.clone()).context("Failed to load config")?;
    args.overrides().apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let _log_guard = init_logging(config.log_dir.as_deref())?;
    info!("Starting quizbot");
    info!(
        source = %config.source(),
        database = %config.database_path.display(),
        log_dir = ?config.log_dir,
        "Configuration loaded"
    );

    let token = config
        .require_token()
        .context("Cannot connect to Telegram")?
        .to_string();

    let store = Arc::new(
        SqliteStore::open(&config.database_path, config.busy_timeout).with_context(|| {
            format!(
                "Failed to open database at {}",
                config.database_path.display()
            )
        })?,
    );

    if config.seed_shared_cards {
        let inserted = store
            .seed_shared_cards(SHARED_CARDS)
            .await
            .context("Failed to seed shared cards")?;
        if inserted > 0 {
            info!(inserted, "Seeded shared cards");
        }
    }
    match store.card_count().await {
        Ok(cards) => info!(cards, "Card store ready"),
        Err(e) => warn!(error = %e, "Could not count cards"),
    }

    let (transport, event_rx, msg_tx) =
        InProcessTransport::new_pair_with_capacity(config.channel_capacity);
    let (events, msg_rx) = transport.into_parts();

    let trainer = Trainer::new(store, Router::default(), msg_tx);
    let trainer_task = tokio::spawn(async move { trainer.run(event_rx).await });

    let bot = Bot::new(token);
    let renderer_task = tokio::spawn(telegram::render(bot.clone(), msg_rx));

    telegram::run(bot, events).await;

    // The dispatcher owned the last event sender, so the trainer drains and stops
    if let Err(e) = trainer_task.await {
        error!(error = %e, "Trainer task failed");
    }
    if let Err(e) = renderer_task.await {
        error!(error = %e, "Renderer task failed");
    }

    info!("Quizbot stopped");
    Ok(())
}
