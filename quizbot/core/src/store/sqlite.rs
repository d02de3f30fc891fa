//! SQLite-backed card store
//!
//! A single connection behind a mutex. Every call runs on tokio's blocking
//! pool so the trainer's event loop never waits on disk I/O.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{Card, CardId, CardStore, SeedCard, StoreError};
use crate::events::{ChatUser, UserId};
use crate::stats::LifetimeStats;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY,
    name TEXT,
    full_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_text TEXT NOT NULL,
    target_text TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users_cards (
    user_id INTEGER NOT NULL,
    card_id INTEGER NOT NULL,
    PRIMARY KEY (user_id, card_id),
    FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE,
    FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS user_stats (
    user_id INTEGER PRIMARY KEY,
    correct_answers INTEGER NOT NULL DEFAULT 0 CHECK (correct_answers >= 0),
    incorrect_answers INTEGER NOT NULL DEFAULT 0 CHECK (incorrect_answers >= 0),
    FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_users_cards_card ON users_cards(card_id);
"#;

/// Card store on a SQLite database file
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema
    ///
    /// Missing parent directories are created.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;
        conn.busy_timeout(busy_timeout)?;

        tracing::debug!(path = %path.display(), "Opened card database");
        Self::from_connection(conn)
    }

    /// Private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Total number of cards, shared and personal
    pub async fn card_count(&self) -> Result<u64, StoreError> {
        self.run(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
            Ok(to_count(count))
        })
        .await
    }

    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("database worker failed: {e}")))?
    }
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn card_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        id: CardId(row.get(0)?),
        source: row.get(1)?,
        target: row.get(2)?,
    })
}

#[async_trait]
impl CardStore for SqliteStore {
    async fn register_user(&self, user: &ChatUser) -> Result<bool, StoreError> {
        let user = user.clone();
        self.run(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO users (user_id, name, full_name) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO NOTHING",
                params![user.id.0, user.username, user.full_name],
            )?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn seed_shared_cards(&self, cards: &'static [SeedCard]) -> Result<usize, StoreError> {
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let has_shared: bool = tx.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM cards c
                     WHERE NOT EXISTS (SELECT 1 FROM users_cards uc WHERE uc.card_id = c.id)
                 )",
                [],
                |row| row.get(0),
            )?;
            if has_shared {
                return Ok(0);
            }

            {
                let mut insert =
                    tx.prepare("INSERT INTO cards (source_text, target_text) VALUES (?1, ?2)")?;
                for card in cards {
                    insert.execute(params![card.source, card.target])?;
                }
            }
            tx.commit()?;
            Ok(cards.len())
        })
        .await
    }

    async fn random_visible_cards(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<Card>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run(move |conn| {
            // One random card per answer text, so cards sharing an answer take turns.
            let mut stmt = conn.prepare(
                "SELECT id, source_text, target_text
                 FROM (
                     SELECT c.id, c.source_text, c.target_text,
                            ROW_NUMBER() OVER (
                                PARTITION BY c.target_text ORDER BY RANDOM()
                            ) AS rn
                     FROM cards c
                     LEFT JOIN users_cards uc ON uc.card_id = c.id
                     WHERE uc.user_id IS NULL OR uc.user_id = ?1
                 )
                 WHERE rn = 1
                 ORDER BY RANDOM()
                 LIMIT ?2",
            )?;
            let cards = stmt
                .query_map(params![user.0, limit], card_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(cards)
        })
        .await
    }

    async fn add_personal_card(
        &self,
        user: UserId,
        source: &str,
        target: &str,
    ) -> Result<Card, StoreError> {
        let source = source.to_string();
        let target = target.to_string();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO cards (source_text, target_text) VALUES (?1, ?2)",
                params![source, target],
            )?;
            let id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO users_cards (user_id, card_id) VALUES (?1, ?2)",
                params![user.0, id],
            )?;
            tx.commit()?;
            Ok(Card {
                id: CardId(id),
                source,
                target,
            })
        })
        .await
    }

    async fn personal_cards(&self, user: UserId) -> Result<Vec<Card>, StoreError> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.source_text, c.target_text
                 FROM cards c
                 JOIN users_cards uc ON uc.card_id = c.id
                 WHERE uc.user_id = ?1
                 ORDER BY c.id",
            )?;
            let cards = stmt
                .query_map(params![user.0], card_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(cards)
        })
        .await
    }

    async fn delete_personal_card(&self, user: UserId, card: CardId) -> Result<bool, StoreError> {
        self.run(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM cards
                 WHERE id = ?1
                   AND id IN (SELECT card_id FROM users_cards WHERE user_id = ?2)",
                params![card.0, user.0],
            )?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn record_answer(&self, user: UserId, correct: bool) -> Result<(), StoreError> {
        let (correct_inc, incorrect_inc) = if correct { (1_i64, 0_i64) } else { (0, 1) };
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO user_stats (user_id, correct_answers, incorrect_answers)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                     correct_answers = correct_answers + excluded.correct_answers,
                     incorrect_answers = incorrect_answers + excluded.incorrect_answers",
                params![user.0, correct_inc, incorrect_inc],
            )?;
            Ok(())
        })
        .await
    }

    async fn lifetime_stats(&self, user: UserId) -> Result<Option<LifetimeStats>, StoreError> {
        self.run(move |conn| {
            let row = conn
                .query_row(
                    "SELECT correct_answers, incorrect_answers FROM user_stats WHERE user_id = ?1",
                    params![user.0],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
                )
                .optional()?;
            Ok(row.map(|(correct, incorrect)| LifetimeStats {
                correct: to_count(correct),
                incorrect: to_count(incorrect),
            }))
        })
        .await
    }
}
