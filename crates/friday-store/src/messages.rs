use chrono::{DateTime, Duration, Utc};
use friday_core::types::SourceId;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, instrument};

use crate::db::{decode_ts, encode_ts, lock, SharedConn};
use crate::error::{Result, StoreError};
use crate::types::{ChatMessage, NewChatMessage};

/// Result of a cooldown-guarded insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Inserted,
    CoolingDown { retry_after_secs: u64 },
}

/// Seconds left before `source` may post again, or `None` once `window`
/// has elapsed since `last`.
///
/// Rounded up so a client that waits exactly this long is always accepted.
/// A `last` in the future (clock skew) is capped at the full window.
pub fn cooldown_remaining(last: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> Option<u64> {
    let elapsed = now - last;
    if elapsed >= window {
        return None;
    }
    let remaining_ms = (window - elapsed).num_milliseconds().min(window.num_milliseconds());
    let secs = (remaining_ms + 999) / 1000;
    Some(secs.max(1) as u64)
}

/// Append-only chat log. Rows are soft-deleted, never removed.
pub struct MessageStore {
    db: SharedConn,
}

const COLUMNS: &str =
    "id, user_name, message_text, is_ai, reply_to, ip_address, deleted_at, created_at";

impl MessageStore {
    pub fn new(db: SharedConn) -> Self {
        Self { db }
    }

    /// Persist a message. Fails with [`StoreError::DuplicateId`] when the id
    /// is already taken so the caller can retry under a fresh one.
    #[instrument(skip(self, msg), fields(id = %msg.id, source = %msg.source))]
    pub fn insert(&self, msg: &NewChatMessage) -> Result<()> {
        let db = lock(&self.db);
        insert_row(&db, msg)?;
        debug!("message stored");
        Ok(())
    }

    /// Rate-limit check and insert under one write lock, so two concurrent
    /// posts from the same source cannot both pass. `msg.created_at` is the
    /// reference time for the window.
    ///
    /// Sources exempt from rate limiting are inserted unconditionally.
    #[instrument(skip(self, msg), fields(id = %msg.id, source = %msg.source))]
    pub fn insert_gated(&self, msg: &NewChatMessage, cooldown: Duration) -> Result<GateOutcome> {
        let mut db = lock(&self.db);
        let tx = db.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !msg.is_ai && msg.source.is_rate_limited() {
            if let Some(last) = last_user_message_at(&tx, &msg.source)? {
                if let Some(secs) = cooldown_remaining(last, msg.created_at, cooldown) {
                    debug!(retry_after_secs = secs, "cooldown active, insert skipped");
                    return Ok(GateOutcome::CoolingDown {
                        retry_after_secs: secs,
                    });
                }
            }
        }

        insert_row(&tx, msg)?;
        tx.commit()?;
        Ok(GateOutcome::Inserted)
    }

    /// Timestamp of the latest visible, user-authored message from `source`.
    pub fn last_user_message_at(&self, source: &SourceId) -> Result<Option<DateTime<Utc>>> {
        let db = lock(&self.db);
        last_user_message_at(&db, source)
    }

    /// Look up a visible message by id.
    pub fn get(&self, id: &str) -> Result<Option<ChatMessage>> {
        let db = lock(&self.db);
        let sql = format!("SELECT {COLUMNS} FROM chat_messages WHERE id = ?1 AND deleted_at IS NULL");
        Ok(db.query_row(&sql, params![id], row_to_message).optional()?)
    }

    /// Public chat feed: up to `limit` messages older than `before`,
    /// returned oldest first.
    pub fn history(&self, limit: usize, before: Option<DateTime<Utc>>) -> Result<Vec<ChatMessage>> {
        let db = lock(&self.db);
        let mut out = match before {
            Some(before) => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM chat_messages
                     WHERE deleted_at IS NULL AND created_at < ?1
                     ORDER BY created_at DESC LIMIT ?2"
                );
                let mut stmt = db.prepare(&sql)?;
                let rows = stmt.query_map(params![encode_ts(&before), limit as i64], row_to_message)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM chat_messages
                     WHERE deleted_at IS NULL
                     ORDER BY created_at DESC LIMIT ?1"
                );
                let mut stmt = db.prepare(&sql)?;
                let rows = stmt.query_map(params![limit as i64], row_to_message)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        out.reverse();
        Ok(out)
    }

    /// Admin listing, newest first.
    pub fn list_visible(&self, limit: usize, offset: usize) -> Result<Vec<ChatMessage>> {
        let db = lock(&self.db);
        let sql = format!(
            "SELECT {COLUMNS} FROM chat_messages
             WHERE deleted_at IS NULL
             ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
        );
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], row_to_message)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Set the deletion timestamp. A second call keeps the first timestamp.
    /// Returns `false` when no row has this id.
    #[instrument(skip(self))]
    pub fn soft_delete(&self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        let db = lock(&self.db);
        let changed = db.execute(
            "UPDATE chat_messages SET deleted_at = COALESCE(deleted_at, ?1) WHERE id = ?2",
            params![encode_ts(&now), id],
        )?;
        Ok(changed > 0)
    }

    /// Number of distinct client sources that posted since `since`.
    /// Automated sentinels and rows without a source are not counted.
    pub fn distinct_active_sources(&self, since: DateTime<Utc>) -> Result<usize> {
        let db = lock(&self.db);
        let n: i64 = db.query_row(
            "SELECT COUNT(DISTINCT ip_address) FROM chat_messages
             WHERE created_at >= ?1
               AND ip_address IS NOT NULL
               AND ip_address NOT IN (?2, ?3)",
            params![encode_ts(&since), SourceId::SYSTEM, SourceId::AUTO_BOT],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

fn insert_row(db: &Connection, msg: &NewChatMessage) -> Result<()> {
    let exists: Option<i64> = db
        .query_row(
            "SELECT 1 FROM chat_messages WHERE id = ?1",
            params![msg.id.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_some() {
        return Err(StoreError::DuplicateId(msg.id.to_string()));
    }

    db.execute(
        "INSERT INTO chat_messages
         (id, user_name, message_text, is_ai, reply_to, ip_address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            msg.id.as_str(),
            msg.user_name,
            msg.message_text,
            msg.is_ai,
            msg.reply_to.as_ref().map(|r| r.as_str()),
            msg.source.as_str(),
            encode_ts(&msg.created_at),
        ],
    )?;
    Ok(())
}

fn last_user_message_at(db: &Connection, source: &SourceId) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = db
        .query_row(
            "SELECT created_at FROM chat_messages
             WHERE ip_address = ?1 AND is_ai = 0 AND deleted_at IS NULL
             ORDER BY created_at DESC LIMIT 1",
            params![source.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(raw.as_deref().map(decode_ts).transpose()?)
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
    let deleted_at: Option<String> = row.get(6)?;
    let created_at: String = row.get(7)?;
    Ok(ChatMessage {
        id: row.get(0)?,
        user_name: row.get(1)?,
        message_text: row.get(2)?,
        is_ai: row.get(3)?,
        reply_to: row.get(4)?,
        ip_address: row.get(5)?,
        deleted_at: deleted_at.as_deref().map(decode_ts).transpose()?,
        created_at: decode_ts(&created_at)?,
    })
}
