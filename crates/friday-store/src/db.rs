use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Result};

/// Connection handle shared by the stores.
pub type SharedConn = Arc<Mutex<Connection>>;

pub fn shared(conn: Connection) -> SharedConn {
    Arc::new(Mutex::new(conn))
}

/// A poisoned lock still guards a usable connection; SQLite rolls back
/// whatever the panicking holder left open.
pub(crate) fn lock(conn: &SharedConn) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fixed-width UTC timestamps so TEXT columns order chronologically.
pub(crate) fn encode_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Initialise every table. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_chat_messages_table(conn)?;
    create_blocked_ips_table(conn)?;
    create_forbidden_words_table(conn)?;
    create_announcements_table(conn)?;
    create_auto_questions_table(conn)?;
    create_form_submissions_table(conn)?;
    create_admin_tables(conn)?;
    Ok(())
}

fn create_chat_messages_table(conn: &Connection) -> Result<()> {
    // reply_to is a weak reference: no FOREIGN KEY, the parent may be
    // soft-deleted or written after a failed insert.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS chat_messages (
            id            TEXT PRIMARY KEY NOT NULL,
            user_name     TEXT NOT NULL,
            message_text  TEXT NOT NULL,
            is_ai         INTEGER NOT NULL DEFAULT 0,
            reply_to      TEXT,
            ip_address    TEXT,
            deleted_at    TEXT,
            created_at    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_chat_created
            ON chat_messages(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_chat_source
            ON chat_messages(ip_address, is_ai, created_at DESC);",
    )
}

fn create_blocked_ips_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS blocked_ips (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            ip_address  TEXT NOT NULL UNIQUE,
            reason      TEXT,
            blocked_at  TEXT NOT NULL
        );",
    )
}

fn create_forbidden_words_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS forbidden_words (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            word        TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );",
    )
}

fn create_announcements_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS announcements (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT,
            text        TEXT NOT NULL,
            image_url   TEXT,
            link_url    TEXT,
            link_text   TEXT,
            expires_at  TEXT,
            is_active   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL
        );",
    )
}

fn create_auto_questions_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS auto_questions (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            question_text  TEXT NOT NULL,
            user_name      TEXT NOT NULL,
            is_sent        INTEGER NOT NULL DEFAULT 0,
            sent_at        TEXT,
            created_at     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_auto_questions_unsent
            ON auto_questions(is_sent);",
    )
}

fn create_form_submissions_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS form_submissions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name  TEXT,
            last_name   TEXT,
            phone       TEXT,
            email       TEXT,
            city        TEXT,
            ip_address  TEXT,
            user_agent  TEXT,
            created_at  TEXT NOT NULL
        );",
    )
}

fn create_admin_tables(conn: &Connection) -> Result<()> {
    // auth_tokens maps a bearer credential (sha256, never stored raw) to a
    // platform user; admins is the separate membership check.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS auth_tokens (
            token_hash  TEXT PRIMARY KEY NOT NULL,
            user_id     TEXT NOT NULL,
            expires_at  TEXT,
            created_at  TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS admins (
            id          TEXT PRIMARY KEY NOT NULL,
            created_at  TEXT NOT NULL
        );",
    )
}

#[cfg(test)]
pub(crate) fn test_conn() -> SharedConn {
    let conn = Connection::open_in_memory().unwrap();
    init_db(&conn).unwrap();
    shared(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn init_db_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        init_db(&conn).unwrap();
    }

    #[test]
    fn encoded_timestamps_sort_chronologically() {
        let a = Utc.with_ymd_and_hms(2025, 11, 29, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(500);
        let c = a + chrono::Duration::seconds(10);
        assert!(encode_ts(&a) < encode_ts(&b));
        assert!(encode_ts(&b) < encode_ts(&c));
        assert_eq!(decode_ts(&encode_ts(&b)).unwrap(), b);
    }
}
