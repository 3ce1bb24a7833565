use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::{decode_ts, encode_ts, lock, SharedConn};
use crate::error::Result;

/// Bearer-token to user mapping plus the administrators table.
///
/// Tokens are stored as sha256 hex; the raw value is only ever returned
/// once, from [`AdminDirectory::issue_token`].
pub struct AdminDirectory {
    db: SharedConn,
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl AdminDirectory {
    pub fn new(db: SharedConn) -> Self {
        Self { db }
    }

    /// Mint a bearer token for `user_id`. `ttl = None` never expires.
    #[instrument(skip(self))]
    pub fn issue_token(&self, user_id: &str, ttl: Option<Duration>) -> Result<String> {
        let raw = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let now = Utc::now();
        let expires_at = ttl.map(|d| encode_ts(&(now + d)));
        let db = lock(&self.db);
        db.execute(
            "INSERT INTO auth_tokens (token_hash, user_id, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![hash_token(&raw), user_id, expires_at, encode_ts(&now)],
        )?;
        info!("auth token issued");
        Ok(raw)
    }

    /// User id behind `token`, or `None` when unknown or expired at `now`.
    pub fn resolve_token(&self, token: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        let db = lock(&self.db);
        let row: Option<(String, Option<String>)> = db
            .query_row(
                "SELECT user_id, expires_at FROM auth_tokens WHERE token_hash = ?1",
                params![hash_token(token)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((user_id, expires_at)) = row else {
            return Ok(None);
        };
        if let Some(raw) = expires_at {
            if decode_ts(&raw)? <= now {
                return Ok(None);
            }
        }
        Ok(Some(user_id))
    }

    pub fn grant_admin(&self, user_id: &str) -> Result<()> {
        let db = lock(&self.db);
        db.execute(
            "INSERT OR IGNORE INTO admins (id, created_at) VALUES (?1, ?2)",
            params![user_id, encode_ts(&Utc::now())],
        )?;
        Ok(())
    }

    pub fn revoke_admin(&self, user_id: &str) -> Result<bool> {
        let db = lock(&self.db);
        Ok(db.execute("DELETE FROM admins WHERE id = ?1", params![user_id])? > 0)
    }

    pub fn is_admin(&self, user_id: &str) -> Result<bool> {
        let db = lock(&self.db);
        let hit: Option<i64> = db
            .query_row(
                "SELECT 1 FROM admins WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hit.is_some())
    }
}
