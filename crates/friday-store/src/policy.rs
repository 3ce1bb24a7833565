use chrono::Utc;
use friday_core::types::SourceId;
use rusqlite::{params, OptionalExtension};
use tracing::{info, instrument};

use crate::db::{encode_ts, lock, SharedConn};
use crate::error::{Result, StoreError};
use crate::types::{BlockEntry, ForbiddenTerm};

/// Block list and the dynamic forbidden-term set.
pub struct PolicyStore {
    db: SharedConn,
}

impl PolicyStore {
    pub fn new(db: SharedConn) -> Self {
        Self { db }
    }

    /// Exact-match lookup. Sentinel sources are never considered blocked.
    pub fn is_blocked(&self, source: &SourceId) -> Result<bool> {
        if !source.is_blockable() {
            return Ok(false);
        }
        let db = lock(&self.db);
        let hit: Option<i64> = db
            .query_row(
                "SELECT id FROM blocked_ips WHERE ip_address = ?1",
                params![source.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    /// Add `source` to the block list. Re-blocking replaces the reason.
    #[instrument(skip(self, reason), fields(source = %source))]
    pub fn block(&self, source: &SourceId, reason: Option<&str>) -> Result<BlockEntry> {
        if !source.is_blockable() {
            return Err(StoreError::Invalid(format!(
                "'{source}' is a reserved source and cannot be blocked"
            )));
        }
        let now = encode_ts(&Utc::now());
        let db = lock(&self.db);
        db.execute(
            "INSERT INTO blocked_ips (ip_address, reason, blocked_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(ip_address) DO UPDATE SET reason = excluded.reason",
            params![source.as_str(), reason, now],
        )?;
        let entry = db.query_row(
            "SELECT id, ip_address, reason, blocked_at FROM blocked_ips WHERE ip_address = ?1",
            params![source.as_str()],
            row_to_block,
        )?;
        info!(id = entry.id, "source blocked");
        Ok(entry)
    }

    #[instrument(skip(self))]
    pub fn unblock(&self, id: i64) -> Result<()> {
        let db = lock(&self.db);
        let changed = db.execute("DELETE FROM blocked_ips WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                kind: "blocked ip",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Most recently blocked first.
    pub fn list_blocked(&self) -> Result<Vec<BlockEntry>> {
        let db = lock(&self.db);
        let mut stmt = db.prepare(
            "SELECT id, ip_address, reason, blocked_at FROM blocked_ips
             ORDER BY blocked_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], row_to_block)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn add_term(&self, word: &str) -> Result<ForbiddenTerm> {
        let word = word.trim();
        if word.is_empty() {
            return Err(StoreError::Invalid("forbidden word must not be empty".into()));
        }
        let now = encode_ts(&Utc::now());
        let db = lock(&self.db);
        db.execute(
            "INSERT INTO forbidden_words (word, created_at) VALUES (?1, ?2)",
            params![word, now],
        )?;
        Ok(ForbiddenTerm {
            id: db.last_insert_rowid(),
            word: word.to_string(),
            created_at: now,
        })
    }

    pub fn remove_term(&self, id: i64) -> Result<()> {
        let db = lock(&self.db);
        let changed = db.execute("DELETE FROM forbidden_words WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                kind: "forbidden word",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn list_terms(&self) -> Result<Vec<ForbiddenTerm>> {
        let db = lock(&self.db);
        let mut stmt =
            db.prepare("SELECT id, word, created_at FROM forbidden_words ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(ForbiddenTerm {
                id: row.get(0)?,
                word: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Just the words, for feeding the moderation filter.
    pub fn term_strings(&self) -> Result<Vec<String>> {
        Ok(self.list_terms()?.into_iter().map(|t| t.word).collect())
    }
}

fn row_to_block(row: &rusqlite::Row<'_>) -> rusqlite::Result<BlockEntry> {
    Ok(BlockEntry {
        id: row.get(0)?,
        ip_address: row.get(1)?,
        reason: row.get(2)?,
        blocked_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;

    #[test]
    fn block_and_unblock() {
        let store = PolicyStore::new(test_conn());
        let ip = SourceId::from("1.2.3.4");
        assert!(!store.is_blocked(&ip).unwrap());

        let entry = store.block(&ip, Some("spam")).unwrap();
        assert!(store.is_blocked(&ip).unwrap());
        assert!(!store.is_blocked(&SourceId::from("1.2.3.40")).unwrap());

        // Re-block keeps a single row.
        store.block(&ip, Some("again")).unwrap();
        let all = store.list_blocked().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].reason.as_deref(), Some("again"));

        store.unblock(entry.id).unwrap();
        assert!(!store.is_blocked(&ip).unwrap());
        assert!(matches!(store.unblock(entry.id), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn sentinels_cannot_be_blocked() {
        let store = PolicyStore::new(test_conn());
        for s in [SourceId::system(), SourceId::auto_bot(), SourceId::unknown()] {
            assert!(matches!(store.block(&s, None), Err(StoreError::Invalid(_))));
            assert!(!store.is_blocked(&s).unwrap());
        }
    }

    #[test]
    fn forbidden_terms_crud() {
        let store = PolicyStore::new(test_conn());
        let t = store.add_term("  מילה  ").unwrap();
        store.add_term("אחרת").unwrap();
        assert_eq!(store.term_strings().unwrap(), vec!["מילה", "אחרת"]);

        store.remove_term(t.id).unwrap();
        assert_eq!(store.term_strings().unwrap(), vec!["אחרת"]);
        assert!(store.add_term("   ").is_err());
    }
}
