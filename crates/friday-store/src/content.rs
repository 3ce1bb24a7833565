use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::{debug, instrument};

use crate::db::{encode_ts, lock, SharedConn};
use crate::error::{Result, StoreError};
use crate::types::{Announcement, AnnouncementPatch, NewAnnouncement, NewLead, SeedQuestion};

/// Announcements, scheduler seed questions and lead-form submissions.
pub struct ContentStore {
    db: SharedConn,
}

const ANNOUNCEMENT_COLUMNS: &str =
    "id, title, text, image_url, link_url, link_text, expires_at, is_active, created_at";

impl ContentStore {
    pub fn new(db: SharedConn) -> Self {
        Self { db }
    }

    // ── Announcements ────────────────────────────────────────────────────

    #[instrument(skip(self, new))]
    pub fn create_announcement(&self, new: &NewAnnouncement) -> Result<Announcement> {
        if new.text.trim().is_empty() {
            return Err(StoreError::Invalid("announcement text must not be empty".into()));
        }
        let expires_at = new.expires_at.as_deref().map(normalize_expiry).transpose()?;
        let db = lock(&self.db);
        db.execute(
            "INSERT INTO announcements
             (title, text, image_url, link_url, link_text, expires_at, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
            params![
                new.title,
                new.text,
                new.image_url,
                new.link_url,
                new.link_text,
                expires_at,
                encode_ts(&Utc::now()),
            ],
        )?;
        let id = db.last_insert_rowid();
        drop(db);
        self.announcement(id)
    }

    /// Apply the `Some` fields of `patch` to announcement `id`.
    #[instrument(skip(self, patch))]
    pub fn update_announcement(&self, id: i64, patch: &AnnouncementPatch) -> Result<Announcement> {
        let mut current = self.announcement(id)?;
        if let Some(title) = &patch.title {
            current.title = Some(title.clone());
        }
        if let Some(text) = &patch.text {
            if text.trim().is_empty() {
                return Err(StoreError::Invalid("announcement text must not be empty".into()));
            }
            current.text = text.clone();
        }
        if let Some(v) = &patch.image_url {
            current.image_url = Some(v.clone());
        }
        if let Some(v) = &patch.link_url {
            current.link_url = Some(v.clone());
        }
        if let Some(v) = &patch.link_text {
            current.link_text = Some(v.clone());
        }
        if let Some(v) = &patch.expires_at {
            current.expires_at = Some(normalize_expiry(v)?);
        }
        if let Some(v) = patch.is_active {
            current.is_active = v;
        }

        let db = lock(&self.db);
        db.execute(
            "UPDATE announcements
             SET title = ?1, text = ?2, image_url = ?3, link_url = ?4,
                 link_text = ?5, expires_at = ?6, is_active = ?7
             WHERE id = ?8",
            params![
                current.title,
                current.text,
                current.image_url,
                current.link_url,
                current.link_text,
                current.expires_at,
                current.is_active,
                id,
            ],
        )?;
        Ok(current)
    }

    pub fn delete_announcement(&self, id: i64) -> Result<()> {
        let db = lock(&self.db);
        let changed = db.execute("DELETE FROM announcements WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                kind: "announcement",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Every announcement, newest first.
    pub fn list_announcements(&self) -> Result<Vec<Announcement>> {
        let db = lock(&self.db);
        let sql = format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements ORDER BY created_at DESC, id DESC"
        );
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_announcement)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Active announcements that have not expired at `now`.
    pub fn active_announcements(&self, now: DateTime<Utc>) -> Result<Vec<Announcement>> {
        let db = lock(&self.db);
        let sql = format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements
             WHERE is_active = 1 AND (expires_at IS NULL OR expires_at > ?1)
             ORDER BY created_at DESC, id DESC"
        );
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(params![encode_ts(&now)], row_to_announcement)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn announcement(&self, id: i64) -> Result<Announcement> {
        let db = lock(&self.db);
        let sql = format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE id = ?1");
        db.query_row(&sql, params![id], row_to_announcement)
            .optional()?
            .ok_or(StoreError::NotFound {
                kind: "announcement",
                id: id.to_string(),
            })
    }

    // ── Seed questions ───────────────────────────────────────────────────

    pub fn add_seed(&self, question_text: &str, user_name: &str) -> Result<SeedQuestion> {
        let db = lock(&self.db);
        db.execute(
            "INSERT INTO auto_questions (question_text, user_name, is_sent, created_at)
             VALUES (?1, ?2, 0, ?3)",
            params![question_text, user_name, encode_ts(&Utc::now())],
        )?;
        Ok(SeedQuestion {
            id: db.last_insert_rowid(),
            question_text: question_text.to_string(),
            user_name: user_name.to_string(),
            is_sent: false,
            sent_at: None,
        })
    }

    /// One unsent seed question chosen uniformly at random.
    pub fn pick_unsent_random(&self) -> Result<Option<SeedQuestion>> {
        let db = lock(&self.db);
        Ok(db
            .query_row(
                "SELECT id, question_text, user_name, is_sent, sent_at
                 FROM auto_questions WHERE is_sent = 0
                 ORDER BY RANDOM() LIMIT 1",
                [],
                |row| {
                    Ok(SeedQuestion {
                        id: row.get(0)?,
                        question_text: row.get(1)?,
                        user_name: row.get(2)?,
                        is_sent: row.get(3)?,
                        sent_at: row.get(4)?,
                    })
                },
            )
            .optional()?)
    }

    #[instrument(skip(self))]
    pub fn mark_sent(&self, id: i64, now: DateTime<Utc>) -> Result<()> {
        let db = lock(&self.db);
        let changed = db.execute(
            "UPDATE auto_questions SET is_sent = 1, sent_at = ?1 WHERE id = ?2",
            params![encode_ts(&now), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                kind: "auto question",
                id: id.to_string(),
            });
        }
        debug!("seed question marked sent");
        Ok(())
    }

    pub fn count_unsent(&self) -> Result<usize> {
        let db = lock(&self.db);
        let n: i64 = db.query_row(
            "SELECT COUNT(*) FROM auto_questions WHERE is_sent = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    // ── Leads ────────────────────────────────────────────────────────────

    /// Record a lead-form submission and return its row id.
    pub fn record_lead(&self, lead: &NewLead) -> Result<i64> {
        let db = lock(&self.db);
        db.execute(
            "INSERT INTO form_submissions
             (first_name, last_name, phone, email, city, ip_address, user_agent, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                lead.first_name,
                lead.last_name,
                lead.phone,
                lead.email,
                lead.city,
                lead.ip_address,
                lead.user_agent,
                encode_ts(&Utc::now()),
            ],
        )?;
        Ok(db.last_insert_rowid())
    }
}

fn normalize_expiry(raw: &str) -> Result<String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| encode_ts(&dt.with_timezone(&Utc)))
        .map_err(|e| StoreError::Invalid(format!("expires_at '{raw}': {e}")))
}

fn row_to_announcement(row: &rusqlite::Row<'_>) -> rusqlite::Result<Announcement> {
    Ok(Announcement {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        image_url: row.get(3)?,
        link_url: row.get(4)?,
        link_text: row.get(5)?,
        expires_at: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;
    use chrono::Duration;

    fn banner(text: &str, expires_at: Option<String>) -> NewAnnouncement {
        NewAnnouncement {
            title: Some("חדש".into()),
            text: text.into(),
            expires_at,
            ..Default::default()
        }
    }

    #[test]
    fn active_feed_hides_inactive_and_expired() {
        let store = ContentStore::new(test_conn());
        let now = Utc::now();
        let live = store.create_announcement(&banner("live", None)).unwrap();
        store
            .create_announcement(&banner("expired", Some((now - Duration::hours(1)).to_rfc3339())))
            .unwrap();
        let future = store
            .create_announcement(&banner("future", Some((now + Duration::hours(1)).to_rfc3339())))
            .unwrap();
        let hidden = store.create_announcement(&banner("hidden", None)).unwrap();
        store
            .update_announcement(
                hidden.id,
                &AnnouncementPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let mut ids: Vec<_> = store
            .active_announcements(now)
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec![live.id, future.id]);
        assert_eq!(store.list_announcements().unwrap().len(), 4);
    }

    #[test]
    fn update_patches_only_given_fields() {
        let store = ContentStore::new(test_conn());
        let a = store.create_announcement(&banner("before", None)).unwrap();
        let b = store
            .update_announcement(
                a.id,
                &AnnouncementPatch {
                    text: Some("after".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(b.text, "after");
        assert_eq!(b.title.as_deref(), Some("חדש"));
        assert!(b.is_active);

        store.delete_announcement(a.id).unwrap();
        assert!(matches!(
            store.update_announcement(a.id, &AnnouncementPatch::default()),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn bad_expiry_is_rejected() {
        let store = ContentStore::new(test_conn());
        let err = store
            .create_announcement(&banner("x", Some("tomorrow".into())))
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[test]
    fn seeds_are_consumed_once() {
        let store = ContentStore::new(test_conn());
        store.add_seed("מתי זה מתחיל?", "יוסי").unwrap();
        store.add_seed("איפה החניה?", "רות").unwrap();
        assert_eq!(store.count_unsent().unwrap(), 2);

        let first = store.pick_unsent_random().unwrap().unwrap();
        store.mark_sent(first.id, Utc::now()).unwrap();
        let second = store.pick_unsent_random().unwrap().unwrap();
        assert_ne!(first.id, second.id);
        store.mark_sent(second.id, Utc::now()).unwrap();

        assert!(store.pick_unsent_random().unwrap().is_none());
        assert_eq!(store.count_unsent().unwrap(), 0);
    }

    #[test]
    fn leads_get_sequential_ids() {
        let store = ContentStore::new(test_conn());
        let a = store
            .record_lead(&NewLead {
                first_name: Some("נועה".into()),
                phone: Some("0501234567".into()),
                ..Default::default()
            })
            .unwrap();
        let b = store.record_lead(&NewLead::default()).unwrap();
        assert!(b > a);
    }
}
