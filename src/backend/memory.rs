//! In-process implementation of the record API. Mirrors the hosted
//! service's observable behavior: listing is newest-first and row-capped,
//! share upserts replace in place, and expired tokens read as absent.

use parking_lot::Mutex;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    BackendError, Draft, DraftPage, DraftPatch, DraftStore, ShareRecord, SharedDraft, LIST_ROW_CAP,
};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    drafts: Vec<Draft>,
    shares: Vec<ShareRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drafts(drafts: Vec<Draft>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                drafts,
                shares: Vec::new(),
            }),
        }
    }
}

impl DraftStore for MemoryStore {
    fn list_drafts(&self) -> Result<DraftPage, BackendError> {
        let inner = self.inner.lock();
        let total = inner.drafts.len();
        let mut drafts = inner.drafts.clone();
        drafts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        drafts.truncate(LIST_ROW_CAP);
        Ok(DraftPage { drafts, total })
    }

    fn insert_draft(&self, title: &str, content: &str) -> Result<Draft, BackendError> {
        let draft = Draft {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            updated_at: OffsetDateTime::now_utc(),
        };
        self.inner.lock().drafts.push(draft.clone());
        Ok(draft)
    }

    fn update_draft(&self, id: Uuid, patch: &DraftPatch) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        let draft = inner
            .drafts
            .iter_mut()
            .find(|draft| draft.id == id)
            .ok_or(BackendError::NotFound)?;
        if let Some(title) = &patch.title {
            draft.title = title.clone();
        }
        if let Some(content) = &patch.content {
            draft.content = content.clone();
        }
        draft.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    fn delete_draft(&self, id: Uuid) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        let before = inner.drafts.len();
        inner.drafts.retain(|draft| draft.id != id);
        if inner.drafts.len() == before {
            return Err(BackendError::NotFound);
        }
        inner.shares.retain(|share| share.draft_id != id);
        Ok(())
    }

    fn fetch_share(&self, draft_id: Uuid) -> Result<Option<ShareRecord>, BackendError> {
        let inner = self.inner.lock();
        Ok(inner
            .shares
            .iter()
            .find(|share| share.draft_id == draft_id)
            .cloned())
    }

    fn upsert_share(
        &self,
        draft_id: Uuid,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<ShareRecord, BackendError> {
        let mut inner = self.inner.lock();
        if !inner.drafts.iter().any(|draft| draft.id == draft_id) {
            return Err(BackendError::NotFound);
        }
        if let Some(existing) = inner
            .shares
            .iter_mut()
            .find(|share| share.draft_id == draft_id)
        {
            existing.expires_at = expires_at;
            return Ok(existing.clone());
        }
        let record = ShareRecord {
            draft_id,
            token: Uuid::new_v4().simple().to_string(),
            expires_at,
        };
        inner.shares.push(record.clone());
        Ok(record)
    }

    fn update_share_expiry(
        &self,
        draft_id: Uuid,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        let share = inner
            .shares
            .iter_mut()
            .find(|share| share.draft_id == draft_id)
            .ok_or(BackendError::NotFound)?;
        share.expires_at = expires_at;
        Ok(())
    }

    fn revoke_share(&self, draft_id: Uuid) -> Result<(), BackendError> {
        self.inner.lock().shares.retain(|share| share.draft_id != draft_id);
        Ok(())
    }

    fn fetch_shared(&self, token: &str) -> Result<Option<SharedDraft>, BackendError> {
        let inner = self.inner.lock();
        let Some(share) = inner.shares.iter().find(|share| share.token == token) else {
            return Ok(None);
        };
        if let Some(expires_at) = share.expires_at {
            if expires_at <= OffsetDateTime::now_utc() {
                return Ok(None);
            }
        }
        Ok(inner
            .drafts
            .iter()
            .find(|draft| draft.id == share.draft_id)
            .map(|draft| SharedDraft {
                title: draft.title.clone(),
                content: draft.content.clone(),
                updated_at: draft.updated_at,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use time::Duration;

    #[test]
    fn listing_is_newest_first_with_exact_total() -> Result<(), BackendError> {
        let store = MemoryStore::new();
        let old = store.insert_draft("old", "")?;
        let newer = store.insert_draft("newer", "")?;
        // Force distinct timestamps regardless of clock resolution.
        {
            let mut inner = store.inner.lock();
            inner.drafts[0].updated_at = OffsetDateTime::now_utc() - Duration::hours(1);
        }
        let page = store.list_drafts()?;
        assert_eq!(page.total, 2);
        assert_eq!(page.drafts[0].id, newer.id);
        assert_eq!(page.drafts[1].id, old.id);
        Ok(())
    }

    #[test]
    fn listing_caps_rows_but_reports_full_total() -> Result<(), BackendError> {
        let now = OffsetDateTime::now_utc();
        let drafts = (0..LIST_ROW_CAP + 3)
            .map(|n| Draft {
                id: Uuid::new_v4(),
                title: format!("draft {n}"),
                content: String::new(),
                updated_at: now,
            })
            .collect();
        let store = MemoryStore::with_drafts(drafts);
        let page = store.list_drafts()?;
        assert_eq!(page.total, LIST_ROW_CAP + 3);
        assert_eq!(page.drafts.len(), LIST_ROW_CAP);
        Ok(())
    }

    #[test]
    fn update_applies_only_patched_fields() -> Result<(), BackendError> {
        let store = MemoryStore::new();
        let draft = store.insert_draft("title", "content")?;
        store.update_draft(
            draft.id,
            &DraftPatch {
                title: None,
                content: Some("new content".into()),
            },
        )?;
        let page = store.list_drafts()?;
        assert_eq!(page.drafts[0].title, "title");
        assert_eq!(page.drafts[0].content, "new content");
        Ok(())
    }

    #[test]
    fn update_of_missing_draft_is_not_found() {
        let store = MemoryStore::new();
        let result = store.update_draft(Uuid::new_v4(), &DraftPatch::default());
        assert_matches!(result, Err(BackendError::NotFound));
    }

    #[test]
    fn upsert_replaces_rather_than_duplicates() -> Result<(), BackendError> {
        let store = MemoryStore::new();
        let draft = store.insert_draft("t", "c")?;
        let first = store.upsert_share(draft.id, None)?;
        let expiry = OffsetDateTime::now_utc() + Duration::days(1);
        let second = store.upsert_share(draft.id, Some(expiry))?;
        // Same record, same token, new expiry.
        assert_eq!(first.token, second.token);
        assert_eq!(second.expires_at, Some(expiry));
        assert_eq!(store.inner.lock().shares.len(), 1);
        Ok(())
    }

    #[test]
    fn expired_tokens_read_as_absent() -> Result<(), BackendError> {
        let store = MemoryStore::new();
        let draft = store.insert_draft("t", "c")?;
        let live = store.upsert_share(draft.id, Some(OffsetDateTime::now_utc() + Duration::hours(1)))?;
        assert!(store.fetch_shared(&live.token)?.is_some());

        store.update_share_expiry(draft.id, Some(OffsetDateTime::now_utc() - Duration::hours(1)))?;
        assert!(store.fetch_shared(&live.token)?.is_none());
        assert!(store.fetch_shared("unknown-token")?.is_none());
        Ok(())
    }

    #[test]
    fn revoke_is_idempotent_and_delete_cascades() -> Result<(), BackendError> {
        let store = MemoryStore::new();
        let draft = store.insert_draft("t", "c")?;
        let share = store.upsert_share(draft.id, None)?;
        store.revoke_share(draft.id)?;
        store.revoke_share(draft.id)?;
        assert!(store.fetch_shared(&share.token)?.is_none());

        let draft = store.insert_draft("t2", "c2")?;
        let share = store.upsert_share(draft.id, None)?;
        store.delete_draft(draft.id)?;
        assert!(store.fetch_shared(&share.token)?.is_none());
        assert_matches!(
            store.update_share_expiry(draft.id, None),
            Err(BackendError::NotFound)
        );
        Ok(())
    }
}
