//! The hosted record API the client consumes, expressed as traits over
//! domain records. [`memory::MemoryStore`] backs tests and offline runs;
//! [`rest::RestStore`] talks to the hosted service.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod memory;
pub mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// Row cap applied when listing a user's draft collection.
pub const LIST_ROW_CAP: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// One page of a draft listing: the rows (newest first, capped at
/// [`LIST_ROW_CAP`]) plus the exact total the backend reports.
#[derive(Debug, Clone)]
pub struct DraftPage {
    pub drafts: Vec<Draft>,
    pub total: usize,
}

/// Partial update of a draft record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl DraftPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub draft_id: Uuid,
    pub token: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

/// What a token lookup returns: a read-only view of the shared draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedDraft {
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("not signed in")]
    Unauthorized,
    #[error("record not found")]
    NotFound,
    /// Failure message passed through from the backend.
    #[error("{0}")]
    Remote(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Record-oriented operations against the hosted draft store. Every method
/// suspends at the network boundary and never panics; failures surface as
/// [`BackendError`].
pub trait DraftStore {
    /// List the signed-in user's drafts, newest first, capped at
    /// [`LIST_ROW_CAP`] rows, with the exact total count.
    fn list_drafts(&self) -> Result<DraftPage, BackendError>;

    fn insert_draft(&self, title: &str, content: &str) -> Result<Draft, BackendError>;

    fn update_draft(&self, id: Uuid, patch: &DraftPatch) -> Result<(), BackendError>;

    fn delete_draft(&self, id: Uuid) -> Result<(), BackendError>;

    fn fetch_share(&self, draft_id: Uuid) -> Result<Option<ShareRecord>, BackendError>;

    /// Create or replace the share record for a draft. A draft has at most
    /// one share; re-issuing updates the existing record in place.
    fn upsert_share(
        &self,
        draft_id: Uuid,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<ShareRecord, BackendError>;

    fn update_share_expiry(
        &self,
        draft_id: Uuid,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<(), BackendError>;

    /// Delete the share record for a draft. Revoking a draft that has no
    /// share is not an error.
    fn revoke_share(&self, draft_id: Uuid) -> Result<(), BackendError>;

    /// Read-only lookup by token. Expiry is enforced by the backend; an
    /// expired or unknown token reads as absent.
    fn fetch_shared(&self, token: &str) -> Result<Option<SharedDraft>, BackendError>;
}
