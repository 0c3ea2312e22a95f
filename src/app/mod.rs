//! The editing session: which draft is current, optimistic local mutation,
//! debounced persistence through the per-draft [`SaveRuntime`], and the
//! share/export operations for the current draft.
//!
//! Edits always land locally first. Persistence failures surface as status
//! and a toast; they never roll the user's text back.

use std::time::{Duration, Instant};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::UserIdentity;
use crate::backend::{Draft, DraftPatch, DraftStore};
use crate::config::AutoSaveConfig;
use crate::export::{self, ExportFile};
use crate::i18n::Lang;
use crate::metrics::{count_graphemes, strip_markdown, TextStats};
use crate::policy::{self, DraftViolation};
use crate::session::{Resolution, SaveRuntime, SaveStatus};
use crate::share::{resolve_expiry, share_url, ExpiryMode, ShareState};

/// True when the platform-appropriate save combination (Ctrl+S or ⌘S) was
/// pressed; the embedding should suppress the default action and call
/// [`EditorSession::save_now`].
pub fn save_shortcut_pressed(ctrl: bool, meta: bool, key: char) -> bool {
    (ctrl || meta) && key.eq_ignore_ascii_case(&'s')
}

#[derive(Debug)]
struct Toast {
    message: String,
    shown_at: Instant,
}

#[derive(Debug)]
struct TransientStatus {
    status: SaveStatus,
    at: Instant,
}

pub struct EditorSession {
    lang: Lang,
    autosave: AutoSaveConfig,
    toast_display: Duration,
    user: Option<UserIdentity>,
    drafts: Vec<Draft>,
    drafts_count: usize,
    current_id: Option<Uuid>,
    title: String,
    content: String,
    save: Option<SaveRuntime>,
    /// Status shown while no draft (and so no save runtime) exists yet.
    fallback_status: Option<TransientStatus>,
    share: Option<ShareState>,
    expiry_mode: ExpiryMode,
    expiry_custom: Option<OffsetDateTime>,
    toast: Option<Toast>,
}

impl EditorSession {
    pub fn new(lang: Lang, autosave: AutoSaveConfig) -> Self {
        let toast_display = autosave.toast_display();
        Self {
            lang,
            autosave,
            toast_display,
            user: None,
            drafts: Vec::new(),
            drafts_count: 0,
            current_id: None,
            title: lang.untitled().to_string(),
            content: String::new(),
            save: None,
            fallback_status: None,
            share: None,
            expiry_mode: ExpiryMode::None,
            expiry_custom: None,
            toast: None,
        }
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    /// Feed the current identity in from the embedding's auth subscription.
    /// Losing the identity clears all remote-backed local state.
    pub fn set_user(&mut self, user: Option<UserIdentity>) {
        let signed_out = user.is_none();
        self.user = user;
        if signed_out {
            self.drafts.clear();
            self.drafts_count = 0;
            self.current_id = None;
            self.title = self.lang.untitled().to_string();
            self.content.clear();
            self.save = None;
            self.fallback_status = None;
            self.share = None;
            self.expiry_mode = ExpiryMode::None;
            self.expiry_custom = None;
        }
    }

    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }

    pub fn drafts_count(&self) -> usize {
        self.drafts_count
    }

    pub fn current_id(&self) -> Option<Uuid> {
        self.current_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Markdown-stripped view of the current content; the counter and the
    /// detailed statistics both measure this.
    pub fn plain(&self) -> String {
        strip_markdown(&self.content)
    }

    pub fn char_count(&self) -> usize {
        count_graphemes(&self.plain())
    }

    pub fn stats(&self) -> TextStats {
        TextStats::measure(&self.plain())
    }

    pub fn status(&self) -> SaveStatus {
        if let Some(runtime) = &self.save {
            return runtime.status();
        }
        if let Some(transient) = &self.fallback_status {
            if transient.at.elapsed() < self.autosave.status_display() {
                return transient.status.clone();
            }
        }
        SaveStatus::Idle
    }

    pub fn toast(&self) -> Option<&str> {
        self.toast
            .as_ref()
            .filter(|toast| toast.shown_at.elapsed() < self.toast_display)
            .map(|toast| toast.message.as_str())
    }

    fn set_toast(&mut self, message: String) {
        self.toast = Some(Toast {
            message,
            shown_at: Instant::now(),
        });
    }

    /// Load the full collection, adopting the most recently updated draft
    /// as current.
    pub fn load_drafts(&mut self, store: &dyn DraftStore) {
        if self.user.is_none() {
            return;
        }
        match store.list_drafts() {
            Ok(page) => {
                self.drafts = page.drafts;
                self.drafts_count = page.total;
                match self.drafts.first().cloned() {
                    Some(first) => self.adopt_draft(store, first),
                    None => {
                        self.current_id = None;
                        self.title = self.lang.untitled().to_string();
                        self.content.clear();
                        self.save = None;
                        self.share = None;
                    }
                }
            }
            Err(err) => {
                let message = self.lang.load_failed(&err.to_string());
                self.set_toast(message);
            }
        }
    }

    pub fn select_draft(&mut self, store: &dyn DraftStore, id: Uuid) {
        if let Some(draft) = self.drafts.iter().find(|draft| draft.id == id).cloned() {
            self.adopt_draft(store, draft);
        }
    }

    /// Make a draft current: rebuild the save runtime (discarding the old
    /// draft's timers and sequence numbers) and pick up its share record.
    fn adopt_draft(&mut self, store: &dyn DraftStore, draft: Draft) {
        self.current_id = Some(draft.id);
        self.title = self.display_title(&draft.title);
        self.content = draft.content;
        self.save = Some(SaveRuntime::new(draft.id, &self.autosave));
        self.fallback_status = None;
        self.refresh_share(store);
    }

    fn display_title(&self, title: &str) -> String {
        if title.is_empty() {
            self.lang.untitled().to_string()
        } else {
            title.to_string()
        }
    }

    fn refresh_share(&mut self, store: &dyn DraftStore) {
        let Some(id) = self.current_id else {
            self.share = None;
            return;
        };
        match store.fetch_share(id) {
            Ok(Some(record)) => {
                match record.expires_at {
                    Some(expires_at) => {
                        self.expiry_mode = ExpiryMode::Custom;
                        self.expiry_custom = Some(expires_at);
                    }
                    None => {
                        self.expiry_mode = ExpiryMode::None;
                        self.expiry_custom = None;
                    }
                }
                self.share = Some(ShareState {
                    token: record.token,
                    expires_at: record.expires_at,
                });
            }
            Ok(None) => {
                self.share = None;
                self.expiry_mode = ExpiryMode::None;
                self.expiry_custom = None;
            }
            Err(err) => {
                tracing::warn!(draft = %id, %err, "failed to fetch share record");
                self.share = None;
            }
        }
    }

    pub fn edit_title(&mut self, store: &dyn DraftStore, value: &str) {
        if policy::title_chars(value) > policy::MAX_TITLE_CHARS {
            self.title = value.chars().take(policy::MAX_TITLE_CHARS).collect();
            let message = self.lang.violation_message(DraftViolation::TitleTooLong);
            self.report_failure(message);
            return;
        }
        self.title = value.to_string();
        if self.user.is_none() {
            return;
        }
        match self.current_id {
            None => {
                self.ensure_draft(
                    store,
                    DraftPatch {
                        title: Some(value.to_string()),
                        content: None,
                    },
                );
            }
            Some(id) => {
                if let Some(draft) = self.drafts.iter_mut().find(|draft| draft.id == id) {
                    draft.title = value.to_string();
                }
                if let Some(runtime) = &mut self.save {
                    runtime.queue_title(value);
                }
            }
        }
    }

    pub fn edit_content(&mut self, store: &dyn DraftStore, value: &str) {
        if policy::byte_length(value) > policy::MAX_CONTENT_BYTES {
            let message = self.lang.violation_message(DraftViolation::ContentTooLarge);
            self.report_failure(message);
            return;
        }
        self.content = value.to_string();
        if self.user.is_none() {
            return;
        }
        match self.current_id {
            None => {
                self.ensure_draft(
                    store,
                    DraftPatch {
                        title: None,
                        content: Some(value.to_string()),
                    },
                );
            }
            Some(id) => {
                if let Some(draft) = self.drafts.iter_mut().find(|draft| draft.id == id) {
                    draft.content = value.to_string();
                }
                if let Some(runtime) = &mut self.save {
                    runtime.queue_content(value);
                }
            }
        }
    }

    /// First-write-creates: when no draft is current, population-check the
    /// limits, insert a record from the live buffers plus the triggering
    /// patch, and adopt the new identifier before anything else happens.
    fn ensure_draft(&mut self, store: &dyn DraftStore, patch: DraftPatch) -> Option<Uuid> {
        self.user.as_ref()?;
        if let Some(id) = self.current_id {
            if let Some(draft) = self.drafts.iter_mut().find(|draft| draft.id == id) {
                if let Some(title) = &patch.title {
                    draft.title = title.clone();
                }
                if let Some(content) = &patch.content {
                    draft.content = content.clone();
                }
            }
            if let Some(runtime) = &mut self.save {
                if let Some(title) = &patch.title {
                    runtime.queue_title(title);
                }
                if let Some(content) = &patch.content {
                    runtime.queue_content(content);
                }
            }
            return Some(id);
        }

        let title = patch.title.clone().unwrap_or_else(|| self.title.clone());
        let content = patch.content.clone().unwrap_or_else(|| self.content.clone());
        if let Err(violation) = policy::validate_draft(&title, &content, Some(self.drafts_count)) {
            let message = self.lang.violation_message(violation);
            self.report_failure(message);
            return None;
        }
        match store.insert_draft(&title, &content) {
            Ok(draft) => {
                tracing::info!(draft = %draft.id, "created draft on first edit");
                self.drafts.insert(0, draft.clone());
                self.drafts_count += 1;
                self.current_id = Some(draft.id);
                self.title = self.display_title(&draft.title);
                self.content = draft.content.clone();
                let mut runtime = SaveRuntime::new(draft.id, &self.autosave);
                runtime.mark_saved();
                self.save = Some(runtime);
                self.fallback_status = None;
                Some(draft.id)
            }
            Err(err) => {
                let message = self.lang.create_failed(&err.to_string());
                self.report_failure(message);
                None
            }
        }
    }

    /// Drive any debounced save whose quiet period has elapsed through the
    /// store, and resolve its outcome against the sequence check.
    pub fn tick(&mut self, store: &dyn DraftStore) {
        let mut failure = None;
        if let Some(runtime) = &mut self.save {
            if let Some(request) = runtime.poll() {
                let result = store
                    .update_draft(request.draft_id, &request.patch)
                    .map_err(|err| err.to_string());
                let failed = result.as_ref().err().cloned();
                if runtime.resolve(request.seq, result) == Resolution::Applied {
                    failure = failed;
                }
            }
        }
        if let Some(message) = failure {
            let message = self.lang.save_failed(&message);
            self.set_toast(message);
        }
    }

    /// Manual save: validate synchronously, create the draft if none
    /// exists, then write both fields immediately, bypassing the
    /// per-field debounce timers.
    pub fn save_now(&mut self, store: &dyn DraftStore) {
        if self.user.is_none() {
            let message = self.lang.login_required().to_string();
            self.set_toast(message);
            return;
        }
        if let Err(violation) = policy::validate_draft(&self.title, &self.content, None) {
            let message = self.lang.violation_message(violation);
            self.report_failure(message);
            return;
        }
        let id = match self.current_id {
            Some(id) => Some(id),
            None => self.ensure_draft(store, DraftPatch::default()),
        };
        if id.is_none() {
            return;
        }
        let mut failure = None;
        if let Some(runtime) = &mut self.save {
            let request = runtime.flush_now(&self.title, &self.content);
            let result = store
                .update_draft(request.draft_id, &request.patch)
                .map_err(|err| err.to_string());
            let failed = result.as_ref().err().cloned();
            if runtime.resolve(request.seq, result) == Resolution::Applied {
                failure = failed;
            }
        }
        if let Some(message) = failure {
            let message = self.lang.save_failed(&message);
            self.set_toast(message);
        }
    }

    pub fn new_draft(&mut self, store: &dyn DraftStore) {
        if self.user.is_none() {
            let message = self.lang.login_required().to_string();
            self.set_toast(message);
            return;
        }
        if self.drafts_count >= policy::MAX_DRAFTS_PER_USER {
            let message = self
                .lang
                .violation_message(DraftViolation::DraftLimitReached);
            self.report_failure(message);
            return;
        }
        match store.insert_draft(self.lang.untitled(), "") {
            Ok(draft) => {
                self.drafts.insert(0, draft.clone());
                self.drafts_count += 1;
                self.current_id = Some(draft.id);
                self.title = self.display_title(&draft.title);
                self.content = draft.content.clone();
                self.save = Some(SaveRuntime::new(draft.id, &self.autosave));
                self.fallback_status = None;
                self.share = None;
                self.expiry_mode = ExpiryMode::None;
                self.expiry_custom = None;
                let message = self.lang.draft_created().to_string();
                self.set_toast(message);
            }
            Err(err) => {
                let message = self.lang.create_failed(&err.to_string());
                self.set_toast(message);
            }
        }
    }

    /// Delete the current draft and adopt the next remaining one.
    pub fn delete_draft(&mut self, store: &dyn DraftStore) {
        let Some(id) = self.current_id else {
            return;
        };
        match store.delete_draft(id) {
            Ok(()) => {
                self.drafts.retain(|draft| draft.id != id);
                self.drafts_count = self.drafts_count.saturating_sub(1);
                self.share = None;
                self.expiry_mode = ExpiryMode::None;
                self.expiry_custom = None;
                self.fallback_status = None;
                match self.drafts.first().cloned() {
                    Some(next) => {
                        self.current_id = Some(next.id);
                        self.title = self.display_title(&next.title);
                        self.content = next.content;
                        self.save = Some(SaveRuntime::new(next.id, &self.autosave));
                    }
                    None => {
                        self.current_id = None;
                        self.title = self.lang.untitled().to_string();
                        self.content.clear();
                        self.save = None;
                    }
                }
                let message = self.lang.draft_deleted().to_string();
                self.set_toast(message);
            }
            Err(err) => {
                let message = self.lang.delete_failed(&err.to_string());
                self.set_toast(message);
            }
        }
    }

    pub fn share(&self) -> Option<&ShareState> {
        self.share.as_ref()
    }

    pub fn expiry_mode(&self) -> ExpiryMode {
        self.expiry_mode
    }

    pub fn set_expiry(&mut self, mode: ExpiryMode, custom: Option<OffsetDateTime>) {
        self.expiry_mode = mode;
        self.expiry_custom = custom;
    }

    pub fn share_link(&self, base: &str) -> Option<String> {
        self.share
            .as_ref()
            .map(|share| share_url(base, &share.token))
    }

    /// Issue (or re-issue) the share link for the current draft with the
    /// selected expiry. Re-issue replaces the existing record.
    pub fn issue_share(&mut self, store: &dyn DraftStore, now: OffsetDateTime) {
        let target = self.user.as_ref().and(self.current_id);
        let Some(id) = target else {
            let message = self.lang.no_draft_to_share().to_string();
            self.set_toast(message);
            return;
        };
        let expires_at = resolve_expiry(self.expiry_mode, self.expiry_custom, now);
        match store.upsert_share(id, expires_at) {
            Ok(record) => {
                self.share = Some(ShareState {
                    token: record.token,
                    expires_at: record.expires_at,
                });
                let message = self.lang.share_issued().to_string();
                self.set_toast(message);
            }
            Err(err) => {
                let message = self.lang.share_issue_failed(&err.to_string());
                self.set_toast(message);
            }
        }
    }

    /// Rewrite only the expiry timestamp of the existing share record.
    pub fn update_share_expiry(&mut self, store: &dyn DraftStore, now: OffsetDateTime) {
        let Some(id) = self.current_id else {
            return;
        };
        if self.share.is_none() {
            return;
        }
        let expires_at = resolve_expiry(self.expiry_mode, self.expiry_custom, now);
        match store.update_share_expiry(id, expires_at) {
            Ok(()) => {
                if let Some(share) = &mut self.share {
                    share.expires_at = expires_at;
                }
                let message = if expires_at.is_some() {
                    self.lang.expiry_updated().to_string()
                } else {
                    self.lang.expiry_cleared().to_string()
                };
                self.set_toast(message);
            }
            Err(err) => {
                let message = self.lang.expiry_update_failed(&err.to_string());
                self.set_toast(message);
            }
        }
    }

    /// Revoke the share link. Local share state clears unconditionally,
    /// even when the remote delete fails.
    pub fn revoke_share(&mut self, store: &dyn DraftStore) {
        let Some(id) = self.current_id else {
            return;
        };
        let result = store.revoke_share(id);
        self.share = None;
        match result {
            Ok(()) => {
                let message = self.lang.share_revoked().to_string();
                self.set_toast(message);
            }
            Err(err) => {
                let message = self.lang.share_revoke_failed(&err.to_string());
                self.set_toast(message);
            }
        }
    }

    pub fn export_markdown(&self) -> ExportFile {
        export::markdown_export(&self.title, &self.content)
    }

    pub fn export_plaintext(&self) -> ExportFile {
        export::plaintext_export(&self.title, &self.content)
    }

    pub fn export_html(&self) -> ExportFile {
        export::html_export(&self.title, &self.content, self.lang)
    }

    /// Surface a failure in the status chip (and as a toast) without
    /// touching the user's local buffers.
    fn report_failure(&mut self, message: String) {
        self.set_toast(message.clone());
        match &mut self.save {
            Some(runtime) => runtime.mark_error(message),
            None => {
                self.fallback_status = Some(TransientStatus {
                    status: SaveStatus::Error { message },
                    at: Instant::now(),
                });
            }
        }
    }
}
