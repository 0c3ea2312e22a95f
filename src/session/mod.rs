//! Per-draft save runtime: the `idle -> saving -> {saved, error}` status
//! machine, per-field debounce timers, and monotonic sequence tagging that
//! keeps a superseded save's outcome from overwriting newer work.
//!
//! One runtime exists per edited draft; it is constructed when a draft
//! becomes current and discarded on draft switch, so timers and sequence
//! numbers never leak across drafts.

use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::backend::DraftPatch;
use crate::config::AutoSaveConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error { message: String },
}

/// A persistence attempt handed to the glue layer. The sequence number is
/// assigned at issue time; pass it back through [`SaveRuntime::resolve`]
/// once the remote write settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub seq: u64,
    pub draft_id: Uuid,
    pub patch: DraftPatch,
}

/// Whether a resolved outcome was applied to the displayed status or
/// discarded because a newer attempt had been issued meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

#[derive(Debug)]
struct PendingField {
    value: String,
    quiet_since: Instant,
}

impl PendingField {
    fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            quiet_since: Instant::now(),
        }
    }

    fn ready(&self, debounce: Duration) -> bool {
        self.quiet_since.elapsed() >= debounce
    }
}

#[derive(Debug)]
enum StatusCell {
    Idle,
    Saving,
    Settled { outcome: SettledOutcome, at: Instant },
}

#[derive(Debug)]
enum SettledOutcome {
    Saved,
    Error(String),
}

#[derive(Debug)]
pub struct SaveRuntime {
    draft_id: Uuid,
    enabled: bool,
    debounce: Duration,
    status_display: Duration,
    next_seq: u64,
    latest_issued: Option<u64>,
    pending_title: Option<PendingField>,
    pending_content: Option<PendingField>,
    status: StatusCell,
}

impl SaveRuntime {
    pub fn new(draft_id: Uuid, config: &AutoSaveConfig) -> Self {
        Self {
            draft_id,
            enabled: config.enabled,
            debounce: config.debounce_duration(),
            status_display: config.status_display(),
            next_seq: 0,
            latest_issued: None,
            pending_title: None,
            pending_content: None,
            status: StatusCell::Idle,
        }
    }

    pub fn draft_id(&self) -> Uuid {
        self.draft_id
    }

    /// Record an edited title. Each call resets the field's quiet-period
    /// timer, superseding any not-yet-fired debounced save of that field.
    pub fn queue_title(&mut self, value: &str) {
        self.pending_title = Some(PendingField::new(value));
    }

    pub fn queue_content(&mut self, value: &str) {
        self.pending_content = Some(PendingField::new(value));
    }

    pub fn has_pending(&self) -> bool {
        self.pending_title.is_some() || self.pending_content.is_some()
    }

    /// Emit a save request once an edited field has gone quiet for the
    /// debounce window. Fields that became ready together travel in one
    /// patch.
    pub fn poll(&mut self) -> Option<SaveRequest> {
        if !self.enabled {
            return None;
        }
        let mut patch = DraftPatch::default();
        if let Some(pending) = &self.pending_title {
            if pending.ready(self.debounce) {
                patch.title = Some(pending.value.clone());
            }
        }
        if let Some(pending) = &self.pending_content {
            if pending.ready(self.debounce) {
                patch.content = Some(pending.value.clone());
            }
        }
        if patch.is_empty() {
            return None;
        }
        if patch.title.is_some() {
            self.pending_title = None;
        }
        if patch.content.is_some() {
            self.pending_content = None;
        }
        Some(self.issue(patch))
    }

    /// Manual save: bypass the debounce timers and write the whole record.
    pub fn flush_now(&mut self, title: &str, content: &str) -> SaveRequest {
        self.pending_title = None;
        self.pending_content = None;
        self.issue(DraftPatch {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
        })
    }

    fn issue(&mut self, patch: DraftPatch) -> SaveRequest {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.latest_issued = Some(seq);
        self.status = StatusCell::Saving;
        tracing::debug!(draft = %self.draft_id, seq, "issuing save");
        SaveRequest {
            seq,
            draft_id: self.draft_id,
            patch,
        }
    }

    /// Report the outcome of a previously issued request. Outcomes of
    /// superseded requests are discarded: only the most recently issued
    /// save may touch the displayed status.
    pub fn resolve(&mut self, seq: u64, outcome: Result<(), String>) -> Resolution {
        if self.latest_issued != Some(seq) {
            tracing::debug!(draft = %self.draft_id, seq, "discarding stale save outcome");
            return Resolution::Stale;
        }
        self.status = match outcome {
            Ok(()) => StatusCell::Settled {
                outcome: SettledOutcome::Saved,
                at: Instant::now(),
            },
            Err(message) => {
                tracing::warn!(draft = %self.draft_id, seq, %message, "save failed");
                StatusCell::Settled {
                    outcome: SettledOutcome::Error(message),
                    at: Instant::now(),
                }
            }
        };
        Resolution::Applied
    }

    /// Surface a locally detected failure (a validation error) without
    /// issuing a request.
    pub fn mark_error(&mut self, message: String) {
        self.status = StatusCell::Settled {
            outcome: SettledOutcome::Error(message),
            at: Instant::now(),
        };
    }

    /// Record a successful write performed outside the poll cycle (the
    /// create that adopts a brand-new draft).
    pub fn mark_saved(&mut self) {
        self.status = StatusCell::Settled {
            outcome: SettledOutcome::Saved,
            at: Instant::now(),
        };
    }

    /// Current display status. Saved/error read back as idle once the
    /// display window has elapsed.
    pub fn status(&self) -> SaveStatus {
        match &self.status {
            StatusCell::Idle => SaveStatus::Idle,
            StatusCell::Saving => SaveStatus::Saving,
            StatusCell::Settled { outcome, at } => {
                if at.elapsed() >= self.status_display {
                    SaveStatus::Idle
                } else {
                    match outcome {
                        SettledOutcome::Saved => SaveStatus::Saved,
                        SettledOutcome::Error(message) => SaveStatus::Error {
                            message: message.clone(),
                        },
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn config(debounce_ms: u64, status_display_ms: u64) -> AutoSaveConfig {
        AutoSaveConfig {
            debounce_ms,
            status_display_ms,
            ..AutoSaveConfig::default()
        }
    }

    fn runtime(debounce_ms: u64, status_display_ms: u64) -> SaveRuntime {
        SaveRuntime::new(Uuid::new_v4(), &config(debounce_ms, status_display_ms))
    }

    #[test]
    fn poll_emits_nothing_without_edits() {
        let mut rt = runtime(0, 60_000);
        assert_eq!(rt.poll(), None);
        assert_eq!(rt.status(), SaveStatus::Idle);
    }

    #[test]
    fn quiet_field_is_emitted_and_cleared() {
        let mut rt = runtime(0, 60_000);
        rt.queue_content("hello");
        let request = rt.poll().expect("ready request");
        assert_eq!(request.patch.content.as_deref(), Some("hello"));
        assert_eq!(request.patch.title, None);
        assert!(!rt.has_pending());
        assert_eq!(rt.status(), SaveStatus::Saving);
        assert_eq!(rt.poll(), None);
    }

    #[test]
    fn fields_ready_together_travel_in_one_patch() {
        let mut rt = runtime(0, 60_000);
        rt.queue_title("title");
        rt.queue_content("body");
        let request = rt.poll().expect("ready request");
        assert_eq!(request.patch.title.as_deref(), Some("title"));
        assert_eq!(request.patch.content.as_deref(), Some("body"));
    }

    #[test]
    fn debounce_holds_requests_until_the_quiet_period_elapses() {
        let mut rt = runtime(3_600_000, 60_000);
        rt.queue_content("still typing");
        assert_eq!(rt.poll(), None);
        assert!(rt.has_pending());
        // A manual flush bypasses the timer.
        let request = rt.flush_now("t", "still typing");
        assert_eq!(request.patch.title.as_deref(), Some("t"));
        assert!(!rt.has_pending());
    }

    #[test]
    fn newest_issued_save_wins_even_if_older_resolves_later() {
        let mut rt = runtime(0, 60_000);
        rt.queue_content("a");
        let first = rt.poll().expect("first request");
        rt.queue_content("ab");
        let second = rt.poll().expect("second request");
        assert!(second.seq > first.seq);

        // The older attempt resolves after the newer one was issued: its
        // failure must not surface.
        assert_eq!(rt.resolve(first.seq, Err("boom".into())), Resolution::Stale);
        assert_eq!(rt.status(), SaveStatus::Saving);

        assert_eq!(rt.resolve(second.seq, Ok(())), Resolution::Applied);
        assert_eq!(rt.status(), SaveStatus::Saved);
    }

    #[test]
    fn stale_success_cannot_mask_a_newer_failure() {
        let mut rt = runtime(0, 60_000);
        rt.queue_content("a");
        let first = rt.poll().expect("first request");
        rt.queue_content("ab");
        let second = rt.poll().expect("second request");

        assert_eq!(
            rt.resolve(second.seq, Err("disk full".into())),
            Resolution::Applied
        );
        assert_eq!(rt.resolve(first.seq, Ok(())), Resolution::Stale);
        assert_matches!(rt.status(), SaveStatus::Error { message } if message == "disk full");
    }

    #[test]
    fn settled_status_returns_to_idle_after_display_window() {
        let mut rt = runtime(0, 0);
        rt.queue_content("x");
        let request = rt.poll().expect("request");
        rt.resolve(request.seq, Ok(()));
        assert_eq!(rt.status(), SaveStatus::Idle);
    }

    #[test]
    fn disabled_runtime_never_polls_but_still_flushes() {
        let mut rt = SaveRuntime::new(
            Uuid::new_v4(),
            &AutoSaveConfig {
                enabled: false,
                debounce_ms: 0,
                ..AutoSaveConfig::default()
            },
        );
        rt.queue_content("x");
        assert_eq!(rt.poll(), None);
        let request = rt.flush_now("t", "x");
        assert_eq!(request.patch.content.as_deref(), Some("x"));
    }

    #[test]
    fn validation_errors_surface_without_a_request() {
        let mut rt = runtime(0, 60_000);
        rt.mark_error("too large".into());
        assert_matches!(rt.status(), SaveStatus::Error { message } if message == "too large");
    }
}
