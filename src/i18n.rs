//! Japanese/English message catalog for everything the core surfaces to a
//! user: save statuses, validation and remote-failure toasts, and the labels
//! of the detailed statistics table.

use serde::{Deserialize, Serialize};

use crate::policy::{DraftViolation, MAX_CONTENT_BYTES, MAX_DRAFTS_PER_USER, MAX_TITLE_CHARS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lang {
    Ja,
    En,
}

impl Default for Lang {
    fn default() -> Self {
        Lang::Ja
    }
}

impl Lang {
    pub fn code(self) -> &'static str {
        match self {
            Lang::Ja => "ja",
            Lang::En => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Lang> {
        match code {
            "ja" => Some(Lang::Ja),
            "en" => Some(Lang::En),
            _ => None,
        }
    }

    pub fn untitled(self) -> &'static str {
        match self {
            Lang::Ja => "無題",
            Lang::En => "Untitled",
        }
    }

    pub fn status_saving(self) -> &'static str {
        match self {
            Lang::Ja => "保存中…",
            Lang::En => "Saving…",
        }
    }

    pub fn status_saved(self) -> &'static str {
        match self {
            Lang::Ja => "保存済み",
            Lang::En => "Saved",
        }
    }

    pub fn status_error(self) -> &'static str {
        match self {
            Lang::Ja => "保存失敗",
            Lang::En => "Save failed",
        }
    }

    pub fn login_required(self) -> &'static str {
        match self {
            Lang::Ja => "保存するにはサインインが必要です。",
            Lang::En => "Sign in to save drafts.",
        }
    }

    pub fn violation_message(self, violation: DraftViolation) -> String {
        match (self, violation) {
            (Lang::Ja, DraftViolation::TitleTooLong) => {
                format!("タイトルは{MAX_TITLE_CHARS}文字以内でご入力ください。")
            }
            (Lang::Ja, DraftViolation::ContentTooLarge) => {
                format!("本文が上限（{MAX_CONTENT_BYTES}B）を超えました。")
            }
            (Lang::Ja, DraftViolation::DraftLimitReached) => {
                format!("下書き数が上限（{MAX_DRAFTS_PER_USER}件）に達しています。")
            }
            (Lang::En, DraftViolation::TitleTooLong) => {
                format!("Titles are limited to {MAX_TITLE_CHARS} characters.")
            }
            (Lang::En, DraftViolation::ContentTooLarge) => {
                format!("Content exceeds the {MAX_CONTENT_BYTES}-byte limit.")
            }
            (Lang::En, DraftViolation::DraftLimitReached) => {
                format!("You've reached the limit of {MAX_DRAFTS_PER_USER} drafts.")
            }
        }
    }

    pub fn draft_created(self) -> &'static str {
        match self {
            Lang::Ja => "新しい下書きを作成しました。",
            Lang::En => "Created a new draft.",
        }
    }

    pub fn draft_deleted(self) -> &'static str {
        match self {
            Lang::Ja => "削除しました。",
            Lang::En => "Deleted.",
        }
    }

    pub fn load_failed(self, message: &str) -> String {
        match self {
            Lang::Ja => format!("下書きの読み込みに失敗しました: {message}"),
            Lang::En => format!("Failed to load drafts: {message}"),
        }
    }

    pub fn create_failed(self, message: &str) -> String {
        match self {
            Lang::Ja => format!("下書きの作成に失敗しました: {message}"),
            Lang::En => format!("Failed to create the draft: {message}"),
        }
    }

    pub fn save_failed(self, message: &str) -> String {
        match self {
            Lang::Ja => format!("保存に失敗しました: {message}"),
            Lang::En => format!("Failed to save: {message}"),
        }
    }

    pub fn delete_failed(self, message: &str) -> String {
        match self {
            Lang::Ja => format!("削除に失敗しました: {message}"),
            Lang::En => format!("Failed to delete: {message}"),
        }
    }

    pub fn no_draft_to_share(self) -> &'static str {
        match self {
            Lang::Ja => "共有対象の下書きがありません。",
            Lang::En => "There is no draft to share.",
        }
    }

    pub fn share_issued(self) -> &'static str {
        match self {
            Lang::Ja => "共有リンクを発行しました。",
            Lang::En => "Share link created.",
        }
    }

    pub fn share_issue_failed(self, message: &str) -> String {
        match self {
            Lang::Ja => format!("共有リンクの作成に失敗しました: {message}"),
            Lang::En => format!("Failed to create the share link: {message}"),
        }
    }

    pub fn share_revoked(self) -> &'static str {
        match self {
            Lang::Ja => "共有リンクを無効化しました。",
            Lang::En => "Share link disabled.",
        }
    }

    pub fn share_revoke_failed(self, message: &str) -> String {
        match self {
            Lang::Ja => format!("共有リンクの無効化に失敗しました: {message}"),
            Lang::En => format!("Failed to disable the share link: {message}"),
        }
    }

    pub fn expiry_updated(self) -> &'static str {
        match self {
            Lang::Ja => "有効期限を更新しました。",
            Lang::En => "Expiry updated.",
        }
    }

    pub fn expiry_cleared(self) -> &'static str {
        match self {
            Lang::Ja => "有効期限を解除しました。",
            Lang::En => "Expiry removed.",
        }
    }

    pub fn expiry_update_failed(self, message: &str) -> String {
        match self {
            Lang::Ja => format!("有効期限の更新に失敗しました: {message}"),
            Lang::En => format!("Failed to update the expiry: {message}"),
        }
    }

    pub fn share_no_expiry(self) -> &'static str {
        match self {
            Lang::Ja => "期限なし",
            Lang::En => "No expiry",
        }
    }

    pub fn share_expired(self) -> &'static str {
        match self {
            Lang::Ja => "期限切れ",
            Lang::En => "Expired",
        }
    }

    pub fn drafts_empty(self) -> &'static str {
        match self {
            Lang::Ja => "まだ下書きがありません。",
            Lang::En => "No drafts yet.",
        }
    }

    pub fn shared_not_found(self) -> &'static str {
        match self {
            Lang::Ja => "共有リンクが見つからないか、期限切れです。",
            Lang::En => "Share link not found or expired.",
        }
    }

    pub fn shared_readonly_updated(self) -> &'static str {
        match self {
            Lang::Ja => "読み取り専用・最終更新：",
            Lang::En => "Read-only · Last updated: ",
        }
    }

    pub fn stats_approx_note(self) -> &'static str {
        match self {
            Lang::Ja => "※ Shift-JIS / EUC-JP / JIS のバイト数は簡易推定です。",
            Lang::En => "* Shift-JIS / EUC-JP / JIS byte counts are rough estimates.",
        }
    }

    /// Labels and units of the detailed statistics table, in display order.
    /// The value order matches [`crate::metrics::TextStats::rows`].
    pub fn stat_labels(self) -> [(&'static str, &'static str); 10] {
        match self {
            Lang::Ja => [
                ("文字数", "文字"),
                ("改行を除いた文字数", "文字"),
                ("改行・空白を除いた文字数", "文字"),
                ("バイト数 (UTF-8)", "バイト"),
                ("バイト数 (UTF-16)", "バイト"),
                ("バイト数 (Shift-JIS)", "バイト"),
                ("バイト数 (EUC-JP)", "バイト"),
                ("バイト数 (JIS)", "バイト"),
                ("行数", "行"),
                ("原稿用紙換算(400字)", "枚"),
            ],
            Lang::En => [
                ("Characters", "chars"),
                ("Characters (no newlines)", "chars"),
                ("Characters (no NL & spaces)", "chars"),
                ("Bytes (UTF-8)", "bytes"),
                ("Bytes (UTF-16)", "bytes"),
                ("Bytes (Shift-JIS)", "bytes"),
                ("Bytes (EUC-JP)", "bytes"),
                ("Bytes (JIS)", "bytes"),
                ("Lines", "lines"),
                ("Genkō-yōshi (400/pg)", "pages"),
            ],
        }
    }
}
