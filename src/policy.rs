use thiserror::Error;

/// Maximum number of drafts a single account may hold.
pub const MAX_DRAFTS_PER_USER: usize = 1_000;
/// Maximum UTF-8 byte length of a draft body (about 200 KB).
pub const MAX_CONTENT_BYTES: usize = 204_800;
/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DraftViolation {
    #[error("title exceeds {} characters", MAX_TITLE_CHARS)]
    TitleTooLong,
    #[error("content exceeds {} bytes", MAX_CONTENT_BYTES)]
    ContentTooLarge,
    #[error("draft limit of {} reached", MAX_DRAFTS_PER_USER)]
    DraftLimitReached,
}

pub fn byte_length(text: &str) -> usize {
    text.len()
}

pub fn title_chars(title: &str) -> usize {
    title.chars().count()
}

/// Check a draft against the product limits before any network call is made.
/// `count` is the caller's current draft total and only matters when the
/// operation would add a new record.
pub fn validate_draft(title: &str, content: &str, count: Option<usize>) -> Result<(), DraftViolation> {
    if title_chars(title) > MAX_TITLE_CHARS {
        return Err(DraftViolation::TitleTooLong);
    }
    if byte_length(content) > MAX_CONTENT_BYTES {
        return Err(DraftViolation::ContentTooLarge);
    }
    if let Some(count) = count {
        if count >= MAX_DRAFTS_PER_USER {
            return Err(DraftViolation::DraftLimitReached);
        }
    }
    Ok(())
}
