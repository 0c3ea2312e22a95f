//! Share-link lifecycle: translating a symbolic expiry mode into an
//! absolute timestamp, building share URLs, and formatting the remaining
//! time for display. The record itself is owned by the backend; issue,
//! update, and revoke go through [`crate::backend::DraftStore`].

use once_cell::sync::Lazy;
use time::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::i18n::Lang;

/// Symbolic expiry choices offered when issuing a share link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryMode {
    #[default]
    None,
    Hours24,
    Days7,
    Custom,
}

/// Translate a mode plus optional custom timestamp into an absolute expiry.
/// `None` means the link never expires. A custom mode without a custom
/// timestamp also yields no expiry.
pub fn resolve_expiry(
    mode: ExpiryMode,
    custom: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> Option<OffsetDateTime> {
    match mode {
        ExpiryMode::None => None,
        ExpiryMode::Hours24 => Some(now + Duration::hours(24)),
        ExpiryMode::Days7 => Some(now + Duration::days(7)),
        ExpiryMode::Custom => custom,
    }
}

/// Parse a `YYYY-MM-DDTHH:MM` datetime-local string. The value is taken as
/// UTC; carrying a timezone database for one input field is not worth it.
pub fn parse_datetime_local(input: &str) -> Option<OffsetDateTime> {
    static FORMAT: Lazy<Vec<format_description::FormatItem<'static>>> = Lazy::new(|| {
        format_description::parse("[year]-[month]-[day]T[hour]:[minute]")
            .expect("valid datetime-local format description")
    });
    PrimitiveDateTime::parse(input, &*FORMAT)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

pub fn share_url(base: &str, token: &str) -> String {
    format!("{}/s/{}", base.trim_end_matches('/'), token)
}

/// Local view of the current draft's share record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareState {
    pub token: String,
    pub expires_at: Option<OffsetDateTime>,
}

/// Human-readable countdown to an expiry: "3d 4h 5m" / "3日4時間5分",
/// with dedicated labels for "never expires" and "already expired".
pub fn human_time_left(
    expires_at: Option<OffsetDateTime>,
    now: OffsetDateTime,
    lang: Lang,
) -> String {
    let Some(expiry) = expires_at else {
        return lang.share_no_expiry().to_string();
    };
    let left = expiry - now;
    if left <= Duration::ZERO {
        return lang.share_expired().to_string();
    }
    let days = left.whole_days();
    let hours = (left - Duration::days(days)).whole_hours();
    let minutes = (left - Duration::days(days) - Duration::hours(hours)).whole_minutes();
    match lang {
        Lang::En => {
            if days > 0 {
                format!("{days}d {hours}h {minutes}m")
            } else if hours > 0 {
                format!("{hours}h {minutes}m")
            } else {
                format!("{minutes}m")
            }
        }
        Lang::Ja => {
            if days > 0 {
                format!("{days}日{hours}時間{minutes}分")
            } else if hours > 0 {
                format!("{hours}時間{minutes}分")
            } else {
                format!("{minutes}分")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

    #[test]
    fn expiry_modes_resolve_to_absolute_timestamps() {
        assert_eq!(resolve_expiry(ExpiryMode::None, None, NOW), None);
        assert_eq!(
            resolve_expiry(ExpiryMode::Hours24, None, NOW),
            Some(datetime!(2024-06-02 12:00 UTC))
        );
        assert_eq!(
            resolve_expiry(ExpiryMode::Days7, None, NOW),
            Some(datetime!(2024-06-08 12:00 UTC))
        );
        let custom = datetime!(2024-07-01 09:30 UTC);
        assert_eq!(
            resolve_expiry(ExpiryMode::Custom, Some(custom), NOW),
            Some(custom)
        );
        assert_eq!(resolve_expiry(ExpiryMode::Custom, None, NOW), None);
    }

    #[test]
    fn datetime_local_parses_and_rejects() {
        assert_eq!(
            parse_datetime_local("2024-07-01T09:30"),
            Some(datetime!(2024-07-01 09:30 UTC))
        );
        assert_eq!(parse_datetime_local("2024-07-01"), None);
        assert_eq!(parse_datetime_local("tomorrow"), None);
    }

    #[test]
    fn share_url_joins_without_double_slashes() {
        assert_eq!(share_url("https://draft.example", "tok"), "https://draft.example/s/tok");
        assert_eq!(share_url("https://draft.example/", "tok"), "https://draft.example/s/tok");
    }

    #[test]
    fn time_left_formats_by_magnitude() {
        let at = |d: i64, h: i64, m: i64| {
            Some(NOW + Duration::days(d) + Duration::hours(h) + Duration::minutes(m))
        };
        assert_eq!(human_time_left(at(3, 4, 5), NOW, Lang::En), "3d 4h 5m");
        assert_eq!(human_time_left(at(0, 4, 5), NOW, Lang::En), "4h 5m");
        assert_eq!(human_time_left(at(0, 0, 5), NOW, Lang::En), "5m");
        assert_eq!(human_time_left(at(3, 4, 5), NOW, Lang::Ja), "3日4時間5分");
    }

    #[test]
    fn time_left_edge_states() {
        assert_eq!(human_time_left(None, NOW, Lang::En), "No expiry");
        assert_eq!(human_time_left(None, NOW, Lang::Ja), "期限なし");
        let past = Some(NOW - Duration::minutes(1));
        assert_eq!(human_time_left(past, NOW, Lang::En), "Expired");
        assert_eq!(human_time_left(past, NOW, Lang::Ja), "期限切れ");
        assert_eq!(human_time_left(Some(NOW), NOW, Lang::En), "Expired");
    }
}
