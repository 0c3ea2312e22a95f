//! Filtering and ordering of the in-memory draft collection. All criteria
//! are conjunctive; missing criteria impose no restriction. The input
//! collection is never mutated.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use time::format_description;
use time::{Date, Duration, OffsetDateTime, Time};

use crate::backend::Draft;
use crate::metrics::{count_graphemes, strip_markdown};

#[derive(Debug, Clone, Copy, Default)]
pub struct RangeFilter {
    pub from: Option<OffsetDateTime>,
    pub to: Option<OffsetDateTime>, // exclusive
}

impl RangeFilter {
    pub fn has_range(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Build a filter from `YYYY-MM-DD` day strings. `from` starts at
    /// midnight; `to` covers through the end of that day (both inclusive,
    /// stored as an exclusive next-midnight bound). Unparseable input
    /// imposes no restriction.
    pub fn from_dates(from: Option<&str>, to: Option<&str>) -> Self {
        let mut filter = Self::default();
        if let Some((start, _)) = from.and_then(parse_day_bounds) {
            filter.from = Some(start);
        }
        if let Some((_, end)) = to.and_then(parse_day_bounds) {
            filter.to = Some(end);
        }
        filter
    }

    pub fn contains(&self, at: OffsetDateTime) -> bool {
        if let Some(from) = self.from {
            if at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if at >= to {
                return false;
            }
        }
        true
    }
}

fn parse_day_bounds(input: &str) -> Option<(OffsetDateTime, OffsetDateTime)> {
    static FORMAT: Lazy<Vec<format_description::FormatItem<'static>>> = Lazy::new(|| {
        format_description::parse("[year]-[month]-[day]").expect("valid date format description")
    });
    let date = Date::parse(input, &*FORMAT).ok()?;
    let start = date.with_time(Time::MIDNIGHT).assume_utc();
    let end = date
        .checked_add(Duration::days(1))?
        .with_time(Time::MIDNIGHT)
        .assume_utc();
    Some((start, end))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CharRange {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct DraftQuery {
    /// Case-insensitive substring matched against title OR content.
    pub text: String,
    pub updated: RangeFilter,
    /// Bounds on the stripped-markdown grapheme count.
    pub chars: CharRange,
    pub sort: SortSpec,
}

/// A draft paired with its stripped-markdown character count, which both
/// the character filter and the character sort operate on.
#[derive(Debug, Clone)]
pub struct DraftEntry {
    pub draft: Draft,
    pub char_count: usize,
}

/// Grapheme count of a draft body after markdown stripping, with carriage
/// returns removed. This is the same measure the on-screen counter uses.
pub fn draft_char_count(content: &str) -> usize {
    let plain = strip_markdown(content);
    count_graphemes(&plain.replace('\r', ""))
}

/// Derive the display sequence: apply every supplied criterion, then order
/// by the requested field and direction. Returns a new allocation.
pub fn filter_drafts(drafts: &[Draft], query: &DraftQuery) -> Vec<DraftEntry> {
    let mut entries: Vec<DraftEntry> = drafts
        .iter()
        .map(|draft| DraftEntry {
            draft: draft.clone(),
            char_count: draft_char_count(&draft.content),
        })
        .collect();

    let needle = query.text.trim().to_lowercase();
    if !needle.is_empty() {
        entries.retain(|entry| {
            entry.draft.title.to_lowercase().contains(&needle)
                || entry.draft.content.to_lowercase().contains(&needle)
        });
    }
    if query.updated.has_range() {
        entries.retain(|entry| query.updated.contains(entry.draft.updated_at));
    }
    if let Some(min) = query.chars.min {
        entries.retain(|entry| entry.char_count >= min);
    }
    if let Some(max) = query.chars.max {
        entries.retain(|entry| entry.char_count <= max);
    }

    let field = query.sort.field;
    entries.sort_by(|a, b| {
        let ordering = compare_entries(field, a, b);
        match query.sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    entries
}

fn compare_entries(field: SortField, a: &DraftEntry, b: &DraftEntry) -> Ordering {
    match field {
        SortField::Updated => a.draft.updated_at.cmp(&b.draft.updated_at),
        SortField::Title => natural_caseless_cmp(&a.draft.title, &b.draft.title),
        SortField::Chars => a.char_count.cmp(&b.char_count),
    }
}

/// Collator-style title comparison: case-insensitive, with runs of ASCII
/// digits compared by numeric value ("draft 2" sorts before "draft 10").
pub fn natural_caseless_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let xv = take_number(&mut left);
                    let yv = take_number(&mut right);
                    match xv.cmp(&yv) {
                        Ordering::Equal => {}
                        other => return other,
                    }
                } else {
                    match x.to_lowercase().cmp(y.to_lowercase()) {
                        Ordering::Equal => {
                            left.next();
                            right.next();
                        }
                        other => return other,
                    }
                }
            }
        }
    }
}

fn take_number(chars: &mut Peekable<Chars<'_>>) -> u128 {
    let mut value: u128 = 0;
    while let Some(ch) = chars.peek().copied() {
        if !ch.is_ascii_digit() {
            break;
        }
        value = value
            .saturating_mul(10)
            .saturating_add(u128::from(ch as u8 - b'0'));
        chars.next();
    }
    value
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortField {
    Updated,
    Title,
    Chars,
}

impl Default for SortField {
    fn default() -> Self {
        SortField::Updated
    }
}

impl SortField {
    pub fn parse(code: &str) -> Option<SortField> {
        match code {
            "updated" => Some(SortField::Updated),
            "title" => Some(SortField::Title),
            "chars" => Some(SortField::Chars),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Descending
    }
}

impl SortDirection {
    pub fn parse(code: &str) -> Option<SortDirection> {
        match code {
            "asc" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn draft(title: &str, content: &str, updated_unix: i64) -> Draft {
        Draft {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            updated_at: OffsetDateTime::from_unix_timestamp(updated_unix).expect("valid timestamp"),
        }
    }

    // Five drafts with known titles, timestamps, and stripped char counts:
    //   alpha  (5 chars, t=100)  beta2 (4 chars, t=500)
    //   Beta10 (3 chars, t=300)  gamma (2 chars, t=200)
    //   delta  (1 char,  t=400)
    fn fixture() -> Vec<Draft> {
        vec![
            draft("alpha", "aaaaa", 100),
            draft("beta2", "bbbb", 500),
            draft("Beta10", "ccc", 300),
            draft("gamma", "dd", 200),
            draft("delta", "e", 400),
        ]
    }

    fn titles(entries: &[DraftEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.draft.title.as_str()).collect()
    }

    fn query(field: SortField, direction: SortDirection) -> DraftQuery {
        DraftQuery {
            sort: SortSpec { field, direction },
            ..DraftQuery::default()
        }
    }

    #[test]
    fn empty_query_returns_full_set() {
        let drafts = fixture();
        let entries = filter_drafts(&drafts, &DraftQuery::default());
        assert_eq!(entries.len(), drafts.len());
        // Default sort: updated, newest first.
        assert_eq!(titles(&entries), vec!["beta2", "delta", "Beta10", "gamma", "alpha"]);
    }

    #[test]
    fn every_sort_combination_yields_the_expected_order() {
        let drafts = fixture();
        let cases: [(SortField, SortDirection, [&str; 5]); 6] = [
            (
                SortField::Updated,
                SortDirection::Ascending,
                ["alpha", "gamma", "Beta10", "delta", "beta2"],
            ),
            (
                SortField::Updated,
                SortDirection::Descending,
                ["beta2", "delta", "Beta10", "gamma", "alpha"],
            ),
            (
                SortField::Title,
                SortDirection::Ascending,
                ["alpha", "beta2", "Beta10", "delta", "gamma"],
            ),
            (
                SortField::Title,
                SortDirection::Descending,
                ["gamma", "delta", "Beta10", "beta2", "alpha"],
            ),
            (
                SortField::Chars,
                SortDirection::Ascending,
                ["delta", "gamma", "Beta10", "beta2", "alpha"],
            ),
            (
                SortField::Chars,
                SortDirection::Descending,
                ["alpha", "beta2", "Beta10", "gamma", "delta"],
            ),
        ];
        for (field, direction, expected) in cases {
            let entries = filter_drafts(&drafts, &query(field, direction));
            assert_eq!(titles(&entries), expected, "{field:?} {direction:?}");
        }
    }

    #[test]
    fn text_query_matches_title_or_content_case_insensitively() {
        let drafts = fixture();
        let mut q = DraftQuery::default();
        q.text = "BETA".into();
        let entries = filter_drafts(&drafts, &q);
        assert_eq!(entries.len(), 2);

        q.text = "bbbb".into();
        let entries = filter_drafts(&drafts, &q);
        assert_eq!(titles(&entries), vec!["beta2"]);
    }

    #[test]
    fn char_bounds_use_stripped_counts() {
        let drafts = vec![
            draft("markdown", "# heading **bold**", 100),
            draft("plain", "0123456789", 200),
        ];
        // The marker runs collapse to spaces, so the first body strips to
        // " heading  bold " (15 graphemes); the second stays at 10.
        let mut q = DraftQuery::default();
        q.chars.min = Some(12);
        let entries = filter_drafts(&drafts, &q);
        assert_eq!(titles(&entries), vec!["markdown"]);

        let mut q = DraftQuery::default();
        q.chars.max = Some(10);
        let entries = filter_drafts(&drafts, &q);
        assert_eq!(titles(&entries), vec!["plain"]);
    }

    #[test]
    fn date_bounds_are_inclusive_through_end_of_day() {
        let in_day = draft("in", "x", 1_700_000_000); // 2023-11-14T22:13:20Z
        let next_day = draft("next", "x", 1_700_100_000); // 2023-11-16
        let drafts = vec![in_day, next_day];

        let mut q = DraftQuery::default();
        q.updated = RangeFilter::from_dates(Some("2023-11-14"), Some("2023-11-14"));
        let entries = filter_drafts(&drafts, &q);
        assert_eq!(titles(&entries), vec!["in"]);

        // Unparseable bounds impose no restriction.
        let mut q = DraftQuery::default();
        q.updated = RangeFilter::from_dates(Some("not-a-date"), None);
        assert_eq!(filter_drafts(&drafts, &q).len(), 2);
    }

    #[test]
    fn conjunctive_criteria_must_all_pass() {
        let drafts = fixture();
        let mut q = DraftQuery::default();
        q.text = "beta".into();
        q.chars.min = Some(4);
        let entries = filter_drafts(&drafts, &q);
        assert_eq!(titles(&entries), vec!["beta2"]);
    }

    #[test]
    fn natural_compare_orders_digit_runs_numerically() {
        assert_eq!(natural_caseless_cmp("draft 2", "draft 10"), Ordering::Less);
        assert_eq!(natural_caseless_cmp("Draft", "draft"), Ordering::Equal);
        assert_eq!(natural_caseless_cmp("a", "b"), Ordering::Less);
        assert_eq!(natural_caseless_cmp("a10", "a10"), Ordering::Equal);
        assert_eq!(natural_caseless_cmp("a2b", "a2a"), Ordering::Greater);
    }

    #[test]
    fn input_collection_is_untouched() {
        let drafts = fixture();
        let before = drafts.clone();
        let _ = filter_drafts(&drafts, &query(SortField::Title, SortDirection::Ascending));
        assert_eq!(drafts, before);
    }
}
