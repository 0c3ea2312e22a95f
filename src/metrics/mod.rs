//! Pure text measurement: grapheme counts, approximate markdown stripping,
//! and multi-encoding byte-length estimates.
//!
//! Everything here is total and side-effect-free; empty input yields
//! all-zero results.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Characters per genkō-yōshi manuscript page.
pub const GENKOYOSHI_PAGE_GRAPHEMES: usize = 400;

/// Snapshot of every measurement shown for a piece of text. Derived on each
/// change, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    pub graphemes: usize,
    pub graphemes_no_newline: usize,
    pub graphemes_no_newline_or_space: usize,
    pub bytes_utf8: usize,
    pub bytes_utf16: usize,
    pub bytes_sjis: usize,
    pub bytes_eucjp: usize,
    pub bytes_jis: usize,
    pub lines: usize,
    pub pages: usize,
}

impl TextStats {
    /// Measure an already markdown-stripped plaintext string.
    pub fn measure(plain: &str) -> Self {
        let no_newline = without_newlines(plain);
        let no_newline_or_space: String = no_newline
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '\t' | '\u{3000}'))
            .collect();
        let packed = count_graphemes(&no_newline_or_space);
        Self {
            graphemes: count_graphemes(plain),
            graphemes_no_newline: count_graphemes(&no_newline),
            graphemes_no_newline_or_space: packed,
            bytes_utf8: byte_length_utf8(plain),
            bytes_utf16: byte_length_utf16(plain),
            bytes_sjis: byte_length_sjis_estimate(plain),
            bytes_eucjp: byte_length_eucjp_estimate(plain),
            bytes_jis: byte_length_jis_estimate(plain),
            lines: line_count(plain),
            pages: page_equivalent(packed),
        }
    }

    /// Values in the display order of [`crate::i18n::Lang::stat_labels`].
    pub fn rows(&self) -> [usize; 10] {
        [
            self.graphemes,
            self.graphemes_no_newline,
            self.graphemes_no_newline_or_space,
            self.bytes_utf8,
            self.bytes_utf16,
            self.bytes_sjis,
            self.bytes_eucjp,
            self.bytes_jis,
            self.lines,
            self.pages,
        ]
    }
}

/// Count user-perceived characters (extended grapheme clusters), so an emoji
/// with modifiers or a combining sequence reads as one unit.
pub fn count_graphemes(text: &str) -> usize {
    text.graphemes(true).count()
}

static FENCED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("valid fenced-code pattern"));
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`[^`]*`").expect("valid inline-code pattern"));
static IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("valid image pattern"));
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").expect("valid link pattern"));
static MARKER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[*_~`>#-]+").expect("valid marker pattern"));

/// Best-effort markdown-to-plaintext conversion. Passes run in a fixed order
/// (fenced code, inline code, images, links, marker punctuation) so later
/// passes cannot re-introduce stripped syntax. This is an approximation, not
/// a markdown parse: nested or malformed markdown may strip incompletely.
pub fn strip_markdown(md: &str) -> String {
    let text = FENCED_CODE.replace_all(md, "");
    let text = INLINE_CODE.replace_all(&text, "");
    let text = IMAGE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    MARKER_RUN.replace_all(&text, " ").into_owned()
}

pub fn byte_length_utf8(text: &str) -> usize {
    text.len()
}

/// Two bytes per UTF-16 code unit (surrogate pairs count as four).
pub fn byte_length_utf16(text: &str) -> usize {
    text.encode_utf16().count() * 2
}

/// Approximate Shift-JIS length: ASCII is one byte, half-width katakana is
/// one byte, everything else two. Not byte-exact; labeled an estimate.
pub fn byte_length_sjis_estimate(text: &str) -> usize {
    text.chars()
        .map(|ch| match ch as u32 {
            0..=0x7f => 1,
            0xff61..=0xff9f => 1,
            _ => 2,
        })
        .sum()
}

/// Approximate EUC-JP length: ASCII is one byte, everything else two.
pub fn byte_length_eucjp_estimate(text: &str) -> usize {
    text.chars().map(|ch| if (ch as u32) <= 0x7f { 1 } else { 2 }).sum()
}

/// Approximate ISO-2022-JP length, ignoring escape-sequence overhead.
pub fn byte_length_jis_estimate(text: &str) -> usize {
    text.chars().map(|ch| if (ch as u32) <= 0x7f { 1 } else { 2 }).sum()
}

/// Count line-feed-delimited segments after dropping carriage returns.
/// The empty string has zero lines.
pub fn line_count(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let normalized = text.replace('\r', "");
    normalized.split('\n').count()
}

/// Genkō-yōshi page equivalent: ceiling division of the packed grapheme
/// count (no newlines, no spaces) by 400.
pub fn page_equivalent(packed_graphemes: usize) -> usize {
    packed_graphemes.div_ceil(GENKOYOSHI_PAGE_GRAPHEMES)
}

fn without_newlines(text: &str) -> String {
    text.replace("\r\n", "").replace('\n', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphemes_treat_composed_sequences_as_single_units() {
        // 'e' + combining acute accent
        assert_eq!(count_graphemes("e\u{0301}"), 1);
        // family emoji joined with ZWJs
        assert_eq!(count_graphemes("\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}"), 1);
        assert_eq!(count_graphemes("abcあ"), 4);
        assert_eq!(count_graphemes(""), 0);
    }

    #[test]
    fn strip_removes_code_and_keeps_link_text() {
        let md = "# Title\n\nSee [docs](https://example.com) and ![logo](logo.png).\n\n```\nlet x = 1;\n```\n\nuse `inline` here";
        let plain = strip_markdown(md);
        assert!(!plain.contains("```"));
        assert!(!plain.contains("let x"));
        assert!(!plain.contains("https://example.com"));
        assert!(!plain.contains("logo.png"));
        assert!(!plain.contains("inline"));
        assert!(plain.contains("docs"));
        assert!(plain.contains("logo"));
        assert!(plain.contains("Title"));
    }

    #[test]
    fn strip_is_idempotent_on_plain_text() {
        let plain = "ただのテキスト with words and 123 numbers.\nsecond line";
        let once = strip_markdown(plain);
        assert_eq!(strip_markdown(&once), once);
    }

    #[test]
    fn utf8_length_matches_reference_encoder() {
        for text in ["", "ascii", "あいう", "e\u{0301}", "🦀 crab"] {
            let stripped = strip_markdown(text);
            assert_eq!(byte_length_utf8(&stripped), stripped.as_bytes().len());
        }
    }

    #[test]
    fn utf16_counts_code_units() {
        assert_eq!(byte_length_utf16("a"), 2);
        assert_eq!(byte_length_utf16("あ"), 2);
        // astral plane: surrogate pair
        assert_eq!(byte_length_utf16("🦀"), 4);
    }

    #[test]
    fn sjis_estimate_gives_halfwidth_katakana_one_byte() {
        // U+FF76 half-width katakana KA
        assert_eq!(byte_length_sjis_estimate("\u{ff76}"), 1);
        assert_eq!(byte_length_eucjp_estimate("\u{ff76}"), 2);
        assert_eq!(byte_length_jis_estimate("\u{ff76}"), 2);
        assert_eq!(byte_length_sjis_estimate("aあ"), 3);
    }

    #[test]
    fn line_count_normalizes_endings() {
        assert_eq!(line_count(""), 0);
        assert_eq!(line_count("a\nb"), 2);
        assert_eq!(line_count("a\r\nb"), 2);
        assert_eq!(line_count("one"), 1);
        assert_eq!(line_count("a\n\nb"), 3);
    }

    #[test]
    fn page_equivalent_boundaries() {
        assert_eq!(page_equivalent(0), 0);
        assert_eq!(page_equivalent(1), 1);
        assert_eq!(page_equivalent(400), 1);
        assert_eq!(page_equivalent(401), 2);
    }

    #[test]
    fn pages_are_monotonic_in_packed_graphemes() {
        let mut last = 0;
        for n in 0..=1200 {
            let pages = page_equivalent(n);
            assert!(pages >= last);
            last = pages;
        }
    }

    #[test]
    fn measure_of_exactly_one_page() {
        let text = "字".repeat(400);
        let stats = TextStats::measure(&text);
        assert_eq!(stats.pages, 1);
        let stats = TextStats::measure(&format!("{text}字"));
        assert_eq!(stats.pages, 2);
    }

    #[test]
    fn measure_ignores_whitespace_for_pages() {
        // 400 characters with interleaved spaces and newlines still fit one page
        let mut text = String::new();
        for chunk in 0..40 {
            text.push_str(&"字".repeat(10));
            text.push(if chunk % 2 == 0 { ' ' } else { '\n' });
            text.push('\u{3000}');
        }
        let stats = TextStats::measure(&text);
        assert_eq!(stats.graphemes_no_newline_or_space, 400);
        assert_eq!(stats.pages, 1);
    }

    #[test]
    fn empty_input_yields_zero_valued_stats() {
        assert_eq!(TextStats::measure(""), TextStats::default());
    }
}
