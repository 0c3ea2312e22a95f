//! Local-only export: the current draft rendered as raw markdown, stripped
//! plaintext, or a standalone HTML document, with filenames sanitized for
//! the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pulldown_cmark::{html, Event, Options, Parser};

use crate::i18n::Lang;
use crate::metrics::strip_markdown;

/// Cap applied to sanitized filenames (before the extension).
pub const MAX_FILENAME_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub mime: &'static str,
    pub body: String,
}

impl ExportFile {
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating export directory {}", dir.display()))?;
        let path = dir.join(&self.filename);
        fs::write(&path, self.body.as_bytes())
            .with_context(|| format!("writing export {}", path.display()))?;
        Ok(path)
    }
}

/// Replace path-unsafe characters with underscores and cap the length.
/// Blank titles fall back to "untitled".
pub fn safe_filename(title: &str) -> String {
    let base = title.trim();
    let base = if base.is_empty() { "untitled" } else { base };
    base.chars()
        .map(|ch| match ch {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .take(MAX_FILENAME_CHARS)
        .collect()
}

pub fn markdown_export(title: &str, content: &str) -> ExportFile {
    ExportFile {
        filename: format!("{}.md", safe_filename(title)),
        mime: "text/markdown;charset=utf-8",
        body: content.to_string(),
    }
}

pub fn plaintext_export(title: &str, content: &str) -> ExportFile {
    ExportFile {
        filename: format!("{}.txt", safe_filename(title)),
        mime: "text/plain;charset=utf-8",
        body: strip_markdown(content),
    }
}

pub fn html_export(title: &str, content: &str, lang: Lang) -> ExportFile {
    let name = safe_filename(title);
    let body = render_sanitized_html(content);
    let document = format!(
        "<!doctype html><html lang=\"{}\"><head><meta charset=\"utf-8\"><title>{}</title></head><body>{}</body></html>",
        lang.code(),
        escape_html(&name),
        body
    );
    ExportFile {
        filename: format!("{name}.html"),
        mime: "text/html;charset=utf-8",
        body: document,
    }
}

/// Render markdown to HTML with raw HTML passed through as escaped text,
/// so script or event-handler markup in a draft becomes inert.
pub fn render_sanitized_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn filenames_strip_path_unsafe_characters() {
        assert_eq!(safe_filename("a/b\\c:d*e?f\"g<h>i|j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(safe_filename("  trimmed  "), "trimmed");
        assert_eq!(safe_filename(""), "untitled");
        assert_eq!(safe_filename("   "), "untitled");
    }

    #[test]
    fn filenames_are_capped_at_one_hundred_characters() {
        let long = "x".repeat(MAX_FILENAME_CHARS + 50);
        assert_eq!(safe_filename(&long).chars().count(), MAX_FILENAME_CHARS);
    }

    #[test]
    fn plaintext_export_strips_markdown() {
        let file = plaintext_export("notes", "# Heading\n\n[link](https://x)");
        assert_eq!(file.filename, "notes.txt");
        assert!(!file.body.contains('#'));
        assert!(!file.body.contains("https://x"));
        assert!(file.body.contains("link"));
    }

    #[test]
    fn markdown_export_is_verbatim() {
        let file = markdown_export("notes", "# As-is `code`");
        assert_eq!(file.filename, "notes.md");
        assert_eq!(file.body, "# As-is `code`");
    }

    #[test]
    fn html_export_escapes_raw_html() {
        let file = html_export("t", "hello <script>alert(1)</script> world", Lang::En);
        assert!(!file.body.contains("<script>"));
        assert!(file.body.contains("&lt;script&gt;"));
        assert!(file.body.contains("<html lang=\"en\">"));
    }

    #[test]
    fn html_export_renders_markdown_structure() {
        let file = html_export("t", "# Title\n\n**bold**", Lang::Ja);
        assert!(file.body.contains("<h1>Title</h1>"));
        assert!(file.body.contains("<strong>bold</strong>"));
        assert!(file.body.contains("lang=\"ja\""));
    }

    #[test]
    fn html_title_is_escaped() {
        let file = html_export("a&b", "text", Lang::En);
        assert!(file.body.contains("<title>a&amp;b</title>"));
        assert_eq!(file.filename, "a&b.html");
    }

    #[test]
    fn write_to_creates_the_directory() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let dir = temp.path().join("exports");
        let file = markdown_export("out", "body");
        let path = file.write_to(&dir)?;
        assert_eq!(std::fs::read_to_string(path)?, "body");
        Ok(())
    }
}
