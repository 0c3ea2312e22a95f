use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use unicode_width::UnicodeWidthStr;
use uuid::Uuid;

use crate::auth::AuthApi;
use crate::backend::{DraftStore, RestStore};
use crate::config::{AppConfig, ConfigPaths};
use crate::export;
use crate::metrics::{strip_markdown, TextStats};
use crate::search::{filter_drafts, CharRange, DraftQuery, RangeFilter, SortDirection, SortField};
use crate::share::{human_time_left, parse_datetime_local, resolve_expiry, share_url, ExpiryMode};

#[derive(Args, Debug, Clone, Default)]
pub struct StatsArgs {
    /// Markdown file to measure; reads stdin when omitted
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Markdown file to export
    pub file: PathBuf,
    /// Output format: md, txt, or html
    #[arg(long, default_value = "md")]
    pub format: String,
    /// Title used for the sanitized filename (defaults to the file stem)
    #[arg(long)]
    pub title: Option<String>,
    /// Output directory (defaults to the configured export directory)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// Account email address
    pub email: String,
    /// Account password; piped on stdin when omitted
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Substring matched against title or content, case-insensitively
    #[arg(long)]
    pub query: Option<String>,
    /// Only drafts updated on or after this day (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,
    /// Only drafts updated on or before this day (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,
    /// Minimum stripped-markdown character count
    #[arg(long)]
    pub min_chars: Option<usize>,
    /// Maximum stripped-markdown character count
    #[arg(long)]
    pub max_chars: Option<usize>,
    /// Sort field: updated, title, or chars
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort direction: asc or desc
    #[arg(long)]
    pub direction: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ShareArgs {
    /// Draft identifier
    pub draft_id: Uuid,
    /// Expiry: none, 24h, 7d, or a YYYY-MM-DDTHH:MM timestamp (UTC)
    #[arg(long)]
    pub expires: Option<String>,
    /// Revoke the share link instead of issuing one
    #[arg(long)]
    pub revoke: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SharedArgs {
    /// Share token from a /s/<token> link
    pub token: String,
}

pub fn run_stats(config: &AppConfig, args: StatsArgs) -> Result<()> {
    let raw = read_input(args.file.as_deref())?;
    let plain = strip_markdown(&raw);
    let stats = TextStats::measure(&plain);

    let labels = config.language.stat_labels();
    let width = labels
        .iter()
        .map(|(label, _)| UnicodeWidthStr::width(*label))
        .max()
        .unwrap_or(0);
    for ((label, unit), value) in labels.into_iter().zip(stats.rows()) {
        let pad = width - UnicodeWidthStr::width(label);
        println!("{label}{:pad$}  {value:>10} {unit}", "");
    }
    println!();
    println!("{}", config.language.stats_approx_note());
    Ok(())
}

pub fn run_export(config: &AppConfig, paths: &ConfigPaths, args: ExportArgs) -> Result<()> {
    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let title = args.title.clone().unwrap_or_else(|| {
        args.file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let file = match args.format.as_str() {
        "md" => export::markdown_export(&title, &content),
        "txt" => export::plaintext_export(&title, &content),
        "html" => export::html_export(&title, &content, config.language),
        other => bail!("unknown export format '{other}' (expected md, txt, or html)"),
    };
    let dir = args.out.unwrap_or_else(|| paths.export_dir.clone());
    let written = file.write_to(&dir)?;
    println!("{}", written.display());
    Ok(())
}

pub fn run_login(config: &AppConfig, args: LoginArgs) -> Result<()> {
    let store = rest_store(config, false)?;
    let password = match args.password {
        Some(password) => password,
        None => {
            if atty::is(atty::Stream::Stdin) {
                bail!("no password: pass --password or pipe it on stdin");
            }
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading password from stdin")?;
            buffer.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    let session = store.sign_in(&args.email, &password)?;
    tracing::info!(user = %session.user.email, "signed in");
    eprintln!("export DRAFTBOX_ACCESS_TOKEN=...");
    println!("{}", session.access_token);
    Ok(())
}

pub fn run_list(config: &AppConfig, args: ListArgs) -> Result<()> {
    let store = rest_store(config, true)?;
    let page = store.list_drafts()?;

    let mut query = DraftQuery {
        sort: config.default_sort,
        ..DraftQuery::default()
    };
    if let Some(text) = args.query {
        query.text = text;
    }
    query.updated = RangeFilter::from_dates(args.from.as_deref(), args.to.as_deref());
    query.chars = CharRange {
        min: args.min_chars,
        max: args.max_chars,
    };
    if let Some(code) = &args.sort {
        query.sort.field = SortField::parse(code)
            .with_context(|| format!("unknown sort field '{code}' (expected updated, title, or chars)"))?;
    }
    if let Some(code) = &args.direction {
        query.sort.direction = SortDirection::parse(code)
            .with_context(|| format!("unknown sort direction '{code}' (expected asc or desc)"))?;
    }

    let entries = filter_drafts(&page.drafts, &query);
    if entries.is_empty() {
        println!("{}", config.language.drafts_empty());
        return Ok(());
    }
    for entry in &entries {
        let updated = entry
            .draft
            .updated_at
            .format(&Rfc3339)
            .context("formatting draft timestamp")?;
        let title = if entry.draft.title.is_empty() {
            config.language.untitled()
        } else {
            &entry.draft.title
        };
        println!("{}  {updated}  {:>8}  {title}", entry.draft.id, entry.char_count);
    }
    println!("{} / {}", entries.len(), page.total);
    Ok(())
}

pub fn run_share(config: &AppConfig, args: ShareArgs) -> Result<()> {
    let store = rest_store(config, true)?;
    if args.revoke {
        store.revoke_share(args.draft_id)?;
        println!("{}", config.language.share_revoked());
        return Ok(());
    }

    let now = OffsetDateTime::now_utc();
    let expires_at = parse_expiry(args.expires.as_deref(), now)?;
    let record = store.upsert_share(args.draft_id, expires_at)?;
    if config.backend.site_url.is_empty() {
        println!("{}", record.token);
    } else {
        println!("{}", share_url(&config.backend.site_url, &record.token));
    }
    println!(
        "{}",
        human_time_left(record.expires_at, now, config.language)
    );
    Ok(())
}

pub fn run_shared(config: &AppConfig, args: SharedArgs) -> Result<()> {
    let store = rest_store(config, false)?;
    match store.fetch_shared(&args.token)? {
        Some(shared) => {
            let title = if shared.title.is_empty() {
                config.language.untitled()
            } else {
                &shared.title
            };
            let updated = shared
                .updated_at
                .format(&Rfc3339)
                .context("formatting shared-draft timestamp")?;
            println!("{title}");
            println!("{}{updated}", config.language.shared_readonly_updated());
            println!();
            println!("{}", shared.content);
        }
        None => println!("{}", config.language.shared_not_found()),
    }
    Ok(())
}

/// Translate the `--expires` argument into an absolute timestamp.
fn parse_expiry(arg: Option<&str>, now: OffsetDateTime) -> Result<Option<OffsetDateTime>> {
    match arg {
        None | Some("none") => Ok(None),
        Some("24h") => Ok(resolve_expiry(ExpiryMode::Hours24, None, now)),
        Some("7d") => Ok(resolve_expiry(ExpiryMode::Days7, None, now)),
        Some(other) => {
            let custom = parse_datetime_local(other).with_context(|| {
                format!("invalid expiry '{other}' (expected none, 24h, 7d, or YYYY-MM-DDTHH:MM)")
            })?;
            Ok(resolve_expiry(ExpiryMode::Custom, Some(custom), now))
        }
    }
}

fn rest_store(config: &AppConfig, require_token: bool) -> Result<RestStore> {
    if !config.backend.is_configured() {
        bail!(
            "backend is not configured: set backend.base_url and backend.api_key in the config \
             file, or the DRAFTBOX_BASE_URL / DRAFTBOX_API_KEY environment variables"
        );
    }
    let store = RestStore::new(&config.backend.base_url, &config.backend.api_key)?;
    match env::var("DRAFTBOX_ACCESS_TOKEN") {
        Ok(token) if !token.is_empty() => Ok(store.with_access_token(token)),
        _ if require_token => {
            bail!("not signed in: set DRAFTBOX_ACCESS_TOKEN to a valid access token")
        }
        _ => Ok(store),
    }
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            if atty::is(atty::Stream::Stdin) {
                bail!("no input: pass a file or pipe markdown on stdin");
            }
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading stdin")?;
            Ok(buffer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

    #[test]
    fn expiry_argument_translation() -> Result<()> {
        assert_eq!(parse_expiry(None, NOW)?, None);
        assert_eq!(parse_expiry(Some("none"), NOW)?, None);
        assert_eq!(
            parse_expiry(Some("24h"), NOW)?,
            Some(datetime!(2024-06-02 12:00 UTC))
        );
        assert_eq!(
            parse_expiry(Some("7d"), NOW)?,
            Some(datetime!(2024-06-08 12:00 UTC))
        );
        assert_eq!(
            parse_expiry(Some("2024-12-24T18:30"), NOW)?,
            Some(datetime!(2024-12-24 18:30 UTC))
        );
        assert!(parse_expiry(Some("whenever"), NOW).is_err());
        Ok(())
    }
}
