use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ConfigLoader;
use crate::i18n::Lang;

pub mod commands;

use self::commands::{ExportArgs, ListArgs, LoginArgs, ShareArgs, SharedArgs, StatsArgs};

#[derive(Parser, Debug)]
#[command(
    name = "draftbox",
    version,
    about = "Markdown drafting tool with live text statistics and cloud drafts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over DRAFTBOX_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Interface language (ja, en)
    #[arg(long)]
    pub lang: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute text statistics for a markdown file, or stdin (default)
    Stats(StatsArgs),
    /// Export a markdown file as .md, .txt, or .html
    Export(ExportArgs),
    /// Sign in and print an access token for DRAFTBOX_ACCESS_TOKEN
    Login(LoginArgs),
    /// List drafts from the hosted backend with filter and sort criteria
    List(ListArgs),
    /// Issue, update, or revoke the share link of a draft
    Share(ShareArgs),
    /// Fetch a shared draft by its token
    Shared(SharedArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("DRAFTBOX_CONFIG", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let mut config = loader.load_or_init()?;
    if let Some(code) = &cli.lang {
        config.language = Lang::from_code(code)
            .with_context(|| format!("unknown language '{code}' (expected ja or en)"))?;
    }

    let command = cli.command.unwrap_or(Commands::Stats(StatsArgs::default()));
    match command {
        Commands::Stats(args) => commands::run_stats(&config, args),
        Commands::Export(args) => commands::run_export(&config, &paths, args),
        Commands::Login(args) => commands::run_login(&config, args),
        Commands::List(args) => commands::run_list(&config, args),
        Commands::Share(args) => commands::run_share(&config, args),
        Commands::Shared(args) => commands::run_shared(&config, args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
