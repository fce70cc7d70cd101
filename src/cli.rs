use crate::commands;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "deno-test-migrate",
    version,
    about = "Vitest to Deno test migration toolkit"
)]
struct Cli {
    /// Increase verbosity (-v, -vv). Uses RUST_LOG under the hood
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a config file (defaults to deno-migrate.toml when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Source root to scan, overrides `src` from the config
    #[arg(long, global = true)]
    src: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report vi.fn()/vi.mock() usage in test files (read-only)
    Report {
        /// Scan already migrated (_test.ts) files instead of .test.ts
        #[arg(long)]
        migrated: bool,
        /// Print the per-file findings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add .ts extensions to relative imports in non-test files
    FixImports {
        /// Show which files would change without writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Back up the source tree, then rewrite and rename every .test.ts file
    Migrate {
        /// Show the migration plan without backup or writes
        #[arg(long)]
        dry_run: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    // logs go to stderr so stdout carries only the reports;
    // a repeated call in one process keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

pub fn run_cli() -> Result<()> {
    run_cli_with(std::env::args())
}

pub fn run_cli_with<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let cli = Cli::parse_from(args.into_iter().map(Into::<String>::into));
    init_tracing(cli.verbose);

    let mut cfg =
        AppConfig::load(cli.config.as_deref().map(Path::new)).context("failed to load config")?;
    if let Some(src) = cli.src {
        cfg.src = PathBuf::from(src);
    }
    tracing::debug!(?cfg, "config loaded");

    match cli.command {
        Commands::Report { migrated, json } => commands::report(&cfg, migrated, json)?,
        Commands::FixImports { dry_run } => commands::fix_imports(&cfg, dry_run)?,
        Commands::Migrate { dry_run } => commands::migrate(&cfg, dry_run)?,
    }

    Ok(())
}
