//! PageKit control tool - drive theme and cache state stored in a file

mod handler;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pagestore::FileStore;
use pagetheme::AmbientSignal;
use tracing::{debug, info};

use crate::handler::{CacheAction, CommandHandler, ThemeAction};
use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Store file
    #[arg(short, long, default_value = "./data/pagekit.store")]
    data: PathBuf,

    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ambient dark preference; omit to act as if none is reported
    #[arg(long)]
    prefers_dark: Option<bool>,

    /// Store quota in bytes
    #[arg(short, long)]
    quota: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show or change the theme preference
    #[command(subcommand)]
    Theme(ThemeCommand),

    /// Read and write ttl cache entries
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Rewrite the store file without stale records
    Compact,
}

#[derive(Subcommand, Debug)]
enum ThemeCommand {
    /// Print the active theme
    Show,
    /// Choose a theme (light or dark)
    Set { theme: String },
    /// Flip between light and dark
    Toggle,
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Store a JSON value; bare words are stored as strings
    Set {
        key: String,
        value: String,
        /// Lifetime in milliseconds (defaults to the configured ttl)
        #[arg(long)]
        ttl_ms: Option<u64>,
    },
    /// Print a live entry
    Get { key: String },
    /// Delete an entry
    Rm { key: String },
    /// Remove every expired entry
    Cleanup,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    debug!("Settings: {:?}", settings);

    let store = Arc::new(
        FileStore::open_with_quota(&args.data, args.quota)
            .with_context(|| format!("Failed to open store {:?}", args.data))?,
    );
    info!("Opened store {:?} ({} keys)", store.path(), store.len());

    let ambient = match args.prefers_dark {
        Some(dark) => AmbientSignal::new(dark),
        None => AmbientSignal::unavailable(),
    };

    let mut handler = CommandHandler::new(Arc::clone(&store), &settings, ambient);

    let output = match args.command {
        Command::Theme(cmd) => handler.handle_theme(match cmd {
            ThemeCommand::Show => ThemeAction::Show,
            ThemeCommand::Set { theme } => ThemeAction::Set(theme),
            ThemeCommand::Toggle => ThemeAction::Toggle,
        }),
        Command::Cache(cmd) => handler.handle_cache(match cmd {
            CacheCommand::Set { key, value, ttl_ms } => CacheAction::Set { key, value, ttl_ms },
            CacheCommand::Get { key } => CacheAction::Get(key),
            CacheCommand::Rm { key } => CacheAction::Remove(key),
            CacheCommand::Cleanup => CacheAction::Cleanup,
        }),
        Command::Compact => handler.handle_compact()?,
    };
    println!("{}", output);
    debug!("Active theme: {}", handler.theme());

    store.close().context("Failed to close store")?;
    Ok(())
}
