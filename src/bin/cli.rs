//! playlist-sync CLI
//!
//! Reads configuration from the environment (and optionally a TOML file),
//! then syncs videos posted to a subreddit into a YouTube playlist.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use playlist_sync::{
    error::{AppError, Result},
    models::{CollectionEntry, Config},
    pipeline::{self, SyncPhase, SyncSettings, Synchronizer},
    services::{PlaylistClient, RedditFeed, YouTubeCredentials, YouTubePlaylist},
    utils::http,
};

/// playlist-sync - Subreddit to YouTube playlist synchronizer
#[derive(Parser, Debug)]
#[command(
    name = "playlist-sync",
    version,
    about = "Sync music videos posted on a subreddit into a YouTube playlist"
)]
struct Cli {
    /// Optional TOML file with non-secret settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add new videos from the feed and prune the playlist (default)
    Sync {
        /// Log planned deletions and insertions without performing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Check configuration and decode credentials without network calls
    Validate,

    /// Print the playlist's entries, oldest first
    List,

    /// Print the video id extracted from each URL
    Extract {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Build configuration from the optional file, then the environment.
fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => {
            let mut config = Config::load_or_default(path);
            log::info!("Loaded configuration from {}", path.display());
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
        None => Config::from_env(),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(cli.config.as_deref());
    let command = cli.command.unwrap_or(Command::Sync { dry_run: false });

    match command {
        Command::Sync { dry_run } => {
            config.sync.dry_run |= dry_run;
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            if let Err(e) = run_sync(&config).await {
                if let Some(phase) = e.phase().filter(SyncPhase::is_failure) {
                    log::error!("Sync stopped: {phase}");
                }
                return Err(e);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = validate(&config) {
                log::error!("Validation failed: {}", e);
                return Err(e);
            }
            log::info!("All validations passed!");
        }

        Command::List => {
            let client = http::create_client(&config.http)?;
            let playlist = YouTubePlaylist::connect(&config.youtube, client).await?;
            list(&playlist, config.sync.max_playlist_size).await?;
        }

        Command::Extract { urls } => {
            for url in urls {
                let id = pipeline::extract_video_id(&url);
                println!(
                    "{}\t{}",
                    id.as_ref().map(|id| id.as_str()).unwrap_or("-"),
                    url
                );
            }
        }
    }

    Ok(())
}

async fn run_sync(config: &Config) -> Result<()> {
    log::info!(
        "Syncing r/{} ({}, up to {} posts) into playlist {}{}",
        config.reddit.subreddit,
        config.reddit.sort,
        config.reddit.post_limit,
        config.youtube.playlist_id.as_deref().unwrap_or("<unset>"),
        if config.sync.dry_run { " [dry run]" } else { "" }
    );

    let client = http::create_client(&config.http)?;
    let feed = match RedditFeed::connect(config, client.clone()).await {
        Ok(feed) => feed,
        Err(e) => {
            log::error!("Failed to connect to Reddit: {}", e);
            return Err(AppError::sync(SyncPhase::SourceFailed, e));
        }
    };

    let synchronizer = Synchronizer::new(SyncSettings::from_config(config));
    let report = synchronizer
        .run(&feed, || YouTubePlaylist::connect(&config.youtube, client.clone()))
        .await?;

    log::debug!("Sync report: {}", serde_json::to_string(&report)?);
    log::info!("Done!");
    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    config.validate()?;
    log::info!("✓ Settings OK");

    let reddit = config.reddit_credentials()?;
    log::info!("✓ Reddit credentials present (user {})", reddit.username);

    config
        .youtube
        .playlist_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::config("PLAYLIST_ID is not set"))?;
    YouTubeCredentials::decode(&config.youtube)?;
    log::info!("✓ YouTube credentials decoded");

    Ok(())
}

async fn list(playlist: &YouTubePlaylist, max_size: usize) -> Result<()> {
    let mut entries: Vec<CollectionEntry> = playlist.entries().try_collect().await?;
    entries.sort_by_key(|entry| entry.published_at);

    for entry in &entries {
        let published = entry
            .published_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{}\t{}\t{}", published, entry.video_id, entry.title);
    }

    log::info!(
        "Playlist {} holds {} of {} entries",
        playlist.playlist_id(),
        entries.len(),
        max_size
    );
    Ok(())
}
