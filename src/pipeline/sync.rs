// src/pipeline/sync.rs

//! Feed-to-playlist synchronization.
//!
//! One run walks these phases in order, stopping early when the feed yields
//! no videos:
//!
//! ```text
//! Init → FetchSource → LoadDestination → Prune → Insert → Done
//! ```
//!
//! Failing to read the feed, connect the playlist, or list the playlist
//! aborts the run before anything is mutated; the returned
//! [`AppError::Sync`] names the failure phase. Individual deletions and
//! insertions are best-effort: failures are logged and counted.

use std::fmt;
use std::future::Future;

use futures::TryStreamExt;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{CandidateItem, CollectionEntry, Config};
use crate::pipeline::diff::{InsertPlan, existing_ids};
use crate::pipeline::extract::collect_video_ids;
use crate::pipeline::prune::plan_prune;
use crate::services::{FeedSource, PlaylistClient};

/// Where a run is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    #[default]
    Init,
    FetchSource,
    LoadDestination,
    Prune,
    Insert,
    Done,
    SourceFailed,
    DestinationInitFailed,
    DestinationListFailed,
}

impl SyncPhase {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SyncPhase::SourceFailed
                | SyncPhase::DestinationInitFailed
                | SyncPhase::DestinationListFailed
        )
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Init => "init",
            SyncPhase::FetchSource => "fetch_source",
            SyncPhase::LoadDestination => "load_destination",
            SyncPhase::Prune => "prune",
            SyncPhase::Insert => "insert",
            SyncPhase::Done => "done",
            SyncPhase::SourceFailed => "source_failed",
            SyncPhase::DestinationInitFailed => "destination_init_failed",
            SyncPhase::DestinationListFailed => "destination_list_failed",
        };
        f.write_str(name)
    }
}

/// Settings for one run, extracted from [`Config`].
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Subreddit to read
    pub feed: String,
    /// Maximum posts to inspect
    pub post_limit: usize,
    /// Playlist size cap
    pub max_playlist_size: usize,
    /// Log planned mutations instead of performing them
    pub dry_run: bool,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            feed: config.reddit.subreddit.clone(),
            post_limit: config.reddit.post_limit,
            max_playlist_size: config.sync.max_playlist_size,
            dry_run: config.sync.dry_run,
        }
    }
}

/// Summary of a run.
///
/// In a dry run, `pruned` and `added` count planned operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Posts read from the feed
    pub candidates: usize,
    /// Distinct video ids found in those posts
    pub unique_ids: usize,
    /// Playlist entries before pruning
    pub existing: usize,
    /// Entries deleted by pruning
    pub pruned: usize,
    /// Deletions that failed
    pub prune_failures: usize,
    /// Videos added
    pub added: usize,
    /// Candidates skipped because the playlist already holds them
    pub skipped: usize,
    /// Insertions that failed
    pub insert_failures: usize,
    /// Whether mutations were only planned
    pub dry_run: bool,
    /// Last phase reached
    pub phase: SyncPhase,
}

/// Drives a feed → playlist synchronization run.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    settings: SyncSettings,
}

impl Synchronizer {
    pub fn new(settings: SyncSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Run one synchronization.
    ///
    /// `connect` is only invoked once the feed has produced at least one
    /// video id, so an empty batch makes no destination calls at all.
    pub async fn run<F, P, C, Fut>(&self, feed: &F, connect: C) -> Result<SyncReport>
    where
        F: FeedSource + ?Sized,
        P: PlaylistClient,
        C: FnOnce() -> Fut,
        Fut: Future<Output = Result<P>>,
    {
        let mut report = SyncReport {
            dry_run: self.settings.dry_run,
            ..SyncReport::default()
        };

        // Source
        report.phase = SyncPhase::FetchSource;
        let items = match self.fetch_candidates(feed).await {
            Ok(items) => items,
            Err(e) => {
                log::error!("Failed to read r/{}: {}", self.settings.feed, e);
                return Err(AppError::sync(SyncPhase::SourceFailed, e));
            }
        };
        report.candidates = items.len();

        let candidates = collect_video_ids(&items);
        report.unique_ids = candidates.len();
        log::info!(
            "Found {} YouTube video(s) in {} post(s) from r/{}",
            candidates.len(),
            items.len(),
            self.settings.feed
        );

        if candidates.is_empty() {
            report.phase = SyncPhase::Done;
            log::info!("Nothing to sync");
            return Ok(report);
        }

        // Destination
        report.phase = SyncPhase::LoadDestination;
        let playlist = match connect().await {
            Ok(playlist) => playlist,
            Err(e) => {
                log::error!("Failed to initialize playlist client: {e}");
                return Err(AppError::sync(SyncPhase::DestinationInitFailed, e));
            }
        };

        let entries: Vec<CollectionEntry> = match playlist.entries().try_collect().await {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("Failed to list playlist entries: {e}");
                return Err(AppError::sync(SyncPhase::DestinationListFailed, e));
            }
        };
        report.existing = entries.len();
        log::info!("Playlist holds {} entries", entries.len());
        let existing = existing_ids(&entries);

        // Prune
        report.phase = SyncPhase::Prune;
        self.prune(&playlist, &entries, &mut report).await;

        // Insert; membership is judged against the listing, not what
        // survived pruning
        report.phase = SyncPhase::Insert;
        let plan = InsertPlan::new(&candidates, &existing);
        self.insert(&playlist, &plan, &mut report).await;

        report.phase = SyncPhase::Done;
        log::info!(
            "{} {} new video(s) ({} already present, {} failed); pruned {} ({} failed)",
            if report.dry_run { "Would add" } else { "Added" },
            report.added,
            report.skipped,
            report.insert_failures,
            report.pruned,
            report.prune_failures
        );

        Ok(report)
    }

    async fn fetch_candidates<F>(&self, feed: &F) -> Result<Vec<CandidateItem>>
    where
        F: FeedSource + ?Sized,
    {
        feed.items(&self.settings.feed, self.settings.post_limit)
            .inspect_ok(|item| log::debug!("Checking: {} → {}", item.title, item.url))
            .try_collect()
            .await
    }

    /// Delete the oldest entries beyond the cap.
    async fn prune<P: PlaylistClient>(
        &self,
        playlist: &P,
        entries: &[CollectionEntry],
        report: &mut SyncReport,
    ) {
        let plan = plan_prune(entries, self.settings.max_playlist_size);
        if plan.is_empty() {
            return;
        }

        log::info!(
            "Playlist exceeds {} entries, evicting {} oldest",
            self.settings.max_playlist_size,
            plan.len()
        );

        for entry in plan {
            if self.settings.dry_run {
                log::info!("Would delete {} ({})", entry.video_id, entry.title);
                report.pruned += 1;
                continue;
            }

            match playlist.delete(&entry.entry_id).await {
                Ok(()) => {
                    log::info!("Deleted {} ({})", entry.video_id, entry.title);
                    report.pruned += 1;
                }
                Err(e) => {
                    log::warn!("Failed to delete {} ({}): {}", entry.video_id, entry.entry_id, e);
                    report.prune_failures += 1;
                }
            }
        }
    }

    async fn insert<P: PlaylistClient>(
        &self,
        playlist: &P,
        plan: &InsertPlan,
        report: &mut SyncReport,
    ) {
        for id in &plan.already_present {
            log::info!("Skipping {id}: already in playlist");
        }
        report.skipped = plan.already_present.len();

        for id in &plan.to_insert {
            if self.settings.dry_run {
                log::info!("Would add {id}");
                report.added += 1;
                continue;
            }

            match playlist.insert(id).await {
                Ok(()) => {
                    log::info!("Added {id}");
                    report.added += 1;
                }
                Err(e) => {
                    log::warn!("Failed to add {id}: {e}");
                    report.insert_failures += 1;
                }
            }
        }
    }
}
