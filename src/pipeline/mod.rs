//! Pipeline stages for a synchronization run.
//!
//! - `extract`: Pull video ids out of post URLs
//! - `diff`: Split candidates into new and already-present ids
//! - `prune`: Pick the oldest playlist entries beyond the size cap
//! - `sync`: Drive a full feed → playlist run

pub mod diff;
pub mod extract;
pub mod prune;
pub mod sync;

pub use diff::InsertPlan;
pub use extract::{collect_video_ids, extract_video_id};
pub use prune::plan_prune;
pub use sync::{SyncPhase, SyncReport, SyncSettings, Synchronizer};
