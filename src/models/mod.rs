// src/models/mod.rs

//! Domain models for the playlist synchronizer.

mod config;
mod video;

// Re-export all public types
pub use config::{
    Config, FeedSort, HttpConfig, RedditConfig, RedditCredentials, SyncConfig, YouTubeConfig, env,
};
pub use video::{CandidateItem, CollectionEntry, VIDEO_ID_LEN, VideoId};
