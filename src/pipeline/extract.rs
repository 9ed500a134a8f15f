// src/pipeline/extract.rs

//! Video identifier extraction from post URLs.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{CandidateItem, VideoId};

/// Short links (`youtu.be/<id>`) and watch links (`youtube.com/watch?v=<id>`).
static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtu\.be/|youtube\.com/watch\?v=)([A-Za-z0-9_-]{11})")
        .expect("video URL pattern is valid")
});

/// Extract the video id from a URL, if it is a supported link.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    let caps = VIDEO_URL.captures(url)?;
    VideoId::parse(caps.get(1)?.as_str())
}

/// Collect the distinct video ids referenced by a batch of posts.
pub fn collect_video_ids<'a>(
    items: impl IntoIterator<Item = &'a CandidateItem>,
) -> BTreeSet<VideoId> {
    items
        .into_iter()
        .filter_map(|item| extract_video_id(&item.url))
        .collect()
}
