//! Video identifiers and playlist membership records.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of a YouTube video identifier.
pub const VIDEO_ID_LEN: usize = 11;

/// A YouTube video identifier.
///
/// Keeps the token exactly as it was written, for requests to the provider,
/// alongside a lower-cased key. Equality, hashing and ordering use the key
/// only, so ids that differ just in case compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId {
    raw: String,
    key: String,
}

impl VideoId {
    /// Validate a raw token.
    ///
    /// Returns `None` unless the token is exactly 11 characters drawn from
    /// `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let valid = raw.len() == VIDEO_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| Self {
            raw: raw.to_string(),
            key: raw.to_ascii_lowercase(),
        })
    }

    /// The id as written, to be sent to the provider.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The lower-cased comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for VideoId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for VideoId {}

impl Hash for VideoId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for VideoId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VideoId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl TryFrom<String> for VideoId {
    type Error = String;

    fn try_from(raw: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&raw).ok_or_else(|| format!("invalid video id {raw:?}"))
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.raw
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A post fetched from the source feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    /// Post title
    pub title: String,

    /// Link the post points at
    pub url: String,
}

impl CandidateItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// One membership record in the destination playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    /// Playlist item id, the handle used for deletion
    pub entry_id: String,

    /// Video the entry points at
    pub video_id: VideoId,

    /// When the entry was added to the playlist (`None` if the provider
    /// omitted or garbled it)
    pub published_at: Option<DateTime<Utc>>,

    /// Video title as reported by the provider
    pub title: String,
}
