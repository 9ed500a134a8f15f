//! Difference between the candidate batch and the playlist's contents.
//!
//! Only additions matter here: candidates that are already in the playlist
//! are reported so they can be logged, and removals are handled by pruning.

use std::collections::{BTreeSet, HashSet};

use crate::models::{CollectionEntry, VideoId};

/// Candidates split by whether the playlist already holds them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertPlan {
    /// Ids missing from the playlist, in a stable order
    pub to_insert: Vec<VideoId>,
    /// Ids already present
    pub already_present: Vec<VideoId>,
}

impl InsertPlan {
    /// Split `candidates` against the ids currently in the playlist.
    pub fn new(candidates: &BTreeSet<VideoId>, existing: &HashSet<VideoId>) -> Self {
        let (already_present, to_insert): (Vec<_>, Vec<_>) = candidates
            .iter()
            .cloned()
            .partition(|id| existing.contains(id));

        Self {
            to_insert,
            already_present,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty()
    }
}

/// Video ids held by the given entries.
pub fn existing_ids<'a>(
    entries: impl IntoIterator<Item = &'a CollectionEntry>,
) -> HashSet<VideoId> {
    entries.into_iter().map(|e| e.video_id.clone()).collect()
}
