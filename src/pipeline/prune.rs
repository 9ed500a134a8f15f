// src/pipeline/prune.rs

//! Oldest-first eviction planning.

use crate::models::CollectionEntry;

/// Choose the entries to delete so that at most `max_size` remain.
///
/// Entries are ranked by `published_at`, oldest first. Entries without a
/// timestamp rank before all dated ones; ties keep listing order. Returns an
/// empty plan when the collection is already within bounds.
pub fn plan_prune(entries: &[CollectionEntry], max_size: usize) -> Vec<&CollectionEntry> {
    let excess = entries.len().saturating_sub(max_size);
    if excess == 0 {
        return Vec::new();
    }

    let mut by_age: Vec<&CollectionEntry> = entries.iter().collect();
    by_age.sort_by_key(|entry| entry.published_at);
    by_age.truncate(excess);
    by_age
}
