//! Service layer for the playlist synchronizer.
//!
//! This module contains the remote collaborators:
//! - Source feed reading (`FeedSource`, implemented by `RedditFeed`)
//! - Destination playlist access (`PlaylistClient`, implemented by `YouTubePlaylist`)
//! - Destination credential decoding (`YouTubeCredentials`)

mod google_auth;
mod reddit;
mod youtube;

use std::future::Future;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::error::Result;
use crate::models::{CandidateItem, CollectionEntry, VideoId};

pub use google_auth::YouTubeCredentials;
pub use reddit::RedditFeed;
pub use youtube::YouTubePlaylist;

/// A discussion board that yields candidate posts.
pub trait FeedSource: Send + Sync {
    /// Lazily read up to `limit` posts from `feed`.
    ///
    /// The stream is finite and cannot be restarted. A transport or
    /// authorization failure ends it with an error.
    fn items<'a>(&'a self, feed: &'a str, limit: usize)
    -> BoxStream<'a, Result<CandidateItem>>;
}

/// A remote playlist that can be listed and mutated.
#[async_trait]
pub trait PlaylistClient: Send + Sync {
    /// Lazily list every entry, following page tokens until the provider
    /// reports no further pages.
    fn entries(&self) -> BoxStream<'_, Result<CollectionEntry>>;

    /// Add a video to the playlist.
    async fn insert(&self, video_id: &VideoId) -> Result<()>;

    /// Remove a playlist entry by its entry id.
    async fn delete(&self, entry_id: &str) -> Result<()>;
}

/// Position in a token-paginated listing.
enum PageCursor {
    Start,
    Next(String),
    Done,
}

/// Turn a page fetcher into a flat stream of items.
///
/// `fetch` receives the continuation token (`None` for the first page) and
/// returns the page's items plus the next token. Iteration stops when the
/// token is absent or a page comes back empty; the first error ends the
/// stream.
pub(crate) fn paginate<'a, T, F, Fut>(fetch: F) -> BoxStream<'a, Result<T>>
where
    T: Send + 'a,
    F: FnMut(Option<String>) -> Fut + Send + 'a,
    Fut: Future<Output = Result<(Vec<T>, Option<String>)>> + Send + 'a,
{
    stream::try_unfold((PageCursor::Start, fetch), advance)
        .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
}

async fn advance<T, F, Fut>(
    (cursor, mut fetch): (PageCursor, F),
) -> Result<Option<(Vec<T>, (PageCursor, F))>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<String>)>>,
{
    let token = match cursor {
        PageCursor::Done => return Ok(None),
        PageCursor::Start => None,
        PageCursor::Next(token) => Some(token),
    };

    let (items, next) = fetch(token).await?;
    let cursor = match next {
        Some(token) if !token.is_empty() && !items.is_empty() => PageCursor::Next(token),
        _ => PageCursor::Done,
    };

    Ok(Some((items, (cursor, fetch))))
}
