// src/services/youtube.rs

//! YouTube playlist client backed by the Data API v3 `playlistItems`
//! resource.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{CollectionEntry, VideoId, YouTubeConfig};
use crate::services::{PlaylistClient, YouTubeCredentials, paginate};
use crate::utils::http;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    id: String,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    published_at: Option<String>,
    #[serde(default)]
    title: String,
    resource_id: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

impl PlaylistItem {
    /// Convert into an entry, or `None` when the item carries no usable
    /// video id.
    fn into_entry(self) -> Option<CollectionEntry> {
        let snippet = self.snippet?;
        let video_id = snippet
            .resource_id
            .and_then(|r| r.video_id)
            .and_then(|raw| VideoId::parse(&raw))?;
        let published_at = snippet
            .published_at
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Some(CollectionEntry {
            entry_id: self.id,
            video_id,
            published_at,
            title: snippet.title,
        })
    }
}

/// An authenticated handle on one playlist.
pub struct YouTubePlaylist {
    client: Client,
    api_base: String,
    playlist_id: String,
    page_size: u32,
    access_token: String,
}

impl YouTubePlaylist {
    /// Decode credentials, obtain an access token, and bind to the
    /// configured playlist.
    ///
    /// Missing or malformed configuration fails before any request is made.
    pub async fn connect(config: &YouTubeConfig, client: Client) -> Result<Self> {
        let playlist_id = config
            .playlist_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::config("PLAYLIST_ID is not set"))?;
        let credentials = YouTubeCredentials::decode(config)?;
        let access_token = credentials.access_token(&client).await?;
        log::debug!("Authenticated with YouTube for playlist {playlist_id}");

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            playlist_id,
            page_size: config.page_size,
            access_token,
        })
    }

    pub fn playlist_id(&self) -> &str {
        &self.playlist_id
    }

    fn items_url(&self) -> String {
        format!("{}/playlistItems", self.api_base)
    }

    async fn fetch_page(
        &self,
        page_token: Option<String>,
    ) -> Result<(Vec<CollectionEntry>, Option<String>)> {
        let mut query = vec![
            ("part", "snippet".to_string()),
            ("playlistId", self.playlist_id.clone()),
            ("maxResults", self.page_size.to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self
            .client
            .get(self.items_url())
            .bearer_auth(&self.access_token)
            .query(&query)
            .send()
            .await?;

        let page: PlaylistItemListResponse =
            http::read_json("playlistItems.list", response).await?;
        Ok(parse_page(page))
    }
}

fn parse_page(page: PlaylistItemListResponse) -> (Vec<CollectionEntry>, Option<String>) {
    let entries = page
        .items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.clone();
            let entry = item.into_entry();
            if entry.is_none() {
                log::warn!("Skipping playlist item {id}: no valid video id");
            }
            entry
        })
        .collect();
    (entries, page.next_page_token)
}

/// `playlistItems.insert` request body. The id goes out as it was written;
/// the provider treats ids case-sensitively.
fn insert_body(playlist_id: &str, video_id: &VideoId) -> serde_json::Value {
    serde_json::json!({
        "snippet": {
            "playlistId": playlist_id,
            "resourceId": {
                "kind": "youtube#video",
                "videoId": video_id.as_str(),
            }
        }
    })
}

#[async_trait]
impl PlaylistClient for YouTubePlaylist {
    fn entries(&self) -> BoxStream<'_, Result<CollectionEntry>> {
        paginate(move |token| self.fetch_page(token))
    }

    async fn insert(&self, video_id: &VideoId) -> Result<()> {
        let body = insert_body(&self.playlist_id, video_id);

        let response = self
            .client
            .post(self.items_url())
            .bearer_auth(&self.access_token)
            .query(&[("part", "snippet")])
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&body)?)
            .send()
            .await?;

        http::read_body("playlistItems.insert", response).await?;
        Ok(())
    }

    async fn delete(&self, entry_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.items_url())
            .bearer_auth(&self.access_token)
            .query(&[("id", entry_id)])
            .send()
            .await?;

        http::read_body("playlistItems.delete", response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "kind": "youtube#playlistItemListResponse",
        "nextPageToken": "CDIQAA",
        "pageInfo": {"totalResults": 3, "resultsPerPage": 50},
        "items": [
            {
                "id": "UExhYmMuMDE",
                "snippet": {
                    "publishedAt": "2024-03-01T12:00:00Z",
                    "title": "Song One",
                    "resourceId": {"kind": "youtube#video", "videoId": "dQw4w9WgXcQ"}
                }
            },
            {
                "id": "UExhYmMuMDI",
                "snippet": {
                    "publishedAt": "not a date",
                    "title": "Deleted video",
                    "resourceId": {"kind": "youtube#video", "videoId": "AAAAAAAAAAA"}
                }
            },
            {
                "id": "UExhYmMuMDM",
                "snippet": {"title": "Broken", "resourceId": {"kind": "youtube#video"}}
            }
        ]
    }"#;

    #[test]
    fn test_parse_page() {
        let page: PlaylistItemListResponse = serde_json::from_str(PAGE).unwrap();
        let (entries, next) = parse_page(page);

        assert_eq!(next.as_deref(), Some("CDIQAA"));
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].entry_id, "UExhYmMuMDE");
        assert_eq!(entries[0].video_id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(
            entries[0].published_at.map(|dt| dt.to_rfc3339()),
            Some("2024-03-01T12:00:00+00:00".to_string())
        );
        assert_eq!(entries[0].title, "Song One");

        assert_eq!(entries[1].video_id.as_str(), "AAAAAAAAAAA");
        assert!(entries[1].published_at.is_none());
    }

    #[test]
    fn test_parse_last_page() {
        let page: PlaylistItemListResponse = serde_json::from_str(r#"{"items": []}"#).unwrap();
        let (entries, next) = parse_page(page);
        assert!(entries.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn test_insert_body_keeps_original_case() {
        let id = crate::pipeline::extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .unwrap();
        let body = serde_json::to_string(&insert_body("PL123", &id)).unwrap();
        assert_eq!(
            body,
            r#"{"snippet":{"playlistId":"PL123","resourceId":{"kind":"youtube#video","videoId":"dQw4w9WgXcQ"}}}"#
        );
    }

    #[tokio::test]
    async fn test_connect_requires_playlist_id() {
        let config = YouTubeConfig::default();
        let err = match YouTubePlaylist::connect(&config, Client::new()).await {
            Ok(_) => panic!("connect should fail without a playlist id"),
            Err(e) => e,
        };
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_connect_requires_credentials() {
        let config = YouTubeConfig {
            playlist_id: Some("PL123".to_string()),
            ..YouTubeConfig::default()
        };
        let err = match YouTubePlaylist::connect(&config, Client::new()).await {
            Ok(_) => panic!("connect should fail without credentials"),
            Err(e) => e,
        };
        assert!(err.is_config());
    }
}
