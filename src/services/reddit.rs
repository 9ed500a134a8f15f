// src/services/reddit.rs

//! Reddit feed reader.
//!
//! Authenticates as a script app with the password grant, then reads a
//! subreddit listing page by page following the `after` cursor.

use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{CandidateItem, Config, FeedSort, RedditCredentials};
use crate::services::{FeedSource, paginate};
use crate::utils::http;

/// Reddit never returns more than this many posts per listing page.
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

impl From<Post> for CandidateItem {
    fn from(post: Post) -> Self {
        CandidateItem::new(post.title, post.url)
    }
}

/// Authenticated reader for subreddit listings.
pub struct RedditFeed {
    client: Client,
    api_base: String,
    sort: FeedSort,
    user_agent: String,
    access_token: String,
}

impl RedditFeed {
    /// Authenticate against Reddit and return a ready feed reader.
    ///
    /// Fails with a configuration error when credentials are incomplete and
    /// with an authorization error when Reddit rejects them.
    pub async fn connect(config: &Config, client: Client) -> Result<Self> {
        let credentials = config.reddit_credentials()?;
        let access_token = Self::authenticate(&client, &config.reddit.auth_url, credentials).await?;
        log::debug!("Authenticated with Reddit as {}", credentials.username);

        Ok(Self {
            client,
            api_base: config.reddit.api_base.trim_end_matches('/').to_string(),
            sort: config.reddit.sort,
            user_agent: credentials.user_agent.clone(),
            access_token,
        })
    }

    async fn authenticate(
        client: &Client,
        auth_url: &str,
        credentials: &RedditCredentials,
    ) -> Result<String> {
        let response = client
            .post(auth_url)
            .header(USER_AGENT, &credentials.user_agent)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;

        // Reddit reports bad passwords as 200 with an `error` field.
        let token: TokenResponse = http::read_json("reddit.access_token", response).await?;
        match (token.access_token, token.error) {
            (Some(access_token), _) => Ok(access_token),
            (None, Some(error)) => Err(AppError::auth(format!("reddit.access_token: {error}"))),
            (None, None) => Err(AppError::auth("reddit.access_token: no token in response")),
        }
    }

    fn listing_url(&self, feed: &str) -> String {
        format!(
            "{}/r/{}/{}",
            self.api_base,
            feed.trim_start_matches("r/"),
            self.sort
        )
    }

    async fn fetch_page(
        &self,
        feed: &str,
        page_size: usize,
        after: Option<String>,
    ) -> Result<(Vec<CandidateItem>, Option<String>)> {
        let mut query = vec![
            ("limit", page_size.to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(after) = after {
            query.push(("after", after));
        }

        let response = self
            .client
            .get(self.listing_url(feed))
            .header(USER_AGENT, &self.user_agent)
            .bearer_auth(&self.access_token)
            .query(&query)
            .send()
            .await?;

        let listing: Listing = http::read_json("reddit.listing", response).await?;
        Ok(parse_listing(listing))
    }
}

fn parse_listing(listing: Listing) -> (Vec<CandidateItem>, Option<String>) {
    let items = listing
        .data
        .children
        .into_iter()
        .map(|thing| CandidateItem::from(thing.data))
        .collect();
    (items, listing.data.after)
}

impl FeedSource for RedditFeed {
    fn items<'a>(
        &'a self,
        feed: &'a str,
        limit: usize,
    ) -> BoxStream<'a, Result<CandidateItem>> {
        let page_size = limit.clamp(1, MAX_PAGE_SIZE);
        paginate(move |after| self.fetch_page(feed, page_size, after))
            .take(limit)
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "kind": "Listing",
        "data": {
            "after": "t3_abc123",
            "children": [
                {"kind": "t3", "data": {"title": "Artist -- Song [indie] (2024)", "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"}},
                {"kind": "t3", "data": {"title": "Weekly discussion", "url": "https://www.reddit.com/r/listentothis/comments/abc/"}},
                {"kind": "t3", "data": {"title": "Missing url"}}
            ]
        }
    }"#;

    #[test]
    fn test_parse_listing() {
        let listing: Listing = serde_json::from_str(LISTING).unwrap();
        let (items, after) = parse_listing(listing);
        assert_eq!(after.as_deref(), Some("t3_abc123"));
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Artist -- Song [indie] (2024)");
        assert_eq!(items[0].url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(items[2].url, "");
    }

    #[test]
    fn test_parse_last_page() {
        let listing: Listing =
            serde_json::from_str(r#"{"data": {"after": null, "children": []}}"#).unwrap();
        let (items, after) = parse_listing(listing);
        assert!(items.is_empty());
        assert!(after.is_none());
    }

    #[test]
    fn test_token_response_error_shape() {
        let token: TokenResponse = serde_json::from_str(r#"{"error": "invalid_grant"}"#).unwrap();
        assert!(token.access_token.is_none());
        assert_eq!(token.error.as_deref(), Some("invalid_grant"));
    }

    #[test]
    fn test_listing_url() {
        let feed = RedditFeed {
            client: Client::new(),
            api_base: "https://oauth.reddit.com".to_string(),
            sort: FeedSort::Top,
            user_agent: "test".to_string(),
            access_token: "token".to_string(),
        };
        assert_eq!(
            feed.listing_url("listentothis"),
            "https://oauth.reddit.com/r/listentothis/top"
        );
        assert_eq!(
            feed.listing_url("r/Music"),
            "https://oauth.reddit.com/r/Music/top"
        );
    }
}
