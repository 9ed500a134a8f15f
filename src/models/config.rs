//! Application configuration structures.
//!
//! Non-secret settings come from an optional TOML file. Environment
//! variables are layered on top, and credentials are only ever read from
//! the environment.

use std::fmt;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Environment variable names.
pub mod env {
    pub const REDDIT_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
    pub const REDDIT_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
    pub const REDDIT_USERNAME: &str = "REDDIT_USERNAME";
    pub const REDDIT_PASSWORD: &str = "REDDIT_PASSWORD";
    pub const REDDIT_USER_AGENT: &str = "REDDIT_USER_AGENT";
    pub const SUBREDDIT_NAME: &str = "SUBREDDIT_NAME";
    pub const POST_LIMIT: &str = "POST_LIMIT";
    pub const FEED_SORT: &str = "FEED_SORT";
    pub const CLIENT_SECRET_JSON: &str = "CLIENT_SECRET_JSON";
    pub const TOKEN_JSON: &str = "TOKEN_JSON";
    pub const PLAYLIST_ID: &str = "PLAYLIST_ID";
    pub const MAX_PLAYLIST_SIZE: &str = "MAX_PLAYLIST_SIZE";
}

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Source feed settings
    #[serde(default)]
    pub reddit: RedditConfig,

    /// Destination playlist settings
    #[serde(default)]
    pub youtube: YouTubeConfig,

    /// Synchronization policy
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Build configuration from defaults and the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from defaults and an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.apply_env(lookup);
        config
    }

    /// Layer environment variables over the current settings.
    ///
    /// Invalid or out-of-range numeric values and unknown enum values keep
    /// the current setting and log a warning. Missing credentials are left unset and reported when the
    /// corresponding client is connected.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(name) = get(env::SUBREDDIT_NAME) {
            self.reddit.subreddit = name;
        }
        if let Some(raw) = get(env::POST_LIMIT) {
            self.reddit.post_limit = parse_in_range_or_keep(
                env::POST_LIMIT,
                &raw,
                1..=defaults::MAX_POST_LIMIT,
                self.reddit.post_limit,
            );
        }
        if let Some(raw) = get(env::FEED_SORT) {
            self.reddit.sort = parse_or_keep(env::FEED_SORT, &raw, self.reddit.sort);
        }
        if let Some(raw) = get(env::MAX_PLAYLIST_SIZE) {
            self.sync.max_playlist_size = parse_in_range_or_keep(
                env::MAX_PLAYLIST_SIZE,
                &raw,
                1..=usize::MAX,
                self.sync.max_playlist_size,
            );
        }

        self.reddit.credentials = match (
            get(env::REDDIT_CLIENT_ID),
            get(env::REDDIT_CLIENT_SECRET),
            get(env::REDDIT_USERNAME),
            get(env::REDDIT_PASSWORD),
            get(env::REDDIT_USER_AGENT),
        ) {
            (
                Some(client_id),
                Some(client_secret),
                Some(username),
                Some(password),
                Some(user_agent),
            ) => Some(RedditCredentials {
                client_id,
                client_secret,
                username,
                password,
                user_agent,
            }),
            _ => None,
        };

        self.youtube.client_secret_json = get(env::CLIENT_SECRET_JSON);
        self.youtube.token_json = get(env::TOKEN_JSON);
        self.youtube.playlist_id = get(env::PLAYLIST_ID).or(self.youtube.playlist_id.take());
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.reddit.subreddit.trim().is_empty() {
            return Err(AppError::validation("reddit.subreddit is empty"));
        }
        if !(1..=defaults::MAX_POST_LIMIT).contains(&self.reddit.post_limit) {
            return Err(AppError::validation(format!(
                "reddit.post_limit must be between 1 and {}",
                defaults::MAX_POST_LIMIT
            )));
        }
        if self.sync.max_playlist_size == 0 {
            return Err(AppError::validation("sync.max_playlist_size must be > 0"));
        }
        if !(1..=50).contains(&self.youtube.page_size) {
            return Err(AppError::validation(
                "youtube.page_size must be between 1 and 50",
            ));
        }
        Url::parse(&self.reddit.auth_url)?;
        Url::parse(&self.reddit.api_base)?;
        Url::parse(&self.youtube.api_base)?;
        Ok(())
    }

    /// Source credentials, or a configuration error naming what is missing.
    pub fn reddit_credentials(&self) -> Result<&RedditCredentials> {
        self.reddit.credentials.as_ref().ok_or_else(|| {
            AppError::config(format!(
                "Reddit credentials incomplete: {}, {}, {}, {} and {} are required",
                env::REDDIT_CLIENT_ID,
                env::REDDIT_CLIENT_SECRET,
                env::REDDIT_USERNAME,
                env::REDDIT_PASSWORD,
                env::REDDIT_USER_AGENT
            ))
        })
    }
}

fn parse_or_keep<T: FromStr + fmt::Display + Copy>(key: &str, raw: &str, current: T) -> T {
    raw.parse().unwrap_or_else(|_| {
        log::warn!("Invalid {key}={raw:?}, falling back to {current}");
        current
    })
}

fn parse_in_range_or_keep(
    key: &str,
    raw: &str,
    range: RangeInclusive<usize>,
    current: usize,
) -> usize {
    match raw.parse::<usize>() {
        Ok(value) if range.contains(&value) => value,
        Ok(value) => {
            log::warn!(
                "{key}={value} is outside {}..={}, falling back to {current}",
                range.start(),
                range.end()
            );
            current
        }
        Err(_) => {
            log::warn!("Invalid {key}={raw:?}, falling back to {current}");
            current
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for destination requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Which listing of the subreddit to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSort {
    #[default]
    Hot,
    New,
    Top,
    Rising,
}

impl FeedSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSort::Hot => "hot",
            FeedSort::New => "new",
            FeedSort::Top => "top",
            FeedSort::Rising => "rising",
        }
    }
}

impl fmt::Display for FeedSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hot" => Ok(FeedSort::Hot),
            "new" => Ok(FeedSort::New),
            "top" => Ok(FeedSort::Top),
            "rising" => Ok(FeedSort::Rising),
            other => Err(AppError::validation(format!("unknown feed sort '{other}'"))),
        }
    }
}

/// Source feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    /// Subreddit to read posts from
    #[serde(default = "defaults::subreddit")]
    pub subreddit: String,

    /// Maximum number of posts to inspect per run
    #[serde(default = "defaults::post_limit")]
    pub post_limit: usize,

    /// Listing to read
    #[serde(default)]
    pub sort: FeedSort,

    /// OAuth token endpoint
    #[serde(default = "defaults::reddit_auth_url")]
    pub auth_url: String,

    /// Base URL for authenticated API calls
    #[serde(default = "defaults::reddit_api_base")]
    pub api_base: String,

    #[serde(skip)]
    pub credentials: Option<RedditCredentials>,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            subreddit: defaults::subreddit(),
            post_limit: defaults::post_limit(),
            sort: FeedSort::default(),
            auth_url: defaults::reddit_auth_url(),
            api_base: defaults::reddit_api_base(),
            credentials: None,
        }
    }
}

/// Reddit script-app credentials.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Destination playlist settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// Base URL of the YouTube Data API
    #[serde(default = "defaults::youtube_api_base")]
    pub api_base: String,

    /// Token endpoint used when the token blob does not name one
    #[serde(default = "defaults::google_token_uri")]
    pub token_uri: String,

    /// Items requested per listing page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Target playlist (normally supplied through the environment)
    #[serde(default)]
    pub playlist_id: Option<String>,

    /// Base64-encoded client-secret JSON
    #[serde(skip)]
    pub client_secret_json: Option<String>,

    /// Base64-encoded authorized-user token JSON
    #[serde(skip)]
    pub token_json: Option<String>,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::youtube_api_base(),
            token_uri: defaults::google_token_uri(),
            page_size: defaults::page_size(),
            playlist_id: None,
            client_secret_json: None,
            token_json: None,
        }
    }
}

impl fmt::Debug for YouTubeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("YouTubeConfig")
            .field("api_base", &self.api_base)
            .field("token_uri", &self.token_uri)
            .field("page_size", &self.page_size)
            .field("playlist_id", &self.playlist_id)
            .field("client_secret_json", &redact(&self.client_secret_json))
            .field("token_json", &redact(&self.token_json))
            .finish()
    }
}

/// Synchronization policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Playlist size cap enforced by oldest-first eviction
    #[serde(default = "defaults::max_playlist_size")]
    pub max_playlist_size: usize,

    /// Plan changes without mutating the playlist
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_playlist_size: defaults::max_playlist_size(),
            dry_run: false,
        }
    }
}

mod defaults {
    pub const MAX_POST_LIMIT: usize = 1000;

    pub fn user_agent() -> String {
        concat!("playlist-sync/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Source defaults
    pub fn subreddit() -> String {
        "listentothis".into()
    }
    pub fn post_limit() -> usize {
        20
    }
    pub fn reddit_auth_url() -> String {
        "https://www.reddit.com/api/v1/access_token".into()
    }
    pub fn reddit_api_base() -> String {
        "https://oauth.reddit.com".into()
    }

    // Destination defaults
    pub fn youtube_api_base() -> String {
        "https://www.googleapis.com/youtube/v3".into()
    }
    pub fn google_token_uri() -> String {
        "https://oauth2.googleapis.com/token".into()
    }
    pub fn page_size() -> u32 {
        50
    }

    // Sync defaults
    pub fn max_playlist_size() -> usize {
        500
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn reddit_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            (env::REDDIT_CLIENT_ID, "id"),
            (env::REDDIT_CLIENT_SECRET, "secret"),
            (env::REDDIT_USERNAME, "user"),
            (env::REDDIT_PASSWORD, "hunter2"),
            (env::REDDIT_USER_AGENT, "script:playlist-sync:v0.1 (by /u/user)"),
        ]
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.reddit.subreddit, "listentothis");
        assert_eq!(config.reddit.post_limit, 20);
        assert_eq!(config.reddit.sort, FeedSort::Hot);
        assert_eq!(config.sync.max_playlist_size, 500);
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_cap() {
        let mut config = Config::default();
        config.sync.max_playlist_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_defaults() {
        let config = Config::from_lookup(lookup(&[
            (env::SUBREDDIT_NAME, "Music"),
            (env::POST_LIMIT, "50"),
            (env::FEED_SORT, "New"),
            (env::MAX_PLAYLIST_SIZE, "200"),
            (env::PLAYLIST_ID, "PL123"),
        ]));
        assert_eq!(config.reddit.subreddit, "Music");
        assert_eq!(config.reddit.post_limit, 50);
        assert_eq!(config.reddit.sort, FeedSort::New);
        assert_eq!(config.sync.max_playlist_size, 200);
        assert_eq!(config.youtube.playlist_id.as_deref(), Some("PL123"));
    }

    #[test]
    fn invalid_post_limit_falls_back_to_default() {
        let config = Config::from_lookup(lookup(&[(env::POST_LIMIT, "twenty")]));
        assert_eq!(config.reddit.post_limit, 20);

        let config = Config::from_lookup(lookup(&[(env::MAX_PLAYLIST_SIZE, "-1")]));
        assert_eq!(config.sync.max_playlist_size, 500);
    }

    #[test]
    fn out_of_range_post_limit_falls_back_and_validates() {
        for raw in ["5000", "0"] {
            let config = Config::from_lookup(lookup(&[(env::POST_LIMIT, raw)]));
            assert_eq!(config.reddit.post_limit, 20);
            assert!(config.validate().is_ok());
        }

        let config = Config::from_lookup(lookup(&[(env::POST_LIMIT, "1000")]));
        assert_eq!(config.reddit.post_limit, 1000);

        let config = Config::from_lookup(lookup(&[(env::MAX_PLAYLIST_SIZE, "0")]));
        assert_eq!(config.sync.max_playlist_size, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reddit_credentials_require_all_fields() {
        let config = Config::from_lookup(lookup(&reddit_vars()));
        let creds = config.reddit_credentials().unwrap();
        assert_eq!(creds.username, "user");

        let mut partial = reddit_vars();
        partial.retain(|(k, _)| *k != env::REDDIT_PASSWORD);
        let config = Config::from_lookup(lookup(&partial));
        assert!(config.reddit_credentials().unwrap_err().is_config());
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut vars = reddit_vars();
        vars.push((env::TOKEN_JSON, "c2VjcmV0"));
        let config = Config::from_lookup(lookup(&vars));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("c2VjcmV0"));
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[reddit]
subreddit = "indieheads"
sort = "top"

[sync]
max_playlist_size = 100
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.reddit.subreddit, "indieheads");
        assert_eq!(config.reddit.sort, FeedSort::Top);
        assert_eq!(config.reddit.post_limit, 20);
        assert_eq!(config.sync.max_playlist_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("missing.toml"));
        assert_eq!(config.reddit.subreddit, "listentothis");
    }
}
