// src/services/google_auth.rs

//! Destination credential decoding and access-token exchange.
//!
//! Credentials arrive as two base64-encoded JSON blobs: the OAuth client
//! secret downloaded from the Google console (`installed` or `web` flavour)
//! and an authorized-user token (`token`, `refresh_token`, ...).

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{YouTubeConfig, env};
use crate::utils::http;

/// Client-secret file as downloaded from the Google console.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

#[derive(Debug, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
    token_uri: Option<String>,
}

/// Authorized-user token blob.
#[derive(Debug, Default, Deserialize)]
struct AuthorizedUser {
    token: Option<String>,
    refresh_token: Option<String>,
    token_uri: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Decoded destination credentials.
#[derive(Clone)]
pub struct YouTubeCredentials {
    client_id: String,
    client_secret: String,
    token_uri: String,
    refresh_token: Option<String>,
    access_token: Option<String>,
}

impl fmt::Debug for YouTubeCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YouTubeCredentials")
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("has_access_token", &self.access_token.is_some())
            .finish()
    }
}

impl YouTubeCredentials {
    /// Decode both credential blobs from the configuration.
    ///
    /// Any missing or malformed value is a configuration error.
    pub fn decode(config: &YouTubeConfig) -> Result<Self> {
        let secret_file: ClientSecretFile =
            decode_blob(env::CLIENT_SECRET_JSON, config.client_secret_json.as_deref())?;
        let user: AuthorizedUser = decode_blob(env::TOKEN_JSON, config.token_json.as_deref())?;

        let secret = secret_file.installed.or(secret_file.web);

        let client_id = user
            .client_id
            .or_else(|| secret.as_ref().map(|s| s.client_id.clone()))
            .ok_or_else(|| AppError::config("no client_id in client secret or token"))?;
        let client_secret = user
            .client_secret
            .or_else(|| secret.as_ref().map(|s| s.client_secret.clone()))
            .ok_or_else(|| AppError::config("no client_secret in client secret or token"))?;
        let token_uri = user
            .token_uri
            .or_else(|| secret.and_then(|s| s.token_uri))
            .unwrap_or_else(|| config.token_uri.clone());

        if user.refresh_token.is_none() && user.token.is_none() {
            return Err(AppError::config(format!(
                "{} holds neither a refresh_token nor an access token",
                env::TOKEN_JSON
            )));
        }

        Ok(Self {
            client_id,
            client_secret,
            token_uri,
            refresh_token: user.refresh_token,
            access_token: user.token,
        })
    }

    /// Obtain a bearer token for API calls.
    ///
    /// Refreshes when a refresh token is available, otherwise returns the
    /// stored access token as-is.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String> {
        let Some(refresh_token) = &self.refresh_token else {
            return self
                .access_token
                .clone()
                .ok_or_else(|| AppError::config("no access token available"));
        };

        log::debug!("Refreshing YouTube access token via {}", self.token_uri);
        let response = client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await?;

        let token: TokenResponse = http::read_json("oauth2.token", response).await?;
        Ok(token.access_token)
    }
}

fn decode_blob<T: DeserializeOwned>(name: &str, value: Option<&str>) -> Result<T> {
    let encoded = value.ok_or_else(|| AppError::config(format!("{name} is not set")))?;

    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| AppError::config(format!("{name} is not valid base64: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::config(format!("{name} is not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;

    use super::*;

    const CLIENT_SECRET: &str = r#"{"installed":{"client_id":"cid.apps.googleusercontent.com","client_secret":"csecret","token_uri":"https://oauth2.googleapis.com/token","redirect_uris":["http://localhost"]}}"#;
    const TOKEN: &str = r#"{"token":"ya29.old","refresh_token":"1//refresh","scopes":["https://www.googleapis.com/auth/youtube"]}"#;

    fn config(secret: Option<&str>, token: Option<&str>) -> YouTubeConfig {
        YouTubeConfig {
            client_secret_json: secret.map(|s| STANDARD.encode(s)),
            token_json: token.map(|t| STANDARD.encode(t)),
            playlist_id: Some("PL123".to_string()),
            ..YouTubeConfig::default()
        }
    }

    #[test]
    fn test_decode_combines_blobs() {
        let creds = YouTubeCredentials::decode(&config(Some(CLIENT_SECRET), Some(TOKEN))).unwrap();
        assert_eq!(creds.client_id, "cid.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "csecret");
        assert_eq!(creds.refresh_token.as_deref(), Some("1//refresh"));
        assert_eq!(creds.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_decode_web_client_and_token_overrides() {
        let secret = r#"{"web":{"client_id":"web-id","client_secret":"web-secret"}}"#;
        let token = r#"{"refresh_token":"r","client_id":"token-id","token_uri":"https://example.com/token"}"#;
        let creds = YouTubeCredentials::decode(&config(Some(secret), Some(token))).unwrap();
        assert_eq!(creds.client_id, "token-id");
        assert_eq!(creds.client_secret, "web-secret");
        assert_eq!(creds.token_uri, "https://example.com/token");
    }

    #[test]
    fn test_decode_tolerates_wrapped_base64() {
        let mut cfg = config(Some(CLIENT_SECRET), Some(TOKEN));
        let encoded = cfg.token_json.take().unwrap();
        let (head, tail) = encoded.split_at(10);
        cfg.token_json = Some(format!("{head}\n{tail}\n"));
        assert!(YouTubeCredentials::decode(&cfg).is_ok());
    }

    #[test]
    fn test_missing_blob_is_config_error() {
        let err = YouTubeCredentials::decode(&config(Some(CLIENT_SECRET), None)).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("TOKEN_JSON"));
    }

    #[test]
    fn test_malformed_blob_is_config_error() {
        let mut cfg = config(Some(CLIENT_SECRET), Some(TOKEN));
        cfg.client_secret_json = Some("!!not base64!!".to_string());
        assert!(YouTubeCredentials::decode(&cfg).unwrap_err().is_config());

        let cfg = config(Some("{not json"), Some(TOKEN));
        assert!(YouTubeCredentials::decode(&cfg).unwrap_err().is_config());
    }

    #[test]
    fn test_token_without_any_token_is_rejected() {
        let cfg = config(Some(CLIENT_SECRET), Some(r#"{"client_id":"x"}"#));
        assert!(YouTubeCredentials::decode(&cfg).unwrap_err().is_config());
    }

    #[tokio::test]
    async fn test_access_token_without_refresh() {
        let token = r#"{"token":"ya29.static"}"#;
        let creds = YouTubeCredentials::decode(&config(Some(CLIENT_SECRET), Some(token))).unwrap();
        let client = reqwest::Client::new();
        assert_eq!(creds.access_token(&client).await.unwrap(), "ya29.static");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let creds = YouTubeCredentials::decode(&config(Some(CLIENT_SECRET), Some(TOKEN))).unwrap();
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("csecret"));
        assert!(!rendered.contains("1//refresh"));
    }
}
