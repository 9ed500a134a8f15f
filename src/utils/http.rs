// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Read a response body, mapping non-success statuses to errors.
///
/// 401 and 403 become [`AppError::Auth`]; any other failure becomes
/// [`AppError::Api`] carrying the provider's own message when it sent one.
pub async fn read_body(context: &str, response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return Ok(body);
    }

    let message = provider_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(AppError::auth(format!("{context}: {message}")))
        }
        _ => Err(AppError::api(context, status.as_u16(), message)),
    }
}

/// Read a response body and deserialize it as JSON.
pub async fn read_json<T: DeserializeOwned>(context: &str, response: Response) -> Result<T> {
    let body = read_body(context, response).await?;
    Ok(serde_json::from_str(&body)?)
}

/// Error payload shapes used by Google and Reddit.
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Google { error: GoogleError },
    OAuth {
        error: String,
        error_description: Option<String>,
    },
    Reddit { message: String },
}

#[derive(Deserialize)]
struct GoogleError {
    message: String,
}

fn provider_message(body: &str) -> Option<String> {
    match serde_json::from_str::<ErrorBody>(body).ok()? {
        ErrorBody::Google { error } => Some(error.message),
        ErrorBody::OAuth {
            error,
            error_description: Some(description),
        } => Some(format!("{error}: {description}")),
        ErrorBody::OAuth { error, .. } => Some(error),
        ErrorBody::Reddit { message } => Some(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client() {
        assert!(create_client(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_google_error_message() {
        let body = r#"{"error":{"code":404,"message":"Playlist not found.","errors":[]}}"#;
        assert_eq!(provider_message(body).as_deref(), Some("Playlist not found."));
    }

    #[test]
    fn test_oauth_error_message() {
        let body = r#"{"error":"invalid_grant","error_description":"Token has been expired or revoked."}"#;
        assert_eq!(
            provider_message(body).as_deref(),
            Some("invalid_grant: Token has been expired or revoked.")
        );
        assert_eq!(
            provider_message(r#"{"error":"unsupported_grant_type"}"#).as_deref(),
            Some("unsupported_grant_type")
        );
    }

    #[test]
    fn test_reddit_error_message() {
        let body = r#"{"message":"Forbidden","error":403}"#;
        assert_eq!(provider_message(body).as_deref(), Some("Forbidden"));
    }

    #[test]
    fn test_unparseable_body() {
        assert!(provider_message("<html>Bad Gateway</html>").is_none());
    }
}
