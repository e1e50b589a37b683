//! Error type shared by the external connectors.

use thiserror::Error;

/// Error type for external search and generation calls.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The service refused the request (4xx other than 429)
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Service returned no content")]
    EmptyResponse,
}

impl ConnectorError {
    /// Whether a connector-level retry can help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConnectorError::ApiError(_) | ConnectorError::RateLimitExceeded | ConnectorError::Timeout
        )
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ConnectorError::Timeout
        } else {
            ConnectorError::ApiError(e.to_string())
        }
    }
}

/// Map a non-success HTTP status to an error, keeping the body for context.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ConnectorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ConnectorError::RateLimitExceeded);
    }

    let body = response.text().await.unwrap_or_default();
    let message = format!("HTTP {}: {}", status, body);
    if status.is_client_error() {
        Err(ConnectorError::Rejected(message))
    } else {
        Err(ConnectorError::ApiError(message))
    }
}
