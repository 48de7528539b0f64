//! Small helpers for rate-limit friendly networking.
//!
//! Every storefront response is classified purely by HTTP status:
//! 404 is terminal, 429 means back off, anything else (including transport
//! failures with no response at all) is a generic retryable error.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the storefront API boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The backend answered 404.
    #[error("not found")]
    NotFound,

    /// The backend answered 429.
    #[error("too many requests")]
    RateLimited,

    /// Any other non-success status.
    #[error("http {0}")]
    Status(u16),

    /// No HTTP response (DNS, connect, timeout, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// A response arrived but its body did not decode.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Coarse classification used by callers to pick a recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    RateLimited,
    NetworkOrServer,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotFound => ErrorKind::NotFound,
            ApiError::RateLimited => ErrorKind::RateLimited,
            _ => ErrorKind::NetworkOrServer,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() != ErrorKind::NotFound
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return classify_status(status).unwrap_or(ApiError::Status(status.as_u16()));
        }
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

/// Map a response status to an error, `None` for success.
pub fn classify_status(status: StatusCode) -> Option<ApiError> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        other => ApiError::Status(other.as_u16()),
    })
}

/// Linear backoff: `base * retry_count`, zero for the first attempt.
pub fn backoff_delay(retry_count: u32, base: Duration) -> Duration {
    base.saturating_mul(retry_count)
}

/// Send a request and turn non-success statuses into [`ApiError`].
pub async fn send_classified(
    rb: reqwest::RequestBuilder,
    label: &str,
) -> Result<reqwest::Response, ApiError> {
    let res = match rb.send().await {
        Ok(r) => r,
        Err(e) => {
            log::warn!("[net] err {label}: {e}");
            return Err(ApiError::from(e));
        }
    };
    match classify_status(res.status()) {
        None => Ok(res),
        Some(err) => {
            if err == ApiError::RateLimited {
                log::warn!("[net] 429 {label}");
            } else {
                log::debug!("[net] {} {label}", res.status());
            }
            Err(err)
        }
    }
}
