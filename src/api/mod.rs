//! Typed clients for the external backend services.
//!
//! Every service takes a JSON body with an `action` field and answers with
//! JSON. Failures carry an `{"error": "..."}` body.

pub mod auth;
pub mod contact;
pub mod session;
pub mod users;

use std::sync::LazyLock;

use regex::Regex;
use reqwest::{Client, Response};
use serde::Deserialize;

pub use auth::{AuthClient, AuthResponse, CodePurpose, EmailClient};
pub use contact::{ContactClient, ContactMessage};
pub use session::{Access, Role, Route, Session, User, guard};
pub use users::{ActivityLog, ManagedUser, NewUser, UserUpdate, UsersClient};

/// Error type for backend calls
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx answer; the message comes from the body or a per-call fallback
    #[error("{message} (HTTP {status})")]
    Backend { status: u16, message: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Validation(String),
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Fail with a validation error when `value` is blank
pub(crate) fn require(value: &str, what: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", what)));
    }
    Ok(())
}

pub(crate) fn require_email(email: &str) -> Result<(), ApiError> {
    require(email, "email")?;
    if !is_valid_email(email) {
        return Err(ApiError::Validation(format!("invalid email: {}", email.trim())));
    }
    Ok(())
}

pub(crate) fn http_client() -> Result<Client, ApiError> {
    Ok(Client::builder()
        .user_agent(concat!("sitemon/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Extract the backend's error message from a response body
pub(crate) fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Pass 2xx responses through; turn anything else into `ApiError::Backend`
pub(crate) async fn check(resp: Response, fallback: &str) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body, fallback);
    tracing::debug!(status = status.as_u16(), %message, "backend error");
    Err(ApiError::Backend {
        status: status.as_u16(),
        message,
    })
}
