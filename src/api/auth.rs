use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::session::User;
use super::{ApiError, check, http_client, require, require_email};

/// Successful login: a session token and the user it belongs to
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Deserialize)]
struct VerifyResponse {
    user: User,
}

/// Why a verification code is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodePurpose {
    Login,
    PasswordReset,
}

#[derive(Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum AuthAction<'a> {
    Login {
        email: &'a str,
        password: &'a str,
        verification_code: &'a str,
    },
    Verify {
        token: &'a str,
    },
    Logout {
        token: &'a str,
    },
}

/// Client for the auth service
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    url: String,
}

impl AuthClient {
    pub fn new(url: &str) -> Result<Self, ApiError> {
        Ok(AuthClient {
            client: http_client()?,
            url: url.to_string(),
        })
    }

    async fn post(&self, action: &AuthAction<'_>, fallback: &str) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(url = %self.url, "auth request");
        let resp = self.client.post(&self.url).json(action).send().await?;
        check(resp, fallback).await
    }

    /// Exchange credentials plus the emailed code for a session token
    pub async fn login(&self, email: &str, password: &str, code: &str) -> Result<AuthResponse, ApiError> {
        require_email(email)?;
        require(password, "password")?;
        require(code, "verification code")?;
        let action = AuthAction::Login {
            email: email.trim(),
            password,
            verification_code: code.trim(),
        };
        let resp = self.post(&action, "Ошибка входа").await?;
        Ok(resp.json().await?)
    }

    /// Resolve a stored token to its user
    pub async fn verify(&self, token: &str) -> Result<User, ApiError> {
        let resp = self.post(&AuthAction::Verify { token }, "Недействительный токен").await?;
        let body: VerifyResponse = resp.json().await?;
        Ok(body.user)
    }

    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.post(&AuthAction::Logout { token }, "Ошибка выхода").await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct SendCode<'a> {
    action: &'static str,
    email: &'a str,
    purpose: CodePurpose,
}

/// Client for the verification-code mailer
#[derive(Debug, Clone)]
pub struct EmailClient {
    client: Client,
    url: String,
}

impl EmailClient {
    pub fn new(url: &str) -> Result<Self, ApiError> {
        Ok(EmailClient {
            client: http_client()?,
            url: url.to_string(),
        })
    }

    pub async fn send_code(&self, email: &str, purpose: CodePurpose) -> Result<(), ApiError> {
        require_email(email)?;
        let body = SendCode {
            action: "send_code",
            email: email.trim(),
            purpose,
        };
        tracing::debug!(url = %self.url, "send_code request");
        let resp = self.client.post(&self.url).json(&body).send().await?;
        check(resp, "Ошибка отправки кода").await?;
        Ok(())
    }
}
