use reqwest::Client;
use serde::Serialize;

use super::{ApiError, check, http_client, require, require_email};

/// A message submitted through the contact form
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> Result<(), ApiError> {
        require(&self.name, "name")?;
        require_email(&self.email)?;
        require(&self.message, "message")
    }
}

#[derive(Debug, Clone)]
pub struct ContactClient {
    client: Client,
    url: String,
}

impl ContactClient {
    pub fn new(url: &str) -> Result<Self, ApiError> {
        Ok(ContactClient {
            client: http_client()?,
            url: url.to_string(),
        })
    }

    pub async fn submit(&self, msg: &ContactMessage) -> Result<(), ApiError> {
        msg.validate()?;
        tracing::debug!(url = %self.url, "contact submit");
        let resp = self.client.post(&self.url).json(msg).send().await?;
        check(resp, "Ошибка отправки сообщения").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(name: &str, email: &str, message: &str) -> ContactMessage {
        ContactMessage {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    #[test]
    fn all_fields_required() {
        assert!(msg("Анна", "a@b.ru", "Здравствуйте").validate().is_ok());
        assert!(matches!(msg("", "a@b.ru", "x").validate(), Err(ApiError::Validation(_))));
        assert!(matches!(msg("Анна", "", "x").validate(), Err(ApiError::Validation(_))));
        assert!(matches!(msg("Анна", "a@b.ru", "  ").validate(), Err(ApiError::Validation(_))));
    }
}
