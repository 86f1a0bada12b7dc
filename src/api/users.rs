use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::session::Role;
use super::{ApiError, check, http_client, require, require_email};

const TOKEN_HEADER: &str = "X-Auth-Token";

/// A user account as listed by the admin panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedUser {
    pub id: i64,
    pub email: String,
    #[serde(default, alias = "name")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
}

fn default_active() -> bool {
    true
}

/// One entry of the admin activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user_email: String,
    pub action: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<serde_json::Value>,
    #[serde(default)]
    pub old_values: Option<serde_json::Value>,
    #[serde(default)]
    pub new_values: Option<serde_json::Value>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

/// Partial update; `None` fields are left out of the request
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.role.is_none() && self.is_active.is_none()
    }
}

#[derive(Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum UsersAction<'a> {
    CreateUser {
        #[serde(flatten)]
        user: &'a NewUser,
    },
    UpdateUser {
        user_id: i64,
        #[serde(flatten)]
        update: &'a UserUpdate,
    },
    ChangePassword {
        user_id: i64,
        new_password: &'a str,
    },
}

#[derive(Deserialize)]
struct UsersList {
    #[serde(default)]
    users: Vec<ManagedUser>,
}

#[derive(Deserialize)]
struct LogsList {
    #[serde(default)]
    logs: Vec<ActivityLog>,
}

/// Acknowledgement returned by mutating calls
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Client for the user-management service. Every call is authenticated
/// with the session token.
#[derive(Debug, Clone)]
pub struct UsersClient {
    client: Client,
    url: String,
    token: String,
}

impl UsersClient {
    pub fn new(url: &str, token: &str) -> Result<Self, ApiError> {
        Ok(UsersClient {
            client: http_client()?,
            url: url.to_string(),
            token: token.to_string(),
        })
    }

    async fn get(&self, query: &[(&str, String)], fallback: &str) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(url = %self.url, ?query, "users GET");
        let resp = self
            .client
            .get(&self.url)
            .query(query)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;
        check(resp, fallback).await
    }

    async fn post(&self, action: &UsersAction<'_>, fallback: &str) -> Result<Ack, ApiError> {
        tracing::debug!(url = %self.url, "users POST");
        let resp = self
            .client
            .post(&self.url)
            .header(TOKEN_HEADER, &self.token)
            .json(action)
            .send()
            .await?;
        Ok(check(resp, fallback).await?.json().await?)
    }

    pub async fn list_users(&self) -> Result<Vec<ManagedUser>, ApiError> {
        let resp = self
            .get(&[("action", "list_users".to_string())], "Ошибка загрузки пользователей")
            .await?;
        let list: UsersList = resp.json().await?;
        Ok(list.users)
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<Ack, ApiError> {
        require_email(&user.email)?;
        require(&user.password, "password")?;
        self.post(&UsersAction::CreateUser { user }, "Ошибка создания пользователя")
            .await
    }

    pub async fn update_user(&self, user_id: i64, update: &UserUpdate) -> Result<Ack, ApiError> {
        if update.is_empty() {
            return Err(ApiError::Validation("nothing to update".into()));
        }
        self.post(
            &UsersAction::UpdateUser { user_id, update },
            "Ошибка обновления пользователя",
        )
        .await
    }

    pub async fn change_password(&self, user_id: i64, new_password: &str) -> Result<Ack, ApiError> {
        require(new_password, "new password")?;
        self.post(
            &UsersAction::ChangePassword {
                user_id,
                new_password,
            },
            "Ошибка изменения пароля",
        )
        .await
    }

    pub async fn activity_logs(&self, limit: u32, offset: u32) -> Result<Vec<ActivityLog>, ApiError> {
        let query = [
            ("action", "activity_logs".to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        let resp = self.get(&query, "Ошибка загрузки логов").await?;
        let list: LogsList = resp.json().await?;
        Ok(list.logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn create_body_is_flat() {
        let user = NewUser {
            email: "new@site.ru".into(),
            password: "secret".into(),
            full_name: "Пётр".into(),
            role: Role::Admin,
        };
        assert_eq!(
            serde_json::to_value(UsersAction::CreateUser { user: &user }).unwrap(),
            serde_json::json!({
                "action": "create_user",
                "email": "new@site.ru",
                "password": "secret",
                "full_name": "Пётр",
                "role": "admin"
            })
        );
    }

    #[test]
    fn update_body_omits_unset_fields() {
        let update = UserUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(UsersAction::UpdateUser {
                user_id: 7,
                update: &update
            })
            .unwrap(),
            serde_json::json!({"action": "update_user", "user_id": 7, "is_active": false})
        );
    }

    #[test]
    fn logs_parse_with_optional_fields() {
        let list: LogsList = serde_json::from_str(
            r#"{"logs":[{"id":1,"user_email":"a@b.ru","action":"login","ip_address":"10.0.0.1","created_at":"2024-05-01T10:00:00"},
                        {"id":2,"user_id":3,"user_email":"c@d.ru","action":"update_user","entity_type":"user","entity_id":"3",
                         "old_values":{"role":"user"},"new_values":{"role":"admin"},"ip_address":"10.0.0.2","created_at":null}]}"#,
        )
        .unwrap();
        assert_eq!(list.logs.len(), 2);
        assert_eq!(list.logs[0].user_id, None);
        assert_eq!(list.logs[1].entity_type.as_deref(), Some("user"));
    }

    #[test]
    fn users_parse_defaults() {
        let list: UsersList =
            serde_json::from_str(r#"{"users":[{"id":1,"email":"a@b.ru","role":"admin"}]}"#).unwrap();
        assert!(list.users[0].is_active);
        assert_eq!(list.users[0].role, Role::Admin);
    }
}
