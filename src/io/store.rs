use std::fs;
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::{io::Write, os::unix::fs::OpenOptionsExt};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::api::session::{Session, User};
use crate::model::status::{StatusOption, StatusRegistry};

const STORE_FILE: &str = ".store.json";

pub const AUTH_TOKEN: &str = "auth_token";
pub const AUTH_USER: &str = "auth_user";
pub const STATUS_OPTIONS: &str = "status_options";

/// Key-value store kept in `.store.json`.
///
/// Each key is decoded on its own: a value that does not parse is treated as
/// absent and leaves the other keys usable.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl LocalStore {
    pub fn open(dir: &Path) -> LocalStore {
        let path = dir.join(STORE_FILE);
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring malformed local store");
                Map::new()
            }),
            Err(_) => Map::new(),
        };
        LocalStore { path, entries }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring malformed stored value");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), serde_json::Error> {
        self.entries.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// The stored session, if both the token and the user are present
    pub fn session(&self) -> Option<Session> {
        let token: String = self.get(AUTH_TOKEN)?;
        let user: User = self.get(AUTH_USER)?;
        Some(Session { token, user })
    }

    pub fn set_session(&mut self, session: &Session) -> Result<(), serde_json::Error> {
        self.set(AUTH_TOKEN, &session.token)?;
        self.set(AUTH_USER, &session.user)
    }

    pub fn clear_session(&mut self) {
        self.remove(AUTH_TOKEN);
        self.remove(AUTH_USER);
    }

    pub fn status_registry(&self) -> StatusRegistry {
        StatusRegistry::from_stored(self.get::<Vec<StatusOption>>(STATUS_OPTIONS))
    }

    pub fn set_status_registry(&mut self, registry: &StatusRegistry) -> Result<(), serde_json::Error> {
        self.set(STATUS_OPTIONS, &registry.options())
    }

    pub fn save(&self) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(&self.entries)?;
        secure_write(&self.path, &content)
    }
}

/// The store holds a session token, so it is readable by the owner only
fn secure_write(path: &Path, content: &str) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?
            .write_all(content.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        fs::write(path, content)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::session::Role;
    use crate::model::object::WorkStatus;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn session() -> Session {
        Session {
            token: "tok-1".into(),
            user: User {
                id: 4,
                email: "admin@site.ru".into(),
                full_name: Some("Администратор".into()),
                role: Role::Admin,
            },
        }
    }

    #[test]
    fn session_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mut store = LocalStore::open(tmp.path());
        assert_eq!(store.session(), None);
        store.set_session(&session()).unwrap();
        store.save().unwrap();

        let mut reopened = LocalStore::open(tmp.path());
        assert_eq!(reopened.session(), Some(session()));
        reopened.clear_session();
        reopened.save().unwrap();
        assert_eq!(LocalStore::open(tmp.path()).session(), None);
    }

    #[test]
    fn malformed_key_does_not_poison_others() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(STORE_FILE),
            r#"{"auth_token":"tok","auth_user":{"id":"nope"},"status_options":[{"value":"paused","label":"Стоп","color":"red","bgClass":"bg-red-500","textClass":"text-red-700","borderClass":"border-red-500/20"}]}"#,
        )
        .unwrap();
        let store = LocalStore::open(tmp.path());
        assert_eq!(store.session(), None);
        assert_eq!(store.get::<String>(AUTH_TOKEN).as_deref(), Some("tok"));
        let reg = store.status_registry();
        assert_eq!(reg.options().len(), 1);
        assert_eq!(reg.label(WorkStatus::Paused), "Стоп");
    }

    #[test]
    fn malformed_file_is_empty_store() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(STORE_FILE), "not json").unwrap();
        let store = LocalStore::open(tmp.path());
        assert_eq!(store.status_registry(), StatusRegistry::default());
    }

    #[test]
    fn invalid_status_list_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(STORE_FILE), r#"{"status_options":[]}"#).unwrap();
        assert_eq!(LocalStore::open(tmp.path()).status_registry(), StatusRegistry::default());
    }

    #[cfg(unix)]
    #[test]
    fn store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let mut store = LocalStore::open(tmp.path());
        store.set_session(&session()).unwrap();
        store.save().unwrap();
        let mode = fs::metadata(tmp.path().join(STORE_FILE)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
