use std::fs;
use std::path::Path;

use crate::io::workspace_io::{CONFIG_FILE, WorkspaceError, atomic_write};
use crate::model::config::{AppConfig, ColumnsConfig, StageDeletePolicy};
use crate::sheet::layout::{self, LayoutError};

/// Error type for `sm config set`
#[derive(Debug, thiserror::Error)]
pub enum ConfigEditError {
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value} (expected {expected})")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Keys editable through `sm config set`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    WorkspaceName,
    StageOnDelete,
    RequireLogin,
    AuthUrl,
    UsersUrl,
    EmailUrl,
    ContactUrl,
    ExportDir,
    ColumnsVisible,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 9] = [
        ConfigKey::WorkspaceName,
        ConfigKey::StageOnDelete,
        ConfigKey::RequireLogin,
        ConfigKey::AuthUrl,
        ConfigKey::UsersUrl,
        ConfigKey::EmailUrl,
        ConfigKey::ContactUrl,
        ConfigKey::ExportDir,
        ConfigKey::ColumnsVisible,
    ];

    /// Dotted `table.field` path
    pub fn path(self) -> &'static str {
        match self {
            ConfigKey::WorkspaceName => "workspace.name",
            ConfigKey::StageOnDelete => "stages.on_delete",
            ConfigKey::RequireLogin => "auth.require_login",
            ConfigKey::AuthUrl => "api.auth_url",
            ConfigKey::UsersUrl => "api.users_url",
            ConfigKey::EmailUrl => "api.email_url",
            ConfigKey::ContactUrl => "api.contact_url",
            ConfigKey::ExportDir => "export.dir",
            ConfigKey::ColumnsVisible => "columns.visible",
        }
    }

    pub fn parse(s: &str) -> Result<ConfigKey, ConfigEditError> {
        ConfigKey::ALL
            .into_iter()
            .find(|k| k.path() == s)
            .ok_or_else(|| ConfigEditError::UnknownKey(s.to_string()))
    }
}

/// Read the workspace config, returning both the parsed config and the raw
/// toml_edit document for comment-preserving edits.
pub fn read_config(dir: &Path) -> Result<(AppConfig, toml_edit::DocumentMut), WorkspaceError> {
    let path = dir.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|e| WorkspaceError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    let config: AppConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

pub fn write_config(dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), WorkspaceError> {
    let path = dir.join(CONFIG_FILE);
    atomic_write(&path, doc.to_string().as_bytes()).map_err(|e| WorkspaceError::WriteError { path, source: e })
}

/// Validate `raw` for `key` and store it in the document
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: ConfigKey, raw: &str) -> Result<(), ConfigEditError> {
    let (table, field) = key.path().split_once('.').unwrap_or(("", key.path()));
    let value = match key {
        ConfigKey::StageOnDelete => {
            let policy = StageDeletePolicy::parse(raw).ok_or_else(|| ConfigEditError::InvalidValue {
                key: key.path(),
                value: raw.to_string(),
                expected: "cascade or detach",
            })?;
            toml_edit::value(policy.as_str())
        }
        ConfigKey::RequireLogin => {
            let flag: bool = raw.parse().map_err(|_| ConfigEditError::InvalidValue {
                key: key.path(),
                value: raw.to_string(),
                expected: "true or false",
            })?;
            toml_edit::value(flag)
        }
        ConfigKey::ColumnsVisible => {
            let columns = layout::parse_column_list(raw)?;
            toml_edit::value(key_array(columns.iter().map(|c| c.key())))
        }
        _ => toml_edit::value(raw),
    };
    ensure_table(doc, table);
    doc[table][field] = value;
    Ok(())
}

fn ensure_table(doc: &mut toml_edit::DocumentMut, table: &str) {
    if !doc.contains_key(table) {
        doc[table] = toml_edit::Item::Table(toml_edit::Table::new());
    }
}

fn key_array<'a>(keys: impl Iterator<Item = &'a str>) -> toml_edit::Array {
    keys.collect()
}

/// Store a whole object table layout, keeping the rest of the document
pub fn set_columns(doc: &mut toml_edit::DocumentMut, columns: &ColumnsConfig) {
    ensure_table(doc, "columns");
    doc["columns"]["visible"] = toml_edit::value(key_array(columns.visible.iter().map(String::as_str)));
    if columns.groups.is_empty() {
        if let Some(table) = doc["columns"].as_table_mut() {
            table.remove("groups");
        }
        return;
    }
    let mut groups = toml_edit::ArrayOfTables::new();
    for group in &columns.groups {
        let mut table = toml_edit::Table::new();
        table["label"] = toml_edit::value(group.label.as_str());
        table["columns"] = toml_edit::value(key_array(group.columns.iter().map(String::as_str)));
        table["collapsed"] = toml_edit::value(group.collapsed);
        groups.push(table);
    }
    doc["columns"]["groups"] = toml_edit::Item::ArrayOfTables(groups);
}

/// Drop the `[columns]` table so the default layout applies
pub fn reset_columns(doc: &mut toml_edit::DocumentMut) {
    doc.remove("columns");
}
