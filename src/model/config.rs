use serde::{Deserialize, Serialize};

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub workspace: WorkspaceInfo,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub stages: StageConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    #[serde(default)]
    pub name: String,
}

/// Endpoints of the external backend services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_users_url")]
    pub users_url: String,
    #[serde(default = "default_email_url")]
    pub email_url: String,
    #[serde(default = "default_contact_url")]
    pub contact_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            auth_url: default_auth_url(),
            users_url: default_users_url(),
            email_url: default_email_url(),
            contact_url: default_contact_url(),
        }
    }
}

fn default_auth_url() -> String {
    "http://localhost:8000/auth".to_string()
}

fn default_users_url() -> String {
    "http://localhost:8000/users".to_string()
}

fn default_email_url() -> String {
    "http://localhost:8000/email".to_string()
}

fn default_contact_url() -> String {
    "http://localhost:8000/contact".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Guard portfolio commands behind a stored session
    #[serde(default)]
    pub require_login: bool,
}

/// What happens to objects that reference a deleted stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageDeletePolicy {
    /// Remove the referencing objects along with the stage
    #[default]
    Cascade,
    /// Keep the objects and clear their stage reference
    Detach,
}

impl StageDeletePolicy {
    pub fn parse(s: &str) -> Option<StageDeletePolicy> {
        match s {
            "cascade" => Some(StageDeletePolicy::Cascade),
            "detach" => Some(StageDeletePolicy::Detach),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageDeletePolicy::Cascade => "cascade",
            StageDeletePolicy::Detach => "detach",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(default)]
    pub on_delete: StageDeletePolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for exported workbooks, relative to the workspace root.
    /// Empty means the current directory.
    #[serde(default)]
    pub dir: String,
}

/// Columns shown by `sm objects` when config.toml has no `[columns]` table
pub const DEFAULT_VISIBLE_COLUMNS: [&str; 5] = ["id", "name", "stage", "deliveryStage", "workStatus"];

/// Object table layout. Column keys are the workbook field keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnsConfig {
    /// Shown columns, in order
    #[serde(default = "default_visible_columns")]
    pub visible: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ColumnGroupConfig>,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        ColumnsConfig {
            visible: default_visible_columns(),
            groups: Vec::new(),
        }
    }
}

fn default_visible_columns() -> Vec<String> {
    DEFAULT_VISIBLE_COLUMNS.iter().map(|k| k.to_string()).collect()
}

/// Named run of columns; a collapsed group shows as a single placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnGroupConfig {
    pub label: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub collapsed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.stages.on_delete, StageDeletePolicy::Cascade);
        assert!(!config.auth.require_login);
        assert_eq!(config.api.auth_url, "http://localhost:8000/auth");
    }

    #[test]
    fn columns_table_parses_groups() {
        let config: AppConfig = toml::from_str(
            r#"
[columns]
visible = ["name", "region", "inspection"]

[[columns.groups]]
label = "Разрешения"
columns = ["inspection"]
collapsed = true
"#,
        )
        .unwrap();
        assert_eq!(config.columns.visible, vec!["name", "region", "inspection"]);
        assert_eq!(config.columns.groups.len(), 1);
        assert!(config.columns.groups[0].collapsed);

        let empty: AppConfig = toml::from_str("").unwrap();
        assert_eq!(empty.columns, ColumnsConfig::default());
    }

    #[test]
    fn detach_policy_parses() {
        let config: AppConfig = toml::from_str("[stages]\non_delete = \"detach\"\n").unwrap();
        assert_eq!(config.stages.on_delete, StageDeletePolicy::Detach);
    }
}
