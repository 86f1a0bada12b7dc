use std::fs;
use std::path::Path;

use super::start_dir;
use crate::cli::commands::InitArgs;
use crate::io::state::{ViewState, write_view_state};
use crate::io::workspace_io::{self, CONFIG_FILE, WORKSPACE_DIR};
use crate::model::project::Portfolio;

const CONFIG_TEMPLATE: &str = r##"[workspace]
name = {name}

# --- Backend ---
# Endpoints of the auth, users, email and contact services.
[api]
auth_url = "http://localhost:8000/auth"
users_url = "http://localhost:8000/users"
email_url = "http://localhost:8000/email"
contact_url = "http://localhost:8000/contact"

[auth]
# Refuse portfolio commands until `sm login` has stored a session
require_login = false

# --- Stages ---
# When a stage is deleted, objects pointing at it are either removed
# ("cascade") or kept with no stage ("detach").
[stages]
on_delete = "cascade"

# --- Export ---
# Directory for exported workbooks, relative to the workspace root.
# Empty means the current directory.
[export]
dir = ""

# --- Object table ---
# Columns shown by `sm objects`, in order. Run `sm columns` for every key.
# Groups are optional:
#   [[columns.groups]]
#   label = "Разрешения"
#   columns = ["poleInstallationPermit", "powerConnectionPermit"]
#   collapsed = false
[columns]
visible = ["id", "name", "stage", "deliveryStage", "workStatus"]
"##;

const DEMO_PORTFOLIO: &str = include_str!("demo_portfolio.json");

/// Infer a workspace name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + &chars.collect::<String>()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_config(name: &str) -> String {
    // a bare Value has no decor, so Display is just the quoted string
    let quoted = toml_edit::Value::from(name).to_string();
    CONFIG_TEMPLATE.replace("{name}", &quoted)
}

fn demo_portfolio() -> Result<Portfolio, serde_json::Error> {
    serde_json::from_str(DEMO_PORTFOLIO)
}

pub fn cmd_init(args: InitArgs, dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root = start_dir(dir)?;
    init_at(&root, args)
}

fn init_at(root: &Path, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ws_dir = root.join(WORKSPACE_DIR);

    if ws_dir.join(CONFIG_FILE).exists() && !args.force {
        return Err("workspace already exists in ./sitemon/ (use --force to reinitialize)".into());
    }

    if let Some(parent) = root.parent()
        && let Ok(parent_root) = workspace_io::discover_workspace(parent)
    {
        eprintln!(
            "Note: parent workspace found at {}/",
            parent_root.join(WORKSPACE_DIR).display()
        );
        eprintln!("Creating new workspace in ./sitemon/");
    }

    let name = args.name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let portfolio = if args.demo {
        demo_portfolio()?
    } else {
        Portfolio::default()
    };

    fs::create_dir_all(&ws_dir)?;
    workspace_io::atomic_write(&ws_dir.join(CONFIG_FILE), render_config(&name).as_bytes())?;
    workspace_io::save_portfolio(&ws_dir, &portfolio)?;
    write_view_state(&ws_dir, &ViewState::default())?;
    tracing::info!(root = %root.display(), demo = args.demo, "workspace initialized");

    println!("Initialized sitemon workspace: {}", name);
    if args.demo {
        let objects: usize = portfolio.projects.iter().map(|p| p.objects.len()).sum();
        println!(
            "  seeded {} projects, {} objects",
            portfolio.projects.len(),
            objects
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::{AppConfig, StageDeletePolicy};
    use crate::ops::check::check_portfolio;
    use tempfile::TempDir;

    fn args(demo: bool, force: bool) -> InitArgs {
        InitArgs {
            name: Some("Тест".to_string()),
            demo,
            force,
        }
    }

    #[test]
    fn test_infer_name() {
        assert_eq!(infer_name("road-works"), "Road Works");
        assert_eq!(infer_name("sitemon"), "Sitemon");
    }

    #[test]
    fn test_render_config_parses() {
        let text = render_config("Объекты \"Юг\"");
        let config: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.workspace.name, "Объекты \"Юг\"");
        assert_eq!(config.stages.on_delete, StageDeletePolicy::Cascade);
        assert!(!config.auth.require_login);
        assert_eq!(config.columns, crate::model::config::ColumnsConfig::default());
    }

    #[test]
    fn test_demo_portfolio_is_valid() {
        let portfolio = demo_portfolio().unwrap();
        assert_eq!(portfolio.projects.len(), 3);
        assert!(check_portfolio(&portfolio).valid);
    }

    #[test]
    fn test_init_refuses_existing_workspace() {
        let tmp = TempDir::new().unwrap();
        init_at(tmp.path(), args(false, false)).unwrap();
        assert!(init_at(tmp.path(), args(false, false)).is_err());
        init_at(tmp.path(), args(true, true)).unwrap();

        let dir = tmp.path().join(WORKSPACE_DIR);
        let portfolio = workspace_io::load_portfolio(&dir).unwrap();
        assert_eq!(portfolio.projects.len(), 3);
        let ws = workspace_io::load_workspace(tmp.path()).unwrap();
        assert_eq!(ws.config.workspace.name, "Тест");
    }
}
