mod account;
mod init;
mod portfolio;
mod settings;
mod sheet;

pub use init::cmd_init;

use std::future::Future;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::api::session::{Access, Route, Session, guard};
use crate::cli::commands::*;
use crate::io::lock::WorkspaceLock;
use crate::io::state::{ViewState, read_view_state, write_view_state};
use crate::io::store::LocalStore;
use crate::io::workspace_io::{self, Workspace, WorkspaceError};
use crate::model::ids::ProjectId;
use crate::model::project::{Portfolio, Project};
use crate::model::status::StatusRegistry;

pub(crate) type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let ctx = Ctx::new(cli.workspace_dir.as_deref(), cli.json)?;

    match cli.command {
        // Init is handled in main.rs before workspace discovery
        Commands::Init(args) => cmd_init(args, cli.workspace_dir.as_deref()),

        // Portfolio
        Commands::Projects => portfolio::cmd_projects(&ctx),
        Commands::Project(cmd) => portfolio::cmd_project(&ctx, cmd),
        Commands::Stages(scope) => portfolio::cmd_stages(&ctx, scope),
        Commands::Stage(cmd) => portfolio::cmd_stage(&ctx, cmd),
        Commands::Objects(args) => portfolio::cmd_objects(&ctx, args),
        Commands::Object(cmd) => portfolio::cmd_object(&ctx, cmd),
        Commands::Select(cmd) => portfolio::cmd_select(&ctx, cmd),
        Commands::Bulk(cmd) => portfolio::cmd_bulk(&ctx, cmd),
        Commands::Stats => portfolio::cmd_stats(&ctx),
        Commands::Check => portfolio::cmd_check(&ctx),
        Commands::Violations => portfolio::cmd_violations(&ctx),

        // Spreadsheets
        Commands::Export(args) => sheet::cmd_export(&ctx, args),
        Commands::Import(args) => sheet::cmd_import(&ctx, args),

        // Accounts
        Commands::Login(args) => account::cmd_login(&ctx, args),
        Commands::Logout => account::cmd_logout(&ctx),
        Commands::Whoami => account::cmd_whoami(&ctx),
        Commands::Users(cmd) => account::cmd_users(&ctx, cmd),
        Commands::Contact(args) => account::cmd_contact(&ctx, args),

        // Settings
        Commands::Status(cmd) => settings::cmd_status(&ctx, cmd),
        Commands::Columns(cmd) => settings::cmd_columns(&ctx, cmd),
        Commands::Config(cmd) => settings::cmd_config(&ctx, cmd),
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Where to look for the workspace, and how to print
pub(crate) struct Ctx {
    start: PathBuf,
    pub json: bool,
}

impl Ctx {
    fn new(dir: Option<&str>, json: bool) -> Result<Ctx, Box<dyn std::error::Error>> {
        Ok(Ctx {
            start: start_dir(dir)?,
            json,
        })
    }

    pub fn workspace(&self) -> Result<Workspace, WorkspaceError> {
        let root = workspace_io::discover_workspace(&self.start)?;
        workspace_io::load_workspace(&root)
    }

    /// Resolve a path given on the command line against the -C directory
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.start.join(path)
    }

    /// Load the portfolio and view state for a read-only command
    pub fn load(&self) -> Result<Loaded, Box<dyn std::error::Error>> {
        let ws = self.workspace()?;
        require_dashboard(&ws)?;
        Loaded::read(ws, None)
    }

    /// Lock the workspace, then load it for a read-modify-write
    pub fn load_for_write(&self) -> Result<Loaded, Box<dyn std::error::Error>> {
        let ws = self.workspace()?;
        require_dashboard(&ws)?;
        let lock = WorkspaceLock::acquire_default(&ws.dir)?;
        Loaded::read(ws, Some(lock))
    }
}

/// Resolve the -C override, or the current directory
pub(crate) fn start_dir(dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match dir {
        Some(dir) => Ok(std::fs::canonicalize(dir).map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

/// A loaded workspace: config, portfolio and view state. Holds the write
/// lock when loaded for writing.
pub(crate) struct Loaded {
    pub ws: Workspace,
    pub portfolio: Portfolio,
    pub state: ViewState,
    _lock: Option<WorkspaceLock>,
}

impl Loaded {
    fn read(ws: Workspace, lock: Option<WorkspaceLock>) -> Result<Loaded, Box<dyn std::error::Error>> {
        let portfolio = workspace_io::load_portfolio(&ws.dir)?;
        let state = read_view_state(&ws.dir);
        Ok(Loaded {
            ws,
            portfolio,
            state,
            _lock: lock,
        })
    }

    pub fn registry(&self) -> StatusRegistry {
        LocalStore::open(&self.ws.dir).status_registry()
    }

    /// The project named by `--project`, else the open project, else the
    /// only project in the portfolio
    pub fn project_id(&self, flag: Option<&str>) -> Result<ProjectId, String> {
        if let Some(id) = flag {
            let id = ProjectId::new(id);
            return match self.portfolio.project(&id) {
                Some(_) => Ok(id),
                None => Err(format!("project not found: {}", id)),
            };
        }
        if let Some(id) = &self.state.active_project
            && self.portfolio.project(id).is_some()
        {
            return Ok(id.clone());
        }
        match self.portfolio.projects.as_slice() {
            [only] => Ok(only.id.clone()),
            [] => Err("no projects yet: run `sm project add`".to_string()),
            _ => Err("no project selected: pass --project or run `sm project open <id>`".to_string()),
        }
    }

    pub fn project(&self, flag: Option<&str>) -> Result<&Project, String> {
        let id = self.project_id(flag)?;
        self.portfolio
            .project(&id)
            .ok_or_else(|| format!("project not found: {}", id))
    }

    /// Replace the portfolio on disk and drop selected or opened ids that no
    /// longer exist
    pub fn commit(&mut self, next: Portfolio) -> CmdResult {
        self.write_portfolio(next)?;
        Ok(())
    }

    /// Like `commit`, for operations that already changed the view state:
    /// the state is written only once the portfolio is on disk.
    pub fn commit_with_state(&mut self, next: Portfolio) -> CmdResult {
        if !self.write_portfolio(next)? {
            self.save_state()?;
        }
        Ok(())
    }

    /// Returns whether the view state was rewritten
    fn write_portfolio(&mut self, next: Portfolio) -> Result<bool, Box<dyn std::error::Error>> {
        workspace_io::save_portfolio(&self.ws.dir, &next)?;
        let pruned = self.state.selection.prune(&next);
        let closed = match &self.state.active_project {
            Some(id) => next.project(id).is_none(),
            None => false,
        };
        if closed {
            self.state.active_project = None;
        }
        self.portfolio = next;
        if pruned > 0 || closed {
            tracing::debug!(pruned, closed, "view state pruned");
            self.save_state()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn save_state(&self) -> CmdResult {
        write_view_state(&self.ws.dir, &self.state)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

const LOGIN_HINT: &str = "login required: run `sm login <email> --password <password>`";

/// Portfolio commands need a session when `auth.require_login` is set
fn require_dashboard(ws: &Workspace) -> CmdResult {
    if !ws.config.auth.require_login {
        return Ok(());
    }
    let session = LocalStore::open(&ws.dir).session();
    match guard(Route::Dashboard, session.as_ref()) {
        Access::Allow => Ok(()),
        Access::Redirect(_) => Err(LOGIN_HINT.into()),
    }
}

/// User administration needs an admin session
pub(crate) fn require_admin(ws: &Workspace) -> Result<Session, Box<dyn std::error::Error>> {
    let session = LocalStore::open(&ws.dir).session();
    match (guard(Route::Admin, session.as_ref()), session) {
        (Access::Allow, Some(session)) => Ok(session),
        (Access::Redirect(Route::Dashboard), _) => Err("admin role required".into()),
        _ => Err(LOGIN_HINT.into()),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Drive a backend call to completion on a single-threaded runtime
pub(crate) fn block_on<F: Future>(fut: F) -> Result<F::Output, std::io::Error> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    Ok(rt.block_on(fut))
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| format!("invalid date: {} (expected YYYY-MM-DD)", s))
}

pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::workspace_io::PORTFOLIO_FILE;
    use crate::model::config::AppConfig;
    use crate::model::ids::ObjectId;
    use tempfile::TempDir;

    fn loaded_in(tmp: &TempDir) -> Loaded {
        let dir = tmp.path().join("sitemon");
        std::fs::create_dir_all(&dir).unwrap();
        let mut state = ViewState::default();
        state.selection.toggle(ObjectId::new("1-1"));
        write_view_state(&dir, &state).unwrap();
        Loaded {
            ws: Workspace {
                root: tmp.path().to_path_buf(),
                dir,
                config: AppConfig::default(),
            },
            portfolio: Portfolio::default(),
            state,
            _lock: None,
        }
    }

    #[test]
    fn test_failed_portfolio_write_keeps_view_state() {
        let tmp = TempDir::new().unwrap();
        let mut loaded = loaded_in(&tmp);
        // a non-empty directory in place of the portfolio file makes the rename fail
        let blocker = loaded.ws.dir.join(PORTFOLIO_FILE);
        std::fs::create_dir_all(blocker.join("keep")).unwrap();

        loaded.state.selection.clear();
        assert!(loaded.commit_with_state(Portfolio::default()).is_err());

        let on_disk = read_view_state(&loaded.ws.dir);
        assert!(on_disk.selection.contains(&ObjectId::new("1-1")));
    }

    #[test]
    fn test_commit_with_state_writes_state_after_portfolio() {
        let tmp = TempDir::new().unwrap();
        let mut loaded = loaded_in(&tmp);

        loaded.state.selection.clear();
        loaded.commit_with_state(Portfolio::default()).unwrap();

        assert!(read_view_state(&loaded.ws.dir).selection.is_empty());
        assert!(loaded.ws.dir.join(PORTFOLIO_FILE).is_file());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-05-11").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 11).unwrap()
        );
        assert!(parse_date("11.05.2024").is_err());
    }
}
