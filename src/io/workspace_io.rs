use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::config::AppConfig;
use crate::model::project::Portfolio;

/// Name of the workspace directory under the workspace root
pub const WORKSPACE_DIR: &str = "sitemon";
pub const CONFIG_FILE: &str = "config.toml";
pub const PORTFOLIO_FILE: &str = "portfolio.json";

/// Error type for workspace I/O operations
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not a sitemon workspace: no sitemon/config.toml found (run `sm init`)")]
    NotAWorkspace,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not parse config.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("could not parse {path}: {source}")]
    PortfolioParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize portfolio: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A discovered workspace: its root, its `sitemon/` directory and the
/// parsed configuration.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub dir: PathBuf,
    pub config: AppConfig,
}

/// Discover the workspace by walking up from the given directory, looking
/// for a `sitemon/config.toml`.
pub fn discover_workspace(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut current = start.to_path_buf();
    loop {
        let dir = current.join(WORKSPACE_DIR);
        if dir.is_dir() && dir.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(WorkspaceError::NotAWorkspace);
        }
    }
}

/// Load the workspace rooted at `root` (config only; the portfolio is read
/// separately so read-only commands never take the lock).
pub fn load_workspace(root: &Path) -> Result<Workspace, WorkspaceError> {
    let dir = root.join(WORKSPACE_DIR);
    if !dir.is_dir() {
        return Err(WorkspaceError::NotAWorkspace);
    }
    let config_path = dir.join(CONFIG_FILE);
    let text = fs::read_to_string(&config_path).map_err(|e| WorkspaceError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: AppConfig = toml::from_str(&text)?;
    Ok(Workspace {
        root: root.to_path_buf(),
        dir,
        config,
    })
}

/// Read the portfolio document. A missing file is an empty portfolio.
pub fn load_portfolio(dir: &Path) -> Result<Portfolio, WorkspaceError> {
    let path = dir.join(PORTFOLIO_FILE);
    if !path.exists() {
        return Ok(Portfolio::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| WorkspaceError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| WorkspaceError::PortfolioParseError { path, source: e })
}

/// Replace the portfolio document in one atomic step
pub fn save_portfolio(dir: &Path, portfolio: &Portfolio) -> Result<(), WorkspaceError> {
    let path = dir.join(PORTFOLIO_FILE);
    let mut content = serde_json::to_string_pretty(portfolio)?;
    content.push('\n');
    atomic_write(&path, content.as_bytes()).map_err(|e| WorkspaceError::WriteError { path, source: e })?;
    tracing::debug!(projects = portfolio.projects.len(), "portfolio saved");
    Ok(())
}

/// Write content to a file atomically: write to a temp file in the same
/// directory, then rename over the target.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
