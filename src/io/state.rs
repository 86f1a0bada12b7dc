use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::workspace_io::atomic_write;
use crate::model::ids::ProjectId;
use crate::ops::filter::ObjectFilter;
use crate::ops::selection::Selection;

const STATE_FILE: &str = ".state.json";

/// Persisted view state (written to .state.json)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Project opened with `sm project open`
    #[serde(default)]
    pub active_project: Option<ProjectId>,
    /// Filter applied by `sm objects` and `sm select all` when no flags are given
    #[serde(default)]
    pub filter: ObjectFilter,
    /// Selected object ids, across all projects
    #[serde(default)]
    pub selection: Selection,
}

/// Read .state.json. Missing or unreadable state is the default state.
pub fn read_view_state(dir: &Path) -> ViewState {
    let path = dir.join(STATE_FILE);
    let Ok(content) = fs::read_to_string(&path) else {
        return ViewState::default();
    };
    match serde_json::from_str(&content) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed view state");
            ViewState::default()
        }
    }
}

pub fn write_view_state(dir: &Path, state: &ViewState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(state)?;
    atomic_write(&dir.join(STATE_FILE), content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::ObjectId;
    use crate::ops::filter::{DeliveryFilter, StageFilter, StatusCategory};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut state = ViewState {
            active_project: Some(ProjectId::new("2")),
            filter: ObjectFilter {
                stage: StageFilter::NoStage,
                delivery: DeliveryFilter::parse("4").unwrap(),
                status: StatusCategory::WithPermits,
            },
            ..Default::default()
        };
        state.selection.toggle(ObjectId::new("o-7"));

        write_view_state(dir.path(), &state).unwrap();
        assert_eq!(read_view_state(dir.path()), state);
    }

    #[test]
    fn missing_or_malformed_state_is_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_view_state(dir.path()), ViewState::default());
        fs::write(dir.path().join(STATE_FILE), "[1, 2").unwrap();
        assert_eq!(read_view_state(dir.path()), ViewState::default());
    }
}
