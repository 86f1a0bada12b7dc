use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{ObjectId, ProjectId, StageId};
use super::object::ProjectObject;
use super::stage::Stage;

/// Placeholder rendered for an object whose stage no longer exists
pub const DELETED_STAGE_LABEL: &str = "Этап удален";

/// Infrastructure category of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Road,
    Bridge,
    Utility,
}

impl ProjectKind {
    pub fn parse(s: &str) -> Option<ProjectKind> {
        match s {
            "road" => Some(ProjectKind::Road),
            "bridge" => Some(ProjectKind::Bridge),
            "utility" => Some(ProjectKind::Utility),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectKind::Road => write!(f, "road"),
            ProjectKind::Bridge => write!(f, "bridge"),
            ProjectKind::Utility => write!(f, "utility"),
        }
    }
}

/// Overall schedule health of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectHealth {
    #[default]
    OnTrack,
    AtRisk,
    Delayed,
}

impl ProjectHealth {
    pub fn parse(s: &str) -> Option<ProjectHealth> {
        match s {
            "on-track" => Some(ProjectHealth::OnTrack),
            "at-risk" => Some(ProjectHealth::AtRisk),
            "delayed" => Some(ProjectHealth::Delayed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProjectHealth::OnTrack => "По плану",
            ProjectHealth::AtRisk => "Риски",
            ProjectHealth::Delayed => "Задержка",
        }
    }
}

impl fmt::Display for ProjectHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectHealth::OnTrack => write!(f, "on-track"),
            ProjectHealth::AtRisk => write!(f, "at-risk"),
            ProjectHealth::Delayed => write!(f, "delayed"),
        }
    }
}

/// An infrastructure project. Owns its stages and objects exclusively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProjectKind,
    /// Percentage, 0–100. Display-only; not derived from stages.
    pub progress: u8,
    pub budget: f64,
    pub spent: f64,
    pub status: ProjectHealth,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub objects: Vec<ProjectObject>,
}

impl Project {
    pub fn stage(&self, id: &StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| &s.id == id)
    }

    pub fn object(&self, id: &ObjectId) -> Option<&ProjectObject> {
        self.objects.iter().find(|o| &o.id == id)
    }

    pub fn has_stage(&self, id: &StageId) -> bool {
        self.stage(id).is_some()
    }

    /// Resolve an object's stage reference to a display name.
    ///
    /// `None` when the object has no stage; the deleted-stage placeholder when
    /// the reference no longer resolves.
    pub fn stage_label(&self, object: &ProjectObject) -> Option<&str> {
        let id = object.stage_id.as_ref()?;
        Some(
            self.stage(id)
                .map(|s| s.name.as_str())
                .unwrap_or(DELETED_STAGE_LABEL),
        )
    }
}

/// The editable fields of a project
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub kind: ProjectKind,
    pub progress: u8,
    pub budget: f64,
    pub spent: f64,
    pub status: ProjectHealth,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<&Project> for ProjectDraft {
    fn from(p: &Project) -> Self {
        ProjectDraft {
            name: p.name.clone(),
            kind: p.kind,
            progress: p.progress,
            budget: p.budget,
            spent: p.spent,
            status: p.status,
            start_date: p.start_date,
            end_date: p.end_date,
        }
    }
}

/// The authoritative project list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Portfolio {
    pub fn new(projects: Vec<Project>) -> Self {
        Portfolio { projects }
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| &p.id == id)
    }

    /// Find the project owning the given object
    pub fn project_of_object(&self, id: &ObjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.object(id).is_some())
    }

    /// Every object id across all projects
    pub fn object_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.projects
            .iter()
            .flat_map(|p| p.objects.iter().map(|o| &o.id))
    }

    /// Replace one project by id, producing the next portfolio value.
    /// Unknown ids leave the portfolio unchanged.
    pub fn with_project(&self, project: Project) -> Portfolio {
        Portfolio {
            projects: self
                .projects
                .iter()
                .map(|p| {
                    if p.id == project.id {
                        project.clone()
                    } else {
                        p.clone()
                    }
                })
                .collect(),
        }
    }
}
