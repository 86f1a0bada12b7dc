use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::StageId;

/// Construction stage status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageStatus {
    Completed,
    InProgress,
    #[default]
    Pending,
}

impl StageStatus {
    pub fn parse(s: &str) -> Option<StageStatus> {
        match s {
            "completed" => Some(StageStatus::Completed),
            "in-progress" => Some(StageStatus::InProgress),
            "pending" => Some(StageStatus::Pending),
            _ => None,
        }
    }

    /// Display label used in listings
    pub fn label(self) -> &'static str {
        match self {
            StageStatus::Completed => "Завершен",
            StageStatus::InProgress => "В работе",
            StageStatus::Pending => "Ожидание",
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageStatus::Completed => write!(f, "completed"),
            StageStatus::InProgress => write!(f, "in-progress"),
            StageStatus::Pending => write!(f, "pending"),
        }
    }
}

/// A construction phase of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    /// Percentage, 0–100
    pub progress: u8,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: StageStatus,
}

/// The editable fields of a stage (everything except its identity)
#[derive(Debug, Clone, PartialEq)]
pub struct StageDraft {
    pub name: String,
    pub progress: u8,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: StageStatus,
}

impl StageDraft {
    pub fn into_stage(self, id: StageId) -> Stage {
        Stage {
            id,
            name: self.name,
            progress: self.progress.min(100),
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status,
        }
    }
}

impl From<&Stage> for StageDraft {
    fn from(stage: &Stage) -> Self {
        StageDraft {
            name: stage.name.clone(),
            progress: stage.progress,
            start_date: stage.start_date,
            end_date: stage.end_date,
            status: stage.status,
        }
    }
}
