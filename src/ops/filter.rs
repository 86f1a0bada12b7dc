use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ids::StageId;
use crate::model::object::{DeliveryStage, ProjectObject};

/// Error type for filter parsing
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("invalid delivery stage filter: {0} (expected all, none or 1-5)")]
    InvalidDelivery(String),
    #[error("invalid status filter: {0}")]
    InvalidStatus(String),
}

/// Narrowing by stage assignment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "id")]
pub enum StageFilter {
    #[default]
    All,
    NoStage,
    Stage(StageId),
}

impl StageFilter {
    /// `all`, `no-stage`/`none`, or a stage id
    pub fn parse(s: &str) -> StageFilter {
        match s {
            "all" => StageFilter::All,
            "no-stage" | "none" => StageFilter::NoStage,
            id => StageFilter::Stage(StageId::new(id)),
        }
    }

    pub fn matches(&self, object: &ProjectObject) -> bool {
        match self {
            StageFilter::All => true,
            StageFilter::NoStage => object.stage_id.is_none(),
            StageFilter::Stage(id) => object.stage_id.as_ref() == Some(id),
        }
    }
}

impl fmt::Display for StageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFilter::All => write!(f, "all"),
            StageFilter::NoStage => write!(f, "no-stage"),
            StageFilter::Stage(id) => write!(f, "{}", id),
        }
    }
}

/// Narrowing by delivery stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "stage")]
pub enum DeliveryFilter {
    #[default]
    All,
    NoStage,
    Stage(DeliveryStage),
}

impl DeliveryFilter {
    /// `all`, `no-stage`/`none`, or `1`..`5`
    pub fn parse(s: &str) -> Result<DeliveryFilter, FilterError> {
        match s {
            "all" => Ok(DeliveryFilter::All),
            "no-stage" | "none" => Ok(DeliveryFilter::NoStage),
            other => DeliveryStage::parse(other)
                .map(DeliveryFilter::Stage)
                .ok_or_else(|| FilterError::InvalidDelivery(other.to_string())),
        }
    }

    pub fn matches(&self, object: &ProjectObject) -> bool {
        match self {
            DeliveryFilter::All => true,
            DeliveryFilter::NoStage => object.delivery_stage.is_none(),
            DeliveryFilter::Stage(d) => object.delivery_stage == Some(*d),
        }
    }
}

impl fmt::Display for DeliveryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryFilter::All => write!(f, "all"),
            DeliveryFilter::NoStage => write!(f, "no-stage"),
            DeliveryFilter::Stage(d) => write!(f, "{}", d),
        }
    }
}

/// A status category derived from an object's work and permit flags.
///
/// `Completed`, `InProgress` and `NotStarted` are disjoint buckets over the
/// construction, commissioning and executive-documentation flags. Permit flags
/// never move an object between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusCategory {
    #[default]
    All,
    Completed,
    InProgress,
    NotStarted,
    WithPermits,
    NoPermits,
}

impl StatusCategory {
    pub const ALL: [StatusCategory; 6] = [
        StatusCategory::All,
        StatusCategory::Completed,
        StatusCategory::InProgress,
        StatusCategory::NotStarted,
        StatusCategory::WithPermits,
        StatusCategory::NoPermits,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusCategory::All => "all",
            StatusCategory::Completed => "completed",
            StatusCategory::InProgress => "in-progress",
            StatusCategory::NotStarted => "not-started",
            StatusCategory::WithPermits => "with-permits",
            StatusCategory::NoPermits => "no-permits",
        }
    }

    pub fn parse(s: &str) -> Result<StatusCategory, FilterError> {
        StatusCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| FilterError::InvalidStatus(s.to_string()))
    }

    pub fn matches(self, o: &ProjectObject) -> bool {
        let all_work_done =
            o.construction_work && o.commissioning_work && o.executive_documentation;
        match self {
            StatusCategory::All => true,
            StatusCategory::Completed => all_work_done,
            StatusCategory::InProgress => {
                (o.construction_work || o.commissioning_work) && !all_work_done
            }
            StatusCategory::NotStarted => !o.construction_work && !o.commissioning_work,
            StatusCategory::WithPermits => o.has_all_permits(),
            StatusCategory::NoPermits => !o.has_all_permits(),
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The combined filter applied to a project's object table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectFilter {
    #[serde(default)]
    pub stage: StageFilter,
    #[serde(default)]
    pub delivery: DeliveryFilter,
    #[serde(default)]
    pub status: StatusCategory,
}

impl ObjectFilter {
    pub fn is_unfiltered(&self) -> bool {
        self == &ObjectFilter::default()
    }

    /// Stage, then delivery stage, then status category
    pub fn matches(&self, object: &ProjectObject) -> bool {
        self.stage.matches(object) && self.delivery.matches(object) && self.status.matches(object)
    }
}

/// Narrow an object list. Output preserves input order.
pub fn filter_objects<'a>(objects: &'a [ProjectObject], filter: &ObjectFilter) -> Vec<&'a ProjectObject> {
    objects.iter().filter(|o| filter.matches(o)).collect()
}
