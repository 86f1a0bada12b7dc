use crate::model::config::StageDeletePolicy;
use crate::model::ids::{ObjectId, StageId, mint_id};
use crate::model::object::ProjectObject;
use crate::model::project::Project;
use crate::model::stage::StageDraft;

/// Error type for stage operations
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("stage not found: {0}")]
    NotFound(StageId),
    #[error("stage name cannot be empty")]
    EmptyName,
    #[error("stage ends ({end}) before it starts ({start})")]
    InvalidDates {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

/// Result of removing a stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageRemoval {
    pub project: Project,
    /// Whether a stage with the given id existed
    pub found: bool,
    /// Objects deleted along with the stage (cascade policy)
    pub removed: Vec<ObjectId>,
    /// Objects whose stage reference was cleared (detach policy)
    pub detached: Vec<ObjectId>,
}

fn validate(draft: &StageDraft) -> Result<(), StageError> {
    if draft.name.trim().is_empty() {
        return Err(StageError::EmptyName);
    }
    if draft.end_date < draft.start_date {
        return Err(StageError::InvalidDates {
            start: draft.start_date,
            end: draft.end_date,
        });
    }
    Ok(())
}

/// Append a stage with a freshly minted id. Returns the next project value
/// and the new id.
pub fn add_stage(project: &Project, draft: StageDraft) -> Result<(Project, StageId), StageError> {
    validate(&draft)?;
    let id = StageId::new(mint_id(|c| project.stages.iter().any(|s| s.id == c)));
    let mut next = project.clone();
    next.stages.push(draft.into_stage(id.clone()));
    tracing::info!(project = %project.id, stage = %id, "stage added");
    Ok((next, id))
}

/// Replace the fields of an existing stage in place, keeping its id and
/// position.
pub fn update_stage(project: &Project, id: &StageId, draft: StageDraft) -> Result<Project, StageError> {
    validate(&draft)?;
    let pos = project
        .stages
        .iter()
        .position(|s| &s.id == id)
        .ok_or_else(|| StageError::NotFound(id.clone()))?;
    let mut next = project.clone();
    next.stages[pos] = draft.into_stage(id.clone());
    Ok(next)
}

fn refers(object: &ProjectObject, stage: &StageId) -> bool {
    object.stage_id.as_ref() == Some(stage)
}

/// Remove a stage and resolve every object that referenced it.
///
/// The stage list and the object list are recomputed together so no object
/// is left pointing at the removed stage. An unknown id is a no-op.
pub fn delete_stage(project: &Project, id: &StageId, policy: StageDeletePolicy) -> StageRemoval {
    let found = project.has_stage(id);
    let mut next = project.clone();
    let mut removed = Vec::new();
    let mut detached = Vec::new();

    if found {
        next.stages.retain(|s| &s.id != id);
        match policy {
            StageDeletePolicy::Cascade => {
                removed = next
                    .objects
                    .iter()
                    .filter(|o| refers(o, id))
                    .map(|o| o.id.clone())
                    .collect();
                next.objects.retain(|o| !refers(o, id));
            }
            StageDeletePolicy::Detach => {
                for o in next.objects.iter_mut().filter(|o| refers(o, id)) {
                    o.stage_id = None;
                    detached.push(o.id.clone());
                }
            }
        }
        tracing::info!(
            project = %project.id,
            stage = %id,
            policy = policy.as_str(),
            removed = removed.len(),
            detached = detached.len(),
            "stage deleted"
        );
    } else {
        tracing::debug!(project = %project.id, stage = %id, "delete of unknown stage ignored");
    }

    StageRemoval {
        project: next,
        found,
        removed,
        detached,
    }
}
