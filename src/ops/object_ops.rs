use crate::model::ids::{ObjectId, StageId, mint_id};
use crate::model::object::ProjectObject;
use crate::model::project::Project;
use crate::model::violation;

/// Error type for object operations
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("object not found: {0}")]
    NotFound(ObjectId),
    #[error("object name cannot be empty")]
    EmptyName,
    #[error("stage {0} does not belong to this project")]
    UnknownStage(StageId),
    #[error("unknown violation code: {0}")]
    UnknownViolation(String),
    #[error("violation {0} is already recorded")]
    DuplicateViolation(String),
    #[error("violation {0} is not recorded on this object")]
    ViolationNotRecorded(String),
}

fn position(project: &Project, id: &ObjectId) -> Result<usize, ObjectError> {
    project
        .objects
        .iter()
        .position(|o| &o.id == id)
        .ok_or_else(|| ObjectError::NotFound(id.clone()))
}

/// Check an edited object against its project and normalize its violation
/// list (trimmed, deduplicated).
fn validate(project: &Project, object: &mut ProjectObject) -> Result<(), ObjectError> {
    if object.name.trim().is_empty() {
        return Err(ObjectError::EmptyName);
    }
    if let Some(stage) = &object.stage_id
        && !project.has_stage(stage)
    {
        return Err(ObjectError::UnknownStage(stage.clone()));
    }
    let codes = violation::dedup_codes(&object.violation_types);
    if let Some(unknown) = codes.iter().find(|c| !violation::is_known(c)) {
        return Err(ObjectError::UnknownViolation(unknown.clone()));
    }
    object.violation_types = codes;
    Ok(())
}

/// Append an object under a freshly minted id. Whatever id `object` carries
/// is discarded.
pub fn add_object(project: &Project, mut object: ProjectObject) -> Result<(Project, ObjectId), ObjectError> {
    validate(project, &mut object)?;
    let id = ObjectId::new(mint_id(|c| project.objects.iter().any(|o| o.id == c)));
    object.id = id.clone();
    let mut next = project.clone();
    next.objects.push(object);
    tracing::info!(project = %project.id, object = %id, "object added");
    Ok((next, id))
}

/// Replace every editable field of the object with the same id
pub fn update_object(project: &Project, mut object: ProjectObject) -> Result<Project, ObjectError> {
    let pos = position(project, &object.id)?;
    validate(project, &mut object)?;
    let mut next = project.clone();
    next.objects[pos] = object;
    Ok(next)
}

pub fn delete_object(project: &Project, id: &ObjectId) -> Result<Project, ObjectError> {
    let pos = position(project, id)?;
    let mut next = project.clone();
    next.objects.remove(pos);
    tracing::info!(project = %project.id, object = %id, "object deleted");
    Ok(next)
}

pub fn add_violation(project: &Project, id: &ObjectId, code: &str) -> Result<Project, ObjectError> {
    let pos = position(project, id)?;
    let code = code.trim();
    if !violation::is_known(code) {
        return Err(ObjectError::UnknownViolation(code.to_string()));
    }
    if project.objects[pos].violation_types.iter().any(|c| c == code) {
        return Err(ObjectError::DuplicateViolation(code.to_string()));
    }
    let mut next = project.clone();
    next.objects[pos].violation_types.push(code.to_string());
    Ok(next)
}

pub fn remove_violation(project: &Project, id: &ObjectId, code: &str) -> Result<Project, ObjectError> {
    let pos = position(project, id)?;
    let code = code.trim();
    let codes = &project.objects[pos].violation_types;
    let idx = codes
        .iter()
        .position(|c| c == code)
        .ok_or_else(|| ObjectError::ViolationNotRecorded(code.to_string()))?;
    let mut next = project.clone();
    next.objects[pos].violation_types.remove(idx);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::ProjectId;
    use crate::model::project::{ProjectHealth, ProjectKind};
    use crate::model::stage::{StageDraft, StageStatus};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sample() -> Project {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let stage = StageDraft {
            name: "Монтаж".into(),
            progress: 0,
            start_date: date,
            end_date: date,
            status: StageStatus::Pending,
        };
        Project {
            id: ProjectId::new("p1"),
            name: "Мост".into(),
            kind: ProjectKind::Bridge,
            progress: 0,
            budget: 0.0,
            spent: 0.0,
            status: ProjectHealth::AtRisk,
            start_date: date,
            end_date: date,
            stages: vec![stage.into_stage(StageId::new("s1"))],
            objects: vec![ProjectObject::blank(ObjectId::new("o1"), "Опора 1")],
        }
    }

    #[test]
    fn add_object_mints_id_and_appends() {
        let p = sample();
        let mut draft = ProjectObject::blank(ObjectId::new("o1"), "Опора 2");
        draft.stage_id = Some(StageId::new("s1"));
        let (next, id) = add_object(&p, draft).unwrap();
        assert_ne!(id, ObjectId::new("o1"));
        assert_eq!(next.objects.len(), 2);
        assert_eq!(next.objects[1].id, id);
        assert_eq!(next.objects[1].name, "Опора 2");
    }

    #[test]
    fn stage_reference_must_resolve_in_same_project() {
        let p = sample();
        let mut draft = ProjectObject::blank(ObjectId::new("n"), "Опора 2");
        draft.stage_id = Some(StageId::new("elsewhere"));
        assert!(matches!(
            add_object(&p, draft),
            Err(ObjectError::UnknownStage(s)) if s == "elsewhere"
        ));
        let mut moved = p.objects[0].clone();
        moved.stage_id = Some(StageId::new("elsewhere"));
        assert!(matches!(update_object(&p, moved), Err(ObjectError::UnknownStage(_))));
    }

    #[test]
    fn update_replaces_fields_and_dedups_violations() {
        let p = sample();
        let mut edited = p.objects[0].clone();
        edited.region = "Тверская область".into();
        edited.violation_types = vec!["12.9 ч.1".into(), "12.9 ч.1".into()];
        let next = update_object(&p, edited).unwrap();
        assert_eq!(next.objects[0].region, "Тверская область");
        assert_eq!(next.objects[0].violation_types, vec!["12.9 ч.1"]);
    }

    #[test]
    fn update_rejects_missing_and_unknown() {
        let p = sample();
        let ghost = ProjectObject::blank(ObjectId::new("ghost"), "x");
        assert!(matches!(update_object(&p, ghost), Err(ObjectError::NotFound(_))));

        let mut bad = p.objects[0].clone();
        bad.violation_types = vec!["1.1".into()];
        assert!(matches!(
            update_object(&p, bad),
            Err(ObjectError::UnknownViolation(c)) if c == "1.1"
        ));
    }

    #[test]
    fn delete_object_removes_it() {
        let p = sample();
        let next = delete_object(&p, &ObjectId::new("o1")).unwrap();
        assert!(next.objects.is_empty());
        assert!(delete_object(&next, &ObjectId::new("o1")).is_err());
    }

    #[test]
    fn violations_add_once_and_remove() {
        let p = sample();
        let id = ObjectId::new("o1");
        let p = add_violation(&p, &id, "12.16 ч.1").unwrap();
        assert!(matches!(
            add_violation(&p, &id, "12.16 ч.1"),
            Err(ObjectError::DuplicateViolation(_))
        ));
        assert!(matches!(
            add_violation(&p, &id, "77"),
            Err(ObjectError::UnknownViolation(_))
        ));
        let p = remove_violation(&p, &id, "12.16 ч.1").unwrap();
        assert!(p.objects[0].violation_types.is_empty());
        assert!(matches!(
            remove_violation(&p, &id, "12.16 ч.1"),
            Err(ObjectError::ViolationNotRecorded(_))
        ));
    }

    #[test]
    fn update_sets_and_clears_stage() {
        let p = sample();
        let mut edited = p.objects[0].clone();
        edited.stage_id = Some(StageId::new("s1"));
        let p = update_object(&p, edited).unwrap();
        assert_eq!(p.stage_label(&p.objects[0]), Some("Монтаж"));
        let mut edited = p.objects[0].clone();
        edited.stage_id = None;
        let p = update_object(&p, edited).unwrap();
        assert_eq!(p.stage_label(&p.objects[0]), None);
    }
}
