use std::collections::HashMap;

use serde::Serialize;

use crate::model::project::{Portfolio, Project};
use crate::model::violation;

/// Structured result from `sm check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (something that should be fixed).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// An object references a stage that is not in its project
    #[serde(rename = "dangling_stage")]
    DanglingStage {
        project_id: String,
        object_id: String,
        stage_id: String,
    },
    /// The same id appears twice in one collection
    #[serde(rename = "duplicate_id")]
    DuplicateId {
        /// `project`, `stage` or `object`
        collection: String,
        /// Owning project, empty for the project list itself
        project_id: String,
        id: String,
    },
    /// A violation code is listed twice on one object
    #[serde(rename = "duplicate_violation")]
    DuplicateViolation {
        project_id: String,
        object_id: String,
        code: String,
    },
}

/// A validation warning (non-critical issue).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// Violation code missing from the catalog
    #[serde(rename = "unknown_violation")]
    UnknownViolation {
        project_id: String,
        object_id: String,
        code: String,
    },
    /// Progress above 100 on a project or stage
    #[serde(rename = "progress_out_of_range")]
    ProgressOutOfRange { project_id: String, stage_id: Option<String>, progress: u8 },
    #[serde(rename = "over_budget")]
    OverBudget { project_id: String, budget: f64, spent: f64 },
    /// End date earlier than start date
    #[serde(rename = "inverted_dates")]
    InvertedDates { project_id: String, stage_id: Option<String> },
}

// ---------------------------------------------------------------------------
// Main check entry point
// ---------------------------------------------------------------------------

/// Validate a portfolio and return structured results.
///
/// Read-only; nothing is repaired.
pub fn check_portfolio(portfolio: &Portfolio) -> CheckResult {
    let mut result = CheckResult::default();

    for id in duplicates(portfolio.projects.iter().map(|p| p.id.as_str())) {
        result.errors.push(CheckError::DuplicateId {
            collection: "project".into(),
            project_id: String::new(),
            id,
        });
    }

    for project in &portfolio.projects {
        check_project(project, &mut result);
    }

    result.valid = result.errors.is_empty();
    result
}

// ---------------------------------------------------------------------------
// Per-project validation
// ---------------------------------------------------------------------------

fn check_project(project: &Project, result: &mut CheckResult) {
    let pid = project.id.to_string();

    for id in duplicates(project.stages.iter().map(|s| s.id.as_str())) {
        result.errors.push(CheckError::DuplicateId {
            collection: "stage".into(),
            project_id: pid.clone(),
            id,
        });
    }
    for id in duplicates(project.objects.iter().map(|o| o.id.as_str())) {
        result.errors.push(CheckError::DuplicateId {
            collection: "object".into(),
            project_id: pid.clone(),
            id,
        });
    }

    if project.progress > 100 {
        result.warnings.push(CheckWarning::ProgressOutOfRange {
            project_id: pid.clone(),
            stage_id: None,
            progress: project.progress,
        });
    }
    if project.spent > project.budget {
        result.warnings.push(CheckWarning::OverBudget {
            project_id: pid.clone(),
            budget: project.budget,
            spent: project.spent,
        });
    }
    if project.end_date < project.start_date {
        result.warnings.push(CheckWarning::InvertedDates {
            project_id: pid.clone(),
            stage_id: None,
        });
    }

    for stage in &project.stages {
        if stage.progress > 100 {
            result.warnings.push(CheckWarning::ProgressOutOfRange {
                project_id: pid.clone(),
                stage_id: Some(stage.id.to_string()),
                progress: stage.progress,
            });
        }
        if stage.end_date < stage.start_date {
            result.warnings.push(CheckWarning::InvertedDates {
                project_id: pid.clone(),
                stage_id: Some(stage.id.to_string()),
            });
        }
    }

    for object in &project.objects {
        if let Some(stage) = &object.stage_id
            && !project.has_stage(stage)
        {
            result.errors.push(CheckError::DanglingStage {
                project_id: pid.clone(),
                object_id: object.id.to_string(),
                stage_id: stage.to_string(),
            });
        }

        for code in duplicates(object.violation_types.iter().map(String::as_str)) {
            result.errors.push(CheckError::DuplicateViolation {
                project_id: pid.clone(),
                object_id: object.id.to_string(),
                code,
            });
        }

        let mut reported = Vec::new();
        for code in &object.violation_types {
            if !violation::is_known(code) && !reported.contains(&code) {
                reported.push(code);
                result.warnings.push(CheckWarning::UnknownViolation {
                    project_id: pid.clone(),
                    object_id: object.id.to_string(),
                    code: code.clone(),
                });
            }
        }
    }
}

/// Values seen more than once, in order of first repetition
fn duplicates<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut out = Vec::new();
    for v in values {
        let count = seen.entry(v).or_insert(0);
        *count += 1;
        if *count == 2 {
            out.push(v.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::{ObjectId, ProjectId, StageId};
    use crate::model::object::ProjectObject;
    use crate::model::project::{ProjectHealth, ProjectKind};
    use crate::model::stage::{StageDraft, StageStatus};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1).unwrap()
    }

    fn make_project(id: &str) -> Project {
        Project {
            id: ProjectId::new(id),
            name: id.to_string(),
            kind: ProjectKind::Road,
            progress: 50,
            budget: 100.0,
            spent: 40.0,
            status: ProjectHealth::OnTrack,
            start_date: date(1),
            end_date: date(12),
            stages: vec![
                StageDraft {
                    name: "Проект".into(),
                    progress: 100,
                    start_date: date(1),
                    end_date: date(2),
                    status: StageStatus::Completed,
                }
                .into_stage(StageId::new("s1")),
            ],
            objects: Vec::new(),
        }
    }

    fn object(id: &str) -> ProjectObject {
        ProjectObject::blank(ObjectId::new(id), id)
    }

    #[test]
    fn test_check_clean_portfolio() {
        let mut p = make_project("p1");
        let mut o = object("o1");
        o.stage_id = Some(StageId::new("s1"));
        o.violation_types = vec!["12.9 ч.1".into()];
        p.objects.push(o);

        let result = check_portfolio(&Portfolio::new(vec![p]));
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_check_dangling_stage() {
        let mut p = make_project("p1");
        let mut o = object("o1");
        o.stage_id = Some(StageId::new("gone"));
        p.objects.push(o);

        let result = check_portfolio(&Portfolio::new(vec![p]));
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![CheckError::DanglingStage {
                project_id: "p1".into(),
                object_id: "o1".into(),
                stage_id: "gone".into(),
            }]
        );
    }

    #[test]
    fn test_check_stage_from_other_project_is_dangling() {
        let p1 = make_project("p1");
        let mut p2 = make_project("p2");
        p2.stages.clear();
        let mut o = object("o1");
        o.stage_id = Some(StageId::new("s1"));
        p2.objects.push(o);

        let result = check_portfolio(&Portfolio::new(vec![p1, p2]));
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_check_duplicate_ids() {
        let mut p = make_project("p1");
        p.objects.push(object("o1"));
        p.objects.push(object("o1"));
        let dup_project = make_project("p1");

        let result = check_portfolio(&Portfolio::new(vec![p, dup_project]));
        assert_eq!(
            result.errors,
            vec![
                CheckError::DuplicateId {
                    collection: "project".into(),
                    project_id: String::new(),
                    id: "p1".into(),
                },
                CheckError::DuplicateId {
                    collection: "object".into(),
                    project_id: "p1".into(),
                    id: "o1".into(),
                },
            ]
        );
    }

    #[test]
    fn test_check_violation_codes() {
        let mut p = make_project("p1");
        let mut o = object("o1");
        o.violation_types = vec!["12.9 ч.1".into(), "12.9 ч.1".into(), "0.0".into()];
        p.objects.push(o);

        let result = check_portfolio(&Portfolio::new(vec![p]));
        assert_eq!(
            result.errors,
            vec![CheckError::DuplicateViolation {
                project_id: "p1".into(),
                object_id: "o1".into(),
                code: "12.9 ч.1".into(),
            }]
        );
        assert_eq!(
            result.warnings,
            vec![CheckWarning::UnknownViolation {
                project_id: "p1".into(),
                object_id: "o1".into(),
                code: "0.0".into(),
            }]
        );
    }

    #[test]
    fn test_warn_numbers_and_dates() {
        let mut p = make_project("p1");
        p.spent = 150.0;
        p.stages[0].progress = 120;
        p.stages[0].end_date = date(1);
        p.stages[0].start_date = date(3);

        let result = check_portfolio(&Portfolio::new(vec![p]));
        assert!(result.valid);
        assert_eq!(
            result.warnings,
            vec![
                CheckWarning::OverBudget {
                    project_id: "p1".into(),
                    budget: 100.0,
                    spent: 150.0,
                },
                CheckWarning::ProgressOutOfRange {
                    project_id: "p1".into(),
                    stage_id: Some("s1".into()),
                    progress: 120,
                },
                CheckWarning::InvertedDates {
                    project_id: "p1".into(),
                    stage_id: Some("s1".into()),
                },
            ]
        );
    }

    #[test]
    fn test_check_result_serializes_to_json() {
        let mut p = make_project("p1");
        let mut o = object("o1");
        o.stage_id = Some(StageId::new("GONE-1"));
        p.objects.push(o);

        let result = check_portfolio(&Portfolio::new(vec![p]));
        let json = serde_json::to_string_pretty(&result).unwrap();
        assert!(json.contains("dangling_stage"));
        assert!(json.contains("GONE-1"));
    }
}
