use serde::Serialize;

use crate::model::ids::{ObjectId, ProjectId, mint_id};
use crate::model::object::WorkStatus;
use crate::model::project::{Portfolio, Project, ProjectDraft, ProjectHealth};
use crate::ops::filter::StatusCategory;

/// Error type for project operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("project not found: {0}")]
    NotFound(ProjectId),
    #[error("project name cannot be empty")]
    EmptyName,
    #[error("budget and spent must be non-negative")]
    NegativeAmount,
    #[error("project ends ({end}) before it starts ({start})")]
    InvalidDates {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

fn validate(draft: &ProjectDraft) -> Result<(), ProjectError> {
    if draft.name.trim().is_empty() {
        return Err(ProjectError::EmptyName);
    }
    if draft.budget < 0.0 || draft.spent < 0.0 || draft.budget.is_nan() || draft.spent.is_nan() {
        return Err(ProjectError::NegativeAmount);
    }
    if draft.end_date < draft.start_date {
        return Err(ProjectError::InvalidDates {
            start: draft.start_date,
            end: draft.end_date,
        });
    }
    Ok(())
}

fn apply_draft(project: &mut Project, draft: ProjectDraft) {
    project.name = draft.name;
    project.kind = draft.kind;
    project.progress = draft.progress.min(100);
    project.budget = draft.budget;
    project.spent = draft.spent;
    project.status = draft.status;
    project.start_date = draft.start_date;
    project.end_date = draft.end_date;
}

/// Append an empty project under a freshly minted id
pub fn add_project(portfolio: &Portfolio, draft: ProjectDraft) -> Result<(Portfolio, ProjectId), ProjectError> {
    validate(&draft)?;
    let id = ProjectId::new(mint_id(|c| portfolio.projects.iter().any(|p| p.id == c)));
    let mut project = Project {
        id: id.clone(),
        name: String::new(),
        kind: draft.kind,
        progress: 0,
        budget: 0.0,
        spent: 0.0,
        status: ProjectHealth::default(),
        start_date: draft.start_date,
        end_date: draft.end_date,
        stages: Vec::new(),
        objects: Vec::new(),
    };
    apply_draft(&mut project, draft);
    let mut projects = portfolio.projects.clone();
    projects.push(project);
    tracing::info!(project = %id, "project added");
    Ok((Portfolio::new(projects), id))
}

/// Replace a project's own fields, leaving its stages and objects alone
pub fn update_project(portfolio: &Portfolio, id: &ProjectId, draft: ProjectDraft) -> Result<Portfolio, ProjectError> {
    validate(&draft)?;
    let mut project = portfolio
        .project(id)
        .cloned()
        .ok_or_else(|| ProjectError::NotFound(id.clone()))?;
    apply_draft(&mut project, draft);
    Ok(portfolio.with_project(project))
}

/// Remove a project together with its stages and objects. Returns the ids of
/// the objects that went with it.
pub fn delete_project(portfolio: &Portfolio, id: &ProjectId) -> Result<(Portfolio, Vec<ObjectId>), ProjectError> {
    let project = portfolio
        .project(id)
        .ok_or_else(|| ProjectError::NotFound(id.clone()))?;
    let removed: Vec<ObjectId> = project.objects.iter().map(|o| o.id.clone()).collect();
    let projects = portfolio
        .projects
        .iter()
        .filter(|p| &p.id != id)
        .cloned()
        .collect();
    tracing::info!(project = %id, objects = removed.len(), "project deleted");
    Ok((Portfolio::new(projects), removed))
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Headline figures across the whole portfolio
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioStats {
    pub total_projects: usize,
    /// Projects whose status is not `delayed`
    pub active_projects: usize,
    pub total_budget: f64,
    pub total_spent: f64,
    pub total_objects: usize,
}

pub fn portfolio_stats(portfolio: &Portfolio) -> PortfolioStats {
    let projects = &portfolio.projects;
    PortfolioStats {
        total_projects: projects.len(),
        active_projects: projects
            .iter()
            .filter(|p| p.status != ProjectHealth::Delayed)
            .count(),
        total_budget: projects.iter().map(|p| p.budget).sum(),
        total_spent: projects.iter().map(|p| p.spent).sum(),
        total_objects: projects.iter().map(|p| p.objects.len()).sum(),
    }
}

/// Object counts for one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCounts {
    pub objects: usize,
    /// One entry per status category other than `all`, in filter order
    pub categories: Vec<(StatusCategory, usize)>,
    /// One entry per work status, in registry order
    pub work_statuses: Vec<(WorkStatus, usize)>,
}

pub fn project_counts(project: &Project) -> ProjectCounts {
    let categories = StatusCategory::ALL
        .into_iter()
        .filter(|c| *c != StatusCategory::All)
        .map(|c| (c, project.objects.iter().filter(|o| c.matches(o)).count()))
        .collect();
    let work_statuses = WorkStatus::ALL
        .into_iter()
        .map(|ws| (ws, project.objects.iter().filter(|o| o.work_status == ws).count()))
        .collect();
    ProjectCounts {
        objects: project.objects.len(),
        categories,
        work_statuses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::object::ProjectObject;
    use crate::model::project::ProjectKind;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn draft(name: &str, status: ProjectHealth, budget: f64) -> ProjectDraft {
        ProjectDraft {
            name: name.to_string(),
            kind: ProjectKind::Utility,
            progress: 40,
            budget,
            spent: budget / 2.0,
            status,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    #[test]
    fn add_update_delete_round() {
        let (pf, id) = add_project(&Portfolio::default(), draft("Водоснабжение", ProjectHealth::OnTrack, 10.0)).unwrap();
        assert_eq!(pf.projects.len(), 1);
        assert_eq!(pf.projects[0].id, id);

        let pf = update_project(&pf, &id, draft("Водоснабжение района", ProjectHealth::AtRisk, 12.0)).unwrap();
        assert_eq!(pf.projects[0].name, "Водоснабжение района");
        assert_eq!(pf.projects[0].status, ProjectHealth::AtRisk);

        let (pf, removed) = delete_project(&pf, &id).unwrap();
        assert!(pf.projects.is_empty());
        assert!(removed.is_empty());
    }

    #[test]
    fn delete_reports_transitive_objects() {
        let (pf, id) = add_project(&Portfolio::default(), draft("Мост", ProjectHealth::OnTrack, 1.0)).unwrap();
        let mut project = pf.projects[0].clone();
        project.objects.push(ProjectObject::blank(ObjectId::new("o1"), "Опора"));
        let pf = pf.with_project(project);

        let (_, removed) = delete_project(&pf, &id).unwrap();
        assert_eq!(removed, vec![ObjectId::new("o1")]);
        assert!(matches!(
            delete_project(&Portfolio::default(), &id),
            Err(ProjectError::NotFound(_))
        ));
    }

    #[test]
    fn validation_rejects_bad_drafts() {
        let pf = Portfolio::default();
        assert!(matches!(
            add_project(&pf, draft(" ", ProjectHealth::OnTrack, 1.0)),
            Err(ProjectError::EmptyName)
        ));
        assert!(matches!(
            add_project(&pf, draft("x", ProjectHealth::OnTrack, -1.0)),
            Err(ProjectError::NegativeAmount)
        ));
    }

    #[test]
    fn stats_count_non_delayed_as_active() {
        let pf = Portfolio::default();
        let (pf, _) = add_project(&pf, draft("a", ProjectHealth::OnTrack, 100.0)).unwrap();
        let (pf, _) = add_project(&pf, draft("b", ProjectHealth::AtRisk, 50.0)).unwrap();
        let (pf, _) = add_project(&pf, draft("c", ProjectHealth::Delayed, 10.0)).unwrap();

        let stats = portfolio_stats(&pf);
        assert_eq!(
            stats,
            PortfolioStats {
                total_projects: 3,
                active_projects: 2,
                total_budget: 160.0,
                total_spent: 80.0,
                total_objects: 0,
            }
        );
    }

    #[test]
    fn counts_per_category_and_work_status() {
        let (pf, _) = add_project(&Portfolio::default(), draft("a", ProjectHealth::OnTrack, 1.0)).unwrap();
        let mut project = pf.projects[0].clone();
        let mut done = ProjectObject::blank(ObjectId::new("o1"), "done");
        done.construction_work = true;
        done.commissioning_work = true;
        done.executive_documentation = true;
        done.work_status = WorkStatus::Completed;
        project.objects.push(done);
        project.objects.push(ProjectObject::blank(ObjectId::new("o2"), "idle"));

        let counts = project_counts(&project);
        assert_eq!(counts.objects, 2);
        assert_eq!(
            counts.categories,
            vec![
                (StatusCategory::Completed, 1),
                (StatusCategory::InProgress, 0),
                (StatusCategory::NotStarted, 1),
                (StatusCategory::WithPermits, 0),
                (StatusCategory::NoPermits, 2),
            ]
        );
        assert_eq!(
            counts.work_statuses,
            vec![
                (WorkStatus::NotStarted, 1),
                (WorkStatus::InProgress, 0),
                (WorkStatus::Paused, 0),
                (WorkStatus::Completed, 1),
            ]
        );
    }
}
