use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::ids::ObjectId;
use crate::model::object::{ProjectObject, WorkStatus};
use crate::model::project::{Portfolio, Project};
use crate::model::violation;
use crate::ops::filter::{ObjectFilter, filter_objects};

/// Error type for bulk mutations
#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    #[error("nothing is selected")]
    EmptySelection,
    #[error("violation list cannot be empty")]
    EmptyViolations,
    #[error("unknown violation code: {0}")]
    UnknownViolation(String),
}

/// What `select_all_visible` did to the visible subset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleToggle {
    Selected(usize),
    Deselected(usize),
}

/// Set of selected object ids, global across every project.
///
/// Keyed by id rather than table position, so filtering never changes what
/// is selected. Ids of objects hidden by the current filter stay selected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: BTreeSet<ObjectId>,
}

impl Selection {
    pub fn new() -> Self {
        Selection::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectId> {
        self.ids.iter()
    }

    /// Add the id if absent, remove it if present. Returns whether the id is
    /// selected afterwards.
    pub fn toggle(&mut self, id: ObjectId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Toggle the objects of `project` that pass `filter`.
    ///
    /// If every visible object is already selected, exactly those ids are
    /// deselected; otherwise all visible ids are added. Ids outside the
    /// visible subset are never touched.
    pub fn select_all_visible(&mut self, project: &Project, filter: &ObjectFilter) -> VisibleToggle {
        let visible: Vec<&ObjectId> = filter_objects(&project.objects, filter)
            .into_iter()
            .map(|o| &o.id)
            .collect();

        if visible.iter().all(|id| self.ids.contains(*id)) {
            for id in &visible {
                self.ids.remove(*id);
            }
            VisibleToggle::Deselected(visible.len())
        } else {
            let before = self.ids.len();
            self.ids.extend(visible.into_iter().cloned());
            VisibleToggle::Selected(self.ids.len() - before)
        }
    }

    /// Drop ids that no longer name an object anywhere in the portfolio
    pub fn prune(&mut self, portfolio: &Portfolio) -> usize {
        let live: BTreeSet<&ObjectId> = portfolio.object_ids().collect();
        let before = self.ids.len();
        self.ids.retain(|id| live.contains(id));
        before - self.ids.len()
    }

    /// Overwrite `work_status` on every selected object in every project,
    /// then clear the selection.
    ///
    /// Returns the next portfolio and the number of objects changed. On
    /// error neither the portfolio nor the selection is touched.
    pub fn apply_bulk_status(
        &mut self,
        portfolio: &Portfolio,
        status: WorkStatus,
    ) -> Result<(Portfolio, usize), BulkError> {
        if self.ids.is_empty() {
            return Err(BulkError::EmptySelection);
        }
        let (next, count) = self.map_selected(portfolio, |o| o.work_status = status);
        tracing::info!(count, status = %status, "bulk status applied");
        self.ids.clear();
        Ok((next, count))
    }

    /// Replace `violation_types` on every selected object in every project,
    /// then clear the selection. The list is deduplicated and every code must
    /// be in the catalog.
    pub fn apply_bulk_violations<S: AsRef<str>>(
        &mut self,
        portfolio: &Portfolio,
        codes: &[S],
    ) -> Result<(Portfolio, usize), BulkError> {
        let codes = violation::dedup_codes(codes);
        if codes.is_empty() {
            return Err(BulkError::EmptyViolations);
        }
        if self.ids.is_empty() {
            return Err(BulkError::EmptySelection);
        }
        if let Some(unknown) = codes.iter().find(|c| !violation::is_known(c)) {
            return Err(BulkError::UnknownViolation(unknown.clone()));
        }
        let (next, count) = self.map_selected(portfolio, |o| o.violation_types = codes.clone());
        tracing::info!(count, codes = codes.len(), "bulk violations applied");
        self.ids.clear();
        Ok((next, count))
    }

    fn map_selected(
        &self,
        portfolio: &Portfolio,
        mut update: impl FnMut(&mut ProjectObject),
    ) -> (Portfolio, usize) {
        let mut count = 0;
        let projects = portfolio
            .projects
            .iter()
            .map(|p| {
                let mut p = p.clone();
                for o in p.objects.iter_mut().filter(|o| self.ids.contains(&o.id)) {
                    update(o);
                    count += 1;
                }
                p
            })
            .collect();
        (Portfolio::new(projects), count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::ProjectId;
    use crate::model::project::{ProjectHealth, ProjectKind};
    use crate::ops::filter::StatusCategory;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn project(id: &str, objects: &[&str]) -> Project {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Project {
            id: ProjectId::new(id),
            name: id.to_string(),
            kind: ProjectKind::Road,
            progress: 0,
            budget: 0.0,
            spent: 0.0,
            status: ProjectHealth::OnTrack,
            start_date: date,
            end_date: date,
            stages: Vec::new(),
            objects: objects
                .iter()
                .map(|o| ProjectObject::blank(ObjectId::new(*o), *o))
                .collect(),
        }
    }

    fn portfolio() -> Portfolio {
        Portfolio::new(vec![project("p1", &["a", "b", "c"]), project("p2", &["x", "y"])])
    }

    fn selection(ids: &[&str]) -> Selection {
        let mut sel = Selection::new();
        for id in ids {
            sel.toggle(ObjectId::new(*id));
        }
        sel
    }

    fn object<'a>(portfolio: &'a Portfolio, id: &str) -> &'a ProjectObject {
        let id = ObjectId::new(id);
        portfolio
            .project_of_object(&id)
            .and_then(|p| p.object(&id))
            .unwrap()
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut sel = Selection::new();
        assert!(sel.toggle(ObjectId::new("a")));
        assert!(sel.contains(&ObjectId::new("a")));
        assert!(!sel.toggle(ObjectId::new("a")));
        assert!(sel.is_empty());
    }

    #[test]
    fn select_all_visible_only_touches_visible_subset() {
        let mut p = project("p1", &["a", "b", "c"]);
        p.objects[0].construction_work = true;
        p.objects[0].commissioning_work = true;
        p.objects[0].executive_documentation = true;
        let filter = ObjectFilter {
            status: StatusCategory::NotStarted,
            ..Default::default()
        };

        // "x" lives in another project and must survive both toggles.
        let mut sel = selection(&["x", "b"]);
        assert_eq!(sel.select_all_visible(&p, &filter), VisibleToggle::Selected(1));
        assert_eq!(sel, selection(&["x", "b", "c"]));

        assert_eq!(sel.select_all_visible(&p, &filter), VisibleToggle::Deselected(2));
        assert_eq!(sel, selection(&["x"]));
    }

    #[test]
    fn select_all_visible_twice_restores_original() {
        let p = project("p1", &["a", "b", "c"]);
        let filter = ObjectFilter::default();
        for start in [vec![], vec!["z"], vec!["a", "b", "c"], vec!["a", "b", "c", "z"]] {
            let original = selection(&start);
            let mut sel = original.clone();
            sel.select_all_visible(&p, &filter);
            assert_ne!(sel, original);
            sel.select_all_visible(&p, &filter);
            assert_eq!(sel, original);
        }
    }

    #[test]
    fn partially_selected_view_is_completed_first() {
        let p = project("p1", &["a", "b", "c"]);
        let mut sel = selection(&["a"]);
        assert_eq!(
            sel.select_all_visible(&p, &ObjectFilter::default()),
            VisibleToggle::Selected(2)
        );
        assert_eq!(sel.len(), 3);
    }

    #[test]
    fn selection_survives_filter_changes() {
        let mut p = project("p1", &["a", "b"]);
        p.objects[1].delivery_stage = crate::model::object::DeliveryStage::new(2);
        let mut sel = Selection::new();
        sel.toggle(ObjectId::new("a"));

        let narrowed = ObjectFilter {
            delivery: crate::ops::filter::DeliveryFilter::parse("2").unwrap(),
            ..Default::default()
        };
        let visible = filter_objects(&p.objects, &narrowed);
        assert_eq!(visible.len(), 1);
        assert_eq!(sel.len(), 1);
        assert!(sel.contains(&ObjectId::new("a")));
    }

    #[test]
    fn bulk_status_applies_across_projects_and_clears() {
        let before = portfolio();
        let mut sel = selection(&["a", "y"]);
        let (after, count) = sel.apply_bulk_status(&before, WorkStatus::Paused).unwrap();

        assert_eq!(count, 2);
        assert!(sel.is_empty());
        assert_eq!(object(&after, "a").work_status, WorkStatus::Paused);
        assert_eq!(object(&after, "y").work_status, WorkStatus::Paused);
        assert_eq!(object(&after, "b").work_status, WorkStatus::NotStarted);
        // The input value is untouched.
        assert_eq!(object(&before, "a").work_status, WorkStatus::NotStarted);
    }

    #[test]
    fn bulk_status_on_empty_selection_is_rejected() {
        let mut sel = Selection::new();
        assert!(matches!(
            sel.apply_bulk_status(&portfolio(), WorkStatus::Completed),
            Err(BulkError::EmptySelection)
        ));
    }

    #[test]
    fn bulk_violations_replace_list() {
        let mut before = portfolio();
        before.projects[0].objects[0].violation_types = vec!["12.9 ч.1".into()];
        let mut sel = selection(&["a", "x"]);
        let (after, _) = sel
            .apply_bulk_violations(&before, &["12.12 ч.2", "12.15 ч.2", "12.12 ч.2"])
            .unwrap();

        assert_eq!(
            object(&after, "a").violation_types,
            vec!["12.12 ч.2", "12.15 ч.2"]
        );
        assert_eq!(
            object(&after, "x").violation_types,
            vec!["12.12 ч.2", "12.15 ч.2"]
        );
        assert!(sel.is_empty());
    }

    #[test]
    fn bulk_violations_empty_list_keeps_everything() {
        let mut before = portfolio();
        before.projects[0].objects[0].violation_types = vec!["12.9 ч.1".into()];
        let mut sel = selection(&["a"]);
        let empty: [&str; 0] = [];

        assert!(matches!(
            sel.apply_bulk_violations(&before, &empty),
            Err(BulkError::EmptyViolations)
        ));
        assert_eq!(sel.len(), 1);
        assert_eq!(object(&before, "a").violation_types, vec!["12.9 ч.1"]);
    }

    #[test]
    fn bulk_violations_reject_unknown_codes() {
        let mut sel = selection(&["a"]);
        assert!(matches!(
            sel.apply_bulk_violations(&portfolio(), &["99.1"]),
            Err(BulkError::UnknownViolation(c)) if c == "99.1"
        ));
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn prune_drops_missing_ids() {
        let mut sel = selection(&["a", "gone", "y"]);
        assert_eq!(sel.prune(&portfolio()), 1);
        assert_eq!(sel, selection(&["a", "y"]));
    }

    #[test]
    fn serializes_as_plain_list() {
        let sel = selection(&["b", "a"]);
        assert_eq!(serde_json::to_string(&sel).unwrap(), r#"["a","b"]"#);
    }
}
