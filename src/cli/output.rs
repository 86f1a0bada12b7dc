use indexmap::IndexMap;
use serde::Serialize;

use crate::api::{ActivityLog, ManagedUser};
use crate::model::ids::{ObjectId, ProjectId};
use crate::model::object::ProjectObject;
use crate::model::project::Project;
use crate::model::status::StatusRegistry;
use crate::ops::check::{CheckError, CheckResult, CheckWarning};
use crate::ops::project_ops::{PortfolioStats, ProjectCounts};
use crate::ops::selection::Selection;
use crate::sheet::{Column, ColumnLayout, Section, cell_for, export_rows};
use crate::util::unicode::{display_width, pad_left_to_width, pad_to_width};

const NAME_MAX: usize = 40;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ProjectSummaryJson<'a> {
    pub id: &'a ProjectId,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub progress: u8,
    pub budget: f64,
    pub spent: f64,
    pub start_date: String,
    pub end_date: String,
    pub stages: usize,
    pub objects: usize,
    pub active: bool,
}

/// An object as listed by `sm objects`: the stored fields plus the resolved
/// stage name and selection flag
#[derive(Serialize)]
pub struct ObjectRowJson<'a> {
    #[serde(flatten)]
    pub object: &'a ProjectObject,
    pub stage_name: Option<&'a str>,
    pub status_label: &'a str,
    pub selected: bool,
}

#[derive(Serialize)]
pub struct ProjectCountsJson<'a> {
    pub id: &'a ProjectId,
    pub name: &'a str,
    pub objects: usize,
    pub categories: IndexMap<&'static str, usize>,
    pub work_statuses: IndexMap<&'static str, usize>,
}

#[derive(Serialize)]
pub struct SelectedJson<'a> {
    pub id: &'a ObjectId,
    pub project_id: Option<&'a ProjectId>,
    pub name: Option<&'a str>,
}

#[derive(Serialize)]
pub struct StatsJson<'a> {
    #[serde(flatten)]
    pub portfolio: &'a PortfolioStats,
    pub projects: Vec<ProjectCountsJson<'a>>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn project_to_json<'a>(project: &'a Project, active: Option<&ProjectId>) -> ProjectSummaryJson<'a> {
    ProjectSummaryJson {
        id: &project.id,
        name: &project.name,
        kind: project.kind.to_string(),
        status: project.status.to_string(),
        progress: project.progress,
        budget: project.budget,
        spent: project.spent,
        start_date: project.start_date.to_string(),
        end_date: project.end_date.to_string(),
        stages: project.stages.len(),
        objects: project.objects.len(),
        active: active == Some(&project.id),
    }
}

pub fn object_to_json<'a>(
    project: &'a Project,
    object: &'a ProjectObject,
    selection: &Selection,
    registry: &'a StatusRegistry,
) -> ObjectRowJson<'a> {
    ObjectRowJson {
        object,
        stage_name: project.stage_label(object),
        status_label: registry.label(object.work_status),
        selected: selection.contains(&object.id),
    }
}

pub fn counts_to_json<'a>(project: &'a Project, counts: &ProjectCounts) -> ProjectCountsJson<'a> {
    ProjectCountsJson {
        id: &project.id,
        name: &project.name,
        objects: counts.objects,
        categories: counts.categories.iter().map(|(c, n)| (c.as_str(), *n)).collect(),
        work_statuses: counts.work_statuses.iter().map(|(ws, n)| (ws.as_str(), *n)).collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// `450000000` → `450.0 млн ₽`
pub fn format_millions(amount: f64) -> String {
    format!("{:.1} млн ₽", amount / 1_000_000.0)
}

/// `1390000000` → `1.39 млрд ₽`
pub fn format_billions(amount: f64) -> String {
    format!("{:.2} млрд ₽", amount / 1_000_000_000.0)
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, max: usize) -> usize {
    values.map(display_width).max().unwrap_or(0).min(max)
}

/// One line per project; the open project is marked with `>`
pub fn format_projects(projects: &[Project], active: Option<&ProjectId>) -> Vec<String> {
    let id_w = column_width(projects.iter().map(|p| p.id.as_str()), 20);
    let name_w = column_width(projects.iter().map(|p| p.name.as_str()), NAME_MAX);
    projects
        .iter()
        .map(|p| {
            let mark = if active == Some(&p.id) { '>' } else { ' ' };
            format!(
                "{} {}  {}  {:>3}%  {}  {} / {}",
                mark,
                pad_to_width(p.id.as_str(), id_w),
                pad_to_width(&p.name, name_w),
                p.progress,
                p.status.label(),
                format_millions(p.spent),
                format_millions(p.budget),
            )
        })
        .collect()
}

pub fn format_project_detail(project: &Project) -> Vec<String> {
    vec![
        format!("{} {}", project.id, project.name),
        format!("type: {}", project.kind),
        format!("status: {} ({})", project.status.label(), project.status),
        format!("progress: {}%", project.progress),
        format!("budget: {}", format_millions(project.budget)),
        format!("spent: {}", format_millions(project.spent)),
        format!("dates: {}..{}", project.start_date, project.end_date),
        format!("stages: {}", project.stages.len()),
        format!("objects: {}", project.objects.len()),
    ]
}

pub fn format_stages(project: &Project) -> Vec<String> {
    let id_w = column_width(project.stages.iter().map(|s| s.id.as_str()), 20);
    let name_w = column_width(project.stages.iter().map(|s| s.name.as_str()), NAME_MAX);
    project
        .stages
        .iter()
        .map(|s| {
            format!(
                "{}  {}  {:>3}%  {}..{}  {}",
                pad_to_width(s.id.as_str(), id_w),
                pad_to_width(&s.name, name_w),
                s.progress,
                s.start_date,
                s.end_date,
                s.status.label(),
            )
        })
        .collect()
}

const CELL_MAX: usize = 32;

/// One printed column: a table column, or the stand-in for a collapsed group
enum TableColumn {
    Field(Column),
    Collapsed,
}

fn group_title(section: &Section) -> Option<String> {
    let label = section.group.as_deref()?;
    let arrow = if section.collapsed { '\u{25b8}' } else { '\u{25be}' };
    Some(format!("{} {} ({})", arrow, label, section.columns.len()))
}

/// Object table laid out by `[columns]`, with a header line (two when
/// groups are in use); selected rows are marked with `*`
pub fn format_objects(
    project: &Project,
    objects: &[&ProjectObject],
    selection: &Selection,
    registry: &StatusRegistry,
    layout: &ColumnLayout,
) -> Vec<String> {
    let mut columns: Vec<TableColumn> = Vec::new();
    // (title, first printed column, printed column count) per section
    let mut spans: Vec<(String, usize, usize)> = Vec::new();
    for section in layout.sections() {
        let first = columns.len();
        if section.collapsed {
            columns.push(TableColumn::Collapsed);
        } else {
            columns.extend(section.shown().iter().map(|c| TableColumn::Field(*c)));
        }
        spans.push((group_title(section).unwrap_or_default(), first, columns.len() - first));
    }

    let headers: Vec<&str> = columns
        .iter()
        .map(|c| match c {
            TableColumn::Field(column) => column.label(),
            TableColumn::Collapsed => "",
        })
        .collect();
    let cells: Vec<Vec<String>> = objects
        .iter()
        .map(|o| {
            columns
                .iter()
                .map(|c| match c {
                    TableColumn::Field(column) => cell_for(*column, o, project, registry)
                        .map(|cell| cell.as_text())
                        .unwrap_or_else(|| "-".to_string()),
                    TableColumn::Collapsed => "\u{2026}".to_string(),
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = (0..columns.len())
        .map(|i| {
            let header = std::iter::once(headers[i]);
            column_width(header.chain(cells.iter().map(|row| row[i].as_str())), CELL_MAX)
        })
        .collect();
    // a group title wider than its columns widens the last of them
    for (title, first, count) in &spans {
        let (first, count) = (*first, *count);
        if count == 0 {
            continue;
        }
        let last = first + count - 1;
        let span: usize = widths[first..=last].iter().sum::<usize>() + 2 * (count - 1);
        let need = display_width(title);
        if need > span {
            widths[last] += need - span;
        }
    }

    let join = |parts: Vec<String>| parts.join("  ").trim_end().to_string();
    let mut lines = Vec::new();
    if layout.has_groups() {
        let titles: Vec<String> = spans
            .iter()
            .map(|(title, first, count)| {
                let span = widths[*first..first + count].iter().sum::<usize>() + 2 * (count - 1);
                pad_to_width(title, span)
            })
            .collect();
        lines.push(format!("  {}", join(titles)));
    }
    let header: Vec<String> = headers.iter().zip(&widths).map(|(h, w)| pad_to_width(h, *w)).collect();
    lines.push(format!("  {}", join(header)));
    for (o, row) in objects.iter().zip(&cells) {
        let mark = if selection.contains(&o.id) { '*' } else { ' ' };
        let padded: Vec<String> = row.iter().zip(&widths).map(|(c, w)| pad_to_width(c, *w)).collect();
        lines.push(format!("{} {}", mark, join(padded)));
    }
    lines
}

/// Every field of one object, labelled as in the spreadsheet
pub fn format_object_detail(project: &Project, object: &ProjectObject, registry: &StatusRegistry) -> Vec<String> {
    let rows = export_rows(project, &[object], registry);
    let Some(row) = rows.first() else {
        return Vec::new();
    };
    row.iter()
        .map(|(column, cell)| format!("{}: {}", column.label(), cell.as_text()))
        .collect()
}

pub fn format_stats(stats: &PortfolioStats, per_project: &[(&Project, ProjectCounts)], registry: &StatusRegistry) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Проекты: {} (активных: {})",
            stats.total_projects, stats.active_projects
        ),
        format!("Бюджет: {}", format_billions(stats.total_budget)),
        format!("Освоено: {}", format_billions(stats.total_spent)),
        format!("Объекты: {}", stats.total_objects),
    ];
    for (project, counts) in per_project {
        lines.push(String::new());
        lines.push(format!("{} {} ({} objects)", project.id, project.name, counts.objects));
        let categories: Vec<String> = counts
            .categories
            .iter()
            .map(|(c, n)| format!("{}: {}", c, n))
            .collect();
        lines.push(format!("  {}", categories.join("  ")));
        let statuses: Vec<String> = counts
            .work_statuses
            .iter()
            .map(|(ws, n)| format!("{}: {}", registry.label(*ws), n))
            .collect();
        lines.push(format!("  {}", statuses.join("  ")));
    }
    lines
}

pub fn format_check(result: &CheckResult) -> Vec<String> {
    let mut lines = Vec::new();
    if !result.errors.is_empty() {
        lines.push("Errors:".to_string());
        for err in &result.errors {
            lines.push(match err {
                CheckError::DanglingStage {
                    project_id,
                    object_id,
                    stage_id,
                } => format!("  [{}] {} references missing stage {}", project_id, object_id, stage_id),
                CheckError::DuplicateId {
                    collection,
                    project_id,
                    id,
                } if project_id.is_empty() => format!("  duplicate {} id: {}", collection, id),
                CheckError::DuplicateId {
                    collection,
                    project_id,
                    id,
                } => format!("  [{}] duplicate {} id: {}", project_id, collection, id),
                CheckError::DuplicateViolation {
                    project_id,
                    object_id,
                    code,
                } => format!("  [{}] {} lists violation {} twice", project_id, object_id, code),
            });
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            lines.push(String::new());
        }
        lines.push("Warnings:".to_string());
        for warn in &result.warnings {
            lines.push(match warn {
                CheckWarning::UnknownViolation {
                    project_id,
                    object_id,
                    code,
                } => format!("  [{}] {} has unknown violation code {}", project_id, object_id, code),
                CheckWarning::ProgressOutOfRange {
                    project_id,
                    stage_id: Some(stage_id),
                    progress,
                } => format!("  [{}] stage {} progress {}% is out of range", project_id, stage_id, progress),
                CheckWarning::ProgressOutOfRange {
                    project_id,
                    stage_id: None,
                    progress,
                } => format!("  [{}] progress {}% is out of range", project_id, progress),
                CheckWarning::OverBudget {
                    project_id,
                    budget,
                    spent,
                } => format!(
                    "  [{}] spent {} exceeds budget {}",
                    project_id,
                    format_millions(*spent),
                    format_millions(*budget)
                ),
                CheckWarning::InvertedDates {
                    project_id,
                    stage_id: Some(stage_id),
                } => format!("  [{}] stage {} ends before it starts", project_id, stage_id),
                CheckWarning::InvertedDates {
                    project_id,
                    stage_id: None,
                } => format!("  [{}] project ends before it starts", project_id),
            });
        }
    }
    if result.valid {
        lines.push("\u{2713} portfolio is valid".to_string());
    } else {
        lines.push("\u{2717} portfolio has errors".to_string());
    }
    lines
}

pub fn format_users(users: &[ManagedUser]) -> Vec<String> {
    let email_w = column_width(users.iter().map(|u| u.email.as_str()), 40);
    let id_w = users.iter().map(|u| u.id.to_string().len()).max().unwrap_or(0);
    users
        .iter()
        .map(|u| {
            format!(
                "{}  {}  {:<5}  {}  {}  {}",
                pad_left_to_width(&u.id.to_string(), id_w),
                pad_to_width(&u.email, email_w),
                u.role.to_string(),
                if u.is_active { "active  " } else { "inactive" },
                u.full_name.as_deref().unwrap_or("-"),
                u.last_login.as_deref().unwrap_or("-"),
            )
        })
        .collect()
}

pub fn format_logs(logs: &[ActivityLog]) -> Vec<String> {
    logs.iter()
        .map(|l| {
            let entity = match (&l.entity_type, &l.entity_id) {
                (Some(kind), Some(id)) => match id.as_str() {
                    Some(id) => format!(" {}:{}", kind, id),
                    None => format!(" {}:{}", kind, id),
                },
                (Some(kind), None) => format!(" {}", kind),
                _ => String::new(),
            };
            format!(
                "{}  {}  {}{}  {}",
                l.created_at.as_deref().unwrap_or("-"),
                l.user_email,
                l.action,
                entity,
                l.ip_address.as_deref().unwrap_or("-"),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::{ColumnGroupConfig, ColumnsConfig};
    use crate::model::ids::StageId;
    use crate::model::project::{ProjectHealth, ProjectKind};
    use crate::model::stage::{Stage, StageStatus};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn project() -> Project {
        let mut placed = ProjectObject::blank(ObjectId::new("o-1"), "Опора №1");
        placed.stage_id = Some(StageId::new("s2"));
        let mut orphan = ProjectObject::blank(ObjectId::new("o-2"), "Камера");
        orphan.stage_id = Some(StageId::new("gone"));
        Project {
            id: ProjectId::new("2"),
            name: "Мост".into(),
            kind: ProjectKind::Bridge,
            progress: 43,
            budget: 820_000_000.0,
            spent: 352_600_000.0,
            status: ProjectHealth::AtRisk,
            start_date: date("2024-02-01"),
            end_date: date("2026-11-20"),
            stages: vec![
                Stage {
                    id: StageId::new("s1"),
                    name: "Проект".into(),
                    progress: 100,
                    start_date: date("2024-01-15"),
                    end_date: date("2024-03-20"),
                    status: StageStatus::Completed,
                },
                Stage {
                    id: StageId::new("s2"),
                    name: "Стройка".into(),
                    progress: 40,
                    start_date: date("2024-03-21"),
                    end_date: date("2024-09-30"),
                    status: StageStatus::InProgress,
                },
            ],
            objects: vec![placed, orphan],
        }
    }

    #[test]
    fn money_formats() {
        assert_eq!(format_millions(450_000_000.0), "450.0 млн ₽");
        assert_eq!(format_billions(1_390_000_000.0), "1.39 млрд ₽");
    }

    #[test]
    fn stages_table() {
        let out = format_stages(&project()).join("\n");
        insta::assert_snapshot!(out, @r"
        s1  Проект   100%  2024-01-15..2024-03-20  Завершен
        s2  Стройка   40%  2024-03-21..2024-09-30  В работе
        ");
    }

    fn objects_table(layout: &ColumnLayout) -> Vec<String> {
        let p = project();
        let objects: Vec<&ProjectObject> = p.objects.iter().collect();
        let mut selection = Selection::new();
        selection.toggle(ObjectId::new("o-2"));
        format_objects(&p, &objects, &selection, &StatusRegistry::default(), layout)
    }

    fn permits_layout(collapsed: bool) -> ColumnLayout {
        let config = ColumnsConfig {
            visible: ["name", "inspection", "poleInstallationPermit", "workStatus"]
                .map(String::from)
                .to_vec(),
            groups: vec![ColumnGroupConfig {
                label: "Разрешения".into(),
                columns: vec!["inspection".into(), "poleInstallationPermit".into()],
                collapsed,
            }],
        };
        ColumnLayout::from_config(&config).unwrap()
    }

    #[test]
    fn objects_table_marks_selection_and_missing_stage() {
        assert_eq!(
            objects_table(&ColumnLayout::default()),
            vec![
                "  ID   Название  Этап         Этап сдачи  Статус работ",
                "  o-1  Опора №1  Стройка      -           Не начато",
                "* o-2  Камера    Этап удален  -           Не начато",
            ]
        );
    }

    #[test]
    fn objects_table_puts_groups_first() {
        assert_eq!(
            objects_table(&permits_layout(false)),
            vec![
                "  \u{25be} Разрешения (2)",
                "  Обследование  Разрешение на установку опор  Название  Статус работ",
                "  Нет           Нет                           Опора №1  Не начато",
                "* Нет           Нет                           Камера    Не начато",
            ]
        );
    }

    #[test]
    fn collapsed_group_prints_one_placeholder_column() {
        assert_eq!(
            objects_table(&permits_layout(true)),
            vec![
                "  \u{25b8} Разрешения (2)",
                "                    Название  Статус работ",
                "  \u{2026}                 Опора №1  Не начато",
                "* \u{2026}                 Камера    Не начато",
            ]
        );
    }

    #[test]
    fn object_detail_uses_sheet_labels() {
        let p = project();
        let lines = format_object_detail(&p, &p.objects[0], &StatusRegistry::default());
        assert!(lines.contains(&"Название: Опора №1".to_string()));
        assert!(lines.contains(&"Этап: Стройка".to_string()));
    }

    #[test]
    fn projects_mark_active() {
        let p = project();
        let lines = format_projects(std::slice::from_ref(&p), Some(&p.id));
        assert_eq!(lines, vec!["> 2  Мост   43%  Риски  352.6 млн ₽ / 820.0 млн ₽"]);
    }

    #[test]
    fn clean_check_reports_valid() {
        let result = CheckResult {
            valid: true,
            ..Default::default()
        };
        assert_eq!(format_check(&result), vec!["\u{2713} portfolio is valid"]);
    }
}
