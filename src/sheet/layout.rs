use super::columns::{COLUMNS, Column};
use crate::model::config::{ColumnGroupConfig, ColumnsConfig};

/// Error type for object table layouts
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("at least one column must be visible")]
    NoColumns,
    #[error("column group label cannot be empty")]
    EmptyGroupLabel,
    #[error("column group not found: {0}")]
    GroupNotFound(String),
    #[error("column {0} is not visible")]
    NotVisible(String),
}

/// Find a column by field key or sheet label
pub fn parse_column(s: &str) -> Result<Column, LayoutError> {
    Column::from_header(s).ok_or_else(|| LayoutError::UnknownColumn(s.trim().to_string()))
}

/// Parse a comma-separated column list, dropping repeats
pub fn parse_column_list(raw: &str) -> Result<Vec<Column>, LayoutError> {
    let mut out: Vec<Column> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let column = parse_column(part)?;
        if !out.contains(&column) {
            out.push(column);
        }
    }
    if out.is_empty() {
        return Err(LayoutError::NoColumns);
    }
    Ok(out)
}

fn keys(columns: &[Column]) -> Vec<String> {
    columns.iter().map(|c| c.key().to_string()).collect()
}

/// A run of adjacent table columns: one group, or the ungrouped rest
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub group: Option<String>,
    pub collapsed: bool,
    /// Visible member columns, listed even when the group is collapsed
    pub columns: Vec<Column>,
}

impl Section {
    /// Columns that get a cell in each row
    pub fn shown(&self) -> &[Column] {
        if self.collapsed { &[] } else { &self.columns }
    }
}

/// Resolved object table layout.
///
/// Grouped columns come first, group by group in config order, then the
/// ungrouped ones. Within a section columns keep their `visible` order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    sections: Vec<Section>,
}

impl ColumnLayout {
    pub fn from_config(config: &ColumnsConfig) -> Result<ColumnLayout, LayoutError> {
        let visible = parse_visible(config)?;
        if visible.is_empty() {
            return Err(LayoutError::NoColumns);
        }

        let mut claimed: Vec<Column> = Vec::new();
        let mut sections = Vec::new();
        for group in &config.groups {
            let label = group.label.trim();
            if label.is_empty() {
                return Err(LayoutError::EmptyGroupLabel);
            }
            let members = group
                .columns
                .iter()
                .map(|k| parse_column(k))
                .collect::<Result<Vec<_>, _>>()?;
            // a column belongs to the first group that lists it
            let columns: Vec<Column> = visible
                .iter()
                .copied()
                .filter(|c| members.contains(c) && !claimed.contains(c))
                .collect();
            if columns.is_empty() {
                continue;
            }
            claimed.extend(&columns);
            sections.push(Section {
                group: Some(label.to_string()),
                collapsed: group.collapsed,
                columns,
            });
        }

        let rest: Vec<Column> = visible.into_iter().filter(|c| !claimed.contains(c)).collect();
        if !rest.is_empty() {
            sections.push(Section {
                group: None,
                collapsed: false,
                columns: rest,
            });
        }
        Ok(ColumnLayout { sections })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn has_groups(&self) -> bool {
        self.sections.iter().any(|s| s.group.is_some())
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        ColumnLayout {
            sections: vec![Section {
                group: None,
                collapsed: false,
                columns: vec![
                    Column::Id,
                    Column::Name,
                    Column::Stage,
                    Column::DeliveryStage,
                    Column::WorkStatus,
                ],
            }],
        }
    }
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

/// Append columns that are not shown yet
pub fn show_columns(config: &ColumnsConfig, columns: &[Column]) -> Result<ColumnsConfig, LayoutError> {
    let mut visible = parse_visible(config)?;
    for column in columns {
        if !visible.contains(column) {
            visible.push(*column);
        }
    }
    Ok(ColumnsConfig {
        visible: keys(&visible),
        groups: config.groups.clone(),
    })
}

pub fn hide_columns(config: &ColumnsConfig, columns: &[Column]) -> Result<ColumnsConfig, LayoutError> {
    let visible: Vec<Column> = parse_visible(config)?
        .into_iter()
        .filter(|c| !columns.contains(c))
        .collect();
    if visible.is_empty() {
        return Err(LayoutError::NoColumns);
    }
    Ok(ColumnsConfig {
        visible: keys(&visible),
        groups: config.groups.clone(),
    })
}

/// Move a visible column to a 1-based position; positions past the end
/// move it last
pub fn move_column(config: &ColumnsConfig, column: Column, position: usize) -> Result<ColumnsConfig, LayoutError> {
    let mut visible = parse_visible(config)?;
    let from = visible
        .iter()
        .position(|c| *c == column)
        .ok_or_else(|| LayoutError::NotVisible(column.key().to_string()))?;
    let moved = visible.remove(from);
    let to = position.saturating_sub(1).min(visible.len());
    visible.insert(to, moved);
    Ok(ColumnsConfig {
        visible: keys(&visible),
        groups: config.groups.clone(),
    })
}

/// Create the group, or replace the members of the one with this label.
/// Listed columns leave any other group.
pub fn set_group(config: &ColumnsConfig, label: &str, columns: &[Column]) -> Result<ColumnsConfig, LayoutError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(LayoutError::EmptyGroupLabel);
    }
    let listed = keys(columns);
    let mut groups: Vec<ColumnGroupConfig> = config
        .groups
        .iter()
        .cloned()
        .map(|mut g| {
            g.columns.retain(|k| !columns.iter().any(|c| Column::from_header(k) == Some(*c)));
            g
        })
        .collect();
    match groups.iter_mut().find(|g| g.label == label) {
        Some(group) => group.columns = listed,
        None => groups.push(ColumnGroupConfig {
            label: label.to_string(),
            columns: listed,
            collapsed: false,
        }),
    }
    Ok(ColumnsConfig {
        visible: config.visible.clone(),
        groups,
    })
}

pub fn remove_group(config: &ColumnsConfig, label: &str) -> Result<ColumnsConfig, LayoutError> {
    let label = label.trim();
    if !config.groups.iter().any(|g| g.label == label) {
        return Err(LayoutError::GroupNotFound(label.to_string()));
    }
    Ok(ColumnsConfig {
        visible: config.visible.clone(),
        groups: config.groups.iter().filter(|g| g.label != label).cloned().collect(),
    })
}

pub fn set_collapsed(config: &ColumnsConfig, label: &str, collapsed: bool) -> Result<ColumnsConfig, LayoutError> {
    let label = label.trim();
    let mut next = config.clone();
    let group = next
        .groups
        .iter_mut()
        .find(|g| g.label == label)
        .ok_or_else(|| LayoutError::GroupNotFound(label.to_string()))?;
    group.collapsed = collapsed;
    Ok(next)
}

fn parse_visible(config: &ColumnsConfig) -> Result<Vec<Column>, LayoutError> {
    let mut out: Vec<Column> = Vec::new();
    for key in &config.visible {
        let column = parse_column(key)?;
        if !out.contains(&column) {
            out.push(column);
        }
    }
    Ok(out)
}

/// Every column with its 1-based position when visible and its group
pub fn describe(config: &ColumnsConfig) -> Result<Vec<(Column, Option<usize>, Option<&str>)>, LayoutError> {
    let visible = parse_visible(config)?;
    let group_of = |column: Column| {
        config
            .groups
            .iter()
            .find(|g| g.columns.iter().any(|k| Column::from_header(k) == Some(column)))
            .map(|g| g.label.as_str())
    };
    let hidden = COLUMNS.into_iter().filter(|c| !visible.contains(c));
    Ok(visible
        .iter()
        .copied()
        .enumerate()
        .map(|(i, c)| (c, Some(i + 1), group_of(c)))
        .chain(hidden.map(|c| (c, None, group_of(c))))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(visible: &[&str], groups: &[(&str, &[&str], bool)]) -> ColumnsConfig {
        ColumnsConfig {
            visible: visible.iter().map(|s| s.to_string()).collect(),
            groups: groups
                .iter()
                .map(|(label, columns, collapsed)| ColumnGroupConfig {
                    label: label.to_string(),
                    columns: columns.iter().map(|s| s.to_string()).collect(),
                    collapsed: *collapsed,
                })
                .collect(),
        }
    }

    #[test]
    fn default_config_matches_default_layout() {
        let layout = ColumnLayout::from_config(&ColumnsConfig::default()).unwrap();
        assert_eq!(layout, ColumnLayout::default());
        assert!(!layout.has_groups());
    }

    #[test]
    fn grouped_columns_come_first() {
        let cfg = config(
            &["name", "region", "inspection", "poleInstallationPermit"],
            &[("Разрешения", &["poleInstallationPermit", "inspection"], false)],
        );
        let layout = ColumnLayout::from_config(&cfg).unwrap();
        let sections = layout.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].group.as_deref(), Some("Разрешения"));
        // visible order wins over the order inside the group
        assert_eq!(sections[0].columns, vec![Column::Inspection, Column::PoleInstallationPermit]);
        assert_eq!(sections[1].columns, vec![Column::Name, Column::Region]);
    }

    #[test]
    fn groups_without_visible_members_are_skipped() {
        let cfg = config(&["name"], &[("Работы", &["constructionWork"], false)]);
        let layout = ColumnLayout::from_config(&cfg).unwrap();
        assert!(!layout.has_groups());
    }

    #[test]
    fn collapsed_group_shows_no_cells() {
        let cfg = config(&["name", "inspection"], &[("Разрешения", &["inspection"], true)]);
        let layout = ColumnLayout::from_config(&cfg).unwrap();
        assert!(layout.sections()[0].shown().is_empty());
        assert_eq!(layout.sections()[0].columns, vec![Column::Inspection]);
    }

    #[test]
    fn layout_rejects_unknown_and_empty() {
        assert_eq!(
            ColumnLayout::from_config(&config(&["name", "colour"], &[])),
            Err(LayoutError::UnknownColumn("colour".into()))
        );
        assert_eq!(ColumnLayout::from_config(&config(&[], &[])), Err(LayoutError::NoColumns));
        assert_eq!(
            ColumnLayout::from_config(&config(&["name"], &[(" ", &["name"], false)])),
            Err(LayoutError::EmptyGroupLabel)
        );
    }

    #[test]
    fn column_list_accepts_keys_and_labels() {
        assert_eq!(
            parse_column_list("name, Регион,name").unwrap(),
            vec![Column::Name, Column::Region]
        );
        assert_eq!(parse_column_list(" , "), Err(LayoutError::NoColumns));
    }

    #[test]
    fn show_hide_and_move() {
        let cfg = ColumnsConfig::default();
        let cfg = show_columns(&cfg, &[Column::Region, Column::Name]).unwrap();
        assert_eq!(cfg.visible.last().map(String::as_str), Some("region"));

        let cfg = move_column(&cfg, Column::Region, 1).unwrap();
        assert_eq!(cfg.visible[0], "region");
        let cfg = move_column(&cfg, Column::Region, 99).unwrap();
        assert_eq!(cfg.visible.last().map(String::as_str), Some("region"));
        assert!(matches!(
            move_column(&cfg, Column::Notes, 1),
            Err(LayoutError::NotVisible(_))
        ));

        let cfg = hide_columns(&cfg, &[Column::Stage, Column::DeliveryStage]).unwrap();
        assert_eq!(cfg.visible, vec!["id", "name", "workStatus", "region"]);
        assert_eq!(
            hide_columns(&cfg, &[Column::Id, Column::Name, Column::WorkStatus, Column::Region]),
            Err(LayoutError::NoColumns)
        );
    }

    #[test]
    fn regrouping_moves_columns_between_groups() {
        let cfg = config(&["inspection", "notes"], &[("Разрешения", &["inspection", "notes"], false)]);
        let cfg = set_group(&cfg, "Прочее", &[Column::Notes]).unwrap();
        assert_eq!(cfg.groups[0].columns, vec!["inspection"]);
        assert_eq!(cfg.groups[1].label, "Прочее");
        assert_eq!(cfg.groups[1].columns, vec!["notes"]);

        let cfg = set_collapsed(&cfg, "Прочее", true).unwrap();
        assert!(cfg.groups[1].collapsed);
        let cfg = remove_group(&cfg, "Разрешения").unwrap();
        assert_eq!(cfg.groups.len(), 1);
        assert_eq!(remove_group(&cfg, "нет такой"), Err(LayoutError::GroupNotFound("нет такой".into())));
    }

    #[test]
    fn describe_lists_visible_then_hidden() {
        let cfg = config(&["notes", "id"], &[("Прочее", &["notes"], false)]);
        let rows = describe(&cfg).unwrap();
        assert_eq!(rows.len(), COLUMNS.len());
        assert_eq!(rows[0], (Column::Notes, Some(1), Some("Прочее")));
        assert_eq!(rows[1], (Column::Id, Some(2), None));
        assert_eq!(rows[2], (Column::Name, None, None));
    }
}
