use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};

use super::columns::{COLUMNS, Column, ColumnKind};
use super::{Cell, NO, SHEET_NAME, SheetError, SheetRow, YES};
use crate::model::object::ProjectObject;
use crate::model::project::Project;
use crate::model::status::StatusRegistry;

/// Which objects an export covers; part of the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    All,
    Selected,
}

impl ExportScope {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportScope::All => "all",
            ExportScope::Selected => "selected",
        }
    }
}

/// `<project>_<all|selected>_<YYYY-MM-DD>.xlsx`, with characters that are
/// not allowed in file names replaced by `_`
pub fn export_file_name(project_name: &str, scope: ExportScope, date: NaiveDate) -> String {
    let name: String = project_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}_{}_{}.xlsx", name, scope.as_str(), date.format("%Y-%m-%d"))
}

fn text(value: &str) -> Option<Cell> {
    (!value.is_empty()).then(|| Cell::Text(value.to_string()))
}

fn flag(value: bool) -> Option<Cell> {
    Some(Cell::Text(if value { YES } else { NO }.to_string()))
}

/// The cell written for one field of an object; `None` leaves it blank
pub fn cell_for(column: Column, object: &ProjectObject, project: &Project, registry: &StatusRegistry) -> Option<Cell> {
    match column {
        Column::Id => text(object.id.as_str()),
        Column::Name => text(&object.name),
        Column::Stage => project.stage_label(object).and_then(text),
        Column::DeliveryStage => object.delivery_stage.map(|d| Cell::Text(d.to_string())),
        Column::Region => text(&object.region),
        Column::District => text(&object.district),
        Column::Location => text(&object.location),
        Column::Coordinates => text(&object.coordinates),
        Column::Inspection => flag(object.inspection),
        Column::PoleInstallationPermit => flag(object.pole_installation_permit),
        Column::PowerConnectionPermit => flag(object.power_connection_permit),
        Column::OtherPermits => text(&object.other_permits),
        Column::EquipmentNumber => text(&object.equipment_number),
        Column::Quantity => Some(Cell::Number(f64::from(object.quantity))),
        Column::VerificationCertificate => flag(object.verification_certificate),
        Column::ExecutiveDocumentation => flag(object.executive_documentation),
        Column::ConstructionWork => flag(object.construction_work),
        Column::CommissioningWork => flag(object.commissioning_work),
        Column::TrafficArrangement => flag(object.traffic_arrangement),
        Column::WebUpload => flag(object.web_upload),
        Column::ViolationRecording => flag(object.violation_recording),
        Column::ViolationTypes => text(&object.violation_types.join(", ")),
        Column::DocumentationUrl => text(&object.documentation_url),
        Column::WorkStatus => text(registry.label(object.work_status)),
        Column::Notes => text(&object.notes),
        Column::MessengerLink => text(&object.messenger_link),
        Column::Operator => text(object.operator.label()),
        Column::ConnectionType => text(object.connection_type.label()),
        Column::TariffCost => Some(Cell::Number(object.tariff_cost)),
    }
}

/// One row per object, in the given order
pub fn export_rows(project: &Project, objects: &[&ProjectObject], registry: &StatusRegistry) -> Vec<SheetRow> {
    objects
        .iter()
        .map(|object| {
            COLUMNS
                .into_iter()
                .filter_map(|column| cell_for(column, object, project, registry).map(|cell| (column, cell)))
                .collect()
        })
        .collect()
}

fn build_workbook(rows: &[SheetRow]) -> Result<Workbook, SheetError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, column) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, column.label(), &header)?;
        sheet.set_column_width(col, column.width())?;
        if *column == Column::Id {
            sheet.set_column_hidden(col)?;
        }
    }
    sheet.set_freeze_panes(1, 0)?;

    for (r, row) in rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (col, column) in COLUMNS.iter().enumerate() {
            let col = col as u16;
            match (row.get(column), column.kind()) {
                (Some(Cell::Number(n)), _) => {
                    sheet.write_number(r, col, *n)?;
                }
                (Some(Cell::Bool(b)), ColumnKind::Flag) => {
                    sheet.write_string(r, col, if *b { YES } else { NO })?;
                }
                (Some(cell), _) => {
                    sheet.write_string(r, col, cell.as_text())?;
                }
                (None, _) => {}
            }
        }
    }
    Ok(workbook)
}

/// Serialize objects to XLSX bytes
pub fn export_to_buffer(
    project: &Project,
    objects: &[&ProjectObject],
    registry: &StatusRegistry,
) -> Result<Vec<u8>, SheetError> {
    let rows = export_rows(project, objects, registry);
    let mut workbook = build_workbook(&rows)?;
    Ok(workbook.save_to_buffer()?)
}

/// Write an export into `dir` under its derived file name. Returns the path.
pub fn export_to_path(
    project: &Project,
    objects: &[&ProjectObject],
    registry: &StatusRegistry,
    scope: ExportScope,
    dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, SheetError> {
    let bytes = export_to_buffer(project, objects, registry)?;
    let path = dir.join(export_file_name(&project.name, scope, date));
    std::fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), rows = objects.len(), scope = scope.as_str(), "export written");
    Ok(path)
}
