use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use calamine::{Data, Range, Reader, Xlsx};

use super::columns::Column;
use super::{Cell, SheetError, SheetRow};
use crate::model::ids::{ObjectId, mint_id};
use crate::model::object::{ConnectionType, DeliveryStage, Operator, ProjectObject};
use crate::model::project::Project;
use crate::model::status::StatusRegistry;
use crate::model::violation;

/// Result of merging an uploaded sheet into a project
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub project: Project,
    pub created: usize,
    pub updated: usize,
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Whitespace-only text counts as empty; other text is kept as written
fn to_cell(data: &Data) -> Option<Cell> {
    match data {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            (!s.trim().is_empty()).then(|| Cell::Text(s.clone()))
        }
        Data::Int(i) => Some(Cell::Number(*i as f64)),
        Data::Float(f) => Some(Cell::Number(*f)),
        Data::Bool(b) => Some(Cell::Bool(*b)),
        Data::DateTime(dt) => Some(Cell::Number(dt.as_f64())),
        Data::Error(_) | Data::Empty => None,
    }
}

/// Turn a sheet range into rows keyed by column.
///
/// The first row is the header. Unknown header cells are ignored and rows
/// with no non-empty known cell are skipped.
pub fn rows_from_range(range: &Range<Data>) -> Result<Vec<SheetRow>, SheetError> {
    let mut rows = range.rows();
    let header = rows.next().ok_or(SheetError::Empty)?;
    let columns: Vec<Option<Column>> = header
        .iter()
        .map(|cell| match to_cell(cell) {
            Some(Cell::Text(s)) => Column::from_header(&s),
            _ => None,
        })
        .collect();
    if columns.iter().all(Option::is_none) {
        return Err(SheetError::NoColumns);
    }

    let mut out = Vec::new();
    for data in rows {
        let mut row = SheetRow::new();
        for (cell, column) in data.iter().zip(&columns) {
            if let Some(column) = column
                && let Some(value) = to_cell(cell)
            {
                row.insert(*column, value);
            }
        }
        if !row.is_empty() {
            out.push(row);
        }
    }
    if out.is_empty() {
        return Err(SheetError::Empty);
    }
    Ok(out)
}

/// Read the first sheet of an XLSX workbook
pub fn read_rows<R: Read + Seek>(reader: R) -> Result<Vec<SheetRow>, SheetError> {
    let mut workbook: Xlsx<R> = Xlsx::new(reader)?;
    let range = workbook.worksheet_range_at(0).ok_or(SheetError::NoSheet)??;
    rows_from_range(&range)
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Yes/no cell: Да/Нет, yes/no, true/false, 1/0 or a native boolean
fn parse_flag(cell: &Cell) -> Option<bool> {
    match cell {
        Cell::Bool(b) => Some(*b),
        Cell::Number(n) if *n == 1.0 => Some(true),
        Cell::Number(n) if *n == 0.0 => Some(false),
        Cell::Number(_) => None,
        Cell::Text(s) => match s.trim().to_lowercase().as_str() {
            "да" | "yes" | "true" | "1" => Some(true),
            "нет" | "no" | "false" | "0" => Some(false),
            _ => None,
        },
    }
}

fn parse_number(cell: &Cell) -> Option<f64> {
    let n: Option<f64> = match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => s.trim().replace(',', ".").replace(' ', "").parse().ok(),
        Cell::Bool(_) => None,
    };
    n.filter(|n| n.is_finite())
}

fn parse_quantity(cell: &Cell) -> Option<u32> {
    parse_number(cell)
        .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n.round() as u32)
}

fn parse_violations(cell: &Cell, row: usize) -> Vec<String> {
    let text = cell.as_text();
    let codes: Vec<&str> = text.split(',').collect();
    violation::dedup_codes(&codes)
        .into_iter()
        .filter(|code| {
            let known = violation::is_known(code);
            if !known {
                tracing::warn!(row, code = %code, "unknown violation code dropped");
            }
            known
        })
        .collect()
}

fn text_field(object: &mut ProjectObject, column: Column) -> Option<&mut String> {
    Some(match column {
        Column::Name => &mut object.name,
        Column::Region => &mut object.region,
        Column::District => &mut object.district,
        Column::Location => &mut object.location,
        Column::Coordinates => &mut object.coordinates,
        Column::OtherPermits => &mut object.other_permits,
        Column::EquipmentNumber => &mut object.equipment_number,
        Column::DocumentationUrl => &mut object.documentation_url,
        Column::Notes => &mut object.notes,
        Column::MessengerLink => &mut object.messenger_link,
        _ => return None,
    })
}

fn flag_field(object: &mut ProjectObject, column: Column) -> Option<&mut bool> {
    Some(match column {
        Column::Inspection => &mut object.inspection,
        Column::PoleInstallationPermit => &mut object.pole_installation_permit,
        Column::PowerConnectionPermit => &mut object.power_connection_permit,
        Column::VerificationCertificate => &mut object.verification_certificate,
        Column::ExecutiveDocumentation => &mut object.executive_documentation,
        Column::ConstructionWork => &mut object.construction_work,
        Column::CommissioningWork => &mut object.commissioning_work,
        Column::TrafficArrangement => &mut object.traffic_arrangement,
        Column::WebUpload => &mut object.web_upload,
        Column::ViolationRecording => &mut object.violation_recording,
        _ => return None,
    })
}

/// Overlay a row onto `object`. Cells that are absent or unreadable leave
/// the current value in place. `work_status` is only taken from the sheet
/// for new objects; the stage column is never read.
fn overlay(object: &mut ProjectObject, row: &SheetRow, row_no: usize, is_new: bool, registry: &StatusRegistry) {
    for (&column, cell) in row {
        if let Some(field) = text_field(object, column) {
            *field = cell.as_text();
            continue;
        }
        if let Some(field) = flag_field(object, column) {
            match parse_flag(cell) {
                Some(b) => *field = b,
                None => skip(row_no, column, cell),
            }
            continue;
        }
        match column {
            Column::Id | Column::Stage => {}
            Column::WorkStatus if !is_new => {}
            Column::WorkStatus => match registry.parse_label(&cell.as_text()) {
                Some(ws) => object.work_status = ws,
                None => skip(row_no, column, cell),
            },
            Column::DeliveryStage => match DeliveryStage::parse(&cell.as_text()) {
                Some(d) => object.delivery_stage = Some(d),
                None => skip(row_no, column, cell),
            },
            Column::Quantity => match parse_quantity(cell) {
                Some(q) => object.quantity = q,
                None => skip(row_no, column, cell),
            },
            Column::TariffCost => match parse_number(cell) {
                Some(n) => object.tariff_cost = n,
                None => skip(row_no, column, cell),
            },
            Column::ViolationTypes => object.violation_types = parse_violations(cell, row_no),
            Column::Operator => match Operator::parse(&cell.as_text()) {
                Some(op) => object.operator = op,
                None => skip(row_no, column, cell),
            },
            Column::ConnectionType => match ConnectionType::parse(&cell.as_text()) {
                Some(ct) => object.connection_type = ct,
                None => skip(row_no, column, cell),
            },
            _ => {}
        }
    }
}

fn skip(row: usize, column: Column, cell: &Cell) {
    tracing::warn!(row, column = column.label(), value = %cell.as_text(), "unreadable cell ignored");
}

/// Merge parsed rows into a project.
///
/// A row whose ID names an existing object updates it in place, keeping its
/// `work_status` and `stage_id`. Any other row becomes a new object with a
/// freshly minted id, appended at the end. Every field not supplied by the
/// row keeps the existing value, or the default for new objects.
pub fn merge_rows(project: &Project, rows: &[SheetRow], registry: &StatusRegistry) -> ImportOutcome {
    let mut next = project.clone();
    let mut created = 0;
    let mut updated = 0;

    for (i, row) in rows.iter().enumerate() {
        // Header is sheet row 1.
        let row_no = i + 2;
        let existing = row
            .get(&Column::Id)
            .map(Cell::as_text)
            .and_then(|id| next.objects.iter().position(|o| o.id == id.trim()));

        match existing {
            Some(pos) => {
                let mut object = next.objects[pos].clone();
                overlay(&mut object, row, row_no, false, registry);
                next.objects[pos] = object;
                updated += 1;
            }
            None => {
                let id = ObjectId::new(mint_id(|c| {
                    project.objects.iter().chain(&next.objects).any(|o| o.id == c)
                }));
                let mut object = ProjectObject::blank(id, "");
                overlay(&mut object, row, row_no, true, registry);
                next.objects.push(object);
                created += 1;
            }
        }
    }

    tracing::info!(project = %project.id, created, updated, "import merged");
    ImportOutcome {
        project: next,
        created,
        updated,
    }
}

/// Read an XLSX file and merge its first sheet into `project`. Nothing is
/// merged if the file cannot be parsed.
pub fn import_file(project: &Project, path: &Path, registry: &StatusRegistry) -> Result<ImportOutcome, SheetError> {
    let file = File::open(path)?;
    let rows = read_rows(BufReader::new(file))?;
    Ok(merge_rows(project, &rows, registry))
}
