pub mod columns;
pub mod export;
pub mod import;
pub mod layout;

pub use columns::{COLUMNS, Column, ColumnKind};
pub use export::{ExportScope, cell_for, export_file_name, export_rows, export_to_buffer, export_to_path};
pub use import::{ImportOutcome, import_file, merge_rows, read_rows};
pub use layout::{ColumnLayout, LayoutError, Section};

/// Name of the worksheet holding the object table
pub const SHEET_NAME: &str = "Объекты";

pub const YES: &str = "Да";
pub const NO: &str = "Нет";

/// Error type for workbook exchange
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    #[error("failed to read workbook: {0}")]
    Read(#[from] calamine::XlsxError),
    #[error("workbook has no sheets")]
    NoSheet,
    #[error("sheet is empty")]
    Empty,
    #[error("header row has no known columns")]
    NoColumns,
}

/// A non-empty cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Text rendering; whole numbers print without a fractional part
    pub fn as_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => if *b { YES } else { NO }.to_string(),
        }
    }
}

/// One data row keyed by column; absent cells are missing from the map
pub type SheetRow = indexmap::IndexMap<Column, Cell>;
