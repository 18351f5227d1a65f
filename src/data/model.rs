use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the uploaded sheet
// ---------------------------------------------------------------------------

/// A dynamically-typed spreadsheet cell.
///
/// Dates only appear as [`CellValue::DateTime`] when the workbook itself stored
/// them as dates. Date-looking text stays [`CellValue::Text`] until the age
/// deriver parses it.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Empty,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.2}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", dt.date())
                } else {
                    write!(f, "{dt}")
                }
            }
            CellValue::Empty => Ok(()),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell, used for the derived age column.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map(CellValue::Float).unwrap_or(CellValue::Empty)
    }
}

// ---------------------------------------------------------------------------
// ColumnRef – proof that a column exists
// ---------------------------------------------------------------------------

/// Handle to a column that was found in a [`RecordTable`].
///
/// Only [`RecordTable::column`] hands these out, so holding one means the
/// lookup already succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    index: usize,
}

// ---------------------------------------------------------------------------
// RecordTable – the whole uploaded sheet
// ---------------------------------------------------------------------------

/// One uploaded sheet: ordered columns, ordered rows of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RecordTable {
    /// Build a table from a header row and data rows.
    ///
    /// Blank headers become `Unnamed: {i}` and repeated headers get a numeric
    /// suffix (`NOME`, `NOME.1`, ...). Rows are padded or truncated to the
    /// header width.
    pub fn new(header: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns = normalize_headers(header);
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        RecordTable { columns, rows }
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<ColumnRef> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|index| ColumnRef { index })
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn column_name(&self, column: ColumnRef) -> &str {
        &self.columns[column.index]
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, index: usize) -> &[CellValue] {
        &self.rows[index]
    }

    /// Cell at `row` in a column known to exist.
    pub fn cell(&self, row: usize, column: ColumnRef) -> &CellValue {
        &self.rows[row][column.index]
    }

    /// Every cell of one column, top to bottom.
    pub fn column_values(&self, column: ColumnRef) -> impl Iterator<Item = &CellValue> {
        (0..self.rows.len()).map(move |row| self.cell(row, column))
    }

    /// Append a derived column, or overwrite it if a column of that name
    /// already exists. `values` must have one entry per row.
    pub fn push_column(&mut self, name: &str, values: Vec<CellValue>) -> ColumnRef {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column(name) {
            Some(existing) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[existing.index] = value;
                }
                existing
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
                ColumnRef {
                    index: self.columns.len() - 1,
                }
            }
        }
    }
}

fn normalize_headers(header: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(header.len());

    for (i, raw) in header.into_iter().enumerate() {
        let base = match raw.trim() {
            "" => format!("Unnamed: {i}"),
            trimmed => trimmed.to_string(),
        };
        let name = match seen.get(&base).copied() {
            None => base.clone(),
            Some(mut n) => loop {
                n += 1;
                let candidate = format!("{base}.{n}");
                if !seen.contains_key(&candidate) {
                    seen.insert(base.clone(), n);
                    break candidate;
                }
            },
        };
        seen.entry(base).or_insert(0);
        seen.insert(name.clone(), 0);
        out.push(name);
    }
    out
}

// ---------------------------------------------------------------------------
// Warnings – recoverable conditions shown next to the results
// ---------------------------------------------------------------------------

/// A condition that degrades a result without failing the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    MissingColumn { column: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingColumn { column } => {
                write!(f, "Coluna '{column}' não encontrada na planilha.")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// UploadedFile – the bytes handed over by the upload widget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Upper-cased extension, as shown in the summary metrics.
    pub fn extension(&self) -> String {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_uppercase())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn blank_and_repeated_headers_are_renamed() {
        let table = RecordTable::new(
            vec!["NOME".into(), "".into(), "NOME".into(), "NOME".into()],
            vec![],
        );
        assert_eq!(
            table.column_names(),
            &["NOME", "Unnamed: 1", "NOME.1", "NOME.2"]
        );
    }

    #[test]
    fn short_rows_are_padded_to_header_width() {
        let table = RecordTable::new(
            vec!["A".into(), "B".into()],
            vec![vec![text("x")], vec![text("y"), text("z"), text("extra")]],
        );
        assert_eq!(table.row(0), &[text("x"), CellValue::Empty]);
        assert_eq!(table.row(1), &[text("y"), text("z")]);
    }

    #[test]
    fn column_lookup_is_optional() {
        let table = RecordTable::new(vec!["NEGRO".into()], vec![vec![text("SIM")]]);
        let col = table.column("NEGRO").unwrap();
        assert_eq!(table.cell(0, col), &text("SIM"));
        assert!(table.column("DEFICIENTE").is_none());
    }

    #[test]
    fn push_column_appends_then_overwrites() {
        let mut table = RecordTable::new(vec!["A".into()], vec![vec![text("a")]]);
        let col = table.push_column("B", vec![CellValue::Integer(1)]);
        assert_eq!(table.column_names(), &["A", "B"]);
        let again = table.push_column("B", vec![CellValue::Integer(2)]);
        assert_eq!(col, again);
        assert_eq!(table.width(), 2);
        assert_eq!(table.cell(0, again), &CellValue::Integer(2));
    }

    #[test]
    fn upload_extension_is_upper_cased() {
        let upload = UploadedFile {
            name: "lista.final.xlsx".into(),
            bytes: Vec::new(),
        };
        assert_eq!(upload.extension(), "XLSX");
    }
}
