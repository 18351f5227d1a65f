use std::io;

use rust_xlsxwriter::{Format, FormatBorder, Workbook, XlsxError};
use thiserror::Error;

use super::model::{CellValue, RecordTable};

/// Default name of the elderly-candidates download.
pub const DOWNLOAD_FILE_NAME: &str = "candidatos_idosos.xlsx";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CSV_MIME: &str = "text/csv";

const SHEET_NAME: &str = "Sheet1";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("building workbook: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("writing CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("flushing CSV buffer: {0}")]
    Io(#[from] io::Error),
    #[error("{rows} rows x {columns} columns does not fit in one worksheet")]
    TooLarge { rows: usize, columns: usize },
}

/// Download container offered for a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => XLSX_MIME,
            ExportFormat::Csv => CSV_MIME,
        }
    }

    /// Serialise `rows` of `table` in this format.
    pub fn encode(self, table: &RecordTable, rows: &[usize]) -> Result<Vec<u8>, ExportError> {
        match self {
            ExportFormat::Xlsx => to_xlsx(table, rows),
            ExportFormat::Csv => to_csv(table, rows),
        }
    }
}

// ---------------------------------------------------------------------------
// XLSX
// ---------------------------------------------------------------------------

/// Write the header and the selected rows to an in-memory `.xlsx` workbook.
pub fn to_xlsx(table: &RecordTable, rows: &[usize]) -> Result<Vec<u8>, ExportError> {
    let too_large = || ExportError::TooLarge {
        rows: rows.len(),
        columns: table.width(),
    };
    u16::try_from(table.width()).map_err(|_| too_large())?;
    u32::try_from(rows.len() + 1).map_err(|_| too_large())?;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let header = Format::new().set_bold().set_border(FormatBorder::Thin);
    let datetime = Format::new().set_num_format(DATETIME_FORMAT);

    for (col, name) in table.column_names().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &header)?;
    }

    for (out_row, &src) in rows.iter().enumerate() {
        let r = out_row as u32 + 1;
        for (col, cell) in table.row(src).iter().enumerate() {
            let c = col as u16;
            match cell {
                CellValue::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                CellValue::Integer(i) => {
                    sheet.write_number(r, c, *i as f64)?;
                }
                CellValue::Float(f) => {
                    sheet.write_number(r, c, *f)?;
                }
                CellValue::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                CellValue::DateTime(dt) => {
                    sheet.write_datetime_with_format(r, c, dt, &datetime)?;
                }
                CellValue::Empty => {}
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    log::info!(
        "Exported {} rows x {} columns to xlsx ({} bytes)",
        rows.len(),
        table.width(),
        bytes.len()
    );
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

pub fn to_csv(table: &RecordTable, rows: &[usize]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for &src in rows {
        writer.write_record(table.row(src).iter().map(csv_field))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    log::info!("Exported {} rows to csv ({} bytes)", rows.len(), bytes.len());
    Ok(bytes)
}

fn csv_field(cell: &CellValue) -> String {
    match cell {
        CellValue::Float(f) => f.to_string(),
        CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::loader::load_spreadsheet;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn table() -> RecordTable {
        let birth = NaiveDate::from_ymd_opt(1960, 1, 1)
            .unwrap()
            .and_time(chrono::NaiveTime::MIN);
        RecordTable::new(
            vec![
                "NOME".into(),
                "NASCIMENTO".into(),
                "INSCRICAO".into(),
                "IDADE_CONCURSO".into(),
                "ATIVO".into(),
            ],
            vec![
                vec![
                    text("Ana"),
                    CellValue::DateTime(birth),
                    CellValue::Integer(1001),
                    CellValue::Float(64.5),
                    CellValue::Bool(true),
                ],
                vec![
                    text("Bia"),
                    CellValue::Empty,
                    CellValue::Integer(1002),
                    CellValue::Empty,
                    CellValue::Bool(false),
                ],
                vec![
                    text("Caio"),
                    text("01/02/1958"),
                    CellValue::Integer(1003),
                    CellValue::Float(66.25),
                    CellValue::Empty,
                ],
            ],
        )
    }

    #[test]
    fn xlsx_round_trip_keeps_selected_rows() {
        let source = table();
        let bytes = to_xlsx(&source, &[0, 2]).unwrap();
        let reloaded = load_spreadsheet(DOWNLOAD_FILE_NAME, &bytes).unwrap().table;

        assert_eq!(reloaded.column_names(), source.column_names());
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.row(0), source.row(0));
        assert_eq!(reloaded.row(1), source.row(2));
    }

    #[test]
    fn empty_subset_still_has_header() {
        let bytes = to_xlsx(&table(), &[]).unwrap();
        let reloaded = load_spreadsheet("x.xlsx", &bytes).unwrap().table;
        assert_eq!(reloaded.width(), 5);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let bytes = to_csv(&table(), &[1, 2]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "NOME,NASCIMENTO,INSCRICAO,IDADE_CONCURSO,ATIVO");
        assert_eq!(lines[1], "Bia,,1002,,false");
        assert_eq!(lines[2], "Caio,01/02/1958,1003,66.25,");
    }

    #[test]
    fn dates_before_march_1900_round_trip() {
        let early = NaiveDate::from_ymd_opt(1900, 1, 15)
            .unwrap()
            .and_time(chrono::NaiveTime::MIN);
        let late = NaiveDate::from_ymd_opt(1900, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let source = RecordTable::new(
            vec!["NASCIMENTO".into()],
            vec![vec![CellValue::DateTime(early)], vec![CellValue::DateTime(late)]],
        );
        let bytes = to_xlsx(&source, &[0, 1]).unwrap();
        let reloaded = load_spreadsheet("x.xlsx", &bytes).unwrap().table;
        assert_eq!(reloaded.row(0), &[CellValue::DateTime(early)]);
        assert_eq!(reloaded.row(1), &[CellValue::DateTime(late)]);
    }

    #[test]
    fn formats_know_their_mime() {
        assert_eq!(ExportFormat::Xlsx.mime(), XLSX_MIME);
        assert_eq!(ExportFormat::Csv.extension(), "csv");
    }
}
