use std::fmt;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use calamine::{Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use super::model::{CellValue, RecordTable, UploadedFile};

// ---------------------------------------------------------------------------
// Formats and errors
// ---------------------------------------------------------------------------

/// Spreadsheet container, decided from the file name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// BIFF `.xls` (Excel 97-2003).
    Legacy,
    /// Zipped OOXML `.xlsx`.
    Modern,
}

impl SpreadsheetFormat {
    /// `.xls` (any case) is legacy; everything else goes to the modern decoder.
    pub fn from_filename(name: &str) -> Self {
        if name.to_ascii_lowercase().ends_with(".xls") {
            SpreadsheetFormat::Legacy
        } else {
            SpreadsheetFormat::Modern
        }
    }
}

impl fmt::Display for SpreadsheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpreadsheetFormat::Legacy => write!(f, ".xls"),
            SpreadsheetFormat::Modern => write!(f, ".xlsx"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file is locked by another process: {}", path.display())]
    Locked { path: PathBuf },
    #[error("no decoder for {format} files in this build")]
    MissingDecoder { format: SpreadsheetFormat },
    #[error("invalid {format} spreadsheet: {message}")]
    Decode {
        format: SpreadsheetFormat,
        message: String,
    },
    #[error("workbook has no worksheet")]
    NoWorksheet,
    #[error("reading upload: {0}")]
    Io(#[from] io::Error),
}

impl LoadError {
    fn decode(format: SpreadsheetFormat, err: impl fmt::Debug) -> Self {
        LoadError::Decode {
            format,
            message: format!("{err:?}"),
        }
    }
}

/// A decoded first worksheet.
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub table: RecordTable,
    pub format: SpreadsheetFormat,
    pub sheet_name: String,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read a file picked by the user into memory.
///
/// A file that Excel keeps open shows up as a permission error (or a sharing
/// violation on Windows); both become [`LoadError::Locked`].
pub fn read_upload(path: &Path) -> Result<UploadedFile, LoadError> {
    let bytes = std::fs::read(path).map_err(|err| {
        if is_locked(&err) {
            LoadError::Locked {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io(err)
        }
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadedFile { name, bytes })
}

fn is_locked(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

/// Decode the first worksheet of an uploaded spreadsheet.
///
/// The first row is the header; every following row is a record.
pub fn load_spreadsheet(name: &str, bytes: &[u8]) -> Result<LoadedSheet, LoadError> {
    let format = SpreadsheetFormat::from_filename(name);
    let sheet = match format {
        SpreadsheetFormat::Legacy => decode_legacy(bytes)?,
        SpreadsheetFormat::Modern => decode_modern(bytes)?,
    };
    log::info!(
        "Decoded {name} ({format}, sheet '{}'): {} rows x {} columns",
        sheet.sheet_name,
        sheet.table.len(),
        sheet.table.width()
    );
    Ok(sheet)
}

#[cfg(feature = "xls")]
fn decode_legacy(bytes: &[u8]) -> Result<LoadedSheet, LoadError> {
    decode_first_sheet::<calamine::Xls<Cursor<&[u8]>>>(SpreadsheetFormat::Legacy, bytes)
}

#[cfg(not(feature = "xls"))]
fn decode_legacy(_bytes: &[u8]) -> Result<LoadedSheet, LoadError> {
    Err(LoadError::MissingDecoder {
        format: SpreadsheetFormat::Legacy,
    })
}

#[cfg(feature = "xlsx")]
fn decode_modern(bytes: &[u8]) -> Result<LoadedSheet, LoadError> {
    decode_first_sheet::<calamine::Xlsx<Cursor<&[u8]>>>(SpreadsheetFormat::Modern, bytes)
}

#[cfg(not(feature = "xlsx"))]
fn decode_modern(_bytes: &[u8]) -> Result<LoadedSheet, LoadError> {
    Err(LoadError::MissingDecoder {
        format: SpreadsheetFormat::Modern,
    })
}

#[allow(dead_code)]
fn decode_first_sheet<'a, R>(
    format: SpreadsheetFormat,
    bytes: &'a [u8],
) -> Result<LoadedSheet, LoadError>
where
    R: Reader<Cursor<&'a [u8]>>,
{
    let mut workbook = R::new(Cursor::new(bytes)).map_err(|e| LoadError::decode(format, e))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::NoWorksheet)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)?
        .map_err(|e| LoadError::decode(format, e))?;

    // The range starts at the first used cell. Blank leading columns still
    // count as columns; blank leading rows are skipped so the header is the
    // first non-blank row.
    let lead = range.start().map_or(0, |(_, col)| col as usize);
    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|cells| {
            std::iter::repeat(String::new())
                .take(lead)
                .chain(cells.iter().map(header_text))
                .collect()
        })
        .unwrap_or_default();
    let records: Vec<Vec<CellValue>> = rows
        .map(|cells| {
            std::iter::repeat(CellValue::Empty)
                .take(lead)
                .chain(cells.iter().map(cell_value))
                .collect()
        })
        .collect();

    Ok(LoadedSheet {
        table: RecordTable::new(header, records),
        format,
        sheet_name,
    })
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if !dt.is_duration() => CellValue::DateTime(value),
            _ => number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Header names keep every digit of a numeric header.
fn header_text(data: &Data) -> String {
    match cell_value(data) {
        CellValue::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

/// Whole numbers load as integers, like `1960` rather than `1960.0`.
fn number(f: f64) -> CellValue {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        CellValue::Integer(f as i64)
    } else {
        CellValue::Float(f)
    }
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}
