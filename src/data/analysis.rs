use chrono::NaiveDate;
use serde::Serialize;

use super::derive::{self, AgeAvailability, AgeBin};
use super::export::{ExportFormat, DOWNLOAD_FILE_NAME};
use super::filter::{self, FilterOutcome};
use super::model::{RecordTable, UploadedFile, Warning};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Column names and thresholds the analysis looks for.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub birth_date_column: String,
    pub black_column: String,
    pub disability_column: String,
    /// Name of the derived age-at-cutoff column.
    pub age_column: String,
    /// Marker text meaning "yes" in the quota columns.
    pub quota_marker: String,
    pub elderly_min_age: f64,
    pub histogram_bin_years: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            birth_date_column: "NASCIMENTO".into(),
            black_column: "NEGRO".into(),
            disability_column: "DEFICIENTE".into(),
            age_column: "IDADE_CONCURSO".into(),
            quota_marker: "SIM".into(),
            elderly_min_age: 60.0,
            histogram_bin_years: 5.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Named subsets
// ---------------------------------------------------------------------------

/// The row sets the dashboard shows in tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsetKind {
    All,
    Elderly,
    Black,
    Disability,
    BlackAndDisability,
}

impl SubsetKind {
    pub const ALL: [SubsetKind; 5] = [
        SubsetKind::All,
        SubsetKind::Elderly,
        SubsetKind::Black,
        SubsetKind::Disability,
        SubsetKind::BlackAndDisability,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SubsetKind::All => "Todos",
            SubsetKind::Elderly => "Idosos (60+)",
            SubsetKind::Black => "Negros",
            SubsetKind::Disability => "PcD",
            SubsetKind::BlackAndDisability => "Negros e PcD",
        }
    }

    fn file_stem(self) -> &'static str {
        match self {
            SubsetKind::All => "candidatos",
            SubsetKind::Elderly => "candidatos_idosos",
            SubsetKind::Black => "candidatos_negros",
            SubsetKind::Disability => "candidatos_pcd",
            SubsetKind::BlackAndDisability => "candidatos_negros_pcd",
        }
    }

    /// Suggested download name, e.g. `candidatos_idosos.xlsx`.
    pub fn file_name(self, format: ExportFormat) -> String {
        match (self, format) {
            (SubsetKind::Elderly, ExportFormat::Xlsx) => DOWNLOAD_FILE_NAME.to_string(),
            _ => format!("{}.{}", self.file_stem(), format.extension()),
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis – everything derived from one upload
// ---------------------------------------------------------------------------

/// Result of the derivation and filtering passes over one table.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The uploaded table, with the age-at-cutoff column appended when possible.
    pub table: RecordTable,
    pub today: NaiveDate,
    pub cutoff: NaiveDate,
    /// Every row index, in order.
    pub all: Vec<usize>,
    /// Mean age today.
    pub mean_age: AgeAvailability,
    /// Distribution of ages at the cutoff date.
    pub age_distribution: Vec<AgeBin>,
    pub elderly: Vec<usize>,
    pub black: Vec<usize>,
    pub disability: Vec<usize>,
    pub black_and_disability: Vec<usize>,
    pub warnings: Vec<Warning>,
}

impl Analysis {
    /// Run every derivation over `table`. Never fails: missing columns only
    /// produce warnings and empty results.
    pub fn compute(
        mut table: RecordTable,
        config: &AnalysisConfig,
        today: NaiveDate,
        cutoff: NaiveDate,
    ) -> Self {
        let mut warnings = Vec::new();

        let (mean_age, age_distribution, elderly) = match table.column(&config.birth_date_column)
        {
            Some(birth) => {
                let mean_age = match derive::mean_age(&derive::ages_at(&table, birth, today)) {
                    Some(mean) => AgeAvailability::Available(mean),
                    None => AgeAvailability::NoValidDates,
                };
                let cutoff_ages = derive::ages_at(&table, birth, cutoff);
                let distribution =
                    derive::age_distribution(&cutoff_ages, config.histogram_bin_years);
                let age_col =
                    derive::derive_cutoff_ages(&mut table, birth, cutoff, &config.age_column);
                let elderly = filter::at_least(&table, age_col, config.elderly_min_age);
                (mean_age, distribution, elderly)
            }
            None => {
                log::warn!(
                    "Birth-date column '{}' not present; ages unavailable",
                    config.birth_date_column
                );
                warnings.push(Warning::MissingColumn {
                    column: config.birth_date_column.clone(),
                });
                (AgeAvailability::Unavailable, Vec::new(), Vec::new())
            }
        };

        let FilterOutcome {
            rows: black,
            warning,
        } = filter::quota_subset(&table, &config.black_column, &config.quota_marker);
        warnings.extend(warning);
        let FilterOutcome {
            rows: disability,
            warning,
        } = filter::quota_subset(&table, &config.disability_column, &config.quota_marker);
        warnings.extend(warning);
        let black_and_disability = filter::intersect(&black, &disability);

        log::info!(
            "Analysis at cutoff {cutoff}: {} rows, {} elderly, {} black, {} disability, {} both",
            table.len(),
            elderly.len(),
            black.len(),
            disability.len(),
            black_and_disability.len()
        );

        Analysis {
            all: (0..table.len()).collect(),
            table,
            today,
            cutoff,
            mean_age,
            age_distribution,
            elderly,
            black,
            disability,
            black_and_disability,
            warnings,
        }
    }

    /// Row indices of a named subset.
    pub fn rows(&self, kind: SubsetKind) -> &[usize] {
        match kind {
            SubsetKind::All => &self.all,
            SubsetKind::Elderly => &self.elderly,
            SubsetKind::Black => &self.black,
            SubsetKind::Disability => &self.disability,
            SubsetKind::BlackAndDisability => &self.black_and_disability,
        }
    }

    pub fn count(&self, kind: SubsetKind) -> usize {
        self.rows(kind).len()
    }

    /// Warnings that explain why `kind` may be empty.
    pub fn warnings_for(&self, kind: SubsetKind, config: &AnalysisConfig) -> Vec<&Warning> {
        let relevant: Vec<&str> = match kind {
            SubsetKind::All => vec![],
            SubsetKind::Elderly => vec![config.birth_date_column.as_str()],
            SubsetKind::Black => vec![config.black_column.as_str()],
            SubsetKind::Disability => vec![config.disability_column.as_str()],
            SubsetKind::BlackAndDisability => {
                vec![config.black_column.as_str(), config.disability_column.as_str()]
            }
        };
        self.warnings
            .iter()
            .filter(|w| match w {
                Warning::MissingColumn { column } => relevant.contains(&column.as_str()),
            })
            .collect()
    }

    pub fn export(
        &self,
        kind: SubsetKind,
        format: ExportFormat,
    ) -> Result<Vec<u8>, super::export::ExportError> {
        format.encode(&self.table, self.rows(kind))
    }

    pub fn summary(&self, upload: &UploadedFile) -> AnalysisSummary {
        AnalysisSummary {
            file_name: upload.name.clone(),
            extension: upload.extension(),
            rows: self.table.len(),
            columns: self.table.width(),
            today: self.today,
            cutoff: self.cutoff,
            mean_age: self.mean_age,
            elderly: self.elderly.len(),
            black: self.black.len(),
            disability: self.disability.len(),
            black_and_disability: self.black_and_disability.len(),
            age_distribution: self.age_distribution.clone(),
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Headline numbers of one analysis, for the clipboard.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub file_name: String,
    pub extension: String,
    pub rows: usize,
    pub columns: usize,
    pub today: NaiveDate,
    pub cutoff: NaiveDate,
    pub mean_age: AgeAvailability,
    pub elderly: usize,
    pub black: usize,
    pub disability: usize,
    pub black_and_disability: usize,
    pub age_distribution: Vec<AgeBin>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn candidates() -> RecordTable {
        RecordTable::new(
            vec![
                "NOME".into(),
                "NASCIMENTO".into(),
                "NEGRO".into(),
                "DEFICIENTE".into(),
            ],
            vec![
                vec![text("Ana"), text("1960-01-01"), text("SIM"), text("sim")],
                vec![text("Bia"), text("1990-06-15"), text("Sim"), text("NAO")],
                vec![text("Caio"), text("invalida"), text("NAO"), text("SIM")],
                vec![text("Davi"), text("1950-12-31"), CellValue::Empty, text("SIM")],
            ],
        )
    }

    #[test]
    fn elderly_example_from_birth_date() {
        let analysis = Analysis::compute(
            candidates(),
            &AnalysisConfig::default(),
            date(2024, 1, 1),
            date(2024, 1, 1),
        );
        let age = analysis.table.column("IDADE_CONCURSO").unwrap();
        assert!((analysis.table.cell(0, age).as_f64().unwrap() - 64.0).abs() < 1e-9);
        assert_eq!(analysis.table.cell(2, age), &CellValue::Empty);
        assert_eq!(analysis.elderly, vec![0, 3]);
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn derived_column_is_added_and_rows_kept() {
        let analysis = Analysis::compute(
            candidates(),
            &AnalysisConfig::default(),
            date(2024, 1, 1),
            date(2024, 1, 1),
        );
        assert_eq!(analysis.table.len(), 4);
        assert_eq!(
            analysis.table.column_names(),
            &["NOME", "NASCIMENTO", "NEGRO", "DEFICIENTE", "IDADE_CONCURSO"]
        );
    }

    #[test]
    fn quota_subsets_and_intersection() {
        let analysis = Analysis::compute(
            candidates(),
            &AnalysisConfig::default(),
            date(2024, 1, 1),
            date(2024, 1, 1),
        );
        assert_eq!(analysis.black, vec![0, 1]);
        assert_eq!(analysis.disability, vec![0, 2, 3]);
        assert_eq!(analysis.black_and_disability, vec![0]);
        assert_eq!(analysis.count(SubsetKind::All), 4);
    }

    #[test]
    fn mean_age_uses_today_and_cutoff_moves_elderly() {
        let analysis = Analysis::compute(
            candidates(),
            &AnalysisConfig::default(),
            date(2024, 1, 1),
            date(2011, 1, 1),
        );
        // At the 2011 cutoff only Davi (born 1950) is 60 or older.
        assert_eq!(analysis.elderly, vec![3]);
        assert!(matches!(analysis.mean_age, AgeAvailability::Available(age) if age > 40.0));
    }

    #[test]
    fn missing_columns_degrade_to_warnings() {
        let table = RecordTable::new(vec!["NOME".into()], vec![vec![text("Ana")]]);
        let config = AnalysisConfig::default();
        let analysis = Analysis::compute(table, &config, date(2024, 1, 1), date(2024, 1, 1));

        assert_eq!(analysis.mean_age, AgeAvailability::Unavailable);
        assert!(analysis.elderly.is_empty());
        assert!(analysis.black.is_empty());
        assert!(analysis.disability.is_empty());
        assert!(analysis.black_and_disability.is_empty());
        assert_eq!(analysis.warnings.len(), 3);
        assert!(analysis.table.column("IDADE_CONCURSO").is_none());

        assert_eq!(analysis.warnings_for(SubsetKind::Black, &config).len(), 1);
        assert_eq!(
            analysis
                .warnings_for(SubsetKind::BlackAndDisability, &config)
                .len(),
            2
        );
        assert!(analysis.warnings_for(SubsetKind::All, &config).is_empty());
    }

    #[test]
    fn no_parseable_dates_is_not_unavailable() {
        let table = RecordTable::new(
            vec!["NASCIMENTO".into()],
            vec![vec![text("??")], vec![CellValue::Empty]],
        );
        let analysis = Analysis::compute(
            table,
            &AnalysisConfig::default(),
            date(2024, 1, 1),
            date(2024, 1, 1),
        );
        assert_eq!(analysis.mean_age, AgeAvailability::NoValidDates);
        assert!(analysis.elderly.is_empty());
    }

    #[test]
    fn elderly_download_name_and_summary_json() {
        assert_eq!(
            SubsetKind::Elderly.file_name(ExportFormat::Xlsx),
            crate::data::export::DOWNLOAD_FILE_NAME
        );

        let analysis = Analysis::compute(
            candidates(),
            &AnalysisConfig::default(),
            date(2024, 1, 1),
            date(2024, 1, 1),
        );
        let upload = UploadedFile {
            name: "candidatos.xlsx".into(),
            bytes: Vec::new(),
        };
        let json = serde_json::to_value(analysis.summary(&upload)).unwrap();
        assert_eq!(json["extension"], "XLSX");
        assert_eq!(json["rows"], 4);
        assert_eq!(json["black_and_disability"], 1);
        assert_eq!(json["mean_age"]["status"], "available");
    }

    #[test]
    fn all_rows_are_computed_once() {
        let analysis = Analysis::compute(
            candidates(),
            &AnalysisConfig::default(),
            date(2024, 1, 1),
            date(2024, 1, 1),
        );
        let first = analysis.rows(SubsetKind::All);
        assert_eq!(first, &[0, 1, 2, 3]);
        assert!(std::ptr::eq(first, analysis.rows(SubsetKind::All)));
        assert_eq!(analysis.count(SubsetKind::All), analysis.table.len());
    }

    #[test]
    fn csv_download_keeps_the_subset_stem() {
        assert_eq!(
            SubsetKind::Elderly.file_name(ExportFormat::Csv),
            "candidatos_idosos.csv"
        );
    }

    #[test]
    fn export_uses_subset_rows() {
        let analysis = Analysis::compute(
            candidates(),
            &AnalysisConfig::default(),
            date(2024, 1, 1),
            date(2024, 1, 1),
        );
        let csv = analysis
            .export(SubsetKind::Elderly, ExportFormat::Csv)
            .unwrap();
        let text = String::from_utf8(csv).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(1).unwrap().starts_with("Ana,"));
    }
}
