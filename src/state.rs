use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::color::SubsetColors;
use crate::data::analysis::{Analysis, AnalysisConfig, SubsetKind};
use crate::data::export::{ExportError, ExportFormat};
use crate::data::loader::{self, LoadError, LoadedSheet};
use crate::data::model::UploadedFile;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AnalysisConfig,

    /// Bytes of the current upload (None until the user picks a file).
    pub upload: Option<UploadedFile>,

    /// Decoded first sheet of `upload`.
    pub sheet: Option<LoadedSheet>,

    /// Derived columns and subsets for `sheet` at `cutoff_date`.
    pub analysis: Option<Analysis>,

    /// Date the per-row age is computed against.
    pub cutoff_date: NaiveDate,

    /// Date the mean age is computed against.
    pub today: NaiveDate,

    /// Tab currently shown in the central panel.
    pub active_subset: SubsetKind,

    /// Failure of the last upload, rendered inline.
    pub load_error: Option<LoadError>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,

    pub colors: SubsetColors,
}

impl Default for AppState {
    fn default() -> Self {
        let today = local_today();
        Self {
            config: AnalysisConfig::default(),
            upload: None,
            sheet: None,
            analysis: None,
            cutoff_date: today,
            today,
            active_subset: SubsetKind::All,
            load_error: None,
            status_message: None,
            colors: SubsetColors::default(),
        }
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl AppState {
    /// Read a file from disk and ingest it.
    pub fn open_path(&mut self, path: &Path) {
        match loader::read_upload(path) {
            Ok(upload) => self.ingest_upload(upload),
            Err(e) => self.fail_upload(e),
        }
    }

    /// Replace whatever was loaded with a fresh upload.
    pub fn ingest_upload(&mut self, upload: UploadedFile) {
        self.today = local_today();
        self.analysis = None;
        self.sheet = None;
        self.status_message = None;

        match loader::load_spreadsheet(&upload.name, &upload.bytes) {
            Ok(sheet) => {
                log::info!(
                    "Loaded {} with {} candidates and columns {:?}",
                    upload.name,
                    sheet.table.len(),
                    sheet.table.column_names()
                );
                if sheet.table.is_empty() {
                    log::warn!("{} has a header but no candidate rows", upload.name);
                }
                self.load_error = None;
                self.sheet = Some(sheet);
                self.upload = Some(upload);
                self.recompute();
            }
            Err(e) => {
                self.upload = Some(upload);
                self.fail_upload(e);
            }
        }
    }

    fn fail_upload(&mut self, err: LoadError) {
        log::error!("Failed to load spreadsheet: {err}");
        self.analysis = None;
        self.sheet = None;
        self.load_error = Some(err);
    }

    /// Change the cutoff date and rebuild the derived tables.
    pub fn set_cutoff_date(&mut self, cutoff: NaiveDate) {
        if cutoff != self.cutoff_date {
            self.cutoff_date = cutoff;
            self.recompute();
        }
    }

    /// Rerun derivation and filtering from the loaded sheet.
    pub fn recompute(&mut self) {
        self.analysis = self.sheet.as_ref().map(|sheet| {
            Analysis::compute(
                sheet.table.clone(),
                &self.config,
                self.today,
                self.cutoff_date,
            )
        });
    }

    pub fn export_bytes(
        &self,
        kind: SubsetKind,
        format: ExportFormat,
    ) -> Option<Result<Vec<u8>, ExportError>> {
        self.analysis.as_ref().map(|a| a.export(kind, format))
    }

    /// Serialise a subset and write it to `path`.
    pub fn save_subset(&self, kind: SubsetKind, format: ExportFormat, path: &Path) -> Result<()> {
        let bytes = self
            .export_bytes(kind, format)
            .context("no spreadsheet loaded")?
            .with_context(|| format!("exporting {}", kind.label()))?;
        std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        log::info!(
            "Saved {} ({}) to {}",
            kind.label(),
            format.mime(),
            path.display()
        );
        Ok(())
    }

    /// Headline numbers of the current analysis as pretty JSON.
    pub fn summary_json(&self) -> Option<Result<String>> {
        let analysis = self.analysis.as_ref()?;
        let upload = self.upload.as_ref()?;
        Some(
            serde_json::to_string_pretty(&analysis.summary(upload))
                .context("serialising summary"),
        )
    }
}

// ---------------------------------------------------------------------------
// User-facing error text
// ---------------------------------------------------------------------------

/// What the dashboard tells the user about a failed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub headline: String,
    pub detail: Option<String>,
}

pub fn describe_load_error(err: &LoadError) -> ErrorReport {
    match err {
        LoadError::Locked { .. } => ErrorReport {
            headline: "Erro: Feche a planilha no Excel antes de carregar aqui!".into(),
            detail: None,
        },
        LoadError::MissingDecoder { format } => ErrorReport {
            headline: format!(
                "Erro: esta versão não lê arquivos {format}. Compile com a feature '{}' habilitada.",
                match format {
                    loader::SpreadsheetFormat::Legacy => "xls",
                    loader::SpreadsheetFormat::Modern => "xlsx",
                }
            ),
            detail: None,
        },
        LoadError::Decode { .. } | LoadError::NoWorksheet | LoadError::Io(_) => ErrorReport {
            headline: "Ocorreu um erro inesperado.".into(),
            detail: Some(format!("Detalhe técnico: {err}")),
        },
    }
}
