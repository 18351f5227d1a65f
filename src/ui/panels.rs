use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use crate::data::analysis::SubsetKind;
use crate::data::derive::AgeAvailability;
use crate::data::export::ExportFormat;
use crate::state::{describe_load_error, AppState};

// ---------------------------------------------------------------------------
// Left side panel – settings and upload
// ---------------------------------------------------------------------------

/// Render the left settings panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Configurações");
    ui.separator();

    ui.strong("Planilha");
    if ui.button("Carregar planilha (XLSX ou XLS)…").clicked() {
        open_file_dialog(state);
    }
    ui.label(RichText::new("ou arraste o arquivo para a janela").small().weak());
    ui.add_space(8.0);

    ui.strong("Data de corte");
    let mut cutoff = state.cutoff_date;
    ui.add(DatePickerButton::new(&mut cutoff).id_salt("cutoff_date"));
    state.set_cutoff_date(cutoff);
    if ui.small_button("Hoje").clicked() {
        let today = state.today;
        state.set_cutoff_date(today);
    }
    ui.add_space(8.0);

    if let (Some(upload), Some(sheet)) = (&state.upload, &state.sheet) {
        ui.separator();
        ui.strong("Arquivo");
        ui.label(&upload.name);
        ui.label(format!("Formato: {}", sheet.format));
        ui.label(format!("Aba: {}", sheet.sheet_name));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Arquivo", |ui: &mut Ui| {
            if ui.button("Abrir planilha…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let has_analysis = state.analysis.is_some();
            if ui
                .add_enabled(has_analysis, egui::Button::new("Copiar resumo (JSON)"))
                .clicked()
            {
                copy_summary(ui.ctx(), state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(analysis) = &state.analysis {
            ui.label(format!(
                "{} candidatos, data de corte {}",
                analysis.table.len(),
                analysis.cutoff.format("%d/%m/%Y")
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

fn copy_summary(ctx: &egui::Context, state: &mut AppState) {
    match state.summary_json() {
        Some(Ok(json)) => {
            ctx.copy_text(json);
            state.status_message = None;
        }
        Some(Err(e)) => {
            log::error!("Failed to build summary: {e:#}");
            state.status_message = Some(format!("Erro: {e:#}"));
        }
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Central panel pieces
// ---------------------------------------------------------------------------

/// Logo and title.
pub fn header(ui: &mut Ui) {
    ui.horizontal(|ui: &mut Ui| {
        ui.add(
            egui::Image::new(egui::include_image!("../../assets/icon.png"))
                .max_height(56.0)
                .max_width(56.0),
        );
        ui.heading(RichText::new("Sistema de Tratamento de Dados").size(26.0));
    });
    ui.separator();
}

/// Inline message for a failed upload.
pub fn load_error(ui: &mut Ui, state: &AppState) {
    let Some(err) = &state.load_error else {
        return;
    };
    let report = describe_load_error(err);
    ui.colored_label(Color32::RED, report.headline);
    if let Some(detail) = report.detail {
        ui.label(RichText::new(detail).weak());
    }
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(24.0).strong());
    });
}

/// Headline numbers of the loaded sheet.
pub fn summary(ui: &mut Ui, state: &AppState) {
    let (Some(analysis), Some(upload)) = (&state.analysis, &state.upload) else {
        return;
    };

    ui.heading("Resumo da Planilha");
    ui.columns(4, |cols| {
        metric(&mut cols[0], "Candidatos", analysis.table.len().to_string());
        metric(&mut cols[1], "Total de Colunas", analysis.table.width().to_string());
        metric(&mut cols[2], "Extensão do Arquivo", upload.extension());
        let mean = match analysis.mean_age {
            AgeAvailability::Available(age) => format!("{age:.1} anos"),
            AgeAvailability::NoValidDates => "sem datas válidas".to_string(),
            AgeAvailability::Unavailable => "indisponível".to_string(),
        };
        metric(&mut cols[3], "Idade média", mean);
    });
}

/// Tab strip with one entry per subset and its row count.
pub fn subset_tabs(ui: &mut Ui, state: &mut AppState) {
    let Some(analysis) = &state.analysis else {
        return;
    };
    let counts: Vec<(SubsetKind, usize)> = SubsetKind::ALL
        .iter()
        .map(|&k| (k, analysis.count(k)))
        .collect();

    ui.horizontal(|ui: &mut Ui| {
        for (kind, count) in counts {
            let text = RichText::new(format!("{} ({count})", kind.label()))
                .color(state.colors.color_for(kind));
            ui.selectable_value(&mut state.active_subset, kind, text);
        }
    });
}

/// Warnings and download buttons for the active subset.
pub fn subset_actions(ui: &mut Ui, state: &mut AppState) {
    let Some(analysis) = &state.analysis else {
        return;
    };
    let kind = state.active_subset;

    for warning in analysis.warnings_for(kind, &state.config) {
        ui.colored_label(Color32::from_rgb(230, 160, 0), format!("⚠ {warning}"));
    }

    let empty = analysis.count(kind) == 0;
    let mut clicked = None;
    ui.horizontal(|ui: &mut Ui| {
        for format in [ExportFormat::Xlsx, ExportFormat::Csv] {
            let label = format!("Baixar {}", format.extension().to_uppercase());
            if ui.add_enabled(!empty, egui::Button::new(label)).clicked() {
                clicked = Some(format);
            }
        }
    });
    if let Some(format) = clicked {
        save_file_dialog(state, kind, format);
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Carregue sua planilha")
        .add_filter("Planilhas", &["xlsx", "xls"])
        .add_filter("Excel (.xlsx)", &["xlsx"])
        .add_filter("Excel 97-2003 (.xls)", &["xls"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState, kind: SubsetKind, format: ExportFormat) {
    let file = rfd::FileDialog::new()
        .set_title("Salvar candidatos")
        .set_file_name(kind.file_name(format))
        .add_filter(format.extension(), &[format.extension()])
        .save_file();

    if let Some(path) = file {
        match state.save_subset(kind, format, &path) {
            Ok(()) => state.status_message = None,
            Err(e) => {
                log::error!("Failed to save subset: {e:#}");
                state.status_message = Some(format!("Erro ao salvar: {e:#}"));
            }
        }
    }
}
