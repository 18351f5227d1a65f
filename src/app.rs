use eframe::egui;

use crate::data::model::UploadedFile;
use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CandidateDashboardApp {
    pub state: AppState,
}

impl eframe::App for CandidateDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        handle_dropped_files(ctx, &mut self.state);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: upload and cutoff date ----
        egui::SidePanel::left("settings_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: summary, histogram, subset tables ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::header(ui);

            if self.state.load_error.is_some() {
                panels::load_error(ui, &self.state);
                return;
            }
            if self.state.analysis.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.label("Aguardando o upload de uma planilha...");
                });
                return;
            }

            panels::summary(ui, &self.state);
            ui.separator();
            plot::age_histogram(ui, &self.state);
            ui.separator();
            panels::subset_tabs(ui, &mut self.state);
            panels::subset_actions(ui, &mut self.state);

            if let Some(analysis) = &self.state.analysis {
                let rows = analysis.rows(self.state.active_subset);
                table::records_table(ui, &analysis.table, rows);
            }
        });
    }
}

/// Treat a file dropped onto the window like a picked upload.
fn handle_dropped_files(ctx: &egui::Context, state: &mut AppState) {
    let dropped = ctx.input(|i| i.raw.dropped_files.clone());
    let Some(file) = dropped.into_iter().next() else {
        return;
    };

    if let Some(bytes) = file.bytes {
        state.ingest_upload(UploadedFile {
            name: file.name,
            bytes: bytes.to_vec(),
        });
    } else if let Some(path) = file.path {
        state.open_path(&path);
    }
}
