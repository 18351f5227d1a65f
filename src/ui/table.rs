use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::RecordTable;

const ROW_HEIGHT: f32 = 18.0;

/// Render `rows` of `table` as a scrollable grid. The first column shows
/// the row's position in the uploaded sheet.
pub fn records_table(ui: &mut Ui, table: &RecordTable, rows: &[usize]) {
    if rows.is_empty() || table.is_empty() {
        ui.label("Nenhum candidato neste filtro.");
        return;
    }

    egui::ScrollArea::horizontal()
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::auto().at_least(40.0))
                .columns(Column::auto().at_least(80.0).clip(true), table.width())
                .min_scrolled_height(0.0)
                .header(20.0, |mut header| {
                    header.col(|ui: &mut Ui| {
                        ui.strong("#");
                    });
                    for name in table.column_names() {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                        let src = rows[row.index()];
                        row.col(|ui: &mut Ui| {
                            ui.label(src.to_string());
                        });
                        for cell in table.row(src) {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell.to_string());
                            });
                        }
                    });
                });
        });
}
