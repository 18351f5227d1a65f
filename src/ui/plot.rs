use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Plot, VLine};

use crate::data::analysis::SubsetKind;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Age histogram
// ---------------------------------------------------------------------------

/// Render the distribution of ages at the cutoff date.
pub fn age_histogram(ui: &mut Ui, state: &AppState) {
    let Some(analysis) = &state.analysis else {
        return;
    };
    if analysis.age_distribution.is_empty() {
        ui.label("Distribuição de idades indisponível.");
        return;
    }

    let color = state.colors.color_for(SubsetKind::All);
    let threshold = state.config.elderly_min_age;

    let bars: Vec<Bar> = analysis
        .age_distribution
        .iter()
        .map(|bin| {
            let fill = if bin.lower >= threshold {
                state.colors.color_for(SubsetKind::Elderly)
            } else {
                color
            };
            Bar::new((bin.lower + bin.upper) / 2.0, bin.count as f64)
                .width((bin.upper - bin.lower) * 0.95)
                .fill(fill)
                .name(format!("{:.0}–{:.0} anos", bin.lower, bin.upper))
        })
        .collect();

    ui.strong("Distribuição de idades na data de corte");
    Plot::new("age_histogram")
        .height(200.0)
        .x_axis_label("Idade")
        .y_axis_label("Candidatos")
        .allow_scroll(false)
        .allow_drag(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Candidatos"));
            plot_ui.vline(
                VLine::new(threshold)
                    .color(Color32::GRAY)
                    .name(format!("{threshold:.0} anos")),
            );
        });
}
