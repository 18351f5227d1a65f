mod app;
mod color;
mod data;
mod state;
mod ui;

use std::sync::Arc;

use app::CandidateDashboardApp;
use eframe::egui;

fn window_icon() -> Option<egui::IconData> {
    let image = image::load_from_memory(include_bytes!("../assets/icon.png"))
        .map_err(|e| log::warn!("Could not decode window icon: {e}"))
        .ok()?
        .into_rgba8();
    let (width, height) = image.dimensions();
    Some(egui::IconData {
        rgba: image.into_raw(),
        width,
        height,
    })
}

fn main() -> eframe::Result {
    env_logger::init();

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 820.0])
        .with_min_inner_size([720.0, 480.0])
        .with_drag_and_drop(true);
    if let Some(icon) = window_icon() {
        viewport = viewport.with_icon(Arc::new(icon));
    }

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Automação de Planilhas",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can render the logo.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(CandidateDashboardApp::default()))
        }),
    )
}
