mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::EmcViewApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::load_or_default();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "EMC View – Spectrum Comparison",
        options,
        Box::new(|_cc| Ok(Box::new(EmcViewApp::new(config)))),
    )
}
