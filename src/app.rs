use eframe::egui;

use crate::config::AppConfig;
use crate::state::{reduce, Action, AppState};
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct EmcViewApp {
    pub state: AppState,
    pub config: AppConfig,
    /// Overlay detected peaks on the plot.
    pub show_peaks: bool,
    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl EmcViewApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::default(),
            config,
            show_peaks: false,
            status_message: None,
        }
    }

    /// Run one state transition and swap in the result.
    pub fn dispatch(&mut self, action: Action) {
        self.state = reduce(&self.state, action, &self.config);
    }
}

impl eframe::App for EmcViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, self);
        });

        // ---- Left side panel: loaded datasets ----
        egui::SidePanel::left("dataset_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, self);
            });

        // ---- Central panel: overlay plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::overlay_plot(ui, self);
        });
    }
}
