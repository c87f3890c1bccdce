use eframe::egui;

use crate::config::ViewerConfig;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CircuitViewerApp {
    pub state: AppState,
}

impl CircuitViewerApp {
    /// Build the app and load the configured data file if present.
    pub fn new(config: ViewerConfig) -> Self {
        let mut state = AppState::new(config);
        state.load_default_data();
        Self { state }
    }
}

impl Default for CircuitViewerApp {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl eframe::App for CircuitViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: display options and filter ----
        egui::SidePanel::left("control_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Right side panel: legend and statistics ----
        egui::SidePanel::right("info_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::info_panel(ui, &self.state);
            });

        // ---- Central panel: 3D view ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(scene) = &self.state.scene {
                plot::scene_title(ui, scene);
            }
            plot::scene_plot(ui, &mut self.state);
        });
    }
}
