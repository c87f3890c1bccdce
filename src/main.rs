use circuit_viewer::app::CircuitViewerApp;
use circuit_viewer::config::ViewerConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ViewerConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 850.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Circuit Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(CircuitViewerApp::new(config)))),
    )
}
