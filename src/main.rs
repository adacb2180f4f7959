mod app;
mod color;
mod ui;

use std::path::Path;

use app::RustyStrataApp;
use eframe::egui;
use rusty_strata::config::ViewerConfig;

const CONFIG_FILE: &str = "rusty-strata.json";

fn main() -> eframe::Result {
    env_logger::init();

    let config = ViewerConfig::load_or_default(Path::new(CONFIG_FILE));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Strata – Category Explorer",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can render the media slot's png files.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(RustyStrataApp::new(config)))
        }),
    )
}
