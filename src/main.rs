mod app;
mod color;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::SmeAtlasApp;
use eframe::egui;
use state::{AppState, DashboardContext};

fn main() -> eframe::Result {
    env_logger::init();

    // Optional positional arguments: dataset path, geometry path.
    let mut args = std::env::args().skip(1);
    let data_path = PathBuf::from(args.next().unwrap_or_else(|| "sme_data.csv".to_string()));
    let geometry_path =
        PathBuf::from(args.next().unwrap_or_else(|| "vn_provinces.geojson".to_string()));

    // Startup inputs are load-or-die: a dashboard over missing data must
    // not start serving.
    let ctx = match DashboardContext::load(&data_path, &geometry_path) {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("startup failed: {e:#}");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SME ICT Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(SmeAtlasApp::new(AppState::new(ctx))))),
    )
}
