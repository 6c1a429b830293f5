use eframe::egui;

use crate::state::AppState;
use crate::ui::{map, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SmeAtlasApp {
    pub state: AppState,
}

impl SmeAtlasApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for SmeAtlasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: title, match count, errors ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state);
        });

        // ---- Left side panel: filter controls ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Right side panel: trend chart ----
        egui::SidePanel::right("trend_panel")
            .default_width(420.0)
            .resizable(true)
            .show(ctx, |ui| {
                plot::trend_chart(ui, &self.state);
            });

        // ---- Bottom panel: matching rows ----
        egui::TopBottomPanel::bottom("rows_panel")
            .default_height(180.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::rows_table(ui, &self.state);
            });

        // ---- Central panel: choropleth ----
        egui::CentralPanel::default().show(ctx, |ui| {
            map::choropleth(ui, &self.state);
        });
    }
}
