use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Plot, PlotPoints, Polygon};

use crate::color::{sequential_color, NO_DATA_FILL};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Choropleth (central panel)
// ---------------------------------------------------------------------------

/// Render the per-province aggregate onto the boundary shapes.  Provinces
/// absent from the map view (no contributing rows, or no metric value) keep
/// the "no data" fill — that is the sparse-map policy made visible.
pub fn choropleth(ui: &mut Ui, state: &AppState) {
    if state.update.metric_unavailable {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(format!(
                "No {} data under the current filters",
                state.metric.label()
            ));
        });
        return;
    }

    let (min, max) = value_range(state);
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(format!("{} by province", state.metric.label()));
        if let (Some(min), Some(max)) = (min, max) {
            ui.label(format!("scale {min:.1} – {max:.1}"));
        } else {
            ui.label("no matching data");
        }
    });

    Plot::new("province_map")
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for shape in state.ctx.geometry.shapes() {
                let value = state.map_values.get(&shape.name).copied();
                let fill = match (value, min, max) {
                    (Some(v), Some(lo), Some(hi)) => {
                        let t = if hi > lo { (v - lo) / (hi - lo) } else { 1.0 };
                        sequential_color(t)
                    }
                    _ => NO_DATA_FILL,
                };
                let label = match value {
                    Some(v) => format!("{}: {v:.2}", shape.name),
                    None => format!("{}: no data", shape.name),
                };

                for ring in &shape.rings {
                    let points: PlotPoints = ring.iter().map(|&[lon, lat]| [lon, lat]).collect();
                    plot_ui.polygon(
                        Polygon::new(points)
                            .fill_color(fill)
                            .stroke(Stroke::new(1.0, Color32::WHITE))
                            .name(&label),
                    );
                }
            }
        });
}

fn value_range(state: &AppState) -> (Option<f64>, Option<f64>) {
    let mut min = None;
    let mut max = None;
    for &v in state.map_values.values() {
        min = Some(min.map_or(v, |m: f64| m.min(v)));
        max = Some(max.map_or(v, |m: f64| m.max(v)));
    }
    (min, max)
}
