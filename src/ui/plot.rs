use std::collections::BTreeMap;

use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

use crate::state::{AppState, ChartKind};

// ---------------------------------------------------------------------------
// Trend chart (right panel)
// ---------------------------------------------------------------------------

/// Render the per-year/per-technology aggregate, either as a bar snapshot of
/// one year or as line series across the retained range.  Both read the same
/// dense trend rows; only the presentation differs.
pub fn trend_chart(ui: &mut Ui, state: &AppState) {
    if state.update.metric_unavailable {
        placeholder(
            ui,
            &format!("No {} data under the current filters", state.metric.label()),
        );
        return;
    }
    if state.update.trend_rows.is_empty() {
        placeholder(ui, "No rows match the current filters");
        return;
    }

    match state.chart_kind {
        ChartKind::Line => {
            ui.strong(format!("{} by technology over time", state.metric.label()));
            line_chart(ui, state);
        }
        ChartKind::Bar => {
            ui.strong(format!(
                "{} by technology, {}",
                state.metric.label(),
                state.snapshot_year
            ));
            bar_chart(ui, state);
        }
    }
}

fn line_chart(ui: &mut Ui, state: &AppState) {
    // technology → (year, value) series; dense fill upstream keeps the
    // lines continuous across zero years.
    let mut series: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for row in &state.update.trend_rows {
        series
            .entry(row.technology.as_str())
            .or_default()
            .push([row.year as f64, row.value]);
    }

    Plot::new("trend_plot")
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label(state.metric.label())
        .show(ui, |plot_ui| {
            for (tech, points) in &series {
                let points: PlotPoints = points.iter().copied().collect();
                plot_ui.line(
                    Line::new(points)
                        .name(*tech)
                        .color(state.colors.color_for(tech))
                        .width(2.0),
                );
            }
        });
}

fn bar_chart(ui: &mut Ui, state: &AppState) {
    let snapshot: Vec<_> = state
        .update
        .trend_rows
        .iter()
        .filter(|row| row.year == state.snapshot_year)
        .collect();

    Plot::new("trend_plot")
        .legend(Legend::default())
        .y_axis_label(state.metric.label())
        .show(ui, |plot_ui| {
            for (i, row) in snapshot.iter().enumerate() {
                let bar = Bar::new(i as f64, row.value).width(0.7);
                plot_ui.bar_chart(
                    BarChart::new(vec![bar])
                        .name(&row.technology)
                        .color(state.colors.color_for(&row.technology)),
                );
            }
        });
}

fn placeholder(ui: &mut Ui, message: &str) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading(message);
    });
}
