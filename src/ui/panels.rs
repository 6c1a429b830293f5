use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Metric;
use crate::state::{AppState, ChartKind};

// ---------------------------------------------------------------------------
// Left side panel – filter controls
// ---------------------------------------------------------------------------

/// Render the control panel.  Every change here triggers exactly one
/// pipeline refresh.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            year_controls(ui, state);
            ui.separator();
            sector_control(ui, state);
            ui.separator();
            value_set_control(ui, state, "Technology", SetKind::Technology);
            ui.separator();
            value_set_control(ui, state, "Firm size", SetKind::FirmSize);
            ui.separator();
            metric_control(ui, state);
            ui.separator();
            chart_controls(ui, state);
            ui.separator();
            export_control(ui, state);

            if !state.map_warnings.is_empty() {
                ui.separator();
                ui.label(
                    RichText::new(format!(
                        "No geometry for: {}",
                        state.map_warnings.join(", ")
                    ))
                    .color(Color32::ORANGE),
                );
            }
        });
}

fn year_controls(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Years");
    let span = state.ctx.dataset.year_min..=state.ctx.dataset.year_max;
    let mut changed = false;
    changed |= ui
        .add(egui::Slider::new(&mut state.year_from, span.clone()).text("from"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut state.year_to, span).text("to"))
        .changed();
    if changed {
        // An inverted range is allowed through: the pipeline rejects it and
        // the message shows up in the top bar.
        state.refresh();
    }
}

fn sector_control(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Industry sector");
    let sectors: Vec<String> = state.ctx.dataset.sectors.iter().cloned().collect();
    let current = state.sector.clone();
    let selected_text = current.as_deref().unwrap_or("All sectors").to_string();

    egui::ComboBox::from_id_salt("sector_filter")
        .selected_text(selected_text)
        .show_ui(ui, |ui: &mut Ui| {
            if ui
                .selectable_label(current.is_none(), "All sectors")
                .clicked()
            {
                state.set_sector(None);
            }
            for sector in &sectors {
                if ui
                    .selectable_label(current.as_deref() == Some(sector.as_str()), sector)
                    .clicked()
                {
                    state.set_sector(Some(sector.clone()));
                }
            }
        });
}

enum SetKind {
    Technology,
    FirmSize,
}

/// Checkbox set for an any-match dimension.  Nothing checked means "all".
fn value_set_control(ui: &mut Ui, state: &mut AppState, label: &str, kind: SetKind) {
    let values: Vec<String> = match kind {
        SetKind::Technology => state.ctx.dataset.technologies.iter().cloned().collect(),
        SetKind::FirmSize => state.ctx.dataset.firm_sizes.iter().cloned().collect(),
    };
    let n_selected = match kind {
        SetKind::Technology => state.technologies.len(),
        SetKind::FirmSize => state.firm_sizes.len(),
    };

    let header = if n_selected == 0 {
        format!("{label}  (all)")
    } else {
        format!("{label}  ({n_selected}/{})", values.len())
    };

    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt(label)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            for value in &values {
                let is_selected = match kind {
                    SetKind::Technology => state.technologies.contains(value),
                    SetKind::FirmSize => state.firm_sizes.contains(value),
                };

                // Swatch the technology entries with their series colour.
                let mut text = RichText::new(value);
                if matches!(kind, SetKind::Technology) {
                    text = text.color(state.colors.color_for(value));
                }

                let mut checked = is_selected;
                if ui.checkbox(&mut checked, text).changed() {
                    match kind {
                        SetKind::Technology => state.toggle_technology(value),
                        SetKind::FirmSize => state.toggle_firm_size(value),
                    }
                }
            }
        });
}

fn metric_control(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Display mode");
    let mut metric = state.metric;
    let mut changed = false;
    changed |= ui
        .radio_value(&mut metric, Metric::CnttUsed, Metric::CnttUsed.label())
        .changed();
    changed |= ui
        .radio_value(
            &mut metric,
            Metric::Productivity,
            Metric::Productivity.label(),
        )
        .changed();
    if changed {
        state.set_metric(metric);
    }
}

fn chart_controls(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Trend chart");
    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut state.chart_kind, ChartKind::Bar, "Bar");
        ui.selectable_value(&mut state.chart_kind, ChartKind::Line, "Line");
    });
    if state.chart_kind == ChartKind::Bar {
        let span = state.year_from..=state.year_to;
        if span.start() <= span.end() {
            ui.add(egui::Slider::new(&mut state.snapshot_year, span).text("year"));
        }
    }
}

// ---------------------------------------------------------------------------
// Export button
// ---------------------------------------------------------------------------

fn export_control(ui: &mut Ui, state: &mut AppState) {
    if ui.button("Download CSV data").clicked() {
        download_filtered_rows(state);
    }
}

/// Serialize the currently filtered rows and hand them to a save dialog.
pub fn download_filtered_rows(state: &mut AppState) {
    let export = match state.export() {
        Ok(export) => export,
        Err(e) => {
            log::error!("export failed: {e}");
            state.status_message = Some(format!("Export failed: {e}"));
            return;
        }
    };

    let Some(path) = rfd::FileDialog::new()
        .set_title("Save filtered rows")
        .set_file_name(&export.filename)
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };

    match std::fs::write(&path, &export.bytes) {
        Ok(()) => log::info!(
            "wrote {} filtered rows to {}",
            state.visible_indices.len(),
            path.display()
        ),
        Err(e) => {
            log::error!("failed to write {}: {e}", path.display());
            state.status_message = Some(format!("Export failed: {e}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top bar: title, match counts, error message.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("SME ICT Dashboard");
        ui.separator();
        ui.label(format!(
            "{} of {} rows match",
            state.visible_indices.len(),
            state.ctx.dataset.len()
        ));
        ui.separator();
        ui.label(format!("metric: {}", state.metric.label()));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Matching-rows table
// ---------------------------------------------------------------------------

/// Virtualized preview of the rows passing the current filters — the same
/// row set the export writes.
pub fn rows_table(ui: &mut Ui, state: &AppState) {
    let dataset = &state.ctx.dataset;
    let columns = dataset.column_names();

    TableBuilder::new(ui)
        .striped(true)
        .columns(Column::auto().resizable(true), columns.len())
        .header(18.0, |mut header| {
            for col in &columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(*col);
                });
            }
        })
        .body(|body| {
            body.rows(16.0, state.visible_indices.len(), |mut row| {
                let rec = &dataset.records[state.visible_indices[row.index()]];
                row.col(|ui: &mut Ui| {
                    ui.label(&rec.province);
                });
                row.col(|ui: &mut Ui| {
                    ui.label(rec.year.to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(&rec.sector);
                });
                row.col(|ui: &mut Ui| {
                    ui.label(&rec.technology);
                });
                row.col(|ui: &mut Ui| {
                    ui.label(&rec.firm_size);
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{}", rec.cntt_used));
                });
                if dataset.has_productivity {
                    row.col(|ui: &mut Ui| {
                        match rec.productivity {
                            Some(v) => ui.label(format!("{v}")),
                            None => ui.label("–"),
                        };
                    });
                }
            });
        });
}
