use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};

use crate::color::ColorMap;
use crate::data::filter::filtered_indices;
use crate::data::geo::GeometryTable;
use crate::data::loader::load_dataset;
use crate::data::model::{Dataset, FilterSelection, Metric};
use crate::data::views::{export_view, update_views, DashboardUpdate, Export};
use crate::data::PipelineError;

// ---------------------------------------------------------------------------
// DashboardContext – everything loaded at startup
// ---------------------------------------------------------------------------

/// The immutable inputs, loaded once before the UI starts.  Passed into the
/// pipeline functions instead of living in module globals, so the pipeline
/// stays testable without a running dashboard.
pub struct DashboardContext {
    pub dataset: Dataset,
    pub geometry: GeometryTable,
}

impl DashboardContext {
    /// Load dataset and geometry.  Any failure here is fatal: the process
    /// must not start serving a partial dashboard.
    pub fn load(data_path: &Path, geometry_path: &Path) -> Result<Self> {
        let dataset = load_dataset(data_path)
            .with_context(|| format!("loading dataset {}", data_path.display()))?;
        let geometry = GeometryTable::load(geometry_path)?;

        log::info!(
            "Loaded {} rows ({} provinces, years {}–{}), {} geometry shapes",
            dataset.len(),
            dataset.provinces.len(),
            dataset.year_min,
            dataset.year_max,
            geometry.len()
        );

        let orphans = geometry.unreferenced_by(&dataset.provinces);
        if !orphans.is_empty() {
            log::warn!(
                "{} geometry entries match no dataset province and will always render grey: {}",
                orphans.len(),
                orphans.join(", ")
            );
        }

        Ok(DashboardContext { dataset, geometry })
    }
}

// ---------------------------------------------------------------------------
// Chart kind – the two trend presentations
// ---------------------------------------------------------------------------

/// How the trend aggregate is presented: a bar snapshot of one year, or the
/// full line series across the retained range.  The aggregation underneath
/// is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub ctx: DashboardContext,
    pub colors: ColorMap,

    // -- control values --
    pub year_from: i32,
    pub year_to: i32,
    pub sector: Option<String>,
    /// Selected technologies; empty means "all".
    pub technologies: BTreeSet<String>,
    /// Selected firm sizes; empty means "all".
    pub firm_sizes: BTreeSet<String>,
    pub metric: Metric,
    pub chart_kind: ChartKind,
    /// Year shown when `chart_kind == Bar`.
    pub snapshot_year: i32,

    // -- latest pipeline output --
    pub update: DashboardUpdate,
    /// Province → aggregate value after the geometry join.
    pub map_values: BTreeMap<String, f64>,
    /// Data provinces with no matching geometry, shown as a warning.
    pub map_warnings: Vec<String>,
    /// Rows passing the current filters, for the preview table.
    pub visible_indices: Vec<usize>,

    /// Error message shown in the UI when a pipeline call is rejected.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(ctx: DashboardContext) -> Self {
        let colors = ColorMap::new(&ctx.dataset.technologies);
        // The controls start out as the unconstrained selection.
        let initial = FilterSelection::all_of(&ctx.dataset);
        let (year_from, year_to) = initial.year_range;
        let mut state = AppState {
            ctx,
            colors,
            year_from,
            year_to,
            sector: initial.sector,
            technologies: initial.technologies,
            firm_sizes: initial.firm_sizes,
            metric: Metric::CnttUsed,
            chart_kind: ChartKind::Bar,
            snapshot_year: year_to,
            update: DashboardUpdate::default(),
            map_values: BTreeMap::new(),
            map_warnings: Vec::new(),
            visible_indices: Vec::new(),
            status_message: None,
        };
        state.refresh();
        state
    }

    /// The current filter choices as a fresh `FilterSelection`.
    pub fn selection(&self) -> FilterSelection {
        FilterSelection {
            year_range: (self.year_from, self.year_to),
            sector: self.sector.clone(),
            technologies: self.technologies.clone(),
            firm_sizes: self.firm_sizes.clone(),
        }
    }

    /// Re-run the pipeline after a control change.
    ///
    /// Errors are caught here, at the controller boundary: the message is
    /// shown and the previous good views stay on screen.
    pub fn refresh(&mut self) {
        let selection = self.selection();
        match update_views(&self.ctx.dataset, &selection, self.metric) {
            Ok(update) => {
                let join = self.ctx.geometry.join(&update.map_rows);
                if !join.missing_geometry.is_empty() {
                    log::warn!(
                        "no geometry for: {}",
                        join.missing_geometry.join(", ")
                    );
                }
                self.map_values = join
                    .matched
                    .iter()
                    .map(|(shape, value)| (shape.name.clone(), *value))
                    .collect();
                self.map_warnings = join.missing_geometry;
                self.visible_indices = filtered_indices(&self.ctx.dataset, &selection);
                self.update = update;
                self.snapshot_year = self.snapshot_year.clamp(self.year_from, self.year_to);
                self.status_message = None;
            }
            Err(e) => {
                self.status_message = Some(e.to_string());
            }
        }
    }

    /// Serialize the rows matching the filters applied right now.
    pub fn export(&self) -> Result<Export, PipelineError> {
        export_view(&self.ctx.dataset, &self.selection())
    }

    /// Toggle one technology in the any-match set.
    pub fn toggle_technology(&mut self, technology: &str) {
        toggle(&mut self.technologies, technology);
        self.refresh();
    }

    /// Toggle one firm size in the any-match set.
    pub fn toggle_firm_size(&mut self, firm_size: &str) {
        toggle(&mut self.firm_sizes, firm_size);
        self.refresh();
    }

    /// Set or clear the sector filter.
    pub fn set_sector(&mut self, sector: Option<String>) {
        self.sector = sector;
        self.refresh();
    }

    /// Switch the aggregated metric.
    pub fn set_metric(&mut self, metric: Metric) {
        if self.metric != metric {
            self.metric = metric;
            self.refresh();
        }
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}
