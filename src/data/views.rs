use std::collections::{BTreeMap, BTreeSet};

use super::aggregate::{aggregate, Aggregation};
use super::filter::filtered_indices;
use super::model::{AggregateRow, Dataset, DimValue, Dimension, FilterSelection, Metric};
use super::PipelineError;

/// Download name offered for the filtered extract.
pub const EXPORT_FILENAME: &str = "filtered_data.csv";

// ---------------------------------------------------------------------------
// View row shapes
// ---------------------------------------------------------------------------

/// One choropleth entry: a province that has contributing data.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRow {
    pub province: String,
    pub value: f64,
}

/// One trend-chart entry.  The trend view is dense: every retained
/// (year, technology) combination appears, zero-filled when no rows
/// contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRow {
    pub year: i32,
    pub technology: String,
    pub value: f64,
}

/// Everything the rendering side needs after one control change.
/// When `metric_unavailable` is set, both row vectors are empty and the UI
/// shows a placeholder instead of charts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardUpdate {
    pub map_rows: Vec<MapRow>,
    pub trend_rows: Vec<TrendRow>,
    pub metric_unavailable: bool,
}

/// A serialized extract ready to hand to a save dialog.
#[derive(Debug, Clone)]
pub struct Export {
    pub bytes: Vec<u8>,
    pub filename: String,
}

// ---------------------------------------------------------------------------
// Controller entry point
// ---------------------------------------------------------------------------

/// Run the whole pipeline for one control change: filter once, aggregate per
/// view.  This is the single function the reactive side calls.
pub fn update_views(
    dataset: &Dataset,
    selection: &FilterSelection,
    metric: Metric,
) -> Result<DashboardUpdate, PipelineError> {
    validate_selection(selection)?;
    let indices = filtered_indices(dataset, selection);

    let by_province = match aggregate(dataset, &indices, metric, &[Dimension::Province]) {
        Aggregation::MetricUnavailable => {
            return Ok(DashboardUpdate {
                metric_unavailable: true,
                ..DashboardUpdate::default()
            })
        }
        Aggregation::Values(rows) => rows,
    };

    let by_year_tech = aggregate(
        dataset,
        &indices,
        metric,
        &[Dimension::Year, Dimension::Technology],
    )
    .rows();

    Ok(DashboardUpdate {
        map_rows: project_map(by_province),
        trend_rows: project_trend(dataset, selection, &indices, by_year_tech),
        metric_unavailable: false,
    })
}

fn validate_selection(selection: &FilterSelection) -> Result<(), PipelineError> {
    let (min, max) = selection.year_range;
    if min > max {
        return Err(PipelineError::InvalidYearRange { min, max });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Map view – sparse by design
// ---------------------------------------------------------------------------

/// Provinces absent from the filtered data are omitted, as are groups whose
/// rows all missed the metric; the map paints both as "no data", not zero.
fn project_map(rows: Vec<AggregateRow>) -> Vec<MapRow> {
    rows.into_iter()
        .filter_map(|row| {
            let value = row.value?;
            match row.key.as_slice() {
                [DimValue::Text(province)] => Some(MapRow {
                    province: province.clone(),
                    value,
                }),
                _ => None,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Trend view – dense by design
// ---------------------------------------------------------------------------

/// Reindex the sparse (year, technology) groups over the full retained
/// domain, filling gaps with zero so chart series stay continuous.
///
/// The domain is deliberately narrow: years are the selection's range
/// clamped to the dataset's observed span, and technologies are only those
/// present in the filtered rows.  Dense fill never re-introduces rows the
/// filters removed.
fn project_trend(
    dataset: &Dataset,
    selection: &FilterSelection,
    indices: &[usize],
    rows: Vec<AggregateRow>,
) -> Vec<TrendRow> {
    let year_lo = selection.year_range.0.max(dataset.year_min);
    let year_hi = selection.year_range.1.min(dataset.year_max);
    if indices.is_empty() || year_lo > year_hi {
        return Vec::new();
    }

    let technologies: BTreeSet<&str> = indices
        .iter()
        .map(|&i| dataset.records[i].technology.as_str())
        .collect();

    let mut grouped: BTreeMap<(i32, &str), f64> = BTreeMap::new();
    for row in &rows {
        if let [DimValue::Year(year), DimValue::Text(tech)] = row.key.as_slice() {
            grouped.insert((*year, tech.as_str()), row.value.unwrap_or(0.0));
        }
    }

    let mut out = Vec::with_capacity((year_hi - year_lo + 1) as usize * technologies.len());
    for year in year_lo..=year_hi {
        for &tech in &technologies {
            out.push(TrendRow {
                year,
                technology: tech.to_string(),
                value: grouped.get(&(year, tech)).copied().unwrap_or(0.0),
            });
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Export view – the raw filtered rows, serialized
// ---------------------------------------------------------------------------

/// Serialize the rows matching `selection` as CSV in the dataset's natural
/// column order.  Filters are applied here, at call time, so the extract
/// always reflects what is currently on screen.
pub fn export_view(
    dataset: &Dataset,
    selection: &FilterSelection,
) -> Result<Export, PipelineError> {
    validate_selection(selection)?;
    let indices = filtered_indices(dataset, selection);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(dataset.column_names())?;

    for &i in &indices {
        let rec = &dataset.records[i];
        let mut fields = vec![
            rec.province.clone(),
            rec.year.to_string(),
            rec.sector.clone(),
            rec.technology.clone(),
            rec.firm_size.clone(),
            rec.cntt_used.to_string(),
        ];
        if dataset.has_productivity {
            fields.push(rec.productivity.map(|v| v.to_string()).unwrap_or_default());
        }
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    let bytes = writer
        .into_inner()
        .map_err(|e| PipelineError::ExportBuffer(e.into_error()))?;

    Ok(Export {
        bytes,
        filename: EXPORT_FILENAME.to_string(),
    })
}
