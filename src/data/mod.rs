//! Data layer: the pure filter-and-aggregate pipeline.
//!
//! Architecture:
//! ```text
//!  sme_data.csv / .parquet          vn_provinces.geojson
//!        │                                  │
//!        ▼                                  ▼
//!   ┌──────────┐                      ┌──────────┐
//!   │  loader   │  parse file →        │   geo     │  FeatureCollection →
//!   └──────────┘  Dataset             └──────────┘  GeometryTable
//!        │                                  │
//!        ▼                                  │
//!   ┌──────────┐                            │
//!   │  filter   │  selection → row indices  │
//!   └──────────┘                            │
//!        │                                  │
//!        ▼                                  ▼
//!   ┌───────────┐                     join by province name
//!   │ aggregate  │  group + mean            │
//!   └───────────┘                           │
//!        │                                  │
//!        ▼                                  ▼
//!   ┌──────────┐                 map / trend / export views
//!   │  views    │ ────────────────────────────────────────▶ UI
//!   └──────────┘
//! ```
//!
//! Everything in here is a pure function of (Dataset, FilterSelection,
//! Metric): no egui imports, no shared mutable state, no caching.

use thiserror::Error;

pub mod aggregate;
pub mod filter;
pub mod geo;
pub mod loader;
pub mod model;
pub mod views;

/// Errors the pipeline can return for malformed requests.  Empty-but-valid
/// inputs never error; the controller catches these and shows a message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid year range: {min} is after {max}")]
    InvalidYearRange { min: i32, max: i32 },

    #[error("failed to serialize export: {0}")]
    ExportCsv(#[from] csv::Error),

    #[error("failed to finalize export buffer: {0}")]
    ExportBuffer(#[from] std::io::Error),
}
