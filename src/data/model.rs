use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Record – one survey row
// ---------------------------------------------------------------------------

/// A single SME survey observation (one row of the source table).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub province: String,
    pub year: i32,
    pub sector: String,
    pub technology: String,
    pub firm_size: String,
    /// Number of SMEs using ICT.
    pub cntt_used: f64,
    /// Productivity measure; the source column is optional.
    pub productivity: Option<f64>,
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed per-dimension value sets.
/// Loaded once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All survey rows, in file order.
    pub records: Vec<Record>,
    /// Sorted unique values per categorical dimension.
    pub provinces: BTreeSet<String>,
    pub sectors: BTreeSet<String>,
    pub technologies: BTreeSet<String>,
    pub firm_sizes: BTreeSet<String>,
    /// Observed year span, inclusive.
    pub year_min: i32,
    pub year_max: i32,
    /// Whether the source file carried the optional Productivity column.
    pub has_productivity: bool,
}

impl Dataset {
    /// Build dimension indices from the loaded rows.
    ///
    /// `has_productivity` comes from the source header, not from the rows:
    /// a file can carry the column with every cell empty.
    pub fn from_records(records: Vec<Record>, has_productivity: bool) -> Self {
        let mut provinces = BTreeSet::new();
        let mut sectors = BTreeSet::new();
        let mut technologies = BTreeSet::new();
        let mut firm_sizes = BTreeSet::new();
        let mut year_min = i32::MAX;
        let mut year_max = i32::MIN;

        for rec in &records {
            provinces.insert(rec.province.clone());
            sectors.insert(rec.sector.clone());
            technologies.insert(rec.technology.clone());
            firm_sizes.insert(rec.firm_size.clone());
            year_min = year_min.min(rec.year);
            year_max = year_max.max(rec.year);
        }
        if records.is_empty() {
            year_min = 0;
            year_max = 0;
        }

        Dataset {
            records,
            provinces,
            sectors,
            technologies,
            firm_sizes,
            year_min,
            year_max,
            has_productivity,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column names in the table's natural order, as exported.
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut cols = vec![
            "Province",
            "Year",
            "Sector",
            "Technology",
            "FirmSize",
            "CNTT_Used",
        ];
        if self.has_productivity {
            cols.push("Productivity");
        }
        cols
    }
}

// ---------------------------------------------------------------------------
// FilterSelection – what the user has picked in the controls
// ---------------------------------------------------------------------------

/// The active filter choices, built fresh from the widgets on every update.
/// An empty set (or `None` sector) means "no constraint on that dimension".
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    /// Inclusive year bounds, always applied.
    pub year_range: (i32, i32),
    /// Exact-match industry sector, if any.
    pub sector: Option<String>,
    /// Any-match technology set.
    pub technologies: BTreeSet<String>,
    /// Any-match firm-size set.
    pub firm_sizes: BTreeSet<String>,
}

impl FilterSelection {
    /// The unconstrained selection over a dataset: full year span, nothing
    /// else set. Filtering with it reproduces the dataset unchanged.
    pub fn all_of(dataset: &Dataset) -> Self {
        FilterSelection {
            year_range: (dataset.year_min, dataset.year_max),
            sector: None,
            technologies: BTreeSet::new(),
            firm_sizes: BTreeSet::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Metric – which numeric column drives the aggregation
// ---------------------------------------------------------------------------

/// The numeric column selected by the display-mode radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    CnttUsed,
    Productivity,
}

impl Metric {
    /// The column's value for a row, if the row carries it.
    pub fn value_of(self, rec: &Record) -> Option<f64> {
        match self {
            Metric::CnttUsed => Some(rec.cntt_used),
            Metric::Productivity => rec.productivity,
        }
    }

    /// Human-readable label for chart titles and the metric radio.
    pub fn label(self) -> &'static str {
        match self {
            Metric::CnttUsed => "SMEs using ICT",
            Metric::Productivity => "Productivity",
        }
    }
}

// ---------------------------------------------------------------------------
// Dimension / DimValue – group-by keys
// ---------------------------------------------------------------------------

/// A groupable dimension of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Province,
    Year,
    Sector,
    Technology,
    FirmSize,
}

impl Dimension {
    /// The dimension's value for a row.
    pub fn value_of(self, rec: &Record) -> DimValue {
        match self {
            Dimension::Province => DimValue::Text(rec.province.clone()),
            Dimension::Year => DimValue::Year(rec.year),
            Dimension::Sector => DimValue::Text(rec.sector.clone()),
            Dimension::Technology => DimValue::Text(rec.technology.clone()),
            Dimension::FirmSize => DimValue::Text(rec.firm_size.clone()),
        }
    }
}

/// One component of a group key.  `Ord` so keys can live in a `BTreeMap`,
/// which is what makes aggregate output order deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DimValue {
    Year(i32),
    Text(String),
}

impl fmt::Display for DimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimValue::Year(y) => write!(f, "{y}"),
            DimValue::Text(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// AggregateRow – one group in an aggregation result
// ---------------------------------------------------------------------------

/// One output group: the ordered key tuple and the reduced metric.
/// `value: None` means the group had rows but none carried the metric;
/// consumers must render that as "no data", never crash on it.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: Vec<DimValue>,
    pub value: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(province: &str, year: i32) -> Record {
        Record {
            province: province.to_string(),
            year,
            sector: "Retail".to_string(),
            technology: "Cloud".to_string(),
            firm_size: "Small".to_string(),
            cntt_used: 1.0,
            productivity: None,
        }
    }

    #[test]
    fn dataset_indexes_dimensions_and_year_span() {
        let ds = Dataset::from_records(
            vec![rec("Hanoi", 2020), rec("Da Nang", 2022), rec("Hanoi", 2018)],
            false,
        );
        assert_eq!(
            ds.provinces.iter().collect::<Vec<_>>(),
            ["Da Nang", "Hanoi"]
        );
        assert_eq!(ds.year_min, 2018);
        assert_eq!(ds.year_max, 2022);
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn column_order_tracks_optional_productivity() {
        let without = Dataset::from_records(vec![rec("Hanoi", 2020)], false);
        let with = Dataset::from_records(vec![rec("Hanoi", 2020)], true);
        assert_eq!(
            without.column_names(),
            ["Province", "Year", "Sector", "Technology", "FirmSize", "CNTT_Used"]
        );
        assert_eq!(with.column_names().last(), Some(&"Productivity"));
    }

    #[test]
    fn dim_values_order_deterministically() {
        let mut keys = vec![
            vec![DimValue::Year(2021), DimValue::Text("Cloud".into())],
            vec![DimValue::Year(2020), DimValue::Text("ERP".into())],
            vec![DimValue::Year(2020), DimValue::Text("AI".into())],
        ];
        keys.sort();
        assert_eq!(keys[0][0], DimValue::Year(2020));
        assert_eq!(keys[0][1], DimValue::Text("AI".into()));
        assert_eq!(keys[2][0], DimValue::Year(2021));
    }
}
