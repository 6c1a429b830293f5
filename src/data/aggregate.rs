use std::collections::BTreeMap;

use super::model::{AggregateRow, Dataset, DimValue, Dimension, Metric};

// ---------------------------------------------------------------------------
// Aggregation outcome
// ---------------------------------------------------------------------------

/// Result of an aggregation pass.
///
/// `MetricUnavailable` is distinct from an empty `Values`: it means the
/// filtered rows exist but none of them carries the selected metric, so the
/// UI must show a placeholder instead of a misleading zero chart.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    Values(Vec<AggregateRow>),
    MetricUnavailable,
}

impl Aggregation {
    /// The grouped rows, with `MetricUnavailable` flattened to empty.
    pub fn rows(self) -> Vec<AggregateRow> {
        match self {
            Aggregation::Values(rows) => rows,
            Aggregation::MetricUnavailable => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Group-by + mean
// ---------------------------------------------------------------------------

/// Group the filtered rows by the ordered tuple of `dims` values and reduce
/// `metric` to its arithmetic mean per group.
///
/// * Rows missing the metric value do not contribute to their group's mean;
///   a group whose rows all miss it gets `value: None`.
/// * Groups with no contributing rows do not appear at all (sparse output);
///   dense reindexing is a view concern, not an aggregator concern.
/// * Output is sorted by group key (`BTreeMap` iteration), so identical
///   inputs always produce identical output order.
pub fn aggregate(
    dataset: &Dataset,
    indices: &[usize],
    metric: Metric,
    dims: &[Dimension],
) -> Aggregation {
    if !indices.is_empty()
        && !indices
            .iter()
            .any(|&i| metric.value_of(&dataset.records[i]).is_some())
    {
        return Aggregation::MetricUnavailable;
    }

    // group key → (sum, count) over rows that carry the metric
    let mut groups: BTreeMap<Vec<DimValue>, (f64, usize)> = BTreeMap::new();

    for &i in indices {
        let rec = &dataset.records[i];
        let key: Vec<DimValue> = dims.iter().map(|d| d.value_of(rec)).collect();
        let entry = groups.entry(key).or_insert((0.0, 0));
        if let Some(v) = metric.value_of(rec) {
            entry.0 += v;
            entry.1 += 1;
        }
    }

    let rows = groups
        .into_iter()
        .map(|(key, (sum, count))| AggregateRow {
            key,
            value: (count > 0).then(|| sum / count as f64),
        })
        .collect();

    Aggregation::Values(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn rec(province: &str, year: i32, tech: &str, used: f64, prod: Option<f64>) -> Record {
        Record {
            province: province.to_string(),
            year,
            sector: "Retail".to_string(),
            technology: tech.to_string(),
            firm_size: "Small".to_string(),
            cntt_used: used,
            productivity: prod,
        }
    }

    fn all_indices(ds: &Dataset) -> Vec<usize> {
        (0..ds.len()).collect()
    }

    #[test]
    fn mean_is_computed_per_group() {
        let ds = Dataset::from_records(
            vec![
                rec("Hanoi", 2020, "Cloud", 10.0, None),
                rec("Hanoi", 2021, "Cloud", 20.0, None),
                rec("Da Nang", 2020, "AI", 5.0, None),
            ],
            false,
        );
        let agg = aggregate(&ds, &all_indices(&ds), Metric::CnttUsed, &[Dimension::Province]);
        let rows = agg.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, vec![DimValue::Text("Da Nang".into())]);
        assert_eq!(rows[0].value, Some(5.0));
        assert_eq!(rows[1].key, vec![DimValue::Text("Hanoi".into())]);
        assert_eq!(rows[1].value, Some(15.0));
    }

    #[test]
    fn multi_dimension_keys_keep_dimension_order() {
        let ds = Dataset::from_records(
            vec![
                rec("Hanoi", 2020, "Cloud", 10.0, None),
                rec("Hanoi", 2020, "AI", 4.0, None),
            ],
            false,
        );
        let rows = aggregate(
            &ds,
            &all_indices(&ds),
            Metric::CnttUsed,
            &[Dimension::Year, Dimension::Technology],
        )
        .rows();
        assert_eq!(
            rows[0].key,
            vec![DimValue::Year(2020), DimValue::Text("AI".into())]
        );
        assert_eq!(
            rows[1].key,
            vec![DimValue::Year(2020), DimValue::Text("Cloud".into())]
        );
    }

    #[test]
    fn rows_missing_the_metric_do_not_skew_the_mean() {
        let ds = Dataset::from_records(
            vec![
                rec("Hanoi", 2020, "Cloud", 1.0, Some(8.0)),
                rec("Hanoi", 2021, "Cloud", 1.0, None),
                rec("Hanoi", 2022, "Cloud", 1.0, Some(4.0)),
            ],
            true,
        );
        let rows = aggregate(
            &ds,
            &all_indices(&ds),
            Metric::Productivity,
            &[Dimension::Province],
        )
        .rows();
        assert_eq!(rows[0].value, Some(6.0));
    }

    #[test]
    fn group_with_no_metric_values_yields_none_when_others_have_data() {
        let ds = Dataset::from_records(
            vec![
                rec("Hanoi", 2020, "Cloud", 1.0, Some(8.0)),
                rec("Da Nang", 2020, "Cloud", 1.0, None),
            ],
            true,
        );
        let rows = aggregate(
            &ds,
            &all_indices(&ds),
            Metric::Productivity,
            &[Dimension::Province],
        )
        .rows();
        assert_eq!(rows[0].key, vec![DimValue::Text("Da Nang".into())]);
        assert_eq!(rows[0].value, None);
        assert_eq!(rows[1].value, Some(8.0));
    }

    #[test]
    fn metric_unavailable_when_no_filtered_row_carries_it() {
        let ds = Dataset::from_records(
            vec![
                rec("Hanoi", 2020, "Cloud", 1.0, None),
                rec("Da Nang", 2021, "AI", 2.0, None),
            ],
            false,
        );
        let agg = aggregate(
            &ds,
            &all_indices(&ds),
            Metric::Productivity,
            &[Dimension::Province],
        );
        assert_eq!(agg, Aggregation::MetricUnavailable);
    }

    #[test]
    fn empty_input_is_empty_not_unavailable() {
        let ds = Dataset::from_records(vec![rec("Hanoi", 2020, "Cloud", 1.0, None)], false);
        let agg = aggregate(&ds, &[], Metric::Productivity, &[Dimension::Province]);
        assert_eq!(agg, Aggregation::Values(Vec::new()));
    }

    #[test]
    fn identical_inputs_produce_identical_output() {
        let ds = Dataset::from_records(
            vec![
                rec("Hue", 2020, "ERP", 3.0, None),
                rec("Hanoi", 2020, "Cloud", 10.0, None),
                rec("Da Nang", 2021, "AI", 5.0, None),
            ],
            false,
        );
        let idx = all_indices(&ds);
        let a = aggregate(&ds, &idx, Metric::CnttUsed, &[Dimension::Province]).rows();
        let b = aggregate(&ds, &idx, Metric::CnttUsed, &[Dimension::Province]).rows();
        assert_eq!(a, b);
    }
}
