use super::model::{Dataset, FilterSelection};

// ---------------------------------------------------------------------------
// Filter predicate: which rows survive the current selection
// ---------------------------------------------------------------------------

/// Return indices of records that pass every active filter condition.
///
/// A record passes when:
/// * its year lies within `selection.year_range`, inclusive (always checked)
/// * the sector matches exactly, if a sector is selected
/// * its technology is in `selection.technologies`, if that set is non-empty
/// * its firm size is in `selection.firm_sizes`, if that set is non-empty
///
/// The conditions AND together.  The dataset is untouched; an empty result
/// is valid and simply means nothing matched.
pub fn filtered_indices(dataset: &Dataset, selection: &FilterSelection) -> Vec<usize> {
    let (min_year, max_year) = selection.year_range;

    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            if rec.year < min_year || rec.year > max_year {
                return false;
            }
            if let Some(sector) = &selection.sector {
                if rec.sector != *sector {
                    return false;
                }
            }
            if !selection.technologies.is_empty()
                && !selection.technologies.contains(&rec.technology)
            {
                return false;
            }
            if !selection.firm_sizes.is_empty() && !selection.firm_sizes.contains(&rec.firm_size)
            {
                return false;
            }
            true
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::model::Record;

    fn rec(province: &str, year: i32, sector: &str, tech: &str, size: &str) -> Record {
        Record {
            province: province.to_string(),
            year,
            sector: sector.to_string(),
            technology: tech.to_string(),
            firm_size: size.to_string(),
            cntt_used: 1.0,
            productivity: None,
        }
    }

    fn sample() -> Dataset {
        Dataset::from_records(
            vec![
                rec("Hanoi", 2019, "Retail", "Cloud", "Small"),
                rec("Hanoi", 2020, "Retail", "AI", "Medium"),
                rec("Da Nang", 2021, "Manufacturing", "ERP", "Small"),
                rec("Can Tho", 2022, "Agriculture", "CRM", "Micro"),
            ],
            false,
        )
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_selection_returns_every_row() {
        let ds = sample();
        let idx = filtered_indices(&ds, &FilterSelection::all_of(&ds));
        assert_eq!(idx, vec![0, 1, 2, 3]);
    }

    #[test]
    fn year_bounds_are_inclusive() {
        let ds = sample();
        let sel = FilterSelection {
            year_range: (2020, 2021),
            ..FilterSelection::all_of(&ds)
        };
        assert_eq!(filtered_indices(&ds, &sel), vec![1, 2]);
    }

    #[test]
    fn sector_is_exact_match() {
        let ds = sample();
        let sel = FilterSelection {
            sector: Some("Retail".to_string()),
            ..FilterSelection::all_of(&ds)
        };
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1]);
    }

    #[test]
    fn technology_set_is_any_match() {
        let ds = sample();
        let sel = FilterSelection {
            technologies: set(&["Cloud", "ERP"]),
            ..FilterSelection::all_of(&ds)
        };
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 2]);
    }

    #[test]
    fn firm_size_set_is_any_match() {
        let ds = sample();
        let sel = FilterSelection {
            firm_sizes: set(&["Small"]),
            ..FilterSelection::all_of(&ds)
        };
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 2]);
    }

    #[test]
    fn conditions_combine_with_and() {
        let ds = sample();
        let sel = FilterSelection {
            year_range: (2019, 2021),
            sector: Some("Retail".to_string()),
            technologies: set(&["Cloud", "ERP"]),
            firm_sizes: set(&["Small"]),
        };
        assert_eq!(filtered_indices(&ds, &sel), vec![0]);
    }

    #[test]
    fn eliminating_every_row_yields_empty_not_error() {
        let ds = sample();
        let sel = FilterSelection {
            sector: Some("Mining".to_string()),
            ..FilterSelection::all_of(&ds)
        };
        assert!(filtered_indices(&ds, &sel).is_empty());
    }

    #[test]
    fn filtering_is_idempotent_and_pure() {
        let ds = sample();
        let before = ds.records.clone();
        let sel = FilterSelection {
            technologies: set(&["AI"]),
            ..FilterSelection::all_of(&ds)
        };
        let first = filtered_indices(&ds, &sel);
        let second = filtered_indices(&ds, &sel);
        assert_eq!(first, second);
        assert_eq!(ds.records, before);
    }

    #[test]
    fn output_rows_all_satisfy_the_selection() {
        let ds = sample();
        let sel = FilterSelection {
            year_range: (2019, 2021),
            sector: None,
            technologies: set(&["Cloud", "AI", "ERP"]),
            firm_sizes: set(&["Small", "Medium"]),
        };
        for i in filtered_indices(&ds, &sel) {
            let rec = &ds.records[i];
            assert!((2019..=2021).contains(&rec.year));
            assert!(sel.technologies.contains(&rec.technology));
            assert!(sel.firm_sizes.contains(&rec.firm_size));
        }
    }
}
