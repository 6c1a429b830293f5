use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{Dataset, Record};

/// Columns every source file must carry, in the table's natural order.
const REQUIRED_COLUMNS: [&str; 6] = [
    "Province",
    "Year",
    "Sector",
    "Technology",
    "FirmSize",
    "CNTT_Used",
];

/// The optional metric column.
const PRODUCTIVITY: &str = "Productivity";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the survey dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – delimited text with a header row (the original format)
/// * `.parquet` – same columns as scalar fields
///
/// Malformed rows fail the whole load; a dashboard serving silently dropped
/// data is worse than one that refuses to start.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    if dataset.is_empty() {
        bail!("{}: dataset has no rows", path.display());
    }
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut required = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, col) in required.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == col)
            .with_context(|| format!("CSV missing required column '{col}'"))?;
    }
    let [province_idx, year_idx, sector_idx, tech_idx, size_idx, used_idx] = required;
    let productivity_idx = headers.iter().position(|h| h == PRODUCTIVITY);

    let mut records = Vec::new();

    fn field<'r>(
        record: &'r csv::StringRecord,
        idx: usize,
        row_no: usize,
        col: &str,
    ) -> Result<&'r str> {
        record
            .get(idx)
            .with_context(|| format!("CSV row {row_no}: missing field '{col}'"))
    }

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let year: i32 = field(&record, year_idx, row_no, "Year")?
            .trim()
            .parse()
            .with_context(|| format!("CSV row {row_no}: Year is not an integer"))?;
        let cntt_used: f64 = field(&record, used_idx, row_no, "CNTT_Used")?
            .trim()
            .parse()
            .with_context(|| format!("CSV row {row_no}: CNTT_Used is not a number"))?;

        // An empty cell in the optional column is a missing value; anything
        // non-numeric beyond that is a malformed row.
        let productivity = match productivity_idx {
            Some(idx) => {
                let raw = field(&record, idx, row_no, PRODUCTIVITY)?.trim();
                if raw.is_empty() {
                    None
                } else {
                    Some(raw.parse::<f64>().with_context(|| {
                        format!("CSV row {row_no}: Productivity is not a number")
                    })?)
                }
            }
            None => None,
        };

        records.push(Record {
            province: field(&record, province_idx, row_no, "Province")?.to_string(),
            year,
            sector: field(&record, sector_idx, row_no, "Sector")?.to_string(),
            technology: field(&record, tech_idx, row_no, "Technology")?.to_string(),
            firm_size: field(&record, size_idx, row_no, "FirmSize")?.to_string(),
            cntt_used,
            productivity,
        });
    }

    Ok(Dataset::from_records(records, productivity_idx.is_some()))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the same column layout as the CSV format.
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    let mut has_productivity = false;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let mut required = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, col) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = schema
                .index_of(col)
                .map_err(|_| anyhow::anyhow!("Parquet file missing required column '{col}'"))?;
        }
        let [province_idx, year_idx, sector_idx, tech_idx, size_idx, used_idx] = required;
        let productivity_idx = schema.index_of(PRODUCTIVITY).ok();
        has_productivity = productivity_idx.is_some();

        for row in 0..batch.num_rows() {
            let rec = Record {
                province: extract_string(batch.column(province_idx), row)
                    .with_context(|| format!("Parquet row {row}: Province"))?,
                year: extract_i32(batch.column(year_idx), row)
                    .with_context(|| format!("Parquet row {row}: Year"))?,
                sector: extract_string(batch.column(sector_idx), row)
                    .with_context(|| format!("Parquet row {row}: Sector"))?,
                technology: extract_string(batch.column(tech_idx), row)
                    .with_context(|| format!("Parquet row {row}: Technology"))?,
                firm_size: extract_string(batch.column(size_idx), row)
                    .with_context(|| format!("Parquet row {row}: FirmSize"))?,
                cntt_used: extract_f64(batch.column(used_idx), row)
                    .with_context(|| format!("Parquet row {row}: CNTT_Used"))?,
                productivity: match productivity_idx {
                    Some(idx) => {
                        let col = batch.column(idx);
                        if col.is_null(row) {
                            None
                        } else {
                            Some(
                                extract_f64(col, row)
                                    .with_context(|| format!("Parquet row {row}: Productivity"))?,
                            )
                        }
                    }
                    None => None,
                },
            };
            records.push(rec);
        }
    }

    Ok(Dataset::from_records(records, has_productivity))
}

// -- Arrow helpers --

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("unexpected null");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        other => bail!("expected a string column, got {other:?}"),
    }
}

fn extract_i32(col: &Arc<dyn Array>, row: usize) -> Result<i32> {
    if col.is_null(row) {
        bail!("unexpected null");
    }
    match col.data_type() {
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            Ok(arr.value(row))
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            i32::try_from(arr.value(row)).context("integer out of range")
        }
        other => bail!("expected an integer column, got {other:?}"),
    }
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("unexpected null");
    }
    match col.data_type() {
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            Ok(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            Ok(arr.value(row) as f64)
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            Ok(arr.value(row) as f64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            Ok(arr.value(row) as f64)
        }
        other => bail!("expected a numeric column, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    use super::*;

    fn write_csv(dir: &TempDir, name: &str, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn loads_a_well_formed_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "sme.csv",
            &[
                "Province,Year,Sector,Technology,FirmSize,CNTT_Used,Productivity",
                "Hanoi,2020,Retail,Cloud,Small,10,1.5",
                "Da Nang,2021,Manufacturing,AI,Medium,4,",
            ],
        );

        let ds = load_dataset(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.has_productivity);
        assert_eq!(ds.records[0].province, "Hanoi");
        assert_eq!(ds.records[0].productivity, Some(1.5));
        assert_eq!(ds.records[1].productivity, None);
        assert_eq!(ds.year_min, 2020);
        assert_eq!(ds.year_max, 2021);
    }

    #[test]
    fn csv_without_productivity_column_loads() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "sme.csv",
            &[
                "Province,Year,Sector,Technology,FirmSize,CNTT_Used",
                "Hanoi,2020,Retail,Cloud,Small,10",
            ],
        );
        let ds = load_dataset(&path).unwrap();
        assert!(!ds.has_productivity);
        assert_eq!(ds.records[0].productivity, None);
    }

    #[test]
    fn missing_required_column_fails_the_load() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "sme.csv",
            &["Province,Year,Sector,Technology,CNTT_Used", "Hanoi,2020,Retail,Cloud,10"],
        );
        let err = load_dataset(&path).unwrap_err();
        assert!(err.to_string().contains("FirmSize"), "{err:#}");
    }

    #[test]
    fn malformed_row_fails_the_load_instead_of_being_dropped() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "sme.csv",
            &[
                "Province,Year,Sector,Technology,FirmSize,CNTT_Used",
                "Hanoi,2020,Retail,Cloud,Small,10",
                "Hanoi,not-a-year,Retail,Cloud,Small,10",
            ],
        );
        let err = load_dataset(&path).unwrap_err();
        assert!(format!("{err:#}").contains("row 1"), "{err:#}");
    }

    #[test]
    fn header_only_csv_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "sme.csv",
            &["Province,Year,Sector,Technology,FirmSize,CNTT_Used"],
        );
        assert!(load_dataset(&path).is_err());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "sme.xlsx", &["whatever"]);
        let err = load_dataset(&path).unwrap_err();
        assert!(err.to_string().contains("xlsx"), "{err:#}");
    }

    #[test]
    fn loads_a_parquet_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sme.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("Province", DataType::Utf8, false),
            Field::new("Year", DataType::Int64, false),
            Field::new("Sector", DataType::Utf8, false),
            Field::new("Technology", DataType::Utf8, false),
            Field::new("FirmSize", DataType::Utf8, false),
            Field::new("CNTT_Used", DataType::Float64, false),
            Field::new("Productivity", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Hanoi", "Da Nang"])),
                Arc::new(Int64Array::from(vec![2020i64, 2021])),
                Arc::new(StringArray::from(vec!["Retail", "Manufacturing"])),
                Arc::new(StringArray::from(vec!["Cloud", "AI"])),
                Arc::new(StringArray::from(vec!["Small", "Medium"])),
                Arc::new(Float64Array::from(vec![10.0, 4.0])),
                Arc::new(Float64Array::from(vec![Some(1.5), None])),
            ],
        )
        .unwrap();

        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_dataset(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.has_productivity);
        assert_eq!(ds.records[0].year, 2020);
        assert_eq!(ds.records[1].productivity, None);
        assert_eq!(
            ds.technologies.iter().collect::<Vec<_>>(),
            ["AI", "Cloud"]
        );
    }
}
