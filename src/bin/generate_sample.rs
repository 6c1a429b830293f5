use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::json;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

struct Row {
    province: &'static str,
    year: i64,
    sector: &'static str,
    technology: &'static str,
    firm_size: &'static str,
    cntt_used: f64,
    productivity: Option<f64>,
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // Province name + centroid (lon, lat) for the synthetic boundaries.
    let provinces: [(&str, f64, f64); 8] = [
        ("Hanoi", 105.85, 21.03),
        ("Ho Chi Minh City", 106.66, 10.76),
        ("Da Nang", 108.22, 16.07),
        ("Hai Phong", 106.68, 20.86),
        ("Can Tho", 105.77, 10.03),
        ("Quang Ninh", 107.29, 21.01),
        ("Nghe An", 104.92, 19.23),
        ("Lam Dong", 108.44, 11.94),
    ];
    let years = 2018..=2023i64;
    let sectors = ["Retail", "Manufacturing", "Agriculture", "Services", "Logistics"];
    let technologies = ["AI", "CRM", "Cloud", "ERP"];
    let firm_sizes = ["Micro", "Small", "Medium"];

    // Per-technology adoption base and yearly growth.
    let tech_profile = |tech: &str| match tech {
        "Cloud" => (22.0, 4.0),
        "CRM" => (15.0, 2.0),
        "ERP" => (10.0, 1.5),
        _ => (4.0, 3.5), // AI: small base, fast growth
    };

    let mut rows: Vec<Row> = Vec::new();
    for &(province, _, _) in &provinces {
        for year in years.clone() {
            for sector in sectors {
                for technology in technologies {
                    for firm_size in firm_sizes {
                        // Leave ~10% of combinations unsurveyed so the
                        // sparse-map / dense-trend behaviour shows up.
                        if rng.next_f64() < 0.10 {
                            continue;
                        }
                        let (base, growth) = tech_profile(technology);
                        let size_factor = match firm_size {
                            "Micro" => 0.5,
                            "Small" => 1.0,
                            _ => 1.6,
                        };
                        let cntt_used = ((base + growth * (year - 2018) as f64) * size_factor
                            + rng.next_f64() * 6.0)
                            .round();
                        let productivity = (rng.next_f64() < 0.7)
                            .then(|| (60.0 + 30.0 * rng.next_f64()).round() / 10.0);

                        rows.push(Row {
                            province,
                            year,
                            sector,
                            technology,
                            firm_size,
                            cntt_used,
                            productivity,
                        });
                    }
                }
            }
        }
    }

    write_csv(&rows);
    write_parquet(&rows);
    write_geojson(&provinces);

    println!(
        "Wrote {} rows to sme_data.csv / sme_data.parquet and {} shapes to vn_provinces.geojson",
        rows.len(),
        provinces.len()
    );
}

fn write_csv(rows: &[Row]) {
    let mut writer = csv::Writer::from_path("sme_data.csv").expect("Failed to create CSV file");
    writer
        .write_record([
            "Province",
            "Year",
            "Sector",
            "Technology",
            "FirmSize",
            "CNTT_Used",
            "Productivity",
        ])
        .expect("Failed to write CSV header");
    for row in rows {
        writer
            .write_record([
                row.province.to_string(),
                row.year.to_string(),
                row.sector.to_string(),
                row.technology.to_string(),
                row.firm_size.to_string(),
                row.cntt_used.to_string(),
                row.productivity.map(|v| v.to_string()).unwrap_or_default(),
            ])
            .expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV");
}

fn write_parquet(rows: &[Row]) {
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
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.province).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.year).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.sector).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.technology).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.firm_size).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.cntt_used).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.productivity).collect::<Vec<_>>(),
            )),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create("sme_data.parquet").expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn write_geojson(provinces: &[(&str, f64, f64)]) {
    let features: Vec<serde_json::Value> = provinces
        .iter()
        .map(|&(name, lon, lat)| {
            // A rectangle around the centroid stands in for the real
            // boundary; Quang Ninh gets a second "island" polygon so the
            // MultiPolygon path is exercised.
            let d = 0.35;
            let rect = vec![
                vec![lon - d, lat - d],
                vec![lon + d, lat - d],
                vec![lon + d, lat + d],
                vec![lon - d, lat + d],
                vec![lon - d, lat - d],
            ];
            let geometry = if name == "Quang Ninh" {
                let island = vec![
                    vec![lon + d + 0.1, lat - 0.1],
                    vec![lon + d + 0.3, lat - 0.1],
                    vec![lon + d + 0.3, lat + 0.1],
                    vec![lon + d + 0.1, lat - 0.1],
                ];
                json!({ "type": "MultiPolygon", "coordinates": [[rect], [island]] })
            } else {
                json!({ "type": "Polygon", "coordinates": [rect] })
            };
            json!({
                "type": "Feature",
                "properties": { "name": name },
                "geometry": geometry,
            })
        })
        .collect();

    let collection = json!({ "type": "FeatureCollection", "features": features });
    std::fs::write(
        "vn_provinces.geojson",
        serde_json::to_string_pretty(&collection).expect("Failed to serialize GeoJSON"),
    )
    .expect("Failed to write GeoJSON");
}
