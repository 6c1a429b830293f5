use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::views::MapRow;

// ---------------------------------------------------------------------------
// GeoJSON wire format (the subset the map needs)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: Properties,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Properties {
    /// The join key: must match the dataset's Province strings exactly.
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon {
        /// rings × points × (lon, lat, …)
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
}

// ---------------------------------------------------------------------------
// GeometryTable – province name → boundary rings
// ---------------------------------------------------------------------------

/// The boundary of one province, flattened to a list of rings for drawing.
#[derive(Debug, Clone)]
pub struct ProvinceShape {
    pub name: String,
    /// Each ring is a closed sequence of (lon, lat) points.
    pub rings: Vec<Vec<[f64; 2]>>,
}

/// The province-keyed geometry reference, loaded once at startup.
/// Used only for rendering; the aggregation math never touches it.
#[derive(Debug, Clone)]
pub struct GeometryTable {
    shapes: BTreeMap<String, ProvinceShape>,
}

/// Result of joining map-view rows to geometry by province name.
#[derive(Debug)]
pub struct MapJoin<'a> {
    /// Shapes that matched, with their aggregate value.
    pub matched: Vec<(&'a ProvinceShape, f64)>,
    /// Provinces present in the data but absent from the geometry.  These
    /// rows are dropped from the map and must be surfaced as a warning.
    pub missing_geometry: Vec<String>,
}

impl GeometryTable {
    /// Load and parse a GeoJSON FeatureCollection file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading geometry file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse GeoJSON text into a name-keyed shape table.
    pub fn parse(text: &str) -> Result<Self> {
        let collection: FeatureCollection =
            serde_json::from_str(text).context("parsing GeoJSON")?;
        if collection.features.is_empty() {
            bail!("GeoJSON has no features");
        }

        let mut shapes = BTreeMap::new();
        for (i, feature) in collection.features.into_iter().enumerate() {
            let name = feature.properties.name;
            let rings = match feature.geometry {
                Geometry::Polygon { coordinates } => rings_from(coordinates)
                    .with_context(|| format!("feature {i} ({name})"))?,
                Geometry::MultiPolygon { coordinates } => {
                    let mut rings = Vec::new();
                    for polygon in coordinates {
                        rings.extend(
                            rings_from(polygon).with_context(|| format!("feature {i} ({name})"))?,
                        );
                    }
                    rings
                }
            };
            shapes.insert(name.clone(), ProvinceShape { name, rings });
        }

        Ok(GeometryTable { shapes })
    }

    /// Number of provinces with geometry.  Never zero: `parse` rejects an
    /// empty collection.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// All shapes, for painting the "no data" background layer.
    pub fn shapes(&self) -> impl Iterator<Item = &ProvinceShape> {
        self.shapes.values()
    }

    /// Join map-view rows to shapes by exact province name.
    pub fn join<'a>(&'a self, rows: &[MapRow]) -> MapJoin<'a> {
        let mut matched = Vec::with_capacity(rows.len());
        let mut missing_geometry = Vec::new();
        for row in rows {
            match self.shapes.get(&row.province) {
                Some(shape) => matched.push((shape, row.value)),
                None => missing_geometry.push(row.province.clone()),
            }
        }
        MapJoin {
            matched,
            missing_geometry,
        }
    }

    /// Geometry entries that no dataset province ever references.  Reported
    /// once at startup so a renamed region is caught before it silently
    /// renders as a permanently grey shape.
    pub fn unreferenced_by(&self, provinces: &BTreeSet<String>) -> Vec<String> {
        self.shapes
            .keys()
            .filter(|name| !provinces.contains(*name))
            .cloned()
            .collect()
    }
}

fn rings_from(coordinates: Vec<Vec<Vec<f64>>>) -> Result<Vec<Vec<[f64; 2]>>> {
    coordinates
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(|point| match point.as_slice() {
                    [lon, lat, ..] => Ok([*lon, *lat]),
                    _ => bail!("ring point has fewer than 2 coordinates"),
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "Hanoi" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[105.0, 21.0], [106.0, 21.0], [106.0, 22.0], [105.0, 21.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Quang Ninh" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[107.0, 20.0], [108.0, 20.0], [108.0, 21.0], [107.0, 20.0]]],
                        [[[107.2, 20.2], [107.4, 20.2], [107.4, 20.4], [107.2, 20.2]]]
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn parses_polygon_and_multipolygon_features() {
        let table = GeometryTable::parse(SAMPLE).unwrap();
        assert_eq!(table.len(), 2);
        let names: Vec<&str> = table.shapes().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Hanoi", "Quang Ninh"]);
        let quang_ninh = table.shapes().find(|s| s.name == "Quang Ninh").unwrap();
        assert_eq!(quang_ninh.rings.len(), 2);
    }

    #[test]
    fn empty_collection_is_rejected() {
        assert!(GeometryTable::parse(r#"{"type":"FeatureCollection","features":[]}"#).is_err());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(GeometryTable::parse("{not geojson").is_err());
    }

    #[test]
    fn join_reports_data_provinces_without_geometry() {
        let table = GeometryTable::parse(SAMPLE).unwrap();
        let rows = vec![
            MapRow { province: "Hanoi".to_string(), value: 10.0 },
            MapRow { province: "Atlantis".to_string(), value: 3.0 },
        ];
        let join = table.join(&rows);
        assert_eq!(join.matched.len(), 1);
        assert_eq!(join.matched[0].0.name, "Hanoi");
        assert_eq!(join.missing_geometry, vec!["Atlantis".to_string()]);
    }

    #[test]
    fn unreferenced_geometry_is_reported() {
        let table = GeometryTable::parse(SAMPLE).unwrap();
        let provinces: BTreeSet<String> = ["Hanoi".to_string()].into_iter().collect();
        assert_eq!(
            table.unreferenced_by(&provinces),
            vec!["Quang Ninh".to_string()]
        );
    }
}
