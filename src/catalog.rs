//! Region catalog loading
//!
//! Regions are hydrological sub-basins delivered as a GeoJSON
//! `FeatureCollection`, each feature tagged with a Pfafstetter code
//! (`PFAF_ID`). The catalog is read once per run, from disk or over HTTP, and
//! stays read-only afterwards.

use crate::errors::{Result, ZonalError};
use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon, Rect};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::fs;

/// Default region identifier property
pub const DEFAULT_ID_FIELD: &str = "PFAF_ID";

/// Canonical string form of a region identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads an identifier from a GeoJSON property value.
    ///
    /// Integral numbers render without a fractional part so that `61` and
    /// `61.0` name the same basin. `null` is not an identifier.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self(i.to_string()))
                } else if let Some(u) = n.as_u64() {
                    Some(Self(u.to_string()))
                } else {
                    let f = n.as_f64()?;
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        Some(Self(format!("{f:.0}")))
                    } else {
                        Some(Self(f.to_string()))
                    }
                }
            }
            other => Some(Self(other.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One catalog feature: a basin outline and its identifier
#[derive(Debug, Clone)]
pub struct RegionPolygon {
    pub id: RegionId,
    pub geometry: MultiPolygon<f64>,
}

/// All region polygons of a run
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    id_field: String,
    polygons: Vec<RegionPolygon>,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Value>,
}

impl RegionCatalog {
    /// Loads a catalog from a local path or an `http(s)://` URL.
    ///
    /// # Errors
    ///
    /// Returns [`ZonalError::CatalogLoad`] if the resource cannot be fetched or
    /// is not a GeoJSON feature collection.
    pub fn load(source: &str, id_field: &str) -> Result<Self> {
        info!("Loading region catalog from {source}");
        let text = if is_remote(source) {
            fetch_remote(source)?
        } else {
            fs::read_to_string(source).map_err(|e| ZonalError::catalog(source, e))?
        };
        Self::from_geojson_str(&text, id_field, source)
    }

    /// Parses a GeoJSON `FeatureCollection` already held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`ZonalError::CatalogLoad`] for malformed documents.
    pub fn from_geojson_str(text: &str, id_field: &str, source_name: &str) -> Result<Self> {
        let raw: RawCollection =
            serde_json::from_str(text).map_err(|e| ZonalError::catalog(source_name, e))?;
        if raw.kind != "FeatureCollection" {
            return Err(ZonalError::catalog(
                source_name,
                format!("expected a FeatureCollection, found '{}'", raw.kind),
            ));
        }

        let mut polygons = Vec::with_capacity(raw.features.len());
        for (index, feature) in raw.features.into_iter().enumerate() {
            let Some(id) = feature
                .properties
                .as_ref()
                .and_then(|props| props.get(id_field))
                .and_then(RegionId::from_json)
            else {
                warn!("Feature {index} has no '{id_field}', skipping");
                continue;
            };

            let geometry = match feature.geometry.as_ref().map(parse_geometry) {
                Some(Ok(Some(geometry))) => geometry,
                Some(Ok(None)) | None => {
                    warn!("Feature {index} ({id_field}={id}) has no polygon geometry, skipping");
                    continue;
                }
                Some(Err(message)) => return Err(ZonalError::catalog(source_name, message)),
            };

            polygons.push(RegionPolygon { id, geometry });
        }

        debug!("Parsed {} region polygons", polygons.len());
        Ok(Self {
            id_field: id_field.to_string(),
            polygons,
        })
    }

    /// Name of the identifier property
    #[must_use]
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    #[must_use]
    pub fn polygons(&self) -> &[RegionPolygon] {
        &self.polygons
    }

    /// Distinct identifiers in order of first appearance
    #[must_use]
    pub fn unique_ids(&self) -> Vec<RegionId> {
        let mut seen = HashSet::new();
        self.polygons
            .iter()
            .filter(|polygon| seen.insert(&polygon.id))
            .map(|polygon| polygon.id.clone())
            .collect()
    }

    /// All polygons tagged with `id`; empty when the catalog has none.
    #[must_use]
    pub fn subset(&self, id: &RegionId) -> Vec<&RegionPolygon> {
        self.polygons.iter().filter(|p| &p.id == id).collect()
    }

    /// Bounding box of every polygon in the catalog
    #[must_use]
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.polygons
            .iter()
            .filter_map(|p| p.geometry.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    Coord {
                        x: a.min().x.min(b.min().x),
                        y: a.min().y.min(b.min().y),
                    },
                    Coord {
                        x: a.max().x.max(b.max().x),
                        y: a.max().y.max(b.max().y),
                    },
                )
            })
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn fetch_remote(url: &str) -> Result<String> {
    let response = reqwest::blocking::get(url).map_err(|e| ZonalError::catalog(url, e))?;
    if !response.status().is_success() {
        return Err(ZonalError::catalog(
            url,
            format!("HTTP status {}", response.status()),
        ));
    }
    response.text().map_err(|e| ZonalError::catalog(url, e))
}

/// `Ok(None)` for geometries that are not (multi)polygons
fn parse_geometry(geometry: &Value) -> std::result::Result<Option<MultiPolygon<f64>>, String> {
    if geometry.is_null() {
        return Ok(None);
    }
    let kind = geometry.get("type").and_then(Value::as_str).unwrap_or_default();
    let coordinates = geometry.get("coordinates");

    match (kind, coordinates) {
        ("Polygon", Some(rings)) => Ok(Some(MultiPolygon::new(vec![parse_polygon(rings)?]))),
        ("MultiPolygon", Some(Value::Array(parts))) => parts
            .iter()
            .map(parse_polygon)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(|parts| Some(MultiPolygon::new(parts))),
        ("Polygon" | "MultiPolygon", _) => Err(format!("{kind} without coordinates")),
        _ => Ok(None),
    }
}

fn parse_polygon(rings: &Value) -> std::result::Result<Polygon<f64>, String> {
    let rings = rings.as_array().ok_or("polygon rings must be an array")?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings.next().ok_or("polygon without exterior ring")??;
    let interiors = rings.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(ring: &Value) -> std::result::Result<LineString<f64>, String> {
    let positions = ring.as_array().ok_or("ring must be an array of positions")?;
    positions
        .iter()
        .map(|position| {
            let xy = position.as_array().filter(|p| p.len() >= 2);
            match xy.map(|p| (p[0].as_f64(), p[1].as_f64())) {
                Some((Some(x), Some(y))) => Ok(Coord { x, y }),
                _ => Err(format!("invalid position {position}")),
            }
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(LineString::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASINS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"PFAF_ID": 10},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]]}},
            {"type": "Feature", "properties": {"PFAF_ID": 20},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[5,5],[6,5],[6,6],[5,6],[5,5]]]]}},
            {"type": "Feature", "properties": {"PFAF_ID": 10},
             "geometry": {"type": "Polygon", "coordinates": [[[3,3],[4,3],[4,4],[3,4],[3,3]]]}},
            {"type": "Feature", "properties": {"NAME": "orphan"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type": "Feature", "properties": {"PFAF_ID": 30},
             "geometry": {"type": "Point", "coordinates": [1, 1]}}
        ]
    }"#;

    #[test]
    fn unique_ids_keep_first_appearance_order() {
        let catalog = RegionCatalog::from_geojson_str(BASINS, DEFAULT_ID_FIELD, "inline").unwrap();
        assert_eq!(catalog.polygons().len(), 3);
        assert_eq!(catalog.unique_ids(), vec![RegionId::new("10"), RegionId::new("20")]);
        assert_eq!(catalog.subset(&RegionId::new("10")).len(), 2);
        assert!(catalog.subset(&RegionId::new("99")).is_empty());
    }

    #[test]
    fn bounds_cover_all_polygons() {
        let catalog = RegionCatalog::from_geojson_str(BASINS, DEFAULT_ID_FIELD, "inline").unwrap();
        let bounds = catalog.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 6.0, y: 6.0 });
    }

    #[test]
    fn identifiers_normalise_numbers() {
        assert_eq!(RegionId::from_json(&json!(61)).unwrap().as_str(), "61");
        assert_eq!(RegionId::from_json(&json!(61.0)).unwrap().as_str(), "61");
        assert_eq!(RegionId::from_json(&json!("6140")).unwrap().as_str(), "6140");
        assert!(RegionId::from_json(&Value::Null).is_none());
    }

    #[test]
    fn malformed_documents_fail_to_load() {
        let err = RegionCatalog::from_geojson_str("{not json", DEFAULT_ID_FIELD, "broken.geojson")
            .unwrap_err();
        assert!(matches!(err, ZonalError::CatalogLoad { .. }));

        let err = RegionCatalog::from_geojson_str(
            r#"{"type": "Feature", "features": []}"#,
            DEFAULT_ID_FIELD,
            "single.geojson",
        )
        .unwrap_err();
        assert!(err.to_string().contains("FeatureCollection"));
    }

    #[test]
    fn missing_local_file_is_a_catalog_error() {
        let err = RegionCatalog::load("/no/such/basins.geojson", DEFAULT_ID_FIELD).unwrap_err();
        assert!(matches!(err, ZonalError::CatalogLoad { .. }));
    }
}
