//! Common types used across the platform
//!
//! The dashboard speaks in plain `{lat, lng}` pairs while the database stores
//! PostGIS geographies exchanged as GeoJSON. The conversions between the two
//! live here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Simplified coordinate pair as used by the dashboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// GeoJSON geometry kind tag
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Polygon,
}

/// GeoJSON point, coordinates ordered `[lng, lat]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    pub coordinates: [f64; 2],
}

/// GeoJSON polygon; the first ring is the outer boundary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoPolygon {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("expected a {expected:?} geometry, got {found:?}")]
    WrongKind {
        expected: GeometryKind,
        found: GeometryKind,
    },

    #[error("polygon has no outer ring")]
    EmptyPolygon,
}

impl From<LatLng> for GeoPoint {
    fn from(p: LatLng) -> Self {
        GeoPoint {
            kind: GeometryKind::Point,
            coordinates: [p.lng, p.lat],
        }
    }
}

impl TryFrom<&GeoPoint> for LatLng {
    type Error = GeometryError;

    fn try_from(point: &GeoPoint) -> Result<Self, Self::Error> {
        if point.kind != GeometryKind::Point {
            return Err(GeometryError::WrongKind {
                expected: GeometryKind::Point,
                found: point.kind,
            });
        }
        let [lng, lat] = point.coordinates;
        Ok(LatLng { lat, lng })
    }
}

impl GeoPolygon {
    /// Build a single-ring polygon, closing the ring if the caller did not
    pub fn from_ring(vertices: &[LatLng]) -> Self {
        let mut ring: Vec<[f64; 2]> = vertices.iter().map(|v| [v.lng, v.lat]).collect();
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        GeoPolygon {
            kind: GeometryKind::Polygon,
            coordinates: vec![ring],
        }
    }

    /// Outer ring as dashboard coordinates, without the closing vertex
    pub fn outer_ring(&self) -> Result<Vec<LatLng>, GeometryError> {
        if self.kind != GeometryKind::Polygon {
            return Err(GeometryError::WrongKind {
                expected: GeometryKind::Polygon,
                found: self.kind,
            });
        }
        let ring = self.coordinates.first().ok_or(GeometryError::EmptyPolygon)?;
        let mut vertices: Vec<LatLng> = ring
            .iter()
            .map(|[lng, lat]| LatLng { lat: *lat, lng: *lng })
            .collect();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        Ok(vertices)
    }
}

/// Imagery search window; open ends fall back to provider defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}
