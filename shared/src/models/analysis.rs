//! Vegetation-index analysis models

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::insight::AiInsight;
use super::stress::StressCause;
use super::weather::WeatherSnapshot;

/// Synthetic fallback bands
pub const SYNTHETIC_NDVI_RANGE: (f64, f64) = (0.55, 0.85);
pub const SYNTHETIC_HEALTHY_RANGE: (u32, u32) = (65, 85);
pub const SYNTHETIC_MODERATE_RANGE: (u32, u32) = (20, 30);
pub const SYNTHETIC_STRESSED_RANGE: (u32, u32) = (5, 10);
pub const SYNTHETIC_ALERT_PROBABILITY: f64 = 0.1;

/// Index values and health buckets before weather and AI enrichment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisBase {
    pub ndvi_average: f64,
    pub healthy_percent: f64,
    pub moderate_percent: f64,
    pub stressed_percent: f64,
    pub alert: bool,
}

/// Scene reference returned by the imagery catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneReference {
    pub product_id: String,
    pub map_url: String,
    pub acquired_at: DateTime<Utc>,
}

/// A persisted analysis; immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub field_id: Uuid,
    pub user_id: Uuid,
    pub ndvi_average: f64,
    pub healthy_percent: f64,
    pub moderate_percent: f64,
    pub stressed_percent: f64,
    pub alert: bool,
    pub map_url: Option<String>,
    pub product_id: Option<String>,
    pub acquired_at: Option<DateTime<Utc>>,
    pub weather: WeatherSnapshot,
    pub ai_insight: AiInsight,
    pub stress_cause: StressCause,
    pub deviation: f64,
    pub seasonal_norm: f64,
    pub created_at: DateTime<Utc>,
}

/// Denormalized copy of the latest analysis kept on the field row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastAnalysis {
    pub analysis_id: Uuid,
    pub ndvi_average: f64,
    pub healthy_percent: f64,
    pub moderate_percent: f64,
    pub stressed_percent: f64,
    pub alert: bool,
    pub status: String,
    pub stress_cause: StressCause,
    pub created_at: DateTime<Utc>,
}

impl From<&Analysis> for LastAnalysis {
    fn from(a: &Analysis) -> Self {
        LastAnalysis {
            analysis_id: a.id,
            ndvi_average: a.ndvi_average,
            healthy_percent: a.healthy_percent,
            moderate_percent: a.moderate_percent,
            stressed_percent: a.stressed_percent,
            alert: a.alert,
            status: a.ai_insight.status.clone(),
            stress_cause: a.stress_cause,
            created_at: a.created_at,
        }
    }
}

/// Expected vegetation index for a calendar month.
///
/// `month0` is zero-based (0 = January). The crop type does not alter the
/// baseline yet; it is accepted so callers need not change when it does.
pub fn seasonal_norm(_crop_type: &str, month0: u32) -> f64 {
    match month0 {
        11 | 0..=2 => 0.2,
        4..=7 => 0.8,
        3 | 8 => 0.45,
        _ => 0.5,
    }
}

pub fn deviation(observed: f64, norm: f64) -> f64 {
    observed - norm
}

/// Deviation relative to the norm, in percent
pub fn deviation_percent(deviation: f64, norm: f64) -> f64 {
    if norm == 0.0 {
        return 0.0;
    }
    deviation / norm * 100.0
}

/// Fixed base reported when a scene was found; pixel statistics are not computed
pub fn placeholder_imagery_base() -> AnalysisBase {
    AnalysisBase {
        ndvi_average: 0.72,
        healthy_percent: 78.0,
        moderate_percent: 17.0,
        stressed_percent: 5.0,
        alert: false,
    }
}

/// Pseudo-random base used when no imagery is available
pub fn synthetic_base<R: Rng + ?Sized>(rng: &mut R) -> AnalysisBase {
    let (ndvi_min, ndvi_max) = SYNTHETIC_NDVI_RANGE;
    let ndvi = rng.random_range(ndvi_min..=ndvi_max);

    AnalysisBase {
        ndvi_average: (ndvi * 1000.0).round() / 1000.0,
        healthy_percent: rng
            .random_range(SYNTHETIC_HEALTHY_RANGE.0..=SYNTHETIC_HEALTHY_RANGE.1)
            .into(),
        moderate_percent: rng
            .random_range(SYNTHETIC_MODERATE_RANGE.0..=SYNTHETIC_MODERATE_RANGE.1)
            .into(),
        stressed_percent: rng
            .random_range(SYNTHETIC_STRESSED_RANGE.0..=SYNTHETIC_STRESSED_RANGE.1)
            .into(),
        alert: rng.random_bool(SYNTHETIC_ALERT_PROBABILITY),
    }
}
