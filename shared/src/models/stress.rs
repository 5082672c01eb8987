//! Vegetation stress classification

use serde::{Deserialize, Serialize};

use super::weather::WeatherSnapshot;

/// Deviation below which a field is considered stressed
pub const STRESS_DEVIATION_THRESHOLD: f64 = -0.1;

/// Drought: little rain over two weeks and a warm spell
pub const DROUGHT_RAIN_14D_MM: f64 = 5.0;
pub const DROUGHT_TEMPERATURE_CELSIUS: f64 = 25.0;

pub const HEAT_TEMPERATURE_CELSIUS: f64 = 30.0;

pub const DISEASE_HUMIDITY_PERCENT: f64 = 80.0;

/// Freeze: cold snap over a canopy that is still green
pub const FREEZE_TEMPERATURE_CELSIUS: f64 = 5.0;
pub const FREEZE_MIN_NDVI: f64 = 0.5;

/// Likely cause of a negative vegetation-index deviation.
///
/// Serialized as the user-facing label shown in the dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StressCause {
    #[serde(rename = "В норме")]
    Normal,
    #[serde(rename = "Дефицит влаги")]
    Drought,
    #[serde(rename = "Тепловой стресс")]
    HeatStress,
    #[serde(rename = "Риск болезней")]
    DiseaseRisk,
    #[serde(rename = "Риск заморозков")]
    FreezeRisk,
    #[serde(rename = "Задержка роста / дефицит питания")]
    GrowthDelay,
}

impl StressCause {
    pub fn label(&self) -> &'static str {
        match self {
            StressCause::Normal => "В норме",
            StressCause::Drought => "Дефицит влаги",
            StressCause::HeatStress => "Тепловой стресс",
            StressCause::DiseaseRisk => "Риск болезней",
            StressCause::FreezeRisk => "Риск заморозков",
            StressCause::GrowthDelay => "Задержка роста / дефицит питания",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [
            StressCause::Normal,
            StressCause::Drought,
            StressCause::HeatStress,
            StressCause::DiseaseRisk,
            StressCause::FreezeRisk,
            StressCause::GrowthDelay,
        ]
        .into_iter()
        .find(|cause| cause.label() == label)
    }
}

impl std::fmt::Display for StressCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Pick the stress cause for an observation.
///
/// Rules are a priority chain: the first match wins even when several hold.
pub fn classify_stress(deviation: f64, weather: &WeatherSnapshot, ndvi: f64) -> StressCause {
    if deviation >= STRESS_DEVIATION_THRESHOLD {
        return StressCause::Normal;
    }

    if weather.rain_14d_mm < DROUGHT_RAIN_14D_MM
        && weather.temperature_celsius > DROUGHT_TEMPERATURE_CELSIUS
    {
        StressCause::Drought
    } else if weather.temperature_celsius > HEAT_TEMPERATURE_CELSIUS {
        StressCause::HeatStress
    } else if weather.humidity_percent > DISEASE_HUMIDITY_PERCENT {
        StressCause::DiseaseRisk
    } else if weather.temperature_celsius < FREEZE_TEMPERATURE_CELSIUS && ndvi > FREEZE_MIN_NDVI {
        StressCause::FreezeRisk
    } else {
        StressCause::GrowthDelay
    }
}
