//! Weather data models

use serde::{Deserialize, Serialize};

/// Coarse weather condition label
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WeatherCondition {
    Clear,
    Clouds,
    Rain,
    Snow,
    Thunderstorm,
    Unknown,
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherCondition::Clear => write!(f, "Clear"),
            WeatherCondition::Clouds => write!(f, "Clouds"),
            WeatherCondition::Rain => write!(f, "Rain"),
            WeatherCondition::Snow => write!(f, "Snow"),
            WeatherCondition::Thunderstorm => write!(f, "Thunderstorm"),
            WeatherCondition::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Weather readings attached to a single analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub temperature_celsius: f64,
    pub condition: WeatherCondition,
    pub humidity_percent: f64,
    pub wind_speed_mps: f64,
    /// Precipitation total over the trailing 14 days
    pub rain_14d_mm: f64,
}

/// Map a WMO weather interpretation code to a condition label
pub fn condition_from_code(code: i32) -> WeatherCondition {
    match code {
        0 => WeatherCondition::Clear,
        // partly cloudy, overcast, fog
        1..=3 | 45 | 48 => WeatherCondition::Clouds,
        // drizzle, rain, freezing rain, showers
        51..=67 | 80..=82 => WeatherCondition::Rain,
        71..=77 | 85 | 86 => WeatherCondition::Snow,
        95..=99 => WeatherCondition::Thunderstorm,
        _ => WeatherCondition::Unknown,
    }
}

/// Synthetic reading used when the forecast provider cannot be reached.
///
/// `month0` is the zero-based calendar month (0 = January).
pub fn seasonal_fallback(month0: u32) -> WeatherSnapshot {
    match month0 {
        11 | 0 | 1 => WeatherSnapshot {
            temperature_celsius: -5.0,
            condition: WeatherCondition::Snow,
            humidity_percent: 85.0,
            wind_speed_mps: 4.0,
            rain_14d_mm: 10.0,
        },
        5..=7 => WeatherSnapshot {
            temperature_celsius: 24.0,
            condition: WeatherCondition::Clear,
            humidity_percent: 55.0,
            wind_speed_mps: 3.0,
            rain_14d_mm: 20.0,
        },
        _ => WeatherSnapshot {
            temperature_celsius: 12.0,
            condition: WeatherCondition::Clouds,
            humidity_percent: 70.0,
            wind_speed_mps: 3.5,
            rain_14d_mm: 15.0,
        },
    }
}
