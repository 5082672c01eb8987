//! Weather API client for fetching current conditions
//!
//! Integrates with the Open-Meteo forecast API (no key required) for current
//! conditions plus the trailing 14 days of daily precipitation.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared::{condition_from_code, WeatherSnapshot};
use thiserror::Error;

/// Length of the trailing precipitation window in days
pub const RAIN_WINDOW_DAYS: u32 = 14;

const KMH_PER_MPS: f64 = 3.6;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("weather API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("weather response missing current conditions")]
    MissingCurrent,
}

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
}

/// Open-Meteo forecast response
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: Option<OpenMeteoCurrent>,
    daily: Option<OpenMeteoDaily>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    /// km/h
    wind_speed_10m: f64,
    weather_code: i32,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoDaily {
    #[serde(default)]
    time: Vec<NaiveDate>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

impl WeatherClient {
    /// Create a new WeatherClient with an explicit request timeout
    pub fn new(base_url: String, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Fetch current conditions and trailing precipitation for a point
    pub async fn get_current_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/forecast", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code".to_string(),
                ),
                ("daily", "precipitation_sum".to_string()),
                ("past_days", RAIN_WINDOW_DAYS.to_string()),
                ("forecast_days", "1".to_string()),
                ("timezone", "UTC".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Status { status, body });
        }

        let data: OpenMeteoResponse = response.json().await?;
        let today = Utc::now().date_naive();

        convert_response(data, today)
    }
}

/// Convert an Open-Meteo response to a snapshot
fn convert_response(
    data: OpenMeteoResponse,
    today: NaiveDate,
) -> Result<WeatherSnapshot, WeatherError> {
    let current = data.current.ok_or(WeatherError::MissingCurrent)?;

    Ok(WeatherSnapshot {
        temperature_celsius: current.temperature_2m,
        condition: condition_from_code(current.weather_code),
        humidity_percent: current.relative_humidity_2m,
        wind_speed_mps: round1(current.wind_speed_10m / KMH_PER_MPS),
        rain_14d_mm: round1(data.daily.map(|d| trailing_rain(&d, today)).unwrap_or(0.0)),
    })
}

/// Sum precipitation over days before `today`; missing values count as zero
fn trailing_rain(daily: &OpenMeteoDaily, today: NaiveDate) -> f64 {
    if daily.time.len() != daily.precipitation_sum.len() {
        // no dates to filter on: take the trailing window by position
        return daily
            .precipitation_sum
            .iter()
            .rev()
            .take(RAIN_WINDOW_DAYS as usize)
            .map(|v| v.unwrap_or(0.0))
            .sum();
    }

    daily
        .time
        .iter()
        .zip(&daily.precipitation_sum)
        .filter(|(date, _)| **date < today)
        .map(|(_, v)| v.unwrap_or(0.0))
        .sum()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
