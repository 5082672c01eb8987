//! NDVI Field Monitoring - Backend
//!
//! HTTP API over a user's fields: CRUD, activity history and the analysis
//! pipeline that combines satellite imagery, weather and a language model
//! into a crop-health report.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;

use crate::error::{AppError, AppResult};
use crate::external::{ImageryClient, ImagerySettings, InsightProvider, WeatherClient};
use crate::services::{AnalysisService, AnalysisSettings, FieldStore, InsightGenerator};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn FieldStore>,
    pub analysis: AnalysisService,
}

impl AppState {
    /// Build provider clients once from configuration
    pub fn from_config(config: Config, store: Arc<dyn FieldStore>) -> AppResult<Self> {
        let weather = WeatherClient::new(
            config.weather.base_url.clone(),
            Duration::from_secs(config.weather.timeout_secs),
        )
        .map_err(|e| AppError::Configuration(format!("weather client: {}", e)))?;

        let imagery = match config.imagery.credentials() {
            Some((username, password)) => {
                let default_window_start = config
                    .imagery
                    .default_window_start
                    .parse::<DateTime<Utc>>()
                    .map_err(|e| {
                        AppError::Configuration(format!("imagery.default_window_start: {}", e))
                    })?;
                let settings = ImagerySettings {
                    token_url: config.imagery.token_url.clone(),
                    catalog_url: config.imagery.catalog_url.clone(),
                    client_id: config.imagery.client_id.clone(),
                    collection: config.imagery.collection.clone(),
                    username,
                    password,
                    default_window_start,
                };
                let client =
                    ImageryClient::new(settings, Duration::from_secs(config.imagery.timeout_secs))
                        .map_err(|e| AppError::Configuration(format!("imagery client: {}", e)))?;
                Some(client)
            }
            None => None,
        };

        let provider = InsightProvider::from_config(&config.llm)
            .map_err(|e| AppError::Configuration(format!("language-model client: {}", e)))?;

        let analysis = AnalysisService::new(
            store.clone(),
            weather,
            imagery,
            InsightGenerator::new(provider),
            AnalysisSettings {
                synthetic_delay: Duration::from_millis(config.analysis.synthetic_delay_ms),
                history_limit: config.analysis.history_limit,
            },
        );

        tracing::info!(
            imagery = analysis.imagery_configured(),
            insight_provider = analysis.insight_provider(),
            "Providers configured"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            analysis,
        })
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "NDVI Field Monitoring API v1.0"
}

/// Liveness check
async fn health_check() -> &'static str {
    "OK"
}
