//! Configuration management for the NDVI monitoring server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with NDVI_ prefix
//!
//! Provider credentials are optional. A provider without credentials is
//! skipped rather than treated as an error.

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Auth provider token validation
    pub auth: AuthConfig,

    /// Forecast provider configuration
    pub weather: WeatherConfig,

    /// Satellite imagery catalog configuration
    pub imagery: ImageryConfig,

    /// Language-model providers
    pub llm: LlmConfig,

    /// Analysis pipeline tuning
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 secret the auth provider signs access tokens with
    pub jwt_secret: String,

    /// Expected `aud` claim
    pub audience: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageryConfig {
    pub token_url: String,
    pub catalog_url: String,
    pub client_id: String,
    pub collection: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Default start of the search window (RFC 3339)
    pub default_window_start: String,
    pub timeout_secs: u64,
}

impl ImageryConfig {
    /// Credentials, when both halves are configured and non-empty
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) if !u.trim().is_empty() && !p.trim().is_empty() => {
                Some((u.clone(), p.clone()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Artificial latency of the synthetic fallback
    pub synthetic_delay_ms: u64,

    /// Default page size for analysis history
    pub history_limit: i64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("NDVI_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3001)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("auth.audience", "authenticated")?
            .set_default("weather.base_url", "https://api.open-meteo.com/v1")?
            .set_default("weather.timeout_secs", 10)?
            .set_default(
                "imagery.token_url",
                "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token",
            )?
            .set_default(
                "imagery.catalog_url",
                "https://catalogue.dataspace.copernicus.eu/odata/v1",
            )?
            .set_default("imagery.client_id", "cdse-public")?
            .set_default("imagery.collection", "SENTINEL-2")?
            .set_default("imagery.default_window_start", "2024-01-01T00:00:00Z")?
            .set_default("imagery.timeout_secs", 20)?
            .set_default("llm.openai_base_url", "https://api.openai.com/v1")?
            .set_default("llm.openai_model", "gpt-4o-mini")?
            .set_default(
                "llm.gemini_base_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("llm.gemini_model", "gemini-1.5-flash")?
            .set_default("llm.timeout_secs", 30)?
            .set_default("analysis.synthetic_delay_ms", 1000)?
            .set_default("analysis.history_limit", 50)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (NDVI_ prefix)
            .add_source(
                Environment::with_prefix("NDVI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
