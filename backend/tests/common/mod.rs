//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ndvi_monitor_backend::config::{
    AnalysisConfig, AuthConfig, Config, DatabaseConfig, ImageryConfig, LlmConfig, ServerConfig,
    WeatherConfig,
};
use ndvi_monitor_backend::error::{AppError, AppResult};
use ndvi_monitor_backend::external::{InsightProvider, WeatherClient};
use ndvi_monitor_backend::middleware::auth::Claims;
use ndvi_monitor_backend::services::{
    AnalysisService, AnalysisSettings, FieldStore, InsightGenerator,
};
use shared::{
    ActivityLogEntry, Analysis, Field, FieldChanges, LastAnalysis, LatLng, NewActivity, NewField,
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";

/// Port nothing listens on; requests fail fast with "connection refused"
pub const UNREACHABLE: &str = "http://127.0.0.1:9";

/// In-memory store keeping the same per-user scoping as the database
#[derive(Default)]
pub struct MemoryFieldStore {
    fields: Mutex<Vec<Field>>,
    analyses: Mutex<Vec<Analysis>>,
    activity: Mutex<Vec<ActivityLogEntry>>,
}

impl MemoryFieldStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn analyses(&self) -> Vec<Analysis> {
        self.analyses.lock().unwrap().clone()
    }

    pub fn activity(&self) -> Vec<ActivityLogEntry> {
        self.activity.lock().unwrap().clone()
    }

    pub fn field(&self, field_id: Uuid) -> Option<Field> {
        self.fields
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == field_id)
            .cloned()
    }

    /// Insert a field directly, bypassing the activity log
    pub fn seed_field(&self, user_id: Uuid, name: &str, crop_type: &str) -> Field {
        let now = Utc::now();
        let field = Field {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            crop_type: crop_type.to_string(),
            center: LatLng::new(55.75, 37.62),
            boundary: None,
            last_analysis: None,
            created_at: now,
            updated_at: now,
        };
        self.fields.lock().unwrap().push(field.clone());
        field
    }
}

#[async_trait]
impl FieldStore for MemoryFieldStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn list_fields(&self, user_id: Uuid) -> AppResult<Vec<Field>> {
        let mut fields: Vec<Field> = self
            .fields
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        fields.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(fields)
    }

    async fn get_field(&self, user_id: Uuid, field_id: Uuid) -> AppResult<Option<Field>> {
        Ok(self
            .fields
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == field_id && f.user_id == user_id)
            .cloned())
    }

    async fn insert_field(&self, user_id: Uuid, field: NewField) -> AppResult<Field> {
        let now = Utc::now();
        let field = Field {
            id: Uuid::new_v4(),
            user_id,
            name: field.name,
            crop_type: field.crop_type,
            center: field.center,
            boundary: field.boundary,
            last_analysis: None,
            created_at: now,
            updated_at: now,
        };
        self.fields.lock().unwrap().push(field.clone());
        Ok(field)
    }

    async fn update_field(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        changes: FieldChanges,
    ) -> AppResult<Option<Field>> {
        let mut fields = self.fields.lock().unwrap();
        let Some(field) = fields
            .iter_mut()
            .find(|f| f.id == field_id && f.user_id == user_id)
        else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            field.name = name;
        }
        if let Some(crop_type) = changes.crop_type {
            field.crop_type = crop_type;
        }
        if let Some(center) = changes.center {
            field.center = center;
        }
        if let Some(boundary) = changes.boundary {
            field.boundary = boundary;
        }
        field.updated_at = Utc::now();
        Ok(Some(field.clone()))
    }

    async fn delete_field(&self, user_id: Uuid, field_id: Uuid) -> AppResult<bool> {
        let mut fields = self.fields.lock().unwrap();
        let before = fields.len();
        fields.retain(|f| !(f.id == field_id && f.user_id == user_id));
        let removed = fields.len() < before;
        if removed {
            self.analyses
                .lock()
                .unwrap()
                .retain(|a| a.field_id != field_id);
        }
        Ok(removed)
    }

    async fn insert_analysis(&self, analysis: &Analysis) -> AppResult<()> {
        self.analyses.lock().unwrap().push(analysis.clone());
        Ok(())
    }

    async fn list_analyses(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<Analysis>> {
        let mut analyses: Vec<Analysis> = self
            .analyses
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.field_id == field_id && a.user_id == user_id)
            .cloned()
            .collect();
        analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        analyses.truncate(limit.max(0) as usize);
        Ok(analyses)
    }

    async fn set_last_analysis(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        snapshot: &LastAnalysis,
    ) -> AppResult<()> {
        let mut fields = self.fields.lock().unwrap();
        if let Some(field) = fields
            .iter_mut()
            .find(|f| f.id == field_id && f.user_id == user_id)
        {
            let newer_stored = field
                .last_analysis
                .as_ref()
                .is_some_and(|s| s.created_at > snapshot.created_at);
            if !newer_stored {
                field.last_analysis = Some(snapshot.clone());
            }
        }
        Ok(())
    }

    async fn append_activity(
        &self,
        user_id: Uuid,
        entry: NewActivity,
    ) -> AppResult<ActivityLogEntry> {
        let entry = ActivityLogEntry {
            id: Uuid::new_v4(),
            user_id,
            kind: entry.kind,
            description: entry.description,
            created_at: Utc::now(),
        };
        self.activity.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn list_activity(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<ActivityLogEntry>> {
        let mut entries: Vec<ActivityLogEntry> = self
            .activity
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }
}

/// Write that [`FailingStore`] refuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertAnalysis,
    SetLastAnalysis,
}

/// Wraps the in-memory store and fails one kind of write with a database error
pub struct FailingStore {
    pub inner: Arc<MemoryFieldStore>,
    fail_on: FailPoint,
}

impl FailingStore {
    pub fn new(inner: Arc<MemoryFieldStore>, fail_on: FailPoint) -> Arc<Self> {
        Arc::new(Self { inner, fail_on })
    }

    fn check(&self, point: FailPoint) -> AppResult<()> {
        if self.fail_on == point {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl FieldStore for FailingStore {
    async fn ping(&self) -> AppResult<()> {
        self.inner.ping().await
    }

    async fn list_fields(&self, user_id: Uuid) -> AppResult<Vec<Field>> {
        self.inner.list_fields(user_id).await
    }

    async fn get_field(&self, user_id: Uuid, field_id: Uuid) -> AppResult<Option<Field>> {
        self.inner.get_field(user_id, field_id).await
    }

    async fn insert_field(&self, user_id: Uuid, field: NewField) -> AppResult<Field> {
        self.inner.insert_field(user_id, field).await
    }

    async fn update_field(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        changes: FieldChanges,
    ) -> AppResult<Option<Field>> {
        self.inner.update_field(user_id, field_id, changes).await
    }

    async fn delete_field(&self, user_id: Uuid, field_id: Uuid) -> AppResult<bool> {
        self.inner.delete_field(user_id, field_id).await
    }

    async fn insert_analysis(&self, analysis: &Analysis) -> AppResult<()> {
        self.check(FailPoint::InsertAnalysis)?;
        self.inner.insert_analysis(analysis).await
    }

    async fn list_analyses(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<Analysis>> {
        self.inner.list_analyses(user_id, field_id, limit).await
    }

    async fn set_last_analysis(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        snapshot: &LastAnalysis,
    ) -> AppResult<()> {
        self.check(FailPoint::SetLastAnalysis)?;
        self.inner.set_last_analysis(user_id, field_id, snapshot).await
    }

    async fn append_activity(
        &self,
        user_id: Uuid,
        entry: NewActivity,
    ) -> AppResult<ActivityLogEntry> {
        self.inner.append_activity(user_id, entry).await
    }

    async fn list_activity(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<ActivityLogEntry>> {
        self.inner.list_activity(user_id, limit).await
    }
}

/// Full configuration with every provider pointed at `weather_url` or left unconfigured
pub fn test_config(weather_url: &str) -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            audience: "authenticated".to_string(),
        },
        weather: WeatherConfig {
            base_url: weather_url.to_string(),
            timeout_secs: 2,
        },
        imagery: ImageryConfig {
            token_url: format!("{}/token", UNREACHABLE),
            catalog_url: UNREACHABLE.to_string(),
            client_id: "cdse-public".to_string(),
            collection: "SENTINEL-2".to_string(),
            username: None,
            password: None,
            default_window_start: "2024-01-01T00:00:00Z".to_string(),
            timeout_secs: 2,
        },
        llm: LlmConfig {
            openai_api_key: None,
            openai_base_url: UNREACHABLE.to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            gemini_api_key: None,
            gemini_base_url: UNREACHABLE.to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            timeout_secs: 2,
        },
        analysis: AnalysisConfig {
            synthetic_delay_ms: 0,
            history_limit: 50,
        },
    }
}

pub fn weather_client(base_url: &str) -> WeatherClient {
    WeatherClient::new(base_url.to_string(), Duration::from_secs(2)).unwrap()
}

/// Analysis service without imagery and with no synthetic delay
pub fn analysis_service(
    store: Arc<dyn FieldStore>,
    weather_url: &str,
    provider: InsightProvider,
) -> AnalysisService {
    AnalysisService::new(
        store,
        weather_client(weather_url),
        None,
        InsightGenerator::new(provider),
        AnalysisSettings {
            synthetic_delay: Duration::ZERO,
            history_limit: 50,
        },
    )
}

/// Access token as the auth provider would issue it
pub fn mint_token(user_id: Uuid, exp_offset_secs: i64) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        aud: "authenticated".to_string(),
        exp: Utc::now().timestamp() + exp_offset_secs,
        email: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Open-Meteo style body with three past days and today
pub fn open_meteo_body() -> serde_json::Value {
    let today = Utc::now().date_naive();
    let days: Vec<String> = (0..4)
        .rev()
        .map(|back| (today - chrono::Duration::days(back)).to_string())
        .collect();
    serde_json::json!({
        "latitude": 55.75,
        "longitude": 37.62,
        "current": {
            "time": format!("{}T12:00", today),
            "temperature_2m": 28.0,
            "relative_humidity_2m": 90.0,
            "wind_speed_10m": 18.0,
            "weather_code": 61
        },
        "daily": {
            "time": days,
            "precipitation_sum": [0.5, null, 1.5, 12.0]
        }
    })
}
