//! Field analysis pipeline
//!
//! One request runs the stages in order:
//! validate → imagery (optional) → weather → deviation & stress cause →
//! AI insight → persist (analysis, field snapshot, activity) → respond.
//!
//! Only validation, ownership and persistence failures abort the request.
//! Every provider stage falls back to substitute data instead. The three
//! writes are sequential and not wrapped in a transaction; the field
//! snapshot is written only after the analysis row exists.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    classify_stress, deviation, placeholder_imagery_base, seasonal_fallback, seasonal_norm,
    synthetic_base, validate_date_range, validate_latitude, validate_longitude,
    validate_percent_buckets, AiInsight, Analysis, AnalysisBase, DateRange, Field, LastAnalysis,
    NewActivity, SceneReference, StressCause, WeatherSnapshot,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::external::{ImageryClient, WeatherClient};
use crate::services::insight::{InsightContext, InsightGenerator};
use crate::services::store::FieldStore;

/// Analysis request body
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AnalyzeRequest {
    pub field_id: Option<Uuid>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: Option<f64>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Analysis response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis_id: Uuid,
    pub field_id: Uuid,
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

impl From<Analysis> for AnalyzeResponse {
    fn from(a: Analysis) -> Self {
        AnalyzeResponse {
            success: true,
            analysis_id: a.id,
            field_id: a.field_id,
            ndvi_average: a.ndvi_average,
            healthy_percent: a.healthy_percent,
            moderate_percent: a.moderate_percent,
            stressed_percent: a.stressed_percent,
            alert: a.alert,
            map_url: a.map_url,
            product_id: a.product_id,
            acquired_at: a.acquired_at,
            weather: a.weather,
            ai_insight: a.ai_insight,
            stress_cause: a.stress_cause,
            deviation: a.deviation,
            seasonal_norm: a.seasonal_norm,
            created_at: a.created_at,
        }
    }
}

/// Flattened history row for CSV export
#[derive(Debug, Serialize)]
pub struct AnalysisCsvRow {
    pub created_at: DateTime<Utc>,
    pub ndvi_average: f64,
    pub healthy_percent: f64,
    pub moderate_percent: f64,
    pub stressed_percent: f64,
    pub alert: bool,
    pub seasonal_norm: f64,
    pub deviation: f64,
    pub stress_cause: String,
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
    pub rain_14d_mm: f64,
    pub status: String,
    pub map_url: Option<String>,
}

impl From<&Analysis> for AnalysisCsvRow {
    fn from(a: &Analysis) -> Self {
        AnalysisCsvRow {
            created_at: a.created_at,
            ndvi_average: a.ndvi_average,
            healthy_percent: a.healthy_percent,
            moderate_percent: a.moderate_percent,
            stressed_percent: a.stressed_percent,
            alert: a.alert,
            seasonal_norm: a.seasonal_norm,
            deviation: a.deviation,
            stress_cause: a.stress_cause.label().to_string(),
            temperature_celsius: a.weather.temperature_celsius,
            humidity_percent: a.weather.humidity_percent,
            rain_14d_mm: a.weather.rain_14d_mm,
            status: a.ai_insight.status.clone(),
            map_url: a.map_url.clone(),
        }
    }
}

/// Pipeline tuning
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub synthetic_delay: Duration,
    pub history_limit: i64,
}

/// Validated inputs of one analysis run
struct ValidatedRequest {
    field_id: Uuid,
    lat: f64,
    lon: f64,
    window: DateRange,
}

/// Orchestrates one analysis; clients are built once and shared
#[derive(Clone)]
pub struct AnalysisService {
    store: Arc<dyn FieldStore>,
    weather: WeatherClient,
    imagery: Option<ImageryClient>,
    insights: InsightGenerator,
    settings: AnalysisSettings,
}

impl AnalysisService {
    pub fn new(
        store: Arc<dyn FieldStore>,
        weather: WeatherClient,
        imagery: Option<ImageryClient>,
        insights: InsightGenerator,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            store,
            weather,
            imagery,
            insights,
            settings,
        }
    }

    pub fn imagery_configured(&self) -> bool {
        self.imagery.is_some()
    }

    pub fn insight_provider(&self) -> &'static str {
        self.insights.provider_name()
    }

    /// Run the full pipeline for one field
    pub async fn analyze(&self, user_id: Uuid, request: AnalyzeRequest) -> AppResult<AnalyzeResponse> {
        let req = validate_request(request)?;
        let field = self
            .store
            .get_field(user_id, req.field_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Field".to_string()))?;

        tracing::info!(field_id = %field.id, %user_id, "Starting analysis");

        let (base, scene) = match self.fetch_scene(&req).await {
            Some(scene) => (placeholder_imagery_base(), Some(scene)),
            None => (self.synthetic().await, None),
        };
        if let Err(reason) = validate_percent_buckets(&base) {
            tracing::debug!(reason, "Health buckets do not sum to 100");
        }

        let now = Utc::now();
        let weather = self.fetch_weather(req.lat, req.lon, now.month0()).await;

        let norm = seasonal_norm(&field.crop_type, now.month0());
        let dev = deviation(base.ndvi_average, norm);
        let stress_cause = classify_stress(dev, &weather, base.ndvi_average);
        tracing::debug!(ndvi = base.ndvi_average, norm, deviation = dev, %stress_cause, "Deviation computed");

        let ai_insight = self
            .insights
            .generate(&InsightContext {
                crop_type: &field.crop_type,
                date: now.date_naive(),
                ndvi: base.ndvi_average,
                seasonal_norm: norm,
                deviation: dev,
                weather: &weather,
            })
            .await;

        let analysis = assemble(user_id, &field, base, scene, weather, ai_insight, stress_cause, dev, norm);
        self.persist(user_id, &field, &analysis).await?;

        tracing::info!(analysis_id = %analysis.id, field_id = %field.id, "Analysis completed");
        Ok(AnalyzeResponse::from(analysis))
    }

    /// Analysis history of a field, newest first
    pub async fn history(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        limit: Option<i64>,
    ) -> AppResult<Vec<Analysis>> {
        if self.store.get_field(user_id, field_id).await?.is_none() {
            return Err(AppError::NotFound("Field".to_string()));
        }
        let limit = limit
            .unwrap_or(self.settings.history_limit)
            .clamp(1, self.settings.history_limit.max(1));
        self.store.list_analyses(user_id, field_id, limit).await
    }

    /// Export analysis history as CSV
    pub fn export_to_csv(analyses: &[Analysis]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for analysis in analyses {
            wtr.serialize(AnalysisCsvRow::from(analysis))
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }

    /// Latest scene, or None when imagery is unconfigured or unavailable
    async fn fetch_scene(&self, req: &ValidatedRequest) -> Option<SceneReference> {
        let Some(imagery) = &self.imagery else {
            tracing::debug!("Imagery provider not configured, skipping scene search");
            return None;
        };

        match imagery
            .find_latest_scene(req.lat, req.lon, req.window.from, req.window.to)
            .await
        {
            Ok(scene) => {
                tracing::debug!(product_id = %scene.product_id, "Scene found");
                Some(scene)
            }
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "Imagery unavailable, using synthetic base");
                None
            }
        }
    }

    async fn synthetic(&self) -> AnalysisBase {
        let base = synthetic_base(&mut rand::rng());
        if !self.settings.synthetic_delay.is_zero() {
            tokio::time::sleep(self.settings.synthetic_delay).await;
        }
        base
    }

    async fn fetch_weather(&self, lat: f64, lon: f64, month0: u32) -> WeatherSnapshot {
        match self.weather.get_current_weather(lat, lon).await {
            Ok(weather) => weather,
            Err(e) => {
                tracing::warn!(error = %e, "Weather unavailable, using seasonal fallback");
                seasonal_fallback(month0)
            }
        }
    }

    async fn persist(&self, user_id: Uuid, field: &Field, analysis: &Analysis) -> AppResult<()> {
        self.store.insert_analysis(analysis).await?;
        self.store
            .set_last_analysis(user_id, field.id, &LastAnalysis::from(analysis))
            .await?;
        self.store
            .append_activity(
                user_id,
                NewActivity::analysis_run(&field.name, analysis.ndvi_average),
            )
            .await?;
        Ok(())
    }
}

fn validate_request(request: AnalyzeRequest) -> AppResult<ValidatedRequest> {
    request.validate()?;

    let field_id = request
        .field_id
        .ok_or_else(|| AppError::invalid("field_id", "field_id is required", "Не указано поле"))?;
    let lat = request
        .lat
        .ok_or_else(|| AppError::invalid("lat", "lat is required", "Не указана широта"))?;
    let lon = request
        .lon
        .ok_or_else(|| AppError::invalid("lon", "lon is required", "Не указана долгота"))?;

    validate_latitude(lat).map_err(|msg| AppError::invalid("lat", msg, "Некорректная широта"))?;
    validate_longitude(lon).map_err(|msg| AppError::invalid("lon", msg, "Некорректная долгота"))?;

    let window = DateRange {
        from: request.date_from,
        to: request.date_to,
    };
    validate_date_range(&window)
        .map_err(|msg| AppError::invalid("date_from", msg, "Некорректный период"))?;

    Ok(ValidatedRequest {
        field_id,
        lat,
        lon,
        window,
    })
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    user_id: Uuid,
    field: &Field,
    base: AnalysisBase,
    scene: Option<SceneReference>,
    weather: WeatherSnapshot,
    ai_insight: AiInsight,
    stress_cause: StressCause,
    deviation: f64,
    seasonal_norm: f64,
) -> Analysis {
    let (map_url, product_id, acquired_at) = match scene {
        Some(s) => (Some(s.map_url), Some(s.product_id), Some(s.acquired_at)),
        None => (None, None, None),
    };

    Analysis {
        id: Uuid::new_v4(),
        field_id: field.id,
        user_id,
        ndvi_average: base.ndvi_average,
        healthy_percent: base.healthy_percent,
        moderate_percent: base.moderate_percent,
        stressed_percent: base.stressed_percent,
        alert: base.alert,
        map_url,
        product_id,
        acquired_at,
        weather,
        ai_insight,
        stress_cause,
        deviation,
        seasonal_norm,
        created_at: Utc::now(),
    }
}
