//! Persistence for fields, analyses and the activity log
//!
//! [`FieldStore`] is the seam between the services and the database. Every
//! method is scoped to the calling user; rows belonging to other users are
//! invisible. [`PgFieldStore`] implements it over PostgreSQL + PostGIS.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    ActivityKind, ActivityLogEntry, AiInsight, Analysis, Field, FieldChanges, GeoPoint,
    GeoPolygon, LastAnalysis, LatLng, NewActivity, NewField, StressCause, WeatherSnapshot,
};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[async_trait]
pub trait FieldStore: Send + Sync {
    /// Connectivity check used by the health endpoint
    async fn ping(&self) -> AppResult<()>;

    async fn list_fields(&self, user_id: Uuid) -> AppResult<Vec<Field>>;

    async fn get_field(&self, user_id: Uuid, field_id: Uuid) -> AppResult<Option<Field>>;

    async fn insert_field(&self, user_id: Uuid, field: NewField) -> AppResult<Field>;

    async fn update_field(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        changes: FieldChanges,
    ) -> AppResult<Option<Field>>;

    /// Returns false when no such field exists for the user
    async fn delete_field(&self, user_id: Uuid, field_id: Uuid) -> AppResult<bool>;

    async fn insert_analysis(&self, analysis: &Analysis) -> AppResult<()>;

    /// Newest first
    async fn list_analyses(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<Analysis>>;

    /// Replace the field's snapshot unless a newer one is already stored
    async fn set_last_analysis(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        snapshot: &LastAnalysis,
    ) -> AppResult<()>;

    async fn append_activity(
        &self,
        user_id: Uuid,
        entry: NewActivity,
    ) -> AppResult<ActivityLogEntry>;

    /// Newest first
    async fn list_activity(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<ActivityLogEntry>>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgFieldStore {
    db: PgPool,
}

const FIELD_COLUMNS: &str = r#"
    id, user_id, name, crop_type,
    ST_AsGeoJSON(center)::jsonb AS center,
    ST_AsGeoJSON(boundary)::jsonb AS boundary,
    last_analysis, created_at, updated_at
"#;

const ANALYSIS_COLUMNS: &str = r#"
    id, field_id, user_id, ndvi_average, healthy_percent, moderate_percent,
    stressed_percent, alert, map_url, product_id, acquired_at, weather,
    ai_insight, stress_cause, deviation, seasonal_norm, created_at
"#;

#[derive(Debug, FromRow)]
struct FieldRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    crop_type: String,
    center: Json<GeoPoint>,
    boundary: Option<Json<GeoPolygon>>,
    last_analysis: Option<Json<LastAnalysis>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FieldRow> for Field {
    type Error = AppError;

    fn try_from(row: FieldRow) -> Result<Self, Self::Error> {
        let center = LatLng::try_from(&row.center.0)
            .map_err(|e| AppError::Internal(format!("Invalid stored center: {}", e)))?;
        let boundary = row
            .boundary
            .map(|b| b.0.outer_ring())
            .transpose()
            .map_err(|e| AppError::Internal(format!("Invalid stored boundary: {}", e)))?;

        Ok(Field {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            crop_type: row.crop_type,
            center,
            boundary,
            last_analysis: row.last_analysis.map(|s| s.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AnalysisRow {
    id: Uuid,
    field_id: Uuid,
    user_id: Uuid,
    ndvi_average: f64,
    healthy_percent: f64,
    moderate_percent: f64,
    stressed_percent: f64,
    alert: bool,
    map_url: Option<String>,
    product_id: Option<String>,
    acquired_at: Option<DateTime<Utc>>,
    weather: Json<WeatherSnapshot>,
    ai_insight: Json<AiInsight>,
    stress_cause: String,
    deviation: f64,
    seasonal_norm: f64,
    created_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for Analysis {
    type Error = AppError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        let stress_cause = StressCause::from_label(&row.stress_cause).ok_or_else(|| {
            AppError::Internal(format!("Unknown stored stress cause: {}", row.stress_cause))
        })?;

        Ok(Analysis {
            id: row.id,
            field_id: row.field_id,
            user_id: row.user_id,
            ndvi_average: row.ndvi_average,
            healthy_percent: row.healthy_percent,
            moderate_percent: row.moderate_percent,
            stressed_percent: row.stressed_percent,
            alert: row.alert,
            map_url: row.map_url,
            product_id: row.product_id,
            acquired_at: row.acquired_at,
            weather: row.weather.0,
            ai_insight: row.ai_insight.0,
            stress_cause,
            deviation: row.deviation,
            seasonal_norm: row.seasonal_norm,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityLogEntry {
    type Error = AppError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        let kind = ActivityKind::parse(&row.kind)
            .ok_or_else(|| AppError::Internal(format!("Unknown activity kind: {}", row.kind)))?;
        Ok(ActivityLogEntry {
            id: row.id,
            user_id: row.user_id,
            kind,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

fn point_json(point: LatLng) -> AppResult<String> {
    serde_json::to_string(&GeoPoint::from(point))
        .map_err(|e| AppError::Internal(format!("GeoJSON encoding error: {}", e)))
}

fn polygon_json(vertices: &[LatLng]) -> AppResult<String> {
    serde_json::to_string(&GeoPolygon::from_ring(vertices))
        .map_err(|e| AppError::Internal(format!("GeoJSON encoding error: {}", e)))
}

impl PgFieldStore {
    /// Create a new PgFieldStore instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FieldStore for PgFieldStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn list_fields(&self, user_id: Uuid) -> AppResult<Vec<Field>> {
        let sql = format!(
            "SELECT {} FROM fields WHERE user_id = $1 ORDER BY created_at DESC",
            FIELD_COLUMNS
        );
        let rows = sqlx::query_as::<_, FieldRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(Field::try_from).collect()
    }

    async fn get_field(&self, user_id: Uuid, field_id: Uuid) -> AppResult<Option<Field>> {
        let sql = format!(
            "SELECT {} FROM fields WHERE id = $1 AND user_id = $2",
            FIELD_COLUMNS
        );
        let row = sqlx::query_as::<_, FieldRow>(&sql)
            .bind(field_id)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(Field::try_from).transpose()
    }

    async fn insert_field(&self, user_id: Uuid, field: NewField) -> AppResult<Field> {
        let center = point_json(field.center)?;
        let boundary = field.boundary.as_deref().map(polygon_json).transpose()?;

        let sql = format!(
            r#"
            INSERT INTO fields (user_id, name, crop_type, center, boundary)
            VALUES (
                $1, $2, $3,
                ST_SetSRID(ST_GeomFromGeoJSON($4), 4326)::geography,
                ST_SetSRID(ST_GeomFromGeoJSON($5), 4326)::geography
            )
            RETURNING {}
            "#,
            FIELD_COLUMNS
        );
        let row = sqlx::query_as::<_, FieldRow>(&sql)
            .bind(user_id)
            .bind(&field.name)
            .bind(&field.crop_type)
            .bind(center)
            .bind(boundary)
            .fetch_one(&self.db)
            .await?;

        Field::try_from(row)
    }

    async fn update_field(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        changes: FieldChanges,
    ) -> AppResult<Option<Field>> {
        let center = changes.center.map(point_json).transpose()?;
        let boundary_set = changes.boundary.is_some();
        let boundary = changes
            .boundary
            .flatten()
            .as_deref()
            .map(polygon_json)
            .transpose()?;

        let sql = format!(
            r#"
            UPDATE fields SET
                name = COALESCE($3, name),
                crop_type = COALESCE($4, crop_type),
                center = COALESCE(ST_SetSRID(ST_GeomFromGeoJSON($5), 4326)::geography, center),
                boundary = CASE WHEN $6
                    THEN ST_SetSRID(ST_GeomFromGeoJSON($7), 4326)::geography
                    ELSE boundary END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            FIELD_COLUMNS
        );
        let row = sqlx::query_as::<_, FieldRow>(&sql)
            .bind(field_id)
            .bind(user_id)
            .bind(&changes.name)
            .bind(&changes.crop_type)
            .bind(center)
            .bind(boundary_set)
            .bind(boundary)
            .fetch_optional(&self.db)
            .await?;

        row.map(Field::try_from).transpose()
    }

    async fn delete_field(&self, user_id: Uuid, field_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM fields WHERE id = $1 AND user_id = $2")
            .bind(field_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_analysis(&self, a: &Analysis) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO analyses (
                id, field_id, user_id, ndvi_average, healthy_percent, moderate_percent,
                stressed_percent, alert, map_url, product_id, acquired_at, weather,
                ai_insight, stress_cause, deviation, seasonal_norm, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(a.id)
        .bind(a.field_id)
        .bind(a.user_id)
        .bind(a.ndvi_average)
        .bind(a.healthy_percent)
        .bind(a.moderate_percent)
        .bind(a.stressed_percent)
        .bind(a.alert)
        .bind(&a.map_url)
        .bind(&a.product_id)
        .bind(a.acquired_at)
        .bind(Json(&a.weather))
        .bind(Json(&a.ai_insight))
        .bind(a.stress_cause.label())
        .bind(a.deviation)
        .bind(a.seasonal_norm)
        .bind(a.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn list_analyses(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<Analysis>> {
        let sql = format!(
            r#"
            SELECT {} FROM analyses
            WHERE field_id = $1 AND user_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
            ANALYSIS_COLUMNS
        );
        let rows = sqlx::query_as::<_, AnalysisRow>(&sql)
            .bind(field_id)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(Analysis::try_from).collect()
    }

    async fn set_last_analysis(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        snapshot: &LastAnalysis,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE fields
            SET last_analysis = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
              AND (last_analysis IS NULL
                   OR (last_analysis->>'created_at')::timestamptz <= $4)
            "#,
        )
        .bind(field_id)
        .bind(user_id)
        .bind(Json(snapshot))
        .bind(snapshot.created_at)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(%field_id, "Field snapshot not replaced; a newer analysis is stored");
        }
        Ok(())
    }

    async fn append_activity(
        &self,
        user_id: Uuid,
        entry: NewActivity,
    ) -> AppResult<ActivityLogEntry> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            INSERT INTO activity_log (user_id, kind, description)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, kind, description, created_at
            "#,
        )
        .bind(user_id)
        .bind(entry.kind.as_str())
        .bind(&entry.description)
        .fetch_one(&self.db)
        .await?;

        ActivityLogEntry::try_from(row)
    }

    async fn list_activity(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<ActivityLogEntry>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, user_id, kind, description, created_at
            FROM activity_log
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ActivityLogEntry::try_from).collect()
    }
}
