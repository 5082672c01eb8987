//! Field management service

use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use shared::{
    validate_boundary, validate_coordinates, validate_crop_type, validate_field_name, Field,
    FieldChanges, LatLng, NewActivity, NewField,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::store::FieldStore;

/// Field service for managing a user's fields
#[derive(Clone)]
pub struct FieldService {
    store: Arc<dyn FieldStore>,
}

/// Input for creating a field
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFieldInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 60))]
    pub crop_type: String,
    pub center: LatLng,
    pub boundary: Option<Vec<LatLng>>,
}

/// Input for updating a field
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFieldInput {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 60))]
    pub crop_type: Option<String>,
    pub center: Option<LatLng>,
    /// Absent keeps the boundary, `null` clears it
    #[serde(default, deserialize_with = "present_or_null")]
    pub boundary: Option<Option<Vec<LatLng>>>,
}

/// Distinguishes an explicit `null` from a missing key
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn check_center(center: &LatLng) -> AppResult<()> {
    validate_coordinates(center).map_err(|msg| {
        AppError::invalid("center", msg, "Некорректные координаты центра поля")
    })
}

fn check_boundary(boundary: &[LatLng]) -> AppResult<()> {
    validate_boundary(boundary)
        .map_err(|msg| AppError::invalid("boundary", msg, "Некорректная граница поля"))
}

fn check_name(name: &str) -> AppResult<()> {
    validate_field_name(name)
        .map_err(|msg| AppError::invalid("name", msg, "Некорректное название поля"))
}

fn check_crop(crop: &str) -> AppResult<()> {
    validate_crop_type(crop)
        .map_err(|msg| AppError::invalid("crop_type", msg, "Не указана культура"))
}

impl FieldService {
    /// Create a new FieldService instance
    pub fn new(store: Arc<dyn FieldStore>) -> Self {
        Self { store }
    }

    /// Get all fields for a user
    pub async fn get_fields(&self, user_id: Uuid) -> AppResult<Vec<Field>> {
        self.store.list_fields(user_id).await
    }

    /// Get a single field owned by the user
    pub async fn get_field(&self, user_id: Uuid, field_id: Uuid) -> AppResult<Field> {
        self.store
            .get_field(user_id, field_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Field".to_string()))
    }

    /// Create a new field and log it
    pub async fn create_field(&self, user_id: Uuid, input: CreateFieldInput) -> AppResult<Field> {
        input.validate()?;
        check_name(&input.name)?;
        check_crop(&input.crop_type)?;
        check_center(&input.center)?;
        if let Some(boundary) = &input.boundary {
            check_boundary(boundary)?;
        }

        let field = self
            .store
            .insert_field(
                user_id,
                NewField {
                    name: input.name.trim().to_string(),
                    crop_type: input.crop_type.trim().to_string(),
                    center: input.center,
                    boundary: input.boundary,
                },
            )
            .await?;

        self.store
            .append_activity(user_id, NewActivity::field_created(&field.name))
            .await?;

        tracing::info!(field_id = %field.id, %user_id, "Field created");
        Ok(field)
    }

    /// Update a field
    pub async fn update_field(
        &self,
        user_id: Uuid,
        field_id: Uuid,
        input: UpdateFieldInput,
    ) -> AppResult<Field> {
        input.validate()?;
        if let Some(name) = &input.name {
            check_name(name)?;
        }
        if let Some(crop) = &input.crop_type {
            check_crop(crop)?;
        }
        if let Some(center) = &input.center {
            check_center(center)?;
        }
        if let Some(Some(boundary)) = &input.boundary {
            check_boundary(boundary)?;
        }

        let changes = FieldChanges {
            name: input.name.map(|n| n.trim().to_string()),
            crop_type: input.crop_type.map(|c| c.trim().to_string()),
            center: input.center,
            boundary: input.boundary,
        };
        if changes.is_empty() {
            return Err(AppError::ValidationError("Nothing to update".to_string()));
        }

        self.store
            .update_field(user_id, field_id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Field".to_string()))
    }

    /// Delete a field and log it
    pub async fn delete_field(&self, user_id: Uuid, field_id: Uuid) -> AppResult<()> {
        let field = self.get_field(user_id, field_id).await?;

        if !self.store.delete_field(user_id, field_id).await? {
            return Err(AppError::NotFound("Field".to_string()));
        }

        self.store
            .append_activity(user_id, NewActivity::field_deleted(&field.name))
            .await?;

        tracing::info!(%field_id, %user_id, "Field deleted");
        Ok(())
    }
}
