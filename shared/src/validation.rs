//! Validation utilities for the NDVI monitoring platform

use crate::models::AnalysisBase;
use crate::types::{DateRange, LatLng};

pub const MAX_FIELD_NAME_LEN: usize = 120;

// ============================================================================
// Geographic Validations
// ============================================================================

pub fn validate_latitude(lat: f64) -> Result<(), &'static str> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err("Latitude must be between -90 and 90");
    }
    Ok(())
}

pub fn validate_longitude(lng: f64) -> Result<(), &'static str> {
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

pub fn validate_coordinates(point: &LatLng) -> Result<(), &'static str> {
    validate_latitude(point.lat)?;
    validate_longitude(point.lng)
}

/// Validate a field boundary: at least three distinct valid vertices
pub fn validate_boundary(vertices: &[LatLng]) -> Result<(), &'static str> {
    for v in vertices {
        validate_coordinates(v)?;
    }
    let mut distinct: Vec<&LatLng> = Vec::with_capacity(vertices.len());
    for v in vertices {
        if !distinct.contains(&v) {
            distinct.push(v);
        }
    }
    if distinct.len() < 3 {
        return Err("Boundary must have at least 3 distinct vertices");
    }
    Ok(())
}

// ============================================================================
// Field Validations
// ============================================================================

pub fn validate_field_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Field name cannot be empty");
    }
    if trimmed.chars().count() > MAX_FIELD_NAME_LEN {
        return Err("Field name must be at most 120 characters");
    }
    Ok(())
}

pub fn validate_crop_type(crop: &str) -> Result<(), &'static str> {
    if crop.trim().is_empty() {
        return Err("Crop type cannot be empty");
    }
    Ok(())
}

// ============================================================================
// Analysis Validations
// ============================================================================

pub fn validate_date_range(range: &DateRange) -> Result<(), &'static str> {
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err("date_from must not be after date_to");
        }
    }
    Ok(())
}

/// Health buckets must each be a percentage and add up to roughly 100
pub fn validate_percent_buckets(base: &AnalysisBase) -> Result<(), &'static str> {
    let buckets = [
        base.healthy_percent,
        base.moderate_percent,
        base.stressed_percent,
    ];
    if buckets.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 100.0) {
        return Err("Percentages must be between 0 and 100");
    }
    let total: f64 = buckets.iter().sum();
    if (total - 100.0).abs() > 1.0 {
        return Err("Percentages must sum to 100");
    }
    Ok(())
}
