use crate::errors::{ApiError, ServiceError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Pagination parameters for list operations
#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    /// Calculate zero-based offset for pagination
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.per_page
    }
}

/// Inclusive calendar-day window for ledger queries. Start expands to the
/// beginning of its day, end to the last second of its day.
#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct DateRangeParams {
    /// Start date, `YYYY-MM-DD`
    pub start_date: String,
    /// End date, `YYYY-MM-DD`
    pub end_date: String,
}

impl DateRangeParams {
    pub fn to_datetime_range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
        let start_date = NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d")
            .map_err(|e| ApiError::ValidationError(format!("Invalid start date format: {}", e)))?;

        let end_date = NaiveDate::parse_from_str(&self.end_date, "%Y-%m-%d")
            .map_err(|e| ApiError::ValidationError(format!("Invalid end date format: {}", e)))?;

        let start_datetime = start_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ApiError::ValidationError("Invalid start date time".to_string()))?;

        let end_datetime = end_date
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| ApiError::ValidationError("Invalid end date time".to_string()))?;

        if end_datetime < start_datetime {
            return Err(ApiError::ValidationError(
                "end_date must not precede start_date".to_string(),
            ));
        }

        Ok((
            DateTime::<Utc>::from_naive_utc_and_offset(start_datetime, Utc),
            DateTime::<Utc>::from_naive_utc_and_offset(end_datetime, Utc),
        ))
    }
}
