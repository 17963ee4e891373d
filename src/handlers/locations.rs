use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    entities::inventory_location::LocationType, errors::ApiError, handlers::AppState,
    services::locations::NewLocation, ApiResponse,
};
use axum::{
    extract::{Json, Query, State},
    routing::post,
    Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// warehouse, site, vehicle or other; defaults to warehouse
    pub location_type: Option<LocationType>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListLocationsParams {
    /// When true, hide deactivated locations
    #[serde(default)]
    pub active_only: bool,
}

/// Register a stock-holding location
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let location = state
        .services
        .locations
        .create_location(NewLocation {
            name: payload.name,
            description: payload.description,
            location_type: payload.location_type,
        })
        .await
        .map_err(map_service_error)?;

    info!(location_id = %location.id, name = %location.name, "Location created");

    Ok(created_response(ApiResponse::success(location)))
}

/// List registered locations, alphabetically
#[utoipa::path(
    get,
    path = "/api/v1/locations",
    params(ListLocationsParams),
    responses(
        (status = 200, description = "Locations listed", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(params): Query<ListLocationsParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let locations = state
        .services
        .locations
        .list_locations(params.active_only)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ApiResponse::success(locations)))
}

/// Creates the router for location endpoints
pub fn location_routes() -> Router<AppState> {
    Router::new().route("/", post(create_location).get(list_locations))
}
