use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginationParams,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    middleware_helpers::ActorContext,
    services::products::{NewProduct, ProductUpdate},
    ApiResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub sku: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    /// Counting unit, defaults to "unit"
    #[validate(length(min = 1, max = 50))]
    pub unit_of_measure: Option<String>,
    pub min_stock_level: Option<Decimal>,
    pub max_stock_level: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    #[validate(length(max = 255))]
    pub supplier: Option<String>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
}

/// Metadata-only update. `current_stock` is absent on purpose: the stock
/// level only moves through ledger entries. A field set to JSON `null`
/// clears the stored value; an absent field is left untouched.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub unit_of_measure: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub min_stock_level: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub max_stock_level: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub unit_cost: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub supplier: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Distinguishes an absent field from an explicit JSON `null` so updates
/// can clear a stored value.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListProductsParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// When true, hide retired products
    #[serde(default)]
    pub active_only: bool,
}

/// Register a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = NewProduct {
        sku: payload.sku,
        name: payload.name,
        description: payload.description,
        category: payload.category,
        unit_of_measure: payload.unit_of_measure,
        min_stock_level: payload.min_stock_level,
        max_stock_level: payload.max_stock_level,
        unit_cost: payload.unit_cost,
        supplier: payload.supplier,
        location: payload.location,
        created_by: actor.name,
        created_by_id: actor.id,
        created_by_email: actor.email,
    };

    let product = state
        .services
        .products
        .create_product(input)
        .await
        .map_err(map_service_error)?;

    info!(product_id = %product.id, sku = %product.sku, "Product created");

    Ok(created_response(ApiResponse::success(product)))
}

/// Page through the product registry
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ListProductsParams),
    responses(
        (status = 200, description = "Products listed", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListProductsParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let pagination = PaginationParams {
        page: params.page.unwrap_or(1),
        per_page: params.per_page.unwrap_or(20),
    };

    let (products, total) = state
        .services
        .products
        .list_products(pagination.per_page, pagination.offset(), params.active_only)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ApiResponse::success(serde_json::json!({
        "products": products,
        "total": total,
        "page": pagination.page,
        "per_page": pagination.per_page,
    }))))
}

/// Active products at or below their minimum stock level
#[utoipa::path(
    get,
    path = "/api/v1/products/low-stock",
    responses(
        (status = 200, description = "Low stock products", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "products"
)]
pub async fn get_low_stock_products(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let products = state
        .services
        .products
        .get_low_stock_products()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ApiResponse::success(products)))
}

/// Fetch a single product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get_product(product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ApiResponse::success(product)))
}

/// Update product metadata
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    request_body = UpdateProductRequest,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let update = ProductUpdate {
        name: payload.name,
        description: payload.description,
        category: payload.category,
        unit_of_measure: payload.unit_of_measure,
        min_stock_level: payload.min_stock_level,
        max_stock_level: payload.max_stock_level,
        unit_cost: payload.unit_cost,
        supplier: payload.supplier,
        location: payload.location,
        is_active: payload.is_active,
    };

    let product = state
        .services
        .products
        .update_product(product_id, update)
        .await
        .map_err(map_service_error)?;

    info!(product_id = %product.id, "Product updated");

    Ok(success_response(ApiResponse::success(product)))
}

/// Creates the router for product endpoints
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/low-stock", get(get_low_stock_products))
        .route("/{id}", get(get_product).put(update_product))
        .route(
            "/{id}/transactions",
            get(super::stock_transactions::get_product_transaction_history),
        )
        .route(
            "/{id}/stock/verify",
            get(super::stock_transactions::verify_product_stock),
        )
}
