use crate::{
    entities::{school_stock, warehouse_stock},
    services::inventory::ReceiveStockInput,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct InventoryListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
}

/// Receive stock into the central warehouse
#[utoipa::path(
    post,
    path = "/api/v1/inventory/warehouse/receive",
    request_body = ReceiveStockInput,
    responses(
        (status = 200, description = "Stock received; ledger row returned"),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn receive_stock(
    State(state): State<AppState>,
    Json(payload): Json<ReceiveStockInput>,
) -> ApiResult<warehouse_stock::Model> {
    let row = state.services.inventory.receive_stock(payload).await?;
    Ok(Json(ApiResponse::success(row)))
}

/// List warehouse ledger rows
#[utoipa::path(
    get,
    path = "/api/v1/inventory/warehouse",
    responses(
        (status = 200, description = "Warehouse ledger returned")
    ),
    tag = "inventory"
)]
pub async fn list_warehouse(
    State(state): State<AppState>,
    Query(query): Query<InventoryListQuery>,
) -> ApiResult<PaginatedResponse<warehouse_stock::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (items, total) = state.services.inventory.list_warehouse(page, limit).await?;

    let total_pages = (total + limit - 1) / limit;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

/// Get the warehouse ledger row for a book
#[utoipa::path(
    get,
    path = "/api/v1/inventory/warehouse/{book_id}",
    params(("book_id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Ledger row returned"),
        (status = 404, description = "No warehouse stock for book", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_warehouse_level(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
) -> ApiResult<warehouse_stock::Model> {
    let row = state
        .services
        .inventory
        .warehouse_level(book_id)
        .await?
        .ok_or_else(|| {
            crate::errors::ServiceError::NotFound(format!(
                "No warehouse stock for book {}",
                book_id
            ))
        })?;
    Ok(Json(ApiResponse::success(row)))
}

/// List a school's ledger rows
#[utoipa::path(
    get,
    path = "/api/v1/inventory/schools/{school_id}",
    params(("school_id" = i32, Path, description = "School id")),
    responses(
        (status = 200, description = "School ledger returned")
    ),
    tag = "inventory"
)]
pub async fn list_school_stock(
    State(state): State<AppState>,
    Path(school_id): Path<i32>,
    Query(query): Query<InventoryListQuery>,
) -> ApiResult<PaginatedResponse<school_stock::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (items, total) = state
        .services
        .inventory
        .list_school_stock(school_id, page, limit)
        .await?;

    let total_pages = (total + limit - 1) / limit;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}
