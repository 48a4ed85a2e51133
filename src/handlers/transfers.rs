use crate::{
    auth::AuthUser,
    entities::stock_request,
    errors::ServiceError,
    services::transfers::{CreateRequestInput, RequestFilter},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct RequestListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
    /// Optional status filter
    pub status: Option<stock_request::RequestStatus>,
    /// Optional school filter
    pub school_id: Option<i32>,
}

/// Create a stock transfer request
#[utoipa::path(
    post,
    path = "/api/v1/stock-requests",
    request_body = CreateRequestInput,
    responses(
        (status = 200, description = "Request created in pending state"),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate pending request", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-requests"
)]
pub async fn create_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateRequestInput>,
) -> ApiResult<stock_request::Model> {
    // School actors may only request stock for their own school.
    if !user.is_admin() && user.school_id != Some(payload.school_id) {
        return Err(ServiceError::Forbidden(
            "cannot create requests for another school".to_string(),
        ));
    }

    let request = state.services.transfers.create_request(payload).await?;
    Ok(Json(ApiResponse::success(request)))
}

/// Approve a pending stock transfer request
#[utoipa::path(
    post,
    path = "/api/v1/stock-requests/{id}/approve",
    params(("id" = i32, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request approved; ledgers updated"),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Request is not pending", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient warehouse stock", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-requests"
)]
pub async fn approve_request(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<stock_request::Model> {
    let request = state.services.transfers.approve_request(id).await?;
    Ok(Json(ApiResponse::success(request)))
}

/// Reject a pending stock transfer request
#[utoipa::path(
    post,
    path = "/api/v1/stock-requests/{id}/reject",
    params(("id" = i32, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request rejected"),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Request is not pending", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-requests"
)]
pub async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<stock_request::Model> {
    let request = state.services.transfers.reject_request(id).await?;
    Ok(Json(ApiResponse::success(request)))
}

/// Get a stock transfer request
#[utoipa::path(
    get,
    path = "/api/v1/stock-requests/{id}",
    params(("id" = i32, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request returned"),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-requests"
)]
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<stock_request::Model> {
    let request = state.services.transfers.get_request(id).await?;
    Ok(Json(ApiResponse::success(request)))
}

/// List stock transfer requests
#[utoipa::path(
    get,
    path = "/api/v1/stock-requests",
    responses(
        (status = 200, description = "Request list returned")
    ),
    tag = "stock-requests"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RequestListQuery>,
) -> ApiResult<PaginatedResponse<stock_request::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    // School actors see their own requests regardless of the filter.
    let school_id = if user.is_admin() {
        query.school_id
    } else {
        user.school_id
    };

    let filter = RequestFilter {
        status: query.status,
        school_id,
    };

    let (items, total) = state
        .services
        .transfers
        .list_requests(filter, page, limit)
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
