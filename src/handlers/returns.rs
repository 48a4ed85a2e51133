use crate::{
    auth::AuthUser,
    entities::book_return,
    errors::ServiceError,
    services::returns::{CreateReturnInput, ReturnFilter},
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
pub struct ReturnListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
    /// Optional status filter
    pub status: Option<book_return::ReturnStatus>,
    /// Optional school filter
    pub school_id: Option<i32>,
}

/// Create a book return
#[utoipa::path(
    post,
    path = "/api/v1/returns",
    request_body = CreateReturnInput,
    responses(
        (status = 200, description = "Return created in pending state"),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate pending return", body = crate::errors::ErrorResponse)
    ),
    tag = "returns"
)]
pub async fn create_return(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateReturnInput>,
) -> ApiResult<book_return::Model> {
    if !user.is_admin() && user.school_id != Some(payload.school_id) {
        return Err(ServiceError::Forbidden(
            "cannot create returns for another school".to_string(),
        ));
    }

    let ret = state.services.returns.create_return(payload).await?;
    Ok(Json(ApiResponse::success(ret)))
}

/// Approve a pending return
#[utoipa::path(
    post,
    path = "/api/v1/returns/{id}/approve",
    params(("id" = i32, Path, description = "Return id")),
    responses(
        (status = 200, description = "Return approved; ledgers updated"),
        (status = 404, description = "Return not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Return is not pending", body = crate::errors::ErrorResponse),
        (status = 422, description = "School holds insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "returns"
)]
pub async fn approve_return(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<book_return::Model> {
    let ret = state.services.returns.approve_return(id).await?;
    Ok(Json(ApiResponse::success(ret)))
}

/// Reject a pending return
#[utoipa::path(
    post,
    path = "/api/v1/returns/{id}/reject",
    params(("id" = i32, Path, description = "Return id")),
    responses(
        (status = 200, description = "Return rejected"),
        (status = 404, description = "Return not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Return is not pending", body = crate::errors::ErrorResponse)
    ),
    tag = "returns"
)]
pub async fn reject_return(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<book_return::Model> {
    let ret = state.services.returns.reject_return(id).await?;
    Ok(Json(ApiResponse::success(ret)))
}

/// Get a return
#[utoipa::path(
    get,
    path = "/api/v1/returns/{id}",
    params(("id" = i32, Path, description = "Return id")),
    responses(
        (status = 200, description = "Return returned"),
        (status = 404, description = "Return not found", body = crate::errors::ErrorResponse)
    ),
    tag = "returns"
)]
pub async fn get_return(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<book_return::Model> {
    let ret = state.services.returns.get_return(id).await?;
    Ok(Json(ApiResponse::success(ret)))
}

/// List returns
#[utoipa::path(
    get,
    path = "/api/v1/returns",
    responses(
        (status = 200, description = "Return list returned")
    ),
    tag = "returns"
)]
pub async fn list_returns(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ReturnListQuery>,
) -> ApiResult<PaginatedResponse<book_return::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let school_id = if user.is_admin() {
        query.school_id
    } else {
        user.school_id
    };

    let filter = ReturnFilter {
        status: query.status,
        school_id,
    };

    let (items, total) = state
        .services
        .returns
        .list_returns(filter, page, limit)
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
