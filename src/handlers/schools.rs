use crate::{
    entities::school,
    services::schools::{RegisterSchoolInput, SchoolFilter},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct SchoolListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
    /// Optional status filter
    pub status: Option<school::SchoolStatus>,
}

/// Register a school (lands in pending state)
#[utoipa::path(
    post,
    path = "/api/v1/schools",
    request_body = RegisterSchoolInput,
    responses(
        (status = 200, description = "School registered, awaiting approval"),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "schools"
)]
pub async fn register_school(
    State(state): State<AppState>,
    Json(payload): Json<RegisterSchoolInput>,
) -> ApiResult<school::Model> {
    let registered = state.services.schools.register_school(payload).await?;
    Ok(Json(ApiResponse::success(registered)))
}

/// Approve a pending school registration
#[utoipa::path(
    post,
    path = "/api/v1/schools/{id}/approve",
    params(("id" = i32, Path, description = "School id")),
    responses(
        (status = 200, description = "School approved"),
        (status = 404, description = "School not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Registration is not pending", body = crate::errors::ErrorResponse)
    ),
    tag = "schools"
)]
pub async fn approve_school(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<school::Model> {
    let approved = state.services.schools.approve_school(id).await?;
    Ok(Json(ApiResponse::success(approved)))
}

/// Reject a pending school registration
#[utoipa::path(
    post,
    path = "/api/v1/schools/{id}/reject",
    params(("id" = i32, Path, description = "School id")),
    responses(
        (status = 200, description = "School rejected"),
        (status = 404, description = "School not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Registration is not pending", body = crate::errors::ErrorResponse)
    ),
    tag = "schools"
)]
pub async fn reject_school(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<school::Model> {
    let rejected = state.services.schools.reject_school(id).await?;
    Ok(Json(ApiResponse::success(rejected)))
}

/// Get a school
#[utoipa::path(
    get,
    path = "/api/v1/schools/{id}",
    params(("id" = i32, Path, description = "School id")),
    responses(
        (status = 200, description = "School returned"),
        (status = 404, description = "School not found", body = crate::errors::ErrorResponse)
    ),
    tag = "schools"
)]
pub async fn get_school(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<school::Model> {
    let found = state.services.schools.get_school(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

/// List schools
#[utoipa::path(
    get,
    path = "/api/v1/schools",
    responses(
        (status = 200, description = "School list returned")
    ),
    tag = "schools"
)]
pub async fn list_schools(
    State(state): State<AppState>,
    Query(query): Query<SchoolListQuery>,
) -> ApiResult<PaginatedResponse<school::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let filter = SchoolFilter {
        status: query.status,
    };

    let (items, total) = state
        .services
        .schools
        .list_schools(filter, page, limit)
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
