use crate::{
    entities::author,
    services::authors::{CreateAuthorInput, UpdateAuthorInput},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct AuthorListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
    /// Optional name search
    pub search: Option<String>,
}

/// Create an author
#[utoipa::path(
    post,
    path = "/api/v1/authors",
    request_body = CreateAuthorInput,
    responses(
        (status = 200, description = "Author created"),
        (status = 409, description = "Email already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "authors"
)]
pub async fn create_author(
    State(state): State<AppState>,
    Json(payload): Json<CreateAuthorInput>,
) -> ApiResult<author::Model> {
    let created = state.services.authors.create_author(payload).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// Update an author
#[utoipa::path(
    put,
    path = "/api/v1/authors/{id}",
    params(("id" = i32, Path, description = "Author id")),
    request_body = UpdateAuthorInput,
    responses(
        (status = 200, description = "Author updated"),
        (status = 404, description = "Author not found", body = crate::errors::ErrorResponse)
    ),
    tag = "authors"
)]
pub async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAuthorInput>,
) -> ApiResult<author::Model> {
    let updated = state.services.authors.update_author(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Get an author
#[utoipa::path(
    get,
    path = "/api/v1/authors/{id}",
    params(("id" = i32, Path, description = "Author id")),
    responses(
        (status = 200, description = "Author returned"),
        (status = 404, description = "Author not found", body = crate::errors::ErrorResponse)
    ),
    tag = "authors"
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<author::Model> {
    let found = state.services.authors.get_author(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

/// List authors
#[utoipa::path(
    get,
    path = "/api/v1/authors",
    responses(
        (status = 200, description = "Author list returned")
    ),
    tag = "authors"
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<AuthorListQuery>,
) -> ApiResult<PaginatedResponse<author::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (items, total) = state
        .services
        .authors
        .list_authors(query.search, page, limit)
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
