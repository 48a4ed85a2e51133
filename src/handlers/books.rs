use crate::{
    entities::book,
    services::books::{CreateBookInput, UpdateBookInput},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct BookListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
    /// Optional title search
    pub search: Option<String>,
    /// Only list active titles
    pub active_only: Option<bool>,
}

/// Create a book
#[utoipa::path(
    post,
    path = "/api/v1/books",
    request_body = CreateBookInput,
    responses(
        (status = 200, description = "Book created"),
        (status = 404, description = "Author not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "ISBN already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "books"
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookInput>,
) -> ApiResult<book::Model> {
    let created = state.services.books.create_book(payload).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/api/v1/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    request_body = UpdateBookInput,
    responses(
        (status = 200, description = "Book updated"),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse)
    ),
    tag = "books"
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateBookInput>,
) -> ApiResult<book::Model> {
    let updated = state.services.books.update_book(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Get a book
#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book returned"),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse)
    ),
    tag = "books"
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<book::Model> {
    let found = state.services.books.get_book(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

/// List books
#[utoipa::path(
    get,
    path = "/api/v1/books",
    responses(
        (status = 200, description = "Book list returned")
    ),
    tag = "books"
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookListQuery>,
) -> ApiResult<PaginatedResponse<book::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (items, total) = state
        .services
        .books
        .list_books(
            query.search,
            query.active_only.unwrap_or(false),
            page,
            limit,
        )
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
