use crate::{auth::RegisterUserInput, entities::user, ApiResponse, ApiResult, AppState};
use axum::{extract::State, response::Json};

/// Register a user account (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterUserInput,
    responses(
        (status = 200, description = "User registered"),
        (status = 409, description = "Email already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserInput>,
) -> ApiResult<user::Model> {
    let account = state.services.auth.register_user(payload).await?;
    Ok(Json(ApiResponse::success(account)))
}
