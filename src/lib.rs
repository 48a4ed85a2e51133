//! Imprint API Library
//!
//! Back-office system for a publishing house: catalog, inventory ledgers,
//! stock transfer requests, returns, school registration, and billing.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{consts as roles, AuthRouterExt};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API v1 routes, grouped by required privilege
pub fn api_v1_routes() -> Router<AppState> {
    // Catalog routes
    let catalog_read = Router::new()
        .route("/authors", get(handlers::authors::list_authors))
        .route("/authors/:id", get(handlers::authors::get_author))
        .route("/books", get(handlers::books::list_books))
        .route("/books/:id", get(handlers::books::get_book))
        .with_auth();

    let catalog_write = Router::new()
        .route(
            "/authors",
            axum::routing::post(handlers::authors::create_author),
        )
        .route(
            "/authors/:id",
            axum::routing::put(handlers::authors::update_author),
        )
        .route("/books", axum::routing::post(handlers::books::create_book))
        .route(
            "/books/:id",
            axum::routing::put(handlers::books::update_book),
        )
        .with_role(roles::ROLE_ADMIN);

    // School registration is open; everything else requires auth
    let schools_open = Router::new().route(
        "/schools",
        axum::routing::post(handlers::schools::register_school),
    );

    let schools_read = Router::new()
        .route("/schools", get(handlers::schools::list_schools))
        .route("/schools/:id", get(handlers::schools::get_school))
        .with_auth();

    let schools_admin = Router::new()
        .route(
            "/schools/:id/approve",
            axum::routing::post(handlers::schools::approve_school),
        )
        .route(
            "/schools/:id/reject",
            axum::routing::post(handlers::schools::reject_school),
        )
        .with_role(roles::ROLE_ADMIN);

    // Inventory ledgers
    let inventory_read = Router::new()
        .route(
            "/inventory/warehouse",
            get(handlers::inventory::list_warehouse),
        )
        .route(
            "/inventory/warehouse/:book_id",
            get(handlers::inventory::get_warehouse_level),
        )
        .route(
            "/inventory/schools/:school_id",
            get(handlers::inventory::list_school_stock),
        )
        .with_auth();

    let inventory_admin = Router::new()
        .route(
            "/inventory/warehouse/receive",
            axum::routing::post(handlers::inventory::receive_stock),
        )
        .with_role(roles::ROLE_ADMIN);

    // Stock transfer requests: schools create, admins resolve
    let requests_create = Router::new()
        .route(
            "/stock-requests",
            axum::routing::post(handlers::transfers::create_request),
        )
        .with_role(roles::ROLE_SCHOOL);

    let requests_read = Router::new()
        .route("/stock-requests", get(handlers::transfers::list_requests))
        .route(
            "/stock-requests/:id",
            get(handlers::transfers::get_request),
        )
        .with_auth();

    let requests_admin = Router::new()
        .route(
            "/stock-requests/:id/approve",
            axum::routing::post(handlers::transfers::approve_request),
        )
        .route(
            "/stock-requests/:id/reject",
            axum::routing::post(handlers::transfers::reject_request),
        )
        .with_role(roles::ROLE_ADMIN);

    // Returns mirror the request flow
    let returns_create = Router::new()
        .route(
            "/returns",
            axum::routing::post(handlers::returns::create_return),
        )
        .with_role(roles::ROLE_SCHOOL);

    let returns_read = Router::new()
        .route("/returns", get(handlers::returns::list_returns))
        .route("/returns/:id", get(handlers::returns::get_return))
        .with_auth();

    let returns_admin = Router::new()
        .route(
            "/returns/:id/approve",
            axum::routing::post(handlers::returns::approve_return),
        )
        .route(
            "/returns/:id/reject",
            axum::routing::post(handlers::returns::reject_return),
        )
        .with_role(roles::ROLE_ADMIN);

    // Billing is back-office only
    let billing_read = Router::new()
        .route("/customers", get(handlers::billing::list_customers))
        .route("/customers/:id", get(handlers::billing::get_customer))
        .route("/invoices", get(handlers::billing::list_invoices))
        .route("/invoices/:id", get(handlers::billing::get_invoice))
        .with_auth();

    let billing_admin = Router::new()
        .route(
            "/customers",
            axum::routing::post(handlers::billing::create_customer),
        )
        .route(
            "/invoices",
            axum::routing::post(handlers::billing::create_invoice),
        )
        .route(
            "/invoices/:id/payments",
            axum::routing::post(handlers::billing::record_payment),
        )
        .route(
            "/invoices/:id/void",
            axum::routing::post(handlers::billing::void_invoice),
        )
        .with_role(roles::ROLE_ADMIN);

    // User management
    let users_admin = Router::new()
        .route("/users", axum::routing::post(handlers::users::register_user))
        .with_role(roles::ROLE_ADMIN);

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Catalog API
        .merge(catalog_read)
        .merge(catalog_write)
        // Schools API
        .merge(schools_open)
        .merge(schools_read)
        .merge(schools_admin)
        // Inventory API
        .merge(inventory_read)
        .merge(inventory_admin)
        // Stock transfer requests API
        .merge(requests_create)
        .merge(requests_read)
        .merge(requests_admin)
        // Returns API
        .merge(returns_create)
        .merge(returns_read)
        .merge(returns_admin)
        // Billing API
        .merge(billing_read)
        .merge(billing_admin)
        // Users API
        .merge(users_admin)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "imprint-api",
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
