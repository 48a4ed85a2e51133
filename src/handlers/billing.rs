use crate::{
    entities::{customer, invoice},
    services::billing::{
        CreateCustomerInput, CreateInvoiceInput, InvoiceDetail, InvoiceFilter, RecordPaymentInput,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct InvoiceListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
    /// Optional status filter
    pub status: Option<invoice::InvoiceStatus>,
    /// Optional customer filter
    pub customer_id: Option<i32>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct CustomerListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
}

/// Create a customer
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerInput,
    responses(
        (status = 200, description = "Customer created"),
        (status = 409, description = "Email already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "billing"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerInput>,
) -> ApiResult<customer::Model> {
    let created = state.services.billing.create_customer(payload).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// Get a customer
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer returned"),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "billing"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<customer::Model> {
    let found = state.services.billing.get_customer(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

/// List customers
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    responses(
        (status = 200, description = "Customer list returned")
    ),
    tag = "billing"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
) -> ApiResult<PaginatedResponse<customer::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (items, total) = state.services.billing.list_customers(page, limit).await?;

    let total_pages = (total + limit - 1) / limit;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

/// Issue an invoice
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    request_body = CreateInvoiceInput,
    responses(
        (status = 200, description = "Invoice issued"),
        (status = 404, description = "Customer or book not found", body = crate::errors::ErrorResponse)
    ),
    tag = "billing"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceInput>,
) -> ApiResult<InvoiceDetail> {
    let detail = state.services.billing.create_invoice(payload).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Record a payment against an invoice
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/payments",
    params(("id" = i32, Path, description = "Invoice id")),
    request_body = RecordPaymentInput,
    responses(
        (status = 200, description = "Payment recorded"),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice void or already paid", body = crate::errors::ErrorResponse)
    ),
    tag = "billing"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<RecordPaymentInput>,
) -> ApiResult<InvoiceDetail> {
    let detail = state.services.billing.record_payment(id, payload).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Void an issued invoice
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/void",
    params(("id" = i32, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice voided"),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice is not open", body = crate::errors::ErrorResponse)
    ),
    tag = "billing"
)]
pub async fn void_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<InvoiceDetail> {
    let detail = state.services.billing.void_invoice(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Get an invoice with lines and payments
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    params(("id" = i32, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice returned"),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse)
    ),
    tag = "billing"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<InvoiceDetail> {
    let detail = state.services.billing.get_invoice(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// List invoices
#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    responses(
        (status = 200, description = "Invoice list returned")
    ),
    tag = "billing"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> ApiResult<PaginatedResponse<invoice::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let filter = InvoiceFilter {
        status: query.status,
        customer_id: query.customer_id,
    };

    let (items, total) = state
        .services
        .billing
        .list_invoices(filter, page, limit)
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
