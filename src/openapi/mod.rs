use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Imprint API",
        version = "0.3.0",
        description = r#"
# Imprint Press Back-Office API

Back-office system for a publishing house: catalog management, warehouse
and school inventory ledgers, stock transfer requests, returns processing,
school registration, and customer billing.

## Authentication

Endpoints require a JWT bearer token obtained from `/auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

Approvals (stock requests, returns, school registrations) and catalog
mutations require the `admin` role. School actors operate on their own
school only.

## Pagination

List endpoints accept `page` (1-indexed) and `limit` query parameters.
"#,
        contact(
            name = "Imprint Press",
            email = "backoffice@imprintpress.example"
        )
    ),
    paths(
        crate::auth::login_handler,
        crate::handlers::authors::create_author,
        crate::handlers::authors::update_author,
        crate::handlers::authors::get_author,
        crate::handlers::authors::list_authors,
        crate::handlers::books::create_book,
        crate::handlers::books::update_book,
        crate::handlers::books::get_book,
        crate::handlers::books::list_books,
        crate::handlers::schools::register_school,
        crate::handlers::schools::approve_school,
        crate::handlers::schools::reject_school,
        crate::handlers::schools::get_school,
        crate::handlers::schools::list_schools,
        crate::handlers::inventory::receive_stock,
        crate::handlers::inventory::list_warehouse,
        crate::handlers::inventory::get_warehouse_level,
        crate::handlers::inventory::list_school_stock,
        crate::handlers::transfers::create_request,
        crate::handlers::transfers::approve_request,
        crate::handlers::transfers::reject_request,
        crate::handlers::transfers::get_request,
        crate::handlers::transfers::list_requests,
        crate::handlers::returns::create_return,
        crate::handlers::returns::approve_return,
        crate::handlers::returns::reject_return,
        crate::handlers::returns::get_return,
        crate::handlers::returns::list_returns,
        crate::handlers::billing::create_customer,
        crate::handlers::billing::get_customer,
        crate::handlers::billing::list_customers,
        crate::handlers::billing::create_invoice,
        crate::handlers::billing::record_payment,
        crate::handlers::billing::void_invoice,
        crate::handlers::billing::get_invoice,
        crate::handlers::billing::list_invoices,
        crate::handlers::users::register_user,
    ),
    components(schemas(
        crate::auth::LoginCredentials,
        crate::auth::LoginResponse,
        crate::auth::RegisterUserInput,
        crate::errors::ErrorResponse,
        crate::services::authors::CreateAuthorInput,
        crate::services::authors::UpdateAuthorInput,
        crate::services::books::CreateBookInput,
        crate::services::books::UpdateBookInput,
        crate::services::schools::RegisterSchoolInput,
        crate::services::inventory::ReceiveStockInput,
        crate::services::transfers::CreateRequestInput,
        crate::services::returns::CreateReturnInput,
        crate::services::billing::CreateCustomerInput,
        crate::services::billing::CreateInvoiceInput,
        crate::services::billing::InvoiceLineInput,
        crate::services::billing::RecordPaymentInput,
    )),
    tags(
        (name = "auth", description = "Authentication"),
        (name = "authors", description = "Author catalog"),
        (name = "books", description = "Book catalog"),
        (name = "schools", description = "School registration and approval"),
        (name = "inventory", description = "Warehouse and school ledgers"),
        (name = "stock-requests", description = "Warehouse-to-school transfer requests"),
        (name = "returns", description = "School-to-warehouse returns"),
        (name = "billing", description = "Customers, invoices, payments"),
        (name = "users", description = "User management"),
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
