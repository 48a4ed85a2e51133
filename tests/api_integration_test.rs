mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn login_issues_usable_bearer_token() {
    let app = TestApp::new().await;

    let email = format!("login-{}@imprintpress.example", Uuid::new_v4());
    app.state
        .services
        .auth
        .register_user(imprint_api::auth::RegisterUserInput {
            email: email.clone(),
            password: "a-strong-password".to_string(),
            role: imprint_api::auth::consts::ROLE_ADMIN.to_string(),
            school_id: None,
        })
        .await
        .expect("register admin");

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": "a-strong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().expect("token in body").to_string();
    assert_eq!(body["token_type"], "Bearer");

    let (status, _) = app
        .request(Method::GET, "/api/v1/books", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;

    let email = format!("login-{}@imprintpress.example", Uuid::new_v4());
    app.state
        .services
        .auth
        .register_user(imprint_api::auth::RegisterUserInput {
            email: email.clone(),
            password: "a-strong-password".to_string(),
            role: imprint_api::auth::consts::ROLE_ADMIN.to_string(),
            school_id: None,
        })
        .await
        .expect("register admin");

    let (status, _) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new().await;

    let (status, _) = app.request(Method::GET, "/api/v1/books", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::GET, "/api/v1/stock-requests", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn school_registration_is_open() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/schools",
            None,
            Some(json!({
                "name": "Open Gate Academy",
                "email": format!("open-{}@example.edu", Uuid::new_v4()),
                "address": "1 Gate Street",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
}

#[tokio::test]
async fn school_actors_cannot_use_admin_routes() {
    let app = TestApp::new().await;
    let school = app.seed_approved_school().await;
    let (_, school_token) = app.create_school_user(school.id).await;

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/v1/schools/{}/approve", school.id),
            Some(&school_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/inventory/warehouse/receive",
            Some(&school_token),
            Some(json!({ "book_id": 1, "quantity": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn school_actors_are_scoped_to_their_own_school() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(6.00)).await;
    let own = app.seed_approved_school().await;
    let other = app.seed_approved_school().await;
    let (_, school_token) = app.create_school_user(own.id).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/stock-requests",
            Some(&school_token),
            Some(json!({
                "school_id": other.id,
                "book_id": book.id,
                "quantity": 2,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/stock-requests",
            Some(&school_token),
            Some(json!({
                "school_id": own.id,
                "book_id": book.id,
                "quantity": 2,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn full_transfer_workflow_over_http() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.create_admin().await;

    // Admin sets up the catalog.
    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/authors",
            Some(&admin_token),
            Some(json!({
                "name": "N. K. Jemisin",
                "email": format!("author-{}@imprintpress.example", Uuid::new_v4()),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let author_id = body["data"]["id"].as_i64().expect("author id");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/books",
            Some(&admin_token),
            Some(json!({
                "title": "The Fifth Season",
                "isbn": format!("978-{}", &Uuid::new_v4().simple().to_string()[..10]),
                "author_id": author_id,
                "price": "18.99",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let book_id = body["data"]["id"].as_i64().expect("book id");

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/inventory/warehouse/receive",
            Some(&admin_token),
            Some(json!({ "book_id": book_id, "quantity": 50 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // School registers, admin approves, school user asks for stock.
    let school = app.seed_approved_school().await;
    let (_, school_token) = app.create_school_user(school.id).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/stock-requests",
            Some(&school_token),
            Some(json!({
                "school_id": school.id,
                "book_id": book_id,
                "quantity": 20,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let request_id = body["data"]["id"].as_i64().expect("request id");
    assert_eq!(body["data"]["status"], "pending");

    // Admin approves; ledgers move.
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/stock-requests/{request_id}/approve"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");

    let (status, body) = app
        .request(
            Method::GET,
            &format!("/api/v1/inventory/warehouse/{book_id}"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity"], 30);

    let (status, body) = app
        .request(
            Method::GET,
            &format!("/api/v1/inventory/schools/{}", school.id),
            Some(&school_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["quantity"], 20);

    // Terminal state surfaces as a 409.
    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/v1/stock-requests/{request_id}/approve"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn insufficient_stock_maps_to_unprocessable_entity() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.create_admin().await;
    let book = app.seed_book(dec!(7.00)).await;
    let school = app.seed_approved_school().await;
    let (_, school_token) = app.create_school_user(school.id).await;
    app.receive(book.id, 3).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/stock-requests",
            Some(&school_token),
            Some(json!({
                "school_id": school.id,
                "book_id": book.id,
                "quantity": 10,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let request_id = body["data"]["id"].as_i64().expect("request id");

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/stock-requests/{request_id}/approve"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("Insufficient stock"));

    // 404 for unknown ids.
    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/stock-requests/424242/approve",
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn billing_workflow_over_http() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.create_admin().await;
    let book = app.seed_book(dec!(12.00)).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/customers",
            Some(&admin_token),
            Some(json!({
                "name": "Direct Buyer",
                "email": format!("buyer-{}@example.com", Uuid::new_v4()),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let customer_id = body["data"]["id"].as_i64().expect("customer id");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/invoices",
            Some(&admin_token),
            Some(json!({
                "customer_id": customer_id,
                "lines": [{ "book_id": book.id, "quantity": 4 }],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let invoice_id = body["data"]["id"].as_i64().expect("invoice id");
    assert_eq!(body["data"]["total"], "48.00");

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/invoices/{invoice_id}/payments"),
            Some(&admin_token),
            Some(json!({ "amount": "48", "method": "card" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "paid");
}
