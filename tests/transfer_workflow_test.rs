mod common;

use assert_matches::assert_matches;
use common::TestApp;
use imprint_api::{
    entities::stock_request::RequestStatus,
    errors::ServiceError,
    services::transfers::{CreateRequestInput, RequestFilter},
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn approval_moves_stock_from_warehouse_to_school() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(12.50)).await;
    let school = app.seed_approved_school().await;
    app.receive(book.id, 50).await;

    let request = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school.id,
            book_id: book.id,
            quantity: 20,
        })
        .await
        .expect("create request");
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(app.warehouse_qty(book.id).await, 50);
    assert_eq!(app.school_qty(school.id, book.id).await, 0);

    let approved = app
        .state
        .services
        .transfers
        .approve_request(request.id)
        .await
        .expect("approve request");

    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(app.warehouse_qty(book.id).await, 30);
    assert_eq!(app.school_qty(school.id, book.id).await, 20);
    // Conservation: the transfer moved exactly 20 between the ledgers.
    assert_eq!(
        app.warehouse_qty(book.id).await + app.school_qty(school.id, book.id).await,
        50
    );
}

#[tokio::test]
async fn insufficient_stock_refuses_and_leaves_request_pending() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(8.00)).await;
    let school = app.seed_approved_school().await;
    app.receive(book.id, 10).await;

    let request = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school.id,
            book_id: book.id,
            quantity: 20,
        })
        .await
        .expect("create request");

    let err = app
        .state
        .services
        .transfers
        .approve_request(request.id)
        .await
        .expect_err("approval should fail");
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // Nothing changed: request still pending, ledgers untouched.
    let reloaded = app
        .state
        .services
        .transfers
        .get_request(request.id)
        .await
        .expect("get request");
    assert_eq!(reloaded.status, RequestStatus::Pending);
    assert_eq!(app.warehouse_qty(book.id).await, 10);
    assert_eq!(app.school_qty(school.id, book.id).await, 0);

    // The request may be retried once stock arrives.
    app.receive(book.id, 15).await;
    let approved = app
        .state
        .services
        .transfers
        .approve_request(request.id)
        .await
        .expect("retry approval");
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(app.warehouse_qty(book.id).await, 5);
    assert_eq!(app.school_qty(school.id, book.id).await, 20);
}

#[tokio::test]
async fn approval_with_missing_warehouse_row_is_insufficient() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(5.00)).await;
    let school = app.seed_approved_school().await;

    let request = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school.id,
            book_id: book.id,
            quantity: 1,
        })
        .await
        .expect("create request");

    let err = app
        .state
        .services
        .transfers
        .approve_request(request.id)
        .await
        .expect_err("approval should fail without a ledger row");
    assert_matches!(err, ServiceError::InsufficientStock(_));
}

#[tokio::test]
async fn approval_increments_existing_school_ledger_row() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(15.00)).await;
    let school = app.seed_approved_school().await;
    app.receive(book.id, 40).await;
    app.seed_school_stock(school.id, book.id, 5).await;

    let request = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school.id,
            book_id: book.id,
            quantity: 20,
        })
        .await
        .expect("create request");
    app.state
        .services
        .transfers
        .approve_request(request.id)
        .await
        .expect("approve request");

    // Incremented, not replaced, and still a single row for the pair.
    assert_eq!(app.school_qty(school.id, book.id).await, 25);
    assert_eq!(app.school_stock_rows(school.id, book.id).await, 1);
    assert_eq!(app.warehouse_qty(book.id).await, 20);
}

#[tokio::test]
async fn resolved_requests_are_terminal() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(9.99)).await;
    let school = app.seed_approved_school().await;
    app.receive(book.id, 30).await;

    let request = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school.id,
            book_id: book.id,
            quantity: 10,
        })
        .await
        .expect("create request");
    app.state
        .services
        .transfers
        .approve_request(request.id)
        .await
        .expect("first approval");

    let warehouse_after = app.warehouse_qty(book.id).await;
    let school_after = app.school_qty(school.id, book.id).await;

    // A second approve and a late reject both conflict, with no ledger delta.
    let err = app
        .state
        .services
        .transfers
        .approve_request(request.id)
        .await
        .expect_err("second approval must fail");
    assert_matches!(err, ServiceError::Conflict(_));

    let err = app
        .state
        .services
        .transfers
        .reject_request(request.id)
        .await
        .expect_err("reject after approve must fail");
    assert_matches!(err, ServiceError::Conflict(_));

    assert_eq!(app.warehouse_qty(book.id).await, warehouse_after);
    assert_eq!(app.school_qty(school.id, book.id).await, school_after);
}

#[tokio::test]
async fn rejection_flips_status_without_touching_ledgers() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(11.00)).await;
    let school = app.seed_approved_school().await;
    app.receive(book.id, 25).await;

    let request = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school.id,
            book_id: book.id,
            quantity: 5,
        })
        .await
        .expect("create request");

    let rejected = app
        .state
        .services
        .transfers
        .reject_request(request.id)
        .await
        .expect("reject request");
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(app.warehouse_qty(book.id).await, 25);
    assert_eq!(app.school_qty(school.id, book.id).await, 0);

    // Terminal: a later approve conflicts.
    let err = app
        .state
        .services
        .transfers
        .approve_request(request.id)
        .await
        .expect_err("approve after reject must fail");
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn duplicate_pending_request_is_refused_until_resolution() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(7.25)).await;
    let school = app.seed_approved_school().await;

    let first = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school.id,
            book_id: book.id,
            quantity: 3,
        })
        .await
        .expect("first request");

    let err = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school.id,
            book_id: book.id,
            quantity: 4,
        })
        .await
        .expect_err("duplicate pending request must fail");
    assert_matches!(err, ServiceError::Conflict(_));

    // After rejection the school may ask again.
    app.state
        .services
        .transfers
        .reject_request(first.id)
        .await
        .expect("reject request");
    app.state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school.id,
            book_id: book.id,
            quantity: 4,
        })
        .await
        .expect("resubmission after rejection");
}

#[tokio::test]
async fn create_request_validates_inputs() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(3.00)).await;
    let school = app.seed_approved_school().await;

    let err = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school.id,
            book_id: book.id,
            quantity: 0,
        })
        .await
        .expect_err("zero quantity must fail");
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school.id,
            book_id: 999_999,
            quantity: 1,
        })
        .await
        .expect_err("unknown book must fail");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn missing_request_is_not_found() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .transfers
        .approve_request(424_242)
        .await
        .expect_err("unknown id must fail");
    assert_matches!(err, ServiceError::NotFound(_));

    let err = app
        .state
        .services
        .transfers
        .reject_request(424_242)
        .await
        .expect_err("unknown id must fail");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn concurrent_approvals_cannot_oversell_the_warehouse() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(20.00)).await;
    let school_a = app.seed_approved_school().await;
    let school_b = app.seed_approved_school().await;
    app.receive(book.id, 30).await;

    let first = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school_a.id,
            book_id: book.id,
            quantity: 20,
        })
        .await
        .expect("first request");
    let second = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school_b.id,
            book_id: book.id,
            quantity: 20,
        })
        .await
        .expect("second request");

    let svc = app.state.services.transfers.clone();
    let (res_a, res_b) = tokio::join!(svc.approve_request(first.id), svc.approve_request(second.id));

    // Exactly one approval wins; the loser sees insufficient stock.
    let successes = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one approval should succeed");
    let loser = if res_a.is_err() { res_a } else { res_b };
    assert_matches!(loser.expect_err("one must fail"), ServiceError::InsufficientStock(_));

    // The warehouse never goes negative and quantity is conserved.
    let warehouse = app.warehouse_qty(book.id).await;
    let schools =
        app.school_qty(school_a.id, book.id).await + app.school_qty(school_b.id, book.id).await;
    assert_eq!(warehouse, 10);
    assert_eq!(schools, 20);
    assert_eq!(warehouse + schools, 30);
    assert!(warehouse >= 0);
}

#[tokio::test]
async fn list_requests_filters_by_status_and_school() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(6.00)).await;
    let school_a = app.seed_approved_school().await;
    let school_b = app.seed_approved_school().await;
    app.receive(book.id, 100).await;

    let req_a = app
        .state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school_a.id,
            book_id: book.id,
            quantity: 5,
        })
        .await
        .expect("request a");
    app.state
        .services
        .transfers
        .create_request(CreateRequestInput {
            school_id: school_b.id,
            book_id: book.id,
            quantity: 6,
        })
        .await
        .expect("request b");
    app.state
        .services
        .transfers
        .approve_request(req_a.id)
        .await
        .expect("approve a");

    let (pending, total_pending) = app
        .state
        .services
        .transfers
        .list_requests(
            RequestFilter {
                status: Some(RequestStatus::Pending),
                school_id: None,
            },
            1,
            20,
        )
        .await
        .expect("list pending");
    assert_eq!(total_pending, 1);
    assert_eq!(pending[0].school_id, school_b.id);

    let (for_a, total_a) = app
        .state
        .services
        .transfers
        .list_requests(
            RequestFilter {
                status: None,
                school_id: Some(school_a.id),
            },
            1,
            20,
        )
        .await
        .expect("list school a");
    assert_eq!(total_a, 1);
    assert_eq!(for_a[0].status, RequestStatus::Approved);
}
