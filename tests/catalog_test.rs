mod common;

use assert_matches::assert_matches;
use common::TestApp;
use imprint_api::{
    errors::ServiceError,
    services::{
        authors::{CreateAuthorInput, UpdateAuthorInput},
        billing::{CreateCustomerInput, CreateInvoiceInput, InvoiceLineInput},
        books::{CreateBookInput, UpdateBookInput},
    },
};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn author_and_book_lifecycle() {
    let app = TestApp::new().await;

    let writer = app
        .state
        .services
        .authors
        .create_author(CreateAuthorInput {
            name: "Ursula K. Le Guin".to_string(),
            email: format!("ukl-{}@imprintpress.example", Uuid::new_v4()),
            bio: None,
        })
        .await
        .expect("create author");

    let book = app
        .state
        .services
        .books
        .create_book(CreateBookInput {
            title: "A Wizard of Earthsea".to_string(),
            isbn: format!("978-{}", &Uuid::new_v4().simple().to_string()[..10]),
            author_id: writer.id,
            price: dec!(15.00),
        })
        .await
        .expect("create book");
    assert!(book.is_active);

    let updated = app
        .state
        .services
        .books
        .update_book(
            book.id,
            UpdateBookInput {
                title: None,
                price: Some(dec!(17.50)),
                is_active: None,
            },
        )
        .await
        .expect("update book");
    assert_eq!(updated.price, dec!(17.50));

    let renamed = app
        .state
        .services
        .authors
        .update_author(
            writer.id,
            UpdateAuthorInput {
                name: Some("U. K. Le Guin".to_string()),
                bio: Some("Fantasy and science fiction".to_string()),
            },
        )
        .await
        .expect("update author");
    assert_eq!(renamed.name, "U. K. Le Guin");
}

#[tokio::test]
async fn duplicate_isbn_and_unknown_author_are_refused() {
    let app = TestApp::new().await;
    let existing = app.seed_book(dec!(5.00)).await;

    let err = app
        .state
        .services
        .books
        .create_book(CreateBookInput {
            title: "Another Edition".to_string(),
            isbn: existing.isbn.clone(),
            author_id: existing.author_id,
            price: dec!(6.00),
        })
        .await
        .expect_err("duplicate isbn must fail");
    assert_matches!(err, ServiceError::Conflict(_));

    let err = app
        .state
        .services
        .books
        .create_book(CreateBookInput {
            title: "Orphan Title".to_string(),
            isbn: format!("978-{}", &Uuid::new_v4().simple().to_string()[..10]),
            author_id: 999_999,
            price: dec!(6.00),
        })
        .await
        .expect_err("unknown author must fail");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn title_search_and_active_filter() {
    let app = TestApp::new().await;
    let writer = app
        .state
        .services
        .authors
        .create_author(CreateAuthorInput {
            name: "Catalog Author".to_string(),
            email: format!("cat-{}@imprintpress.example", Uuid::new_v4()),
            bio: None,
        })
        .await
        .expect("create author");

    for title in ["Practical Typesetting", "Practical Binding", "Paper Science"] {
        app.state
            .services
            .books
            .create_book(CreateBookInput {
                title: title.to_string(),
                isbn: format!("978-{}", &Uuid::new_v4().simple().to_string()[..10]),
                author_id: writer.id,
                price: dec!(10.00),
            })
            .await
            .expect("create book");
    }

    let (matches, total) = app
        .state
        .services
        .books
        .list_books(Some("Practical".to_string()), false, 1, 20)
        .await
        .expect("search books");
    assert_eq!(total, 2);
    assert!(matches.iter().all(|b| b.title.contains("Practical")));

    // Deactivate one and filter it out.
    let retired = &matches[0];
    app.state
        .services
        .books
        .update_book(
            retired.id,
            UpdateBookInput {
                title: None,
                price: None,
                is_active: Some(false),
            },
        )
        .await
        .expect("deactivate book");

    let (_, active_total) = app
        .state
        .services
        .books
        .list_books(Some("Practical".to_string()), true, 1, 20)
        .await
        .expect("search active books");
    assert_eq!(active_total, 1);
}

#[tokio::test]
async fn retired_books_cannot_be_invoiced() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(20.00)).await;

    let customer = app
        .state
        .services
        .billing
        .create_customer(CreateCustomerInput {
            name: "Buyer".to_string(),
            email: format!("buyer-{}@example.com", Uuid::new_v4()),
            address: None,
        })
        .await
        .expect("create customer");

    app.state
        .services
        .books
        .update_book(
            book.id,
            UpdateBookInput {
                title: None,
                price: None,
                is_active: Some(false),
            },
        )
        .await
        .expect("deactivate book");

    let err = app
        .state
        .services
        .billing
        .create_invoice(CreateInvoiceInput {
            customer_id: customer.id,
            lines: vec![InvoiceLineInput {
                book_id: book.id,
                quantity: 1,
            }],
        })
        .await
        .expect_err("invoicing a retired book must fail");
    assert_matches!(err, ServiceError::Conflict(_));
}
