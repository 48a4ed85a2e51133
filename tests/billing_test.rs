mod common;

use assert_matches::assert_matches;
use common::TestApp;
use imprint_api::{
    entities::invoice::InvoiceStatus,
    errors::ServiceError,
    services::billing::{
        CreateCustomerInput, CreateInvoiceInput, InvoiceLineInput, RecordPaymentInput,
    },
};
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn seed_customer(app: &TestApp) -> i32 {
    app.state
        .services
        .billing
        .create_customer(CreateCustomerInput {
            name: "Direct Buyer".to_string(),
            email: format!("buyer-{}@example.com", Uuid::new_v4()),
            address: None,
        })
        .await
        .expect("create customer")
        .id
}

#[tokio::test]
async fn invoice_totals_come_from_catalog_prices() {
    let app = TestApp::new().await;
    let hardcover = app.seed_book(dec!(25.00)).await;
    let paperback = app.seed_book(dec!(9.50)).await;
    let customer_id = seed_customer(&app).await;

    let detail = app
        .state
        .services
        .billing
        .create_invoice(CreateInvoiceInput {
            customer_id,
            lines: vec![
                InvoiceLineInput {
                    book_id: hardcover.id,
                    quantity: 2,
                },
                InvoiceLineInput {
                    book_id: paperback.id,
                    quantity: 3,
                },
            ],
        })
        .await
        .expect("create invoice");

    assert_eq!(detail.invoice.status, InvoiceStatus::Issued);
    assert_eq!(detail.invoice.subtotal, dec!(78.50));
    assert_eq!(detail.invoice.total, dec!(78.50));
    assert_eq!(detail.invoice.amount_paid, dec!(0));
    assert_eq!(detail.lines.len(), 2);
    assert_eq!(detail.lines[0].unit_price, dec!(25.00));
    assert_eq!(detail.lines[0].line_total, dec!(50.00));
}

#[tokio::test]
async fn payments_accumulate_and_flip_to_paid_at_threshold() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(10.00)).await;
    let customer_id = seed_customer(&app).await;

    let detail = app
        .state
        .services
        .billing
        .create_invoice(CreateInvoiceInput {
            customer_id,
            lines: vec![InvoiceLineInput {
                book_id: book.id,
                quantity: 10,
            }],
        })
        .await
        .expect("create invoice");
    let invoice_id = detail.invoice.id;

    // Partial payment keeps the invoice open.
    let after_first = app
        .state
        .services
        .billing
        .record_payment(
            invoice_id,
            RecordPaymentInput {
                amount: dec!(40.00),
                method: "bank_transfer".to_string(),
                reference: Some("TX-1".to_string()),
            },
        )
        .await
        .expect("first payment");
    assert_eq!(after_first.invoice.status, InvoiceStatus::Issued);
    assert_eq!(after_first.invoice.amount_paid, dec!(40.00));

    // Covering the balance flips it to paid.
    let after_second = app
        .state
        .services
        .billing
        .record_payment(
            invoice_id,
            RecordPaymentInput {
                amount: dec!(60.00),
                method: "bank_transfer".to_string(),
                reference: Some("TX-2".to_string()),
            },
        )
        .await
        .expect("second payment");
    assert_eq!(after_second.invoice.status, InvoiceStatus::Paid);
    assert_eq!(after_second.invoice.amount_paid, dec!(100.00));
    assert_eq!(after_second.payments.len(), 2);

    // Paid invoices accept no further payments.
    let err = app
        .state
        .services
        .billing
        .record_payment(
            invoice_id,
            RecordPaymentInput {
                amount: dec!(1.00),
                method: "cash".to_string(),
                reference: None,
            },
        )
        .await
        .expect_err("payment on paid invoice must fail");
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn void_invoice_rules() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(5.00)).await;
    let customer_id = seed_customer(&app).await;

    let detail = app
        .state
        .services
        .billing
        .create_invoice(CreateInvoiceInput {
            customer_id,
            lines: vec![InvoiceLineInput {
                book_id: book.id,
                quantity: 1,
            }],
        })
        .await
        .expect("create invoice");

    let voided = app
        .state
        .services
        .billing
        .void_invoice(detail.invoice.id)
        .await
        .expect("void invoice");
    assert_eq!(voided.invoice.status, InvoiceStatus::Void);

    // Void invoices accept neither payments nor a second void.
    let err = app
        .state
        .services
        .billing
        .record_payment(
            detail.invoice.id,
            RecordPaymentInput {
                amount: dec!(5.00),
                method: "cash".to_string(),
                reference: None,
            },
        )
        .await
        .expect_err("payment on void invoice must fail");
    assert_matches!(err, ServiceError::Conflict(_));

    let err = app
        .state
        .services
        .billing
        .void_invoice(detail.invoice.id)
        .await
        .expect_err("second void must fail");
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn invoice_requires_known_customer_and_books() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(5.00)).await;
    let customer_id = seed_customer(&app).await;

    let err = app
        .state
        .services
        .billing
        .create_invoice(CreateInvoiceInput {
            customer_id: 999_999,
            lines: vec![InvoiceLineInput {
                book_id: book.id,
                quantity: 1,
            }],
        })
        .await
        .expect_err("unknown customer must fail");
    assert_matches!(err, ServiceError::NotFound(_));

    let err = app
        .state
        .services
        .billing
        .create_invoice(CreateInvoiceInput {
            customer_id,
            lines: vec![InvoiceLineInput {
                book_id: 999_999,
                quantity: 1,
            }],
        })
        .await
        .expect_err("unknown book must fail");
    assert_matches!(err, ServiceError::NotFound(_));

    let err = app
        .state
        .services
        .billing
        .create_invoice(CreateInvoiceInput {
            customer_id,
            lines: vec![],
        })
        .await
        .expect_err("empty invoice must fail");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn payment_validation() {
    let app = TestApp::new().await;
    let book = app.seed_book(dec!(5.00)).await;
    let customer_id = seed_customer(&app).await;

    let detail = app
        .state
        .services
        .billing
        .create_invoice(CreateInvoiceInput {
            customer_id,
            lines: vec![InvoiceLineInput {
                book_id: book.id,
                quantity: 1,
            }],
        })
        .await
        .expect("create invoice");

    let err = app
        .state
        .services
        .billing
        .record_payment(
            detail.invoice.id,
            RecordPaymentInput {
                amount: dec!(0),
                method: "cash".to_string(),
                reference: None,
            },
        )
        .await
        .expect_err("zero payment must fail");
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .state
        .services
        .billing
        .record_payment(
            999_999,
            RecordPaymentInput {
                amount: dec!(1.00),
                method: "cash".to_string(),
                reference: None,
            },
        )
        .await
        .expect_err("unknown invoice must fail");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn duplicate_customer_email_is_refused() {
    let app = TestApp::new().await;

    let email = format!("unique-{}@example.com", Uuid::new_v4());
    app.state
        .services
        .billing
        .create_customer(CreateCustomerInput {
            name: "First".to_string(),
            email: email.clone(),
            address: None,
        })
        .await
        .expect("first customer");

    let err = app
        .state
        .services
        .billing
        .create_customer(CreateCustomerInput {
            name: "Second".to_string(),
            email,
            address: None,
        })
        .await
        .expect_err("duplicate email must fail");
    assert_matches!(err, ServiceError::Conflict(_));
}
