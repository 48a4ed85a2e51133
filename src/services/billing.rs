//! Customer billing: invoices priced from the catalog at issue time, and
//! payments recorded against them.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entities::{
        book, customer, invoice,
        invoice::InvoiceStatus,
        invoice_line, payment,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Service for customer billing
#[derive(Clone)]
pub struct BillingService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Input for creating a customer
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub address: Option<String>,
}

/// One line of an invoice request
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct InvoiceLineInput {
    pub book_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// Input for creating an invoice
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceInput {
    pub customer_id: i32,
    #[validate(length(min = 1))]
    pub lines: Vec<InvoiceLineInput>,
}

/// Input for recording a payment
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordPaymentInput {
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
}

/// Invoice with its lines and payments, as returned by `get_invoice`
#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: invoice::Model,
    pub lines: Vec<invoice_line::Model>,
    pub payments: Vec<payment::Model>,
}

/// Filters accepted when listing invoices
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<i32>,
}

impl BillingService {
    /// Creates a new billing service instance
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a customer
    #[instrument(skip(self))]
    pub async fn create_customer(
        &self,
        input: CreateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let existing = customer::Entity::find()
            .filter(customer::Column::Email.eq(&input.email))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "customer with email {} already exists",
                input.email
            )));
        }

        let now = Utc::now();
        let created = customer::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            address: Set(input.address),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let created = created.insert(db).await?;

        self.event_sender
            .send_or_log(Event::CustomerCreated(created.id))
            .await;

        info!(customer_id = created.id, "created customer");
        Ok(created)
    }

    /// Gets a customer by id
    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: i32) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))
    }

    /// Lists customers with pagination
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let paginator = customer::Entity::find()
            .order_by_asc(customer::Column::Name)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((customers, total))
    }

    /// Issues an invoice for a customer. Line prices are captured from
    /// the catalog at issue time; the invoice and its lines are inserted
    /// in one transaction.
    #[instrument(skip(self))]
    pub async fn create_invoice(
        &self,
        input: CreateInvoiceInput,
    ) -> Result<InvoiceDetail, ServiceError> {
        input.validate()?;
        for line in &input.lines {
            line.validate()?;
        }
        let db = &*self.db;

        self.get_customer(input.customer_id).await?;

        let txn = db.begin().await?;
        let now = Utc::now();

        let mut priced_lines = Vec::with_capacity(input.lines.len());
        let mut subtotal = Decimal::ZERO;
        for line in &input.lines {
            let item = book::Entity::find_by_id(line.book_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Book {} not found", line.book_id))
                })?;
            if !item.is_active {
                return Err(ServiceError::Conflict(format!(
                    "book {} is no longer available",
                    line.book_id
                )));
            }
            let line_total = item.price * Decimal::from(line.quantity);
            subtotal += line_total;
            priced_lines.push((line.book_id, line.quantity, item.price, line_total));
        }

        let issued = invoice::ActiveModel {
            customer_id: Set(input.customer_id),
            subtotal: Set(subtotal),
            total: Set(subtotal),
            amount_paid: Set(Decimal::ZERO),
            status: Set(InvoiceStatus::Issued),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let issued = issued.insert(&txn).await?;

        let mut lines = Vec::with_capacity(priced_lines.len());
        for (book_id, quantity, unit_price, line_total) in priced_lines {
            let line = invoice_line::ActiveModel {
                invoice_id: Set(issued.id),
                book_id: Set(book_id),
                quantity: Set(quantity),
                unit_price: Set(unit_price),
                line_total: Set(line_total),
                created_at: Set(now),
                ..Default::default()
            };
            lines.push(line.insert(&txn).await?);
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::InvoiceIssued {
                invoice_id: issued.id,
                customer_id: issued.customer_id,
                total: issued.total,
            })
            .await;

        info!(invoice_id = issued.id, total = %issued.total, "issued invoice");
        Ok(InvoiceDetail {
            invoice: issued,
            lines,
            payments: Vec::new(),
        })
    }

    /// Records a payment against an issued invoice. The invoice flips to
    /// `Paid` once accumulated payments cover the total.
    #[instrument(skip(self))]
    pub async fn record_payment(
        &self,
        invoice_id: i32,
        input: RecordPaymentInput,
    ) -> Result<InvoiceDetail, ServiceError> {
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "payment amount must be positive".to_string(),
            ));
        }
        if input.method.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "payment method is required".to_string(),
            ));
        }
        let db = &*self.db;

        let txn = db.begin().await?;
        let now = Utc::now();

        let target = invoice::Entity::find_by_id(invoice_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        match target.status {
            InvoiceStatus::Void => {
                return Err(ServiceError::Conflict(format!(
                    "invoice {} is void",
                    invoice_id
                )));
            }
            InvoiceStatus::Paid => {
                return Err(ServiceError::Conflict(format!(
                    "invoice {} is already paid",
                    invoice_id
                )));
            }
            InvoiceStatus::Issued => {}
        }

        let recorded = payment::ActiveModel {
            invoice_id: Set(invoice_id),
            amount: Set(input.amount),
            method: Set(input.method),
            reference: Set(input.reference),
            created_at: Set(now),
            ..Default::default()
        };
        recorded.insert(&txn).await?;

        let amount_paid = target.amount_paid + input.amount;
        let status = if amount_paid >= target.total {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Issued
        };

        let mut active: invoice::ActiveModel = target.into();
        active.amount_paid = Set(amount_paid);
        active.status = Set(status);
        active.updated_at = Set(now);
        active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PaymentRecorded {
                invoice_id,
                amount: input.amount,
            })
            .await;
        if status == InvoiceStatus::Paid {
            self.event_sender
                .send_or_log(Event::InvoicePaid(invoice_id))
                .await;
        }

        info!(invoice_id, amount = %input.amount, "recorded payment");
        self.get_invoice(invoice_id).await
    }

    /// Voids an issued invoice. Paid invoices cannot be voided.
    #[instrument(skip(self))]
    pub async fn void_invoice(&self, invoice_id: i32) -> Result<InvoiceDetail, ServiceError> {
        let db = &*self.db;

        let target = invoice::Entity::find_by_id(invoice_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        if target.status != InvoiceStatus::Issued {
            return Err(ServiceError::Conflict(format!(
                "invoice {} is not open",
                invoice_id
            )));
        }

        let voided = invoice::Entity::update_many()
            .col_expr(invoice::Column::Status, Expr::value(InvoiceStatus::Void))
            .col_expr(invoice::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(invoice::Column::Id.eq(invoice_id))
            .filter(invoice::Column::Status.eq(InvoiceStatus::Issued))
            .exec(db)
            .await?;
        if voided.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "invoice {} is not open",
                invoice_id
            )));
        }

        self.event_sender
            .send_or_log(Event::InvoiceVoided(invoice_id))
            .await;

        info!(invoice_id, "voided invoice");
        self.get_invoice(invoice_id).await
    }

    /// Gets an invoice with its lines and payments
    #[instrument(skip(self))]
    pub async fn get_invoice(&self, invoice_id: i32) -> Result<InvoiceDetail, ServiceError> {
        let db = &*self.db;

        let found = invoice::Entity::find_by_id(invoice_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        let lines = invoice_line::Entity::find()
            .filter(invoice_line::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(invoice_line::Column::Id)
            .all(db)
            .await?;

        let payments = payment::Entity::find()
            .filter(payment::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(payment::Column::Id)
            .all(db)
            .await?;

        Ok(InvoiceDetail {
            invoice: found,
            lines,
            payments,
        })
    }

    /// Lists invoices with optional filters, newest first
    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        filter: InvoiceFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<invoice::Model>, u64), ServiceError> {
        let mut query = invoice::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(invoice::Column::Status.eq(status));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(invoice::Column::CustomerId.eq(customer_id));
        }

        let paginator = query
            .order_by_desc(invoice::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let invoices = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((invoices, total))
    }
}
