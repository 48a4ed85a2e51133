//! Warehouse and school stock ledgers.
//!
//! Intake (`receive_stock`) is the only writer here; quantity moves
//! between the ledgers exclusively through transfer and return approvals.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entities::{book, school_stock, warehouse_stock},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Service for reading ledgers and receiving stock into the warehouse
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Input for a warehouse stock intake
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReceiveStockInput {
    pub book_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

impl InventoryService {
    /// Creates a new inventory service instance
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Receives copies into the central warehouse, creating the ledger row
    /// on first intake.
    #[instrument(skip(self))]
    pub async fn receive_stock(
        &self,
        input: ReceiveStockInput,
    ) -> Result<warehouse_stock::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        book::Entity::find_by_id(input.book_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book {} not found", input.book_id)))?;

        let txn = db.begin().await?;
        let now = Utc::now();

        let updated = warehouse_stock::Entity::update_many()
            .col_expr(
                warehouse_stock::Column::Quantity,
                Expr::col(warehouse_stock::Column::Quantity).add(input.quantity),
            )
            .col_expr(warehouse_stock::Column::UpdatedAt, Expr::value(now))
            .filter(warehouse_stock::Column::BookId.eq(input.book_id))
            .filter(warehouse_stock::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            let row = warehouse_stock::ActiveModel {
                book_id: Set(input.book_id),
                quantity: Set(input.quantity),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            row.insert(&txn).await?;
        }

        txn.commit().await?;

        let row = self.warehouse_level(input.book_id).await?.ok_or_else(|| {
            ServiceError::InternalError(format!(
                "warehouse row for book {} vanished after intake",
                input.book_id
            ))
        })?;

        self.event_sender
            .send_or_log(Event::StockReceived {
                book_id: input.book_id,
                quantity: input.quantity,
                new_quantity: row.quantity,
            })
            .await;

        info!(
            book_id = input.book_id,
            received = input.quantity,
            on_hand = row.quantity,
            "received warehouse stock"
        );
        Ok(row)
    }

    /// Gets the warehouse ledger row for a book, if any
    #[instrument(skip(self))]
    pub async fn warehouse_level(
        &self,
        book_id: i32,
    ) -> Result<Option<warehouse_stock::Model>, ServiceError> {
        let row = warehouse_stock::Entity::find()
            .filter(warehouse_stock::Column::BookId.eq(book_id))
            .filter(warehouse_stock::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?;
        Ok(row)
    }

    /// Lists warehouse ledger rows with pagination
    #[instrument(skip(self))]
    pub async fn list_warehouse(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<warehouse_stock::Model>, u64), ServiceError> {
        let paginator = warehouse_stock::Entity::find()
            .filter(warehouse_stock::Column::IsActive.eq(true))
            .order_by_asc(warehouse_stock::Column::BookId)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }

    /// Gets the school ledger row for a (school, book) pair, if any
    #[instrument(skip(self))]
    pub async fn school_level(
        &self,
        school_id: i32,
        book_id: i32,
    ) -> Result<Option<school_stock::Model>, ServiceError> {
        let row = school_stock::Entity::find()
            .filter(school_stock::Column::SchoolId.eq(school_id))
            .filter(school_stock::Column::BookId.eq(book_id))
            .one(&*self.db)
            .await?;
        Ok(row)
    }

    /// Lists a school's ledger rows with pagination
    #[instrument(skip(self))]
    pub async fn list_school_stock(
        &self,
        school_id: i32,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<school_stock::Model>, u64), ServiceError> {
        let paginator = school_stock::Entity::find()
            .filter(school_stock::Column::SchoolId.eq(school_id))
            .order_by_asc(school_stock::Column::BookId)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }
}
