//! Warehouse-to-school stock transfer requests.
//!
//! A school asks for N copies of a book; an admin approves or rejects the
//! request. Approval moves quantity from the warehouse ledger into the
//! school ledger inside a single database transaction. The stock
//! sufficiency check is part of the decrement statement itself, so two
//! concurrent approvals against the same book cannot both pass a stale
//! read: the losing transaction sees zero affected rows and the whole
//! unit rolls back.

use chrono::Utc;
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
        book, school_stock, stock_request,
        stock_request::RequestStatus,
        warehouse_stock,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Service for managing stock transfer requests
#[derive(Clone)]
pub struct TransferService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Input for creating a transfer request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRequestInput {
    pub school_id: i32,
    pub book_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// Filters accepted when listing transfer requests
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub school_id: Option<i32>,
}

impl TransferService {
    /// Creates a new transfer service instance
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a transfer request in `Pending` state.
    ///
    /// Refuses when the book does not exist or when the school already has
    /// a pending request for the same book. The ledgers are untouched
    /// until approval.
    #[instrument(skip(self))]
    pub async fn create_request(
        &self,
        input: CreateRequestInput,
    ) -> Result<stock_request::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        book::Entity::find_by_id(input.book_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book {} not found", input.book_id)))?;

        let outstanding = stock_request::Entity::find()
            .filter(stock_request::Column::SchoolId.eq(input.school_id))
            .filter(stock_request::Column::BookId.eq(input.book_id))
            .filter(stock_request::Column::Status.eq(RequestStatus::Pending))
            .one(db)
            .await?;
        if outstanding.is_some() {
            return Err(ServiceError::Conflict(format!(
                "school {} already has a pending request for book {}",
                input.school_id, input.book_id
            )));
        }

        let now = Utc::now();
        let request = stock_request::ActiveModel {
            school_id: Set(input.school_id),
            book_id: Set(input.book_id),
            quantity: Set(input.quantity),
            status: Set(RequestStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let request = request.insert(db).await?;

        self.event_sender
            .send_or_log(Event::StockRequestCreated {
                request_id: request.id,
                school_id: request.school_id,
                book_id: request.book_id,
                quantity: request.quantity,
            })
            .await;

        info!(request_id = request.id, "created stock request");
        Ok(request)
    }

    /// Approves a pending request, moving its quantity from the warehouse
    /// ledger into the school ledger.
    ///
    /// All three writes happen in one transaction:
    /// 1. warehouse decrement, conditional on `quantity >= requested` so
    ///    sufficiency is re-checked at the moment of the write;
    /// 2. school ledger upsert (increment an existing row or insert one);
    /// 3. status flip, conditional on the row still being `Pending`.
    ///
    /// Zero affected rows at step 1 means insufficient stock (or no ledger
    /// row at all); at step 3 it means a concurrent resolution won. Either
    /// way the transaction rolls back and no ledger changes.
    #[instrument(skip(self))]
    pub async fn approve_request(&self, id: i32) -> Result<stock_request::Model, ServiceError> {
        let db = &*self.db;

        let request = stock_request::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock request {} not found", id)))?;

        if request.status != RequestStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "stock request {} is not pending",
                id
            )));
        }

        let txn = db.begin().await?;
        let now = Utc::now();

        let decremented = warehouse_stock::Entity::update_many()
            .col_expr(
                warehouse_stock::Column::Quantity,
                Expr::col(warehouse_stock::Column::Quantity).sub(request.quantity),
            )
            .col_expr(warehouse_stock::Column::UpdatedAt, Expr::value(now))
            .filter(warehouse_stock::Column::BookId.eq(request.book_id))
            .filter(warehouse_stock::Column::IsActive.eq(true))
            .filter(warehouse_stock::Column::Quantity.gte(request.quantity))
            .exec(&txn)
            .await?;
        if decremented.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ServiceError::InsufficientStock(format!(
                "warehouse holds fewer than {} copies of book {}",
                request.quantity, request.book_id
            )));
        }

        let incremented = school_stock::Entity::update_many()
            .col_expr(
                school_stock::Column::Quantity,
                Expr::col(school_stock::Column::Quantity).add(request.quantity),
            )
            .col_expr(school_stock::Column::UpdatedAt, Expr::value(now))
            .filter(school_stock::Column::SchoolId.eq(request.school_id))
            .filter(school_stock::Column::BookId.eq(request.book_id))
            .exec(&txn)
            .await?;
        if incremented.rows_affected == 0 {
            let row = school_stock::ActiveModel {
                school_id: Set(request.school_id),
                book_id: Set(request.book_id),
                quantity: Set(request.quantity),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            row.insert(&txn).await?;
        }

        let flipped = stock_request::Entity::update_many()
            .col_expr(
                stock_request::Column::Status,
                Expr::value(RequestStatus::Approved),
            )
            .col_expr(stock_request::Column::UpdatedAt, Expr::value(now))
            .filter(stock_request::Column::Id.eq(id))
            .filter(stock_request::Column::Status.eq(RequestStatus::Pending))
            .exec(&txn)
            .await?;
        if flipped.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ServiceError::Conflict(format!(
                "stock request {} is not pending",
                id
            )));
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::StockRequestApproved {
                request_id: id,
                school_id: request.school_id,
                book_id: request.book_id,
                quantity: request.quantity,
            })
            .await;

        info!(request_id = id, quantity = request.quantity, "approved stock request");
        self.reload(id).await
    }

    /// Rejects a pending request. Terminal states are immutable; the
    /// ledgers are never touched.
    #[instrument(skip(self))]
    pub async fn reject_request(&self, id: i32) -> Result<stock_request::Model, ServiceError> {
        let db = &*self.db;

        let request = stock_request::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock request {} not found", id)))?;

        if request.status != RequestStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "stock request {} is not pending",
                id
            )));
        }

        let rejected = stock_request::Entity::update_many()
            .col_expr(
                stock_request::Column::Status,
                Expr::value(RequestStatus::Rejected),
            )
            .col_expr(stock_request::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(stock_request::Column::Id.eq(id))
            .filter(stock_request::Column::Status.eq(RequestStatus::Pending))
            .exec(db)
            .await?;
        if rejected.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "stock request {} is not pending",
                id
            )));
        }

        self.event_sender
            .send_or_log(Event::StockRequestRejected(id))
            .await;

        info!(request_id = id, "rejected stock request");
        self.reload(id).await
    }

    /// Gets a transfer request by id
    #[instrument(skip(self))]
    pub async fn get_request(&self, id: i32) -> Result<stock_request::Model, ServiceError> {
        stock_request::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock request {} not found", id)))
    }

    /// Lists transfer requests with optional status/school filters,
    /// newest first
    #[instrument(skip(self))]
    pub async fn list_requests(
        &self,
        filter: RequestFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_request::Model>, u64), ServiceError> {
        let mut query = stock_request::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(stock_request::Column::Status.eq(status));
        }
        if let Some(school_id) = filter.school_id {
            query = query.filter(stock_request::Column::SchoolId.eq(school_id));
        }

        let paginator = query
            .order_by_desc(stock_request::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let requests = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((requests, total))
    }

    async fn reload(&self, id: i32) -> Result<stock_request::Model, ServiceError> {
        stock_request::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("stock request {} vanished after update", id))
            })
    }
}
