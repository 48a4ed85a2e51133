//! Book returns from schools back to the central warehouse.
//!
//! The state machine mirrors transfer requests: a school creates a
//! pending return, an admin approves or rejects it. Approval moves
//! quantity from the school ledger back into the warehouse ledger inside
//! one transaction, with the school-side sufficiency check folded into
//! the decrement statement.

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
        book, book_return,
        book_return::ReturnStatus,
        school_stock, warehouse_stock,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Service for managing book returns
#[derive(Clone)]
pub struct ReturnService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Input for creating a return
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReturnInput {
    pub school_id: i32,
    pub book_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub reason: Option<String>,
}

/// Filters accepted when listing returns
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct ReturnFilter {
    pub status: Option<ReturnStatus>,
    pub school_id: Option<i32>,
}

impl ReturnService {
    /// Creates a new return service instance
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a return in `Pending` state. Duplicate pending returns for
    /// the same (school, book) pair are refused.
    #[instrument(skip(self))]
    pub async fn create_return(
        &self,
        input: CreateReturnInput,
    ) -> Result<book_return::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        book::Entity::find_by_id(input.book_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book {} not found", input.book_id)))?;

        let outstanding = book_return::Entity::find()
            .filter(book_return::Column::SchoolId.eq(input.school_id))
            .filter(book_return::Column::BookId.eq(input.book_id))
            .filter(book_return::Column::Status.eq(ReturnStatus::Pending))
            .one(db)
            .await?;
        if outstanding.is_some() {
            return Err(ServiceError::Conflict(format!(
                "school {} already has a pending return for book {}",
                input.school_id, input.book_id
            )));
        }

        let now = Utc::now();
        let ret = book_return::ActiveModel {
            school_id: Set(input.school_id),
            book_id: Set(input.book_id),
            quantity: Set(input.quantity),
            reason: Set(input.reason),
            status: Set(ReturnStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let ret = ret.insert(db).await?;

        self.event_sender
            .send_or_log(Event::ReturnRequested {
                return_id: ret.id,
                school_id: ret.school_id,
                book_id: ret.book_id,
                quantity: ret.quantity,
            })
            .await;

        info!(return_id = ret.id, "created book return");
        Ok(ret)
    }

    /// Approves a pending return, moving its quantity from the school
    /// ledger back into the warehouse.
    ///
    /// Same transactional shape as transfer approval, with the ledgers
    /// swapped: the school decrement carries the `quantity >= returned`
    /// predicate, the warehouse row is upserted, and the status flip is
    /// guarded on `Pending`.
    #[instrument(skip(self))]
    pub async fn approve_return(&self, id: i32) -> Result<book_return::Model, ServiceError> {
        let db = &*self.db;

        let ret = book_return::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Return {} not found", id)))?;

        if ret.status != ReturnStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "return {} is not pending",
                id
            )));
        }

        let txn = db.begin().await?;
        let now = Utc::now();

        let decremented = school_stock::Entity::update_many()
            .col_expr(
                school_stock::Column::Quantity,
                Expr::col(school_stock::Column::Quantity).sub(ret.quantity),
            )
            .col_expr(school_stock::Column::UpdatedAt, Expr::value(now))
            .filter(school_stock::Column::SchoolId.eq(ret.school_id))
            .filter(school_stock::Column::BookId.eq(ret.book_id))
            .filter(school_stock::Column::Quantity.gte(ret.quantity))
            .exec(&txn)
            .await?;
        if decremented.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ServiceError::InsufficientStock(format!(
                "school {} holds fewer than {} copies of book {}",
                ret.school_id, ret.quantity, ret.book_id
            )));
        }

        let incremented = warehouse_stock::Entity::update_many()
            .col_expr(
                warehouse_stock::Column::Quantity,
                Expr::col(warehouse_stock::Column::Quantity).add(ret.quantity),
            )
            .col_expr(warehouse_stock::Column::UpdatedAt, Expr::value(now))
            .filter(warehouse_stock::Column::BookId.eq(ret.book_id))
            .filter(warehouse_stock::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;
        if incremented.rows_affected == 0 {
            let row = warehouse_stock::ActiveModel {
                book_id: Set(ret.book_id),
                quantity: Set(ret.quantity),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            row.insert(&txn).await?;
        }

        let flipped = book_return::Entity::update_many()
            .col_expr(
                book_return::Column::Status,
                Expr::value(ReturnStatus::Approved),
            )
            .col_expr(book_return::Column::UpdatedAt, Expr::value(now))
            .filter(book_return::Column::Id.eq(id))
            .filter(book_return::Column::Status.eq(ReturnStatus::Pending))
            .exec(&txn)
            .await?;
        if flipped.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ServiceError::Conflict(format!(
                "return {} is not pending",
                id
            )));
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ReturnApproved {
                return_id: id,
                school_id: ret.school_id,
                book_id: ret.book_id,
                quantity: ret.quantity,
            })
            .await;

        info!(return_id = id, quantity = ret.quantity, "approved book return");
        self.reload(id).await
    }

    /// Rejects a pending return. No ledger interaction.
    #[instrument(skip(self))]
    pub async fn reject_return(&self, id: i32) -> Result<book_return::Model, ServiceError> {
        let db = &*self.db;

        let ret = book_return::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Return {} not found", id)))?;

        if ret.status != ReturnStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "return {} is not pending",
                id
            )));
        }

        let rejected = book_return::Entity::update_many()
            .col_expr(
                book_return::Column::Status,
                Expr::value(ReturnStatus::Rejected),
            )
            .col_expr(book_return::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(book_return::Column::Id.eq(id))
            .filter(book_return::Column::Status.eq(ReturnStatus::Pending))
            .exec(db)
            .await?;
        if rejected.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "return {} is not pending",
                id
            )));
        }

        self.event_sender
            .send_or_log(Event::ReturnRejected(id))
            .await;

        info!(return_id = id, "rejected book return");
        self.reload(id).await
    }

    /// Gets a return by id
    #[instrument(skip(self))]
    pub async fn get_return(&self, id: i32) -> Result<book_return::Model, ServiceError> {
        book_return::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Return {} not found", id)))
    }

    /// Lists returns with optional filters, newest first
    #[instrument(skip(self))]
    pub async fn list_returns(
        &self,
        filter: ReturnFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<book_return::Model>, u64), ServiceError> {
        let mut query = book_return::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(book_return::Column::Status.eq(status));
        }
        if let Some(school_id) = filter.school_id {
            query = query.filter(book_return::Column::SchoolId.eq(school_id));
        }

        let paginator = query
            .order_by_desc(book_return::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let returns = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((returns, total))
    }

    async fn reload(&self, id: i32) -> Result<book_return::Model, ServiceError> {
        book_return::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("return {} vanished after update", id))
            })
    }
}
