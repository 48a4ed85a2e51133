//! Book catalog management.
//!
//! Books are soft-deactivated, never deleted; ledgers and invoices keep
//! their foreign keys valid. `get_book` is the existence check consumed
//! by the transfer and billing flows.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entities::{author, book},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Service for managing the book catalog
#[derive(Clone)]
pub struct BookService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Input for creating a book
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookInput {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 10))]
    pub isbn: String,
    pub author_id: i32,
    pub price: Decimal,
}

/// Input for updating a book
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateBookInput {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl BookService {
    /// Creates a new book service instance
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a book under an existing author
    #[instrument(skip(self))]
    pub async fn create_book(&self, input: CreateBookInput) -> Result<book::Model, ServiceError> {
        input.validate()?;
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }
        let db = &*self.db;

        author::Entity::find_by_id(input.author_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Author {} not found", input.author_id))
            })?;

        let existing = book::Entity::find()
            .filter(book::Column::Isbn.eq(&input.isbn))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "book with ISBN {} already exists",
                input.isbn
            )));
        }

        let now = Utc::now();
        let created = book::ActiveModel {
            title: Set(input.title),
            isbn: Set(input.isbn),
            author_id: Set(input.author_id),
            price: Set(input.price),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let created = created.insert(db).await?;

        self.event_sender
            .send_or_log(Event::BookCreated(created.id))
            .await;

        info!(book_id = created.id, "created book");
        Ok(created)
    }

    /// Updates a book's mutable fields; setting `is_active = false`
    /// retires it from the catalog.
    #[instrument(skip(self))]
    pub async fn update_book(
        &self,
        id: i32,
        input: UpdateBookInput,
    ) -> Result<book::Model, ServiceError> {
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price must not be negative".to_string(),
                ));
            }
        }

        let existing = self.get_book(id).await?;

        let mut active: book::ActiveModel = existing.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BookUpdated(updated.id))
            .await;

        Ok(updated)
    }

    /// Gets a book by id
    #[instrument(skip(self))]
    pub async fn get_book(&self, id: i32) -> Result<book::Model, ServiceError> {
        book::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book {} not found", id)))
    }

    /// Lists books with pagination, optional title search, and an
    /// active-only switch
    #[instrument(skip(self))]
    pub async fn list_books(
        &self,
        search: Option<String>,
        active_only: bool,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<book::Model>, u64), ServiceError> {
        let mut query = book::Entity::find();
        if let Some(needle) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(book::Column::Title.contains(needle.trim()));
        }
        if active_only {
            query = query.filter(book::Column::IsActive.eq(true));
        }

        let paginator = query
            .order_by_asc(book::Column::Title)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let books = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((books, total))
    }
}
