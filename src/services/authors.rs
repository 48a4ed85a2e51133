//! Author catalog management.

use chrono::Utc;
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
    entities::author,
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Service for managing catalog authors
#[derive(Clone)]
pub struct AuthorService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Input for creating an author
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAuthorInput {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub bio: Option<String>,
}

/// Input for updating an author
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateAuthorInput {
    pub name: Option<String>,
    pub bio: Option<String>,
}

impl AuthorService {
    /// Creates a new author service instance
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates an author
    #[instrument(skip(self))]
    pub async fn create_author(
        &self,
        input: CreateAuthorInput,
    ) -> Result<author::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let existing = author::Entity::find()
            .filter(author::Column::Email.eq(&input.email))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "author with email {} already exists",
                input.email
            )));
        }

        let now = Utc::now();
        let created = author::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            bio: Set(input.bio),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let created = created.insert(db).await?;

        self.event_sender
            .send_or_log(Event::AuthorCreated(created.id))
            .await;

        info!(author_id = created.id, "created author");
        Ok(created)
    }

    /// Updates an author's mutable fields
    #[instrument(skip(self))]
    pub async fn update_author(
        &self,
        id: i32,
        input: UpdateAuthorInput,
    ) -> Result<author::Model, ServiceError> {
        let existing = self.get_author(id).await?;

        let mut active: author::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        Ok(updated)
    }

    /// Gets an author by id
    #[instrument(skip(self))]
    pub async fn get_author(&self, id: i32) -> Result<author::Model, ServiceError> {
        author::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Author {} not found", id)))
    }

    /// Lists authors with pagination and optional name search
    #[instrument(skip(self))]
    pub async fn list_authors(
        &self,
        search: Option<String>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<author::Model>, u64), ServiceError> {
        let mut query = author::Entity::find();
        if let Some(needle) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(author::Column::Name.contains(needle.trim()));
        }

        let paginator = query
            .order_by_asc(author::Column::Name)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let authors = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((authors, total))
    }
}
