//! Partner school registration and approval.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entities::{school, school::SchoolStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Service for managing partner schools
#[derive(Clone)]
pub struct SchoolService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Input for registering a school
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterSchoolInput {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub address: Option<String>,
}

/// Filters accepted when listing schools
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct SchoolFilter {
    pub status: Option<SchoolStatus>,
}

impl SchoolService {
    /// Creates a new school service instance
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Registers a school in `Pending` state, awaiting admin approval
    #[instrument(skip(self))]
    pub async fn register_school(
        &self,
        input: RegisterSchoolInput,
    ) -> Result<school::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let existing = school::Entity::find()
            .filter(school::Column::Email.eq(&input.email))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "school with email {} already registered",
                input.email
            )));
        }

        let now = Utc::now();
        let registered = school::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            address: Set(input.address),
            status: Set(SchoolStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let registered = registered.insert(db).await?;

        self.event_sender
            .send_or_log(Event::SchoolRegistered(registered.id))
            .await;

        info!(school_id = registered.id, "registered school");
        Ok(registered)
    }

    /// Approves a pending registration
    #[instrument(skip(self))]
    pub async fn approve_school(&self, id: i32) -> Result<school::Model, ServiceError> {
        self.transition(id, SchoolStatus::Approved).await?;
        self.event_sender
            .send_or_log(Event::SchoolApproved(id))
            .await;
        info!(school_id = id, "approved school");
        self.get_school(id).await
    }

    /// Rejects a pending registration
    #[instrument(skip(self))]
    pub async fn reject_school(&self, id: i32) -> Result<school::Model, ServiceError> {
        self.transition(id, SchoolStatus::Rejected).await?;
        self.event_sender
            .send_or_log(Event::SchoolRejected(id))
            .await;
        info!(school_id = id, "rejected school");
        self.get_school(id).await
    }

    /// Gets a school by id
    #[instrument(skip(self))]
    pub async fn get_school(&self, id: i32) -> Result<school::Model, ServiceError> {
        school::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("School {} not found", id)))
    }

    /// Lists schools with an optional status filter
    #[instrument(skip(self))]
    pub async fn list_schools(
        &self,
        filter: SchoolFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<school::Model>, u64), ServiceError> {
        let mut query = school::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(school::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(school::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let schools = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((schools, total))
    }

    /// Pending-only status transition, guarded at the database so a
    /// concurrent decision cannot be overwritten.
    async fn transition(&self, id: i32, to: SchoolStatus) -> Result<(), ServiceError> {
        let db = &*self.db;

        let registered = school::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("School {} not found", id)))?;

        if registered.status != SchoolStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "school {} registration is not pending",
                id
            )));
        }

        let updated = school::Entity::update_many()
            .col_expr(school::Column::Status, Expr::value(to))
            .col_expr(school::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(school::Column::Id.eq(id))
            .filter(school::Column::Status.eq(SchoolStatus::Pending))
            .exec(db)
            .await?;
        if updated.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "school {} registration is not pending",
                id
            )));
        }

        Ok(())
    }
}
