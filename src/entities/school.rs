use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Partner school entity. Registration lands in `Pending`; an admin
/// approves or rejects it before the school participates in transfers.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schools")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(nullable)]
    pub address: Option<String>,
    pub status: SchoolStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::school_stock::Entity")]
    SchoolStock,
    #[sea_orm(has_many = "super::stock_request::Entity")]
    StockRequests,
}

impl Related<super::school_stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolStock.def()
    }
}

impl Related<super::stock_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// School registration status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum SchoolStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}
