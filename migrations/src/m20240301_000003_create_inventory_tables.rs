use sea_orm_migration::prelude::*;

use super::m20240301_000001_create_catalog_tables::Books;
use super::m20240301_000002_create_schools_table::Schools;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WarehouseStock::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WarehouseStock::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WarehouseStock::BookId).integer().not_null())
                    .col(
                        ColumnDef::new(WarehouseStock::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WarehouseStock::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(WarehouseStock::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WarehouseStock::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_warehouse_stock_book_id")
                            .from(WarehouseStock::Table, WarehouseStock::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One ledger row per book.
        manager
            .create_index(
                Index::create()
                    .name("uq_warehouse_stock_book_id")
                    .table(WarehouseStock::Table)
                    .col(WarehouseStock::BookId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SchoolStock::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SchoolStock::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SchoolStock::SchoolId).integer().not_null())
                    .col(ColumnDef::new(SchoolStock::BookId).integer().not_null())
                    .col(
                        ColumnDef::new(SchoolStock::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SchoolStock::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SchoolStock::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_school_stock_school_id")
                            .from(SchoolStock::Table, SchoolStock::SchoolId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_school_stock_book_id")
                            .from(SchoolStock::Table, SchoolStock::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one row per (school, book) pair.
        manager
            .create_index(
                Index::create()
                    .name("uq_school_stock_school_book")
                    .table(SchoolStock::Table)
                    .col(SchoolStock::SchoolId)
                    .col(SchoolStock::BookId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SchoolStock::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WarehouseStock::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum WarehouseStock {
    Table,
    Id,
    BookId,
    Quantity,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum SchoolStock {
    Table,
    Id,
    SchoolId,
    BookId,
    Quantity,
    CreatedAt,
    UpdatedAt,
}
