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
                    .table(StockRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockRequests::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StockRequests::SchoolId).integer().not_null())
                    .col(ColumnDef::new(StockRequests::BookId).integer().not_null())
                    .col(ColumnDef::new(StockRequests::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(StockRequests::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(StockRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_requests_school_id")
                            .from(StockRequests::Table, StockRequests::SchoolId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_requests_book_id")
                            .from(StockRequests::Table, StockRequests::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_requests_school_book_status")
                    .table(StockRequests::Table)
                    .col(StockRequests::SchoolId)
                    .col(StockRequests::BookId)
                    .col(StockRequests::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BookReturns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookReturns::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BookReturns::SchoolId).integer().not_null())
                    .col(ColumnDef::new(BookReturns::BookId).integer().not_null())
                    .col(ColumnDef::new(BookReturns::Quantity).integer().not_null())
                    .col(ColumnDef::new(BookReturns::Reason).string().null())
                    .col(
                        ColumnDef::new(BookReturns::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(BookReturns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BookReturns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_book_returns_school_id")
                            .from(BookReturns::Table, BookReturns::SchoolId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_book_returns_book_id")
                            .from(BookReturns::Table, BookReturns::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_book_returns_school_book_status")
                    .table(BookReturns::Table)
                    .col(BookReturns::SchoolId)
                    .col(BookReturns::BookId)
                    .col(BookReturns::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookReturns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StockRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum StockRequests {
    Table,
    Id,
    SchoolId,
    BookId,
    Quantity,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum BookReturns {
    Table,
    Id,
    SchoolId,
    BookId,
    Quantity,
    Reason,
    Status,
    CreatedAt,
    UpdatedAt,
}
