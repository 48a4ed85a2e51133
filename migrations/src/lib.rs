pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_catalog_tables;
mod m20240301_000002_create_schools_table;
mod m20240301_000003_create_inventory_tables;
mod m20240301_000004_create_transfer_tables;
mod m20240301_000005_create_billing_tables;
mod m20240301_000006_create_users_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_catalog_tables::Migration),
            Box::new(m20240301_000002_create_schools_table::Migration),
            Box::new(m20240301_000003_create_inventory_tables::Migration),
            Box::new(m20240301_000004_create_transfer_tables::Migration),
            Box::new(m20240301_000005_create_billing_tables::Migration),
            Box::new(m20240301_000006_create_users_table::Migration),
        ]
    }
}
