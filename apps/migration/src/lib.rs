//! Schema migrations for the remote content backend.

use sea_orm_migration::prelude::*;

mod m20240101_000001_create_content_tables;
mod m20240101_000002_create_account_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_content_tables::Migration),
            Box::new(m20240101_000002_create_account_tables::Migration),
        ]
    }
}
