//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration. They cover the fixed
//! tables only; document tables follow the loaded schemas and are synced
//! by the store on open.

pub use sea_orm_migration::prelude::*;

mod m20261016_000001_ledger;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20261016_000001_ledger::Migration)]
    }
}
