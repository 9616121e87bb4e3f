//! Ledger and naming series migration.
//!
//! Creates the append-only `ledger_entries` table and the `number_series`
//! counters used for `PREFIX-00001` document names.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(LEDGER_SQL).await?;
        db.execute_unprepared(SERIES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS number_series; DROP TABLE IF EXISTS ledger_entries;",
        )
        .await?;
        Ok(())
    }
}

const LEDGER_SQL: &str = r"
-- Ledger entries; amounts as decimal text, never updated or deleted
CREATE TABLE ledger_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account TEXT NOT NULL,
    party TEXT,
    debit TEXT NOT NULL DEFAULT '0',
    credit TEXT NOT NULL DEFAULT '0',
    reference_type TEXT NOT NULL,
    reference_name TEXT NOT NULL,
    date TEXT NOT NULL,
    reverts INTEGER REFERENCES ledger_entries(id),
    is_round_off INTEGER NOT NULL DEFAULT 0
);

-- Account statements and trial balance
CREATE INDEX idx_ledger_entries_account_date ON ledger_entries(account, date);

-- Entries of one voucher
CREATE INDEX idx_ledger_entries_reference ON ledger_entries(reference_type, reference_name);

-- Corrections are new offsetting entries
CREATE TRIGGER trg_ledger_entries_no_update
BEFORE UPDATE ON ledger_entries
BEGIN
    SELECT RAISE(ABORT, 'ledger entries are append-only');
END;

CREATE TRIGGER trg_ledger_entries_no_delete
BEFORE DELETE ON ledger_entries
BEGIN
    SELECT RAISE(ABORT, 'ledger entries are append-only');
END;
";

const SERIES_SQL: &str = r"
-- Last number handed out per naming series prefix
CREATE TABLE number_series (
    prefix TEXT PRIMARY KEY,
    current INTEGER NOT NULL DEFAULT 0
);
";
