//! `SeaORM` Entity for the append-only ledger.

use sea_orm::entity::prelude::*;

/// Amounts are stored as decimal text so no precision is lost in SQLite.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub account: String,
    pub party: Option<String>,
    pub debit: String,
    pub credit: String,
    pub reference_type: String,
    pub reference_name: String,
    pub date: Date,
    pub reverts: Option<i64>,
    pub is_round_off: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
