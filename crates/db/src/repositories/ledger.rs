//! Ledger repository for append-only ledger entries.
//!
//! Entries are only ever inserted; the table's triggers reject updates and
//! deletes. Reads serve the posting service (entries of a voucher) and the
//! reports (entries and balances in a date range).

use std::str::FromStr;

use chrono::NaiveDate;
use folio_core::ledger::{ACCOUNT_SCHEMA, AccountBalance, LedgerEntry, PARTY_SCHEMA, Posting};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::ledger_entries;

/// Read access to the ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Entries of one voucher in insertion order, reversals included.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn by_reference(
        &self,
        reference_type: &str,
        reference_name: &str,
    ) -> Result<Vec<LedgerEntry>, DbErr> {
        by_reference(&self.db, reference_type, reference_name).await
    }

    /// Entries of one account dated in `[from, to)`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn by_account(
        &self,
        account: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LedgerEntry>, DbErr> {
        let models = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::Account.eq(account))
            .filter(ledger_entries::Column::Date.gte(from))
            .filter(ledger_entries::Column::Date.lt(to))
            .order_by_asc(ledger_entries::Column::Date)
            .order_by_asc(ledger_entries::Column::Id)
            .all(&self.db)
            .await?;
        models.into_iter().map(to_entry).collect()
    }

    /// Net balance (debit positive) of one account over entries dated
    /// before `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balance_before(&self, account: &str, date: NaiveDate) -> Result<Decimal, DbErr> {
        let models = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::Account.eq(account))
            .filter(ledger_entries::Column::Date.lt(date))
            .all(&self.db)
            .await?;
        models
            .into_iter()
            .map(to_entry)
            .try_fold(Decimal::ZERO, |sum, entry| Ok(sum + entry?.signed_amount()))
    }

    /// Every entry dated in `[from, to)`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<LedgerEntry>, DbErr> {
        let models = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::Date.gte(from))
            .filter(ledger_entries::Column::Date.lt(to))
            .order_by_asc(ledger_entries::Column::Date)
            .order_by_asc(ledger_entries::Column::Id)
            .all(&self.db)
            .await?;
        models.into_iter().map(to_entry).collect()
    }

    /// Debit and credit totals per account for entries in `[from, to)`,
    /// sorted by account.
    ///
    /// Amounts are summed as decimals in memory; the database stores them
    /// as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balances(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AccountBalance>, DbErr> {
        let entries = self.between(from, to).await?;
        Ok(AccountBalance::from_entries(&entries))
    }
}

/// Appends a validated posting and returns the stored entries with their ids.
pub(crate) async fn insert_posting<C: ConnectionTrait>(
    conn: &C,
    posting: &Posting,
) -> Result<Vec<LedgerEntry>, DbErr> {
    let mut stored = Vec::with_capacity(posting.entries().len());
    for entry in posting.entries() {
        let model = ledger_entries::ActiveModel {
            id: NotSet,
            account: Set(entry.account.clone()),
            party: Set(entry.party.clone()),
            debit: Set(entry.debit.to_string()),
            credit: Set(entry.credit.to_string()),
            reference_type: Set(posting.reference_type.clone()),
            reference_name: Set(posting.reference_name.clone()),
            date: Set(posting.date),
            reverts: Set(entry.reverts),
            is_round_off: Set(entry.is_round_off),
        }
        .insert(conn)
        .await?;
        stored.push(to_entry(model)?);
    }
    Ok(stored)
}

/// Entries of one voucher in insertion order.
pub(crate) async fn by_reference<C: ConnectionTrait>(
    conn: &C,
    reference_type: &str,
    reference_name: &str,
) -> Result<Vec<LedgerEntry>, DbErr> {
    let models = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::ReferenceType.eq(reference_type))
        .filter(ledger_entries::Column::ReferenceName.eq(reference_name))
        .order_by_asc(ledger_entries::Column::Id)
        .all(conn)
        .await?;
    models.into_iter().map(to_entry).collect()
}

/// Whether any entry refers to the document, as voucher, account or party.
pub(crate) async fn is_referenced<C: ConnectionTrait>(
    conn: &C,
    schema: &str,
    name: &str,
) -> Result<bool, DbErr> {
    let mut cond = Condition::any().add(
        Condition::all()
            .add(ledger_entries::Column::ReferenceType.eq(schema))
            .add(ledger_entries::Column::ReferenceName.eq(name)),
    );
    if schema == ACCOUNT_SCHEMA {
        cond = cond.add(ledger_entries::Column::Account.eq(name));
    }
    if schema == PARTY_SCHEMA {
        cond = cond.add(ledger_entries::Column::Party.eq(name));
    }
    let found = ledger_entries::Entity::find().filter(cond).one(conn).await?;
    Ok(found.is_some())
}

fn to_entry(model: ledger_entries::Model) -> Result<LedgerEntry, DbErr> {
    let amount = |text: &str| {
        Decimal::from_str(text).map_err(|e| {
            DbErr::Type(format!("ledger entry {}: bad amount {text:?}: {e}", model.id))
        })
    };
    Ok(LedgerEntry {
        id: model.id,
        debit: amount(&model.debit)?,
        credit: amount(&model.credit)?,
        account: model.account,
        party: model.party,
        reference_type: model.reference_type,
        reference_name: model.reference_name,
        date: model.date,
        reverts: model.reverts,
        is_round_off: model.is_round_off,
    })
}
