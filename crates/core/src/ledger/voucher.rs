//! Voucher extraction from documents.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::schema::VoucherKind;
use crate::schema::registry::{
    LINE_ACCOUNT_FIELD, LINE_AMOUNT_FIELD, VOUCHER_ACCOUNT_FIELD, VOUCHER_DATE_FIELD,
    VOUCHER_EXCHANGE_RATE_FIELD, VOUCHER_ITEMS_FIELD, VOUCHER_TOTAL_FIELD,
};

use super::error::LedgerError;

const PARTY_FIELD: &str = "party";
const IS_RETURN_FIELD: &str = "is_return";
const DISCOUNT_FIELD: &str = "discount_amount";

/// One line of a voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherLine {
    /// Income or expense account of the line.
    pub account: String,
    /// Line amount in voucher currency.
    pub amount: Decimal,
}

/// The part of an invoice the posting engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    /// Voucher name.
    pub name: String,
    /// Schema of the voucher document.
    pub reference_type: String,
    /// Posting rules.
    pub kind: VoucherKind,
    /// Return vouchers post every entry on the opposite side.
    pub is_return: bool,
    /// Posting date.
    pub date: NaiveDate,
    /// Customer or supplier.
    pub party: Option<String>,
    /// Receivable (sale) or payable (purchase) account.
    pub account: String,
    /// Voucher currency to base currency.
    pub exchange_rate: Decimal,
    /// Amount owed by or to the party.
    pub grand_total: Decimal,
    /// Discount granted on the voucher.
    pub discount_amount: Decimal,
    /// Lines in document order.
    pub lines: Vec<VoucherLine>,
}

impl Voucher {
    /// Reads a voucher from a submitted document.
    ///
    /// A missing exchange rate reads as 1 and missing amounts as zero.
    ///
    /// # Errors
    ///
    /// Returns `MissingAccount` when the header or a line has no account,
    /// `InvalidAmount` for negative amounts and `InvalidVoucher` for a
    /// missing date or a non-positive exchange rate.
    pub fn from_document(doc: &Document, kind: VoucherKind) -> Result<Self, LedgerError> {
        let invalid = |reason: &str| LedgerError::InvalidVoucher {
            voucher: doc.name.clone(),
            reason: reason.to_string(),
        };

        let date = doc
            .date(VOUCHER_DATE_FIELD)
            .ok_or_else(|| invalid("missing date"))?;
        let account = doc
            .text(VOUCHER_ACCOUNT_FIELD)
            .ok_or_else(|| LedgerError::MissingAccount {
                voucher: doc.name.clone(),
                role: "header".into(),
            })?
            .to_string();

        let exchange_rate = match doc.currency(VOUCHER_EXCHANGE_RATE_FIELD) {
            None => Decimal::ONE,
            Some(rate) if rate > Decimal::ZERO => rate,
            Some(_) => return Err(invalid("exchange rate must be positive")),
        };

        let amount = |source: &Document, field: &str| -> Result<Decimal, LedgerError> {
            let value = source.currency(field).unwrap_or_default();
            if value.is_sign_negative() && !value.is_zero() {
                return Err(LedgerError::InvalidAmount {
                    voucher: doc.name.clone(),
                    field: field.to_string(),
                    amount: value,
                });
            }
            Ok(value)
        };

        let mut lines = Vec::new();
        for (i, row) in doc.rows(VOUCHER_ITEMS_FIELD).iter().enumerate() {
            let account = row
                .text(LINE_ACCOUNT_FIELD)
                .ok_or_else(|| LedgerError::MissingAccount {
                    voucher: doc.name.clone(),
                    role: format!("line {}", i + 1),
                })?;
            lines.push(VoucherLine {
                account: account.to_string(),
                amount: amount(row, LINE_AMOUNT_FIELD)?,
            });
        }

        Ok(Self {
            name: doc.name.clone(),
            reference_type: doc.schema_name.clone(),
            kind,
            is_return: doc.check(IS_RETURN_FIELD),
            date,
            party: doc.text(PARTY_FIELD).map(str::to_string),
            account,
            exchange_rate,
            grand_total: amount(doc, VOUCHER_TOTAL_FIELD)?,
            discount_amount: amount(doc, DISCOUNT_FIELD)?,
            lines,
        })
    }
}
