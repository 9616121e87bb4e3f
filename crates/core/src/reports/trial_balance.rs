//! Trial balance over the account tree.
//!
//! Leaf balances come from ledger entries in the date range; group accounts
//! show the sum of all their descendants. Each row shows its net balance
//! on the debit or credit side.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use folio_shared::AccountingConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{ReportError, check_range};
use super::types::{Cell, Column, ColumnType, ReportRow};
use crate::ledger::AccountBalance;

/// Report filters. The date range is half-open: `[from_date, to_date)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrialBalanceFilters {
    /// First day included.
    pub from_date: NaiveDate,
    /// First day excluded.
    pub to_date: NaiveDate,
}

impl TrialBalanceFilters {
    /// Checks the date range.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidDateRange` when `from_date` is after
    /// `to_date`.
    pub fn validate(&self) -> Result<(), ReportError> {
        check_range(self.from_date, self.to_date)
    }
}

/// An account of the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountNode {
    /// Account name.
    pub name: String,
    /// Parent group, if any.
    pub parent: Option<String>,
    /// Whether the account is a group.
    pub is_group: bool,
}

/// One account line of the trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    /// Account name.
    pub account: String,
    /// Depth in the account tree, roots at 0.
    pub depth: usize,
    /// Whether the account is a group.
    pub is_group: bool,
    /// Net debit balance, zero if the account is in credit.
    pub debit: Decimal,
    /// Net credit balance, zero if the account is in debit.
    pub credit: Decimal,
}

/// Trial balance lines plus totals over leaf accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// Lines in tree order.
    pub lines: Vec<TrialBalanceLine>,
    /// Sum of leaf debit balances.
    pub total_debit: Decimal,
    /// Sum of leaf credit balances.
    pub total_credit: Decimal,
}

/// Builds the trial balance.
///
/// Accounts that appear in `balances` but not in `accounts` are shown as
/// roots. A parent chain that loops back on itself stops rolling up at the
/// repeat, and the loop is listed from its first account by name.
#[must_use]
pub fn build(accounts: &[AccountNode], balances: &[AccountBalance]) -> TrialBalance {
    let mut nodes: BTreeMap<&str, &AccountNode> =
        accounts.iter().map(|a| (a.name.as_str(), a)).collect();
    let orphans: Vec<AccountNode> = balances
        .iter()
        .filter(|b| !nodes.contains_key(b.account.as_str()))
        .map(|b| AccountNode {
            name: b.account.clone(),
            parent: None,
            is_group: false,
        })
        .collect();
    nodes.extend(orphans.iter().map(|a| (a.name.as_str(), a)));

    // Roll every leaf net up through its ancestors.
    let mut net: BTreeMap<&str, Decimal> = BTreeMap::new();
    for balance in balances {
        let mut seen = HashSet::new();
        let mut current = Some(balance.account.as_str());
        while let Some(name) = current {
            if !seen.insert(name) {
                break;
            }
            *net.entry(name).or_default() += balance.net();
            current = nodes
                .get(name)
                .and_then(|n| n.parent.as_deref())
                .filter(|p| nodes.contains_key(p));
        }
    }

    let mut children: BTreeMap<Option<&str>, Vec<&str>> = BTreeMap::new();
    for node in nodes.values() {
        let parent = node
            .parent
            .as_deref()
            .filter(|p| nodes.contains_key(p) && *p != node.name);
        children.entry(parent).or_default().push(node.name.as_str());
    }

    let mut lines = Vec::with_capacity(nodes.len());
    let mut visited = HashSet::new();
    // Accounts on a parent cycle never hang below a root; they start their
    // own subtree after the rest of the chart.
    let roots = children.get(&None).map_or(&[][..], Vec::as_slice);
    for root in roots.iter().copied().chain(nodes.keys().copied()) {
        let mut stack = vec![(root, 0)];
        while let Some((name, depth)) = stack.pop() {
            if !visited.insert(name) {
                continue;
            }
            let amount = net.get(name).copied().unwrap_or_default();
            let is_group = nodes.get(name).is_some_and(|n| n.is_group);
            lines.push(TrialBalanceLine {
                account: name.to_string(),
                depth,
                is_group,
                debit: amount.max(Decimal::ZERO),
                credit: (-amount).max(Decimal::ZERO),
            });
            if let Some(kids) = children.get(&Some(name)) {
                stack.extend(kids.iter().rev().map(|k| (*k, depth + 1)));
            }
        }
    }

    let leaf_nets = balances.iter().map(AccountBalance::net);
    let (total_debit, total_credit) = leaf_nets.fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(debit, credit), n| (debit + n.max(Decimal::ZERO), credit + (-n).max(Decimal::ZERO)),
    );

    TrialBalance {
        lines,
        total_debit,
        total_credit,
    }
}

/// Column metadata.
#[must_use]
pub fn columns() -> Vec<Column> {
    vec![
        Column::new("Account", "account", ColumnType::Text, 240),
        Column::new("Debit", "debit", ColumnType::Currency, 140),
        Column::new("Credit", "credit", ColumnType::Currency, 140),
    ]
}

/// Formats the trial balance as report rows, totals last.
#[must_use]
pub fn to_report_rows(report: &TrialBalance, config: &AccountingConfig) -> Vec<ReportRow> {
    let money = |amount| Cell::money(amount, config.currency);
    let mut rows: Vec<ReportRow> = report
        .lines
        .iter()
        .map(|line| {
            let mut row = ReportRow::new()
                .cell("account", Cell::text(line.account.clone()))
                .cell("debit", money(line.debit))
                .cell("credit", money(line.credit));
            row.depth = line.depth;
            row.bold = line.is_group;
            row
        })
        .collect();

    let mut total = ReportRow::new()
        .cell("account", Cell::text("Total"))
        .cell("debit", money(report.total_debit))
        .cell("credit", money(report.total_credit));
    total.bold = true;
    rows.push(total);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn node(name: &str, parent: Option<&str>, is_group: bool) -> AccountNode {
        AccountNode {
            name: name.into(),
            parent: parent.map(str::to_string),
            is_group,
        }
    }

    fn balance(account: &str, debit: Decimal, credit: Decimal) -> AccountBalance {
        AccountBalance {
            account: account.into(),
            debit_total: debit,
            credit_total: credit,
        }
    }

    fn chart() -> Vec<AccountNode> {
        vec![
            node("Assets", None, true),
            node("Current Assets", Some("Assets"), true),
            node("Cash", Some("Current Assets"), false),
            node("Debtors", Some("Current Assets"), false),
            node("Income", None, true),
            node("Sales", Some("Income"), false),
        ]
    }

    #[test]
    fn test_group_roll_up_and_tree_order() {
        let balances = [
            balance("Cash", dec!(50), dec!(0)),
            balance("Debtors", dec!(100), dec!(50)),
            balance("Sales", dec!(0), dec!(100)),
        ];
        let report = build(&chart(), &balances);
        let names: Vec<_> = report.lines.iter().map(|l| l.account.as_str()).collect();
        assert_eq!(
            names,
            ["Assets", "Current Assets", "Cash", "Debtors", "Income", "Sales"]
        );

        let assets = &report.lines[0];
        assert_eq!(assets.depth, 0);
        assert_eq!(assets.debit, dec!(100));
        assert_eq!(report.lines[2].depth, 2);
        assert_eq!(report.lines[4].credit, dec!(100));
        assert_eq!(report.total_debit, dec!(100));
        assert_eq!(report.total_credit, dec!(100));
    }

    #[test]
    fn test_orphan_balance_is_root() {
        let report = build(&[], &[balance("Suspense", dec!(5), dec!(0))]);
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].depth, 0);
    }

    #[test]
    fn test_parent_cycle_still_listed() {
        let mut accounts = chart();
        accounts.push(node("A", Some("B"), true));
        accounts.push(node("B", Some("A"), true));
        accounts.push(node("Loose", Some("B"), false));
        let report = build(
            &accounts,
            &[balance("Loose", dec!(7), dec!(0)), balance("Sales", dec!(0), dec!(7))],
        );

        let lines: Vec<_> = report
            .lines
            .iter()
            .map(|l| (l.account.as_str(), l.depth))
            .collect();
        assert_eq!(lines.len(), accounts.len());
        assert_eq!(&lines[lines.len() - 3..], [("A", 0), ("B", 1), ("Loose", 2)]);

        let loose = report.lines.iter().find(|l| l.account == "Loose").unwrap();
        assert_eq!(loose.debit, dec!(7));
        let listed_debit: Decimal = report
            .lines
            .iter()
            .filter(|l| !l.is_group)
            .map(|l| l.debit)
            .sum();
        assert_eq!(listed_debit, report.total_debit);
    }

    #[test]
    fn test_report_rows_end_with_total() {
        let report = build(&chart(), &[balance("Cash", dec!(10), dec!(0))]);
        let rows = to_report_rows(&report, &AccountingConfig::default());
        let total = rows.last().unwrap();
        assert!(total.bold);
        assert_eq!(total.get("debit").unwrap().display, "10.00");
        assert_eq!(rows[0].get("account").unwrap().display, "Assets");
    }
}
