//! Filter predicates and query descriptions.
//!
//! A [`Query`] is a plain value: it can be stored, cloned and run again.
//! The store compiles it to SQL; [`Filter::matches`] evaluates the same
//! predicate over rows already in memory and must agree with the database.

use std::cmp::Ordering;

use folio_shared::types::PageRequest;
use serde::{Deserialize, Serialize};

use super::model::Row;
use super::value::Value;

/// Comparison applied by a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "value")]
pub enum Condition {
    /// `=`
    Eq(Value),
    /// `!=`
    Ne(Value),
    /// `>`
    Gt(Value),
    /// `<`
    Lt(Value),
    /// `>=`
    Ge(Value),
    /// `<=`
    Le(Value),
    /// Membership; an empty list matches nothing.
    In(Vec<Value>),
    /// SQL `LIKE` with `%` and `_` wildcards, ASCII case-insensitive.
    Like(String),
}

impl Condition {
    /// SQL spelling of the operator.
    #[must_use]
    pub const fn operator(&self) -> &'static str {
        match self {
            Self::Eq(_) => "=",
            Self::Ne(_) => "!=",
            Self::Gt(_) => ">",
            Self::Lt(_) => "<",
            Self::Ge(_) => ">=",
            Self::Le(_) => "<=",
            Self::In(_) => "in",
            Self::Like(_) => "like",
        }
    }
}

/// A single `field <op> operand` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Column the predicate applies to.
    pub field: String,
    /// Operator and operand.
    pub condition: Condition,
}

impl Filter {
    /// Creates a filter.
    #[must_use]
    pub fn new(field: impl Into<String>, condition: Condition) -> Self {
        Self {
            field: field.into(),
            condition,
        }
    }

    /// `field = value`
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Condition::Eq(value.into()))
    }

    /// `field != value`
    #[must_use]
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Condition::Ne(value.into()))
    }

    /// `field > value`
    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Condition::Gt(value.into()))
    }

    /// `field < value`
    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Condition::Lt(value.into()))
    }

    /// `field >= value`
    #[must_use]
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Condition::Ge(value.into()))
    }

    /// `field <= value`
    #[must_use]
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Condition::Le(value.into()))
    }

    /// `field in (values...)`
    #[must_use]
    pub fn is_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(
            field,
            Condition::In(values.into_iter().map(Into::into).collect()),
        )
    }

    /// `field like pattern`
    #[must_use]
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, Condition::Like(pattern.into()))
    }

    /// Evaluates the predicate against a row.
    ///
    /// Follows SQL semantics: a missing or `Null` column never matches, not
    /// even `!=`.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        let Some(value) = row.get(&self.field).filter(|v| !v.is_null()) else {
            return false;
        };
        let cmp = |operand: &Value| value.compare(operand);
        match &self.condition {
            Condition::Eq(v) => cmp(v) == Some(Ordering::Equal),
            Condition::Ne(v) => matches!(cmp(v), Some(Ordering::Less | Ordering::Greater)),
            Condition::Gt(v) => cmp(v) == Some(Ordering::Greater),
            Condition::Lt(v) => cmp(v) == Some(Ordering::Less),
            Condition::Ge(v) => matches!(cmp(v), Some(Ordering::Greater | Ordering::Equal)),
            Condition::Le(v) => matches!(cmp(v), Some(Ordering::Less | Ordering::Equal)),
            Condition::In(vs) => vs.iter().any(|v| cmp(v) == Some(Ordering::Equal)),
            Condition::Like(pattern) => value
                .as_str()
                .is_some_and(|text| like_match(pattern, text)),
        }
    }
}

/// SQLite `LIKE`: `%` matches any run, `_` one character, ASCII letters
/// compare case-insensitively.
fn like_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len()
            && (pattern[p] == '_' || pattern[p].eq_ignore_ascii_case(&text[t]))
        {
            p += 1;
            t += 1;
        } else if let Some((bp, bt)) = backtrack {
            p = bp + 1;
            t = bt + 1;
            backtrack = Some((bp, bt + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == '%')
}

/// Sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// Column to sort by.
    pub field: String,
    /// Descending instead of ascending.
    #[serde(default)]
    pub descending: bool,
}

/// A restartable query over one schema's table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Conjunction of predicates.
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Columns to return; all columns when `None`.
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    /// Sort keys, applied in order.
    #[serde(default)]
    pub sort: Vec<Sort>,
    /// Page to return; all rows when `None`.
    #[serde(default)]
    pub page: Option<PageRequest>,
}

impl Query {
    /// A query returning every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Restricts the returned columns.
    #[must_use]
    pub fn select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Appends an ascending sort key.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.sort.push(Sort {
            field: field.into(),
            descending: false,
        });
        self
    }

    /// Appends a descending sort key.
    #[must_use]
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.sort.push(Sort {
            field: field.into(),
            descending: true,
        });
        self
    }

    /// Returns one page of results.
    #[must_use]
    pub const fn paginate(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    /// Whether a row satisfies every filter.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}
