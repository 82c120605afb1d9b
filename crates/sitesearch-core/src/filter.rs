//! Structured filter predicates.
//!
//! Filters are built as a small tree of typed comparisons instead of SQL
//! text. Backends render them into whatever they speak: the SQLite backend
//! turns them into a `WHERE` fragment with bind parameters, the in-memory
//! backend calls [`Predicate::evaluate`].

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Columns a predicate can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Field {
    Id,
    LastEdited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    Ge,
    Le,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FilterValue {
    Int(i64),
    Timestamp(NaiveDateTime),
}

impl FilterValue {
    fn compare(&self, other: &FilterValue) -> Option<Ordering> {
        match (self, other) {
            (FilterValue::Int(a), FilterValue::Int(b)) => Some(a.cmp(b)),
            (FilterValue::Timestamp(a), FilterValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Predicate {
    /// Matches nothing (`1 = 2`).
    Never,
    /// `field IN (values)`.
    In { field: Field, values: Vec<i64> },
    /// `field op value`.
    Compare {
        field: Field,
        op: CompareOp,
        value: FilterValue,
    },
    /// Conjunction of all parts.
    And(Vec<Predicate>),
}

impl Predicate {
    /// `field IN (ids)`, or [`Predicate::Never`] for an empty set.
    pub fn id_in<I: IntoIterator<Item = i64>>(ids: I) -> Self {
        let values: Vec<i64> = ids.into_iter().collect();
        if values.is_empty() {
            Predicate::Never
        } else {
            Predicate::In {
                field: Field::Id,
                values,
            }
        }
    }

    /// AND two optional predicates together, flattening nested conjunctions.
    pub fn and(left: Option<Predicate>, right: Option<Predicate>) -> Option<Predicate> {
        match (left, right) {
            (None, p) | (p, None) => p,
            (Some(a), Some(b)) => {
                let mut parts = Vec::new();
                for p in [a, b] {
                    match p {
                        Predicate::And(inner) => parts.extend(inner),
                        other => parts.push(other),
                    }
                }
                Some(Predicate::And(parts))
            }
        }
    }

    /// Evaluate against a record, looking field values up through `lookup`.
    ///
    /// A comparison whose field is missing or of another type is false.
    pub fn evaluate<F>(&self, lookup: &F) -> bool
    where
        F: Fn(Field) -> Option<FilterValue>,
    {
        match self {
            Predicate::Never => false,
            Predicate::In { field, values } => match lookup(*field) {
                Some(FilterValue::Int(v)) => values.contains(&v),
                _ => false,
            },
            Predicate::Compare { field, op, value } => {
                let Some(actual) = lookup(*field) else {
                    return false;
                };
                match (op, actual.compare(value)) {
                    (CompareOp::Ge, Some(ord)) => ord != Ordering::Less,
                    (CompareOp::Le, Some(ord)) => ord != Ordering::Greater,
                    (_, None) => false,
                }
            }
            Predicate::And(parts) => parts.iter().all(|p| p.evaluate(lookup)),
        }
    }
}

/// Optional last-edited bounds from the form.
///
/// `from` after `to` is accepted as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

/// `LastEdited >= from AND LastEdited <= to`, with either side optional.
///
/// Bounds are midnight of the given day, so `to` excludes edits made later
/// that same day.
pub fn date_filter(range: &DateRange) -> Option<Predicate> {
    let bound = |op, date| Predicate::Compare {
        field: Field::LastEdited,
        op,
        value: FilterValue::Timestamp(midnight(date)),
    };

    let lower = range.from.map(|d| bound(CompareOp::Ge, d));
    let upper = range.to.map(|d| bound(CompareOp::Le, d));
    Predicate::and(lower, upper)
}
