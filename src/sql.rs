//! Rendering search structures into SQLite.
//!
//! - [`render_predicate`] turns a [`Predicate`] into a `WHERE` fragment.
//!   Every value travels as a bind parameter; id sets are bound as one JSON
//!   array and expanded with `json_each`, so large scopes never hit the
//!   bind-variable limit.
//! - [`to_fts5`] turns a [`BooleanQuery`] into an FTS5 match expression.
//!   Every term is emitted as a quoted string, so characters that are
//!   operators in FTS5 syntax are matched literally.

use sitesearch_core::boolean::{tokenize, BooleanQuery, Occur, Term};
use sitesearch_core::filter::{Field, FilterValue, Predicate};
use sitesearch_core::sort::{Direction, SortClause, SortField};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
}

/// A SQL fragment and the values for its `?` placeholders, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlFragment {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

fn column(alias: &str, field: Field) -> String {
    match field {
        Field::Id => format!("{}.id", alias),
        Field::LastEdited => format!("{}.last_edited", alias),
    }
}

fn value(v: &FilterValue) -> SqlValue {
    match v {
        FilterValue::Int(i) => SqlValue::Int(*i),
        FilterValue::Timestamp(ts) => SqlValue::Int(ts.and_utc().timestamp()),
    }
}

/// Render `pred` against the table aliased as `alias`.
pub fn render_predicate(pred: &Predicate, alias: &str) -> SqlFragment {
    let mut out = SqlFragment::default();
    render_into(pred, alias, &mut out);
    out
}

fn render_into(pred: &Predicate, alias: &str, out: &mut SqlFragment) {
    match pred {
        Predicate::Never => out.sql.push_str("1 = 2"),
        Predicate::In { field, values } => {
            out.sql.push_str(&format!(
                "{} IN (SELECT value FROM json_each(?))",
                column(alias, *field)
            ));
            let json = format!(
                "[{}]",
                values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            );
            out.binds.push(SqlValue::Text(json));
        }
        Predicate::Compare { field, op, value: v } => {
            out.sql
                .push_str(&format!("{} {} ?", column(alias, *field), op.symbol()));
            out.binds.push(value(v));
        }
        Predicate::And(parts) => {
            if parts.is_empty() {
                out.sql.push_str("1 = 1");
                return;
            }
            out.sql.push('(');
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    out.sql.push_str(" AND ");
                }
                render_into(part, alias, out);
            }
            out.sql.push(')');
        }
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// One FTS5 string, or `None` if the term has no indexable token.
fn fts_term(term: &Term) -> Option<String> {
    let (text, prefix) = match term {
        Term::Word { text, prefix } => (text.as_str(), *prefix),
        Term::Phrase(text) => (text.as_str(), false),
    };
    if tokenize(text).is_empty() {
        return None;
    }
    Some(if prefix {
        format!("{} *", quote(text))
    } else {
        quote(text)
    })
}

/// FTS5 match expression for `query`, or `None` when nothing can match.
pub fn to_fts5(query: &BooleanQuery) -> Option<String> {
    let mut musts = Vec::new();
    for term in query.by_occur(Occur::Must) {
        // A required term with no tokens can never be satisfied.
        musts.push(fts_term(term)?);
    }
    let shoulds: Vec<String> = query.by_occur(Occur::Should).filter_map(fts_term).collect();
    let nots: Vec<String> = query.by_occur(Occur::MustNot).filter_map(fts_term).collect();

    let positive = if !musts.is_empty() {
        musts.join(" AND ")
    } else if !shoulds.is_empty() {
        shoulds.join(" OR ")
    } else {
        return None;
    };

    let mut expr = format!("({})", positive);
    for term in nots {
        expr.push_str(" NOT ");
        expr.push_str(&term);
    }
    Some(expr)
}

/// `ORDER BY` body for the unioned result set, with a stable tie-break.
pub fn order_by(sort: &SortClause) -> String {
    let column = match sort.field {
        SortField::Relevance => "relevance",
        SortField::LastEdited => "last_edited",
        SortField::Title => "title",
    };
    let direction = match sort.direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    };
    // 'page' sorts before 'file'.
    format!("{} {}, kind DESC, id ASC", column, direction)
}
