//! Error taxonomy for the search dispatcher.

use thiserror::Error;

/// Errors surfaced by form parsing and [`dispatch`](crate::search::dispatch).
///
/// Collaborator traits return `anyhow::Result`; the dispatcher narrows
/// engine failures into [`SearchError::Unavailable`] and passes content
/// store failures through as [`SearchError::Other`].
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search engine unavailable: {0}")]
    Unavailable(String),

    #[error("invalid {field} date '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("invalid start offset '{0}'")]
    InvalidStart(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
