//! Sort resolution for search results.

use std::fmt;

use serde::Serialize;

/// Sort choices offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortKey {
    #[default]
    Relevance,
    LastUpdated,
    PageTitle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortField {
    Relevance,
    LastEdited,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Asc,
    Desc,
}

/// A concrete ordering: one field, one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortClause {
    pub field: SortField,
    pub direction: Direction,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Relevance, SortKey::LastUpdated, SortKey::PageTitle];

    /// Map the submitted `sortby` value; anything unrecognised is relevance.
    pub fn resolve(raw: Option<&str>) -> SortKey {
        match raw.map(str::trim) {
            Some("LastUpdated") => SortKey::LastUpdated,
            Some("PageTitle") => SortKey::PageTitle,
            _ => SortKey::Relevance,
        }
    }

    /// Value submitted by the form.
    pub fn key(self) -> &'static str {
        match self {
            SortKey::Relevance => "Relevance",
            SortKey::LastUpdated => "LastUpdated",
            SortKey::PageTitle => "PageTitle",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Relevance => "Relevance",
            SortKey::LastUpdated => "Last Updated",
            SortKey::PageTitle => "Page Title",
        }
    }

    pub fn clause(self) -> SortClause {
        let (field, direction) = match self {
            SortKey::Relevance => (SortField::Relevance, Direction::Desc),
            SortKey::LastUpdated => (SortField::LastEdited, Direction::Desc),
            SortKey::PageTitle => (SortField::Title, Direction::Asc),
        };
        SortClause { field, direction }
    }
}

impl fmt::Display for SortClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Relevance => "Relevance",
            SortField::LastEdited => "LastEdited",
            SortField::Title => "Title",
        };
        let dir = match self.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        write!(f, "{} {}", field, dir)
    }
}
