//! Core data models used throughout Site Search.
//!
//! These types describe the site content that gets searched (pages in the
//! site tree, uploaded files, the links between them) and the result pages
//! returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A page in the site tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub url_segment: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub last_edited: DateTime<Utc>,
}

/// An uploaded file or image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteFile {
    pub id: i64,
    pub filename: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub last_edited: DateTime<Utc>,
}

/// Records that a page's content references a file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImageTracking {
    pub page_id: i64,
    pub file_id: i64,
}

/// A permission code and its human-readable label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionCode {
    pub code: String,
    pub label: String,
    #[serde(default)]
    pub hidden: bool,
}

/// Everything a backend needs to serve searches, in one serializable bundle.
///
/// Used by `sitesearch import` and by [`InMemorySite::from_snapshot`](crate::store::memory::InMemorySite::from_snapshot).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteSnapshot {
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub files: Vec<SiteFile>,
    #[serde(default)]
    pub tracking: Vec<ImageTracking>,
    #[serde(default)]
    pub permissions: Vec<PermissionCode>,
}

/// A content node as returned by a lookup on its URL segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNode {
    pub id: i64,
    pub url_segment: String,
    pub title: String,
}

/// Which table a hit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HitKind {
    Page,
    File,
}

/// A single search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub kind: HitKind,
    pub id: i64,
    pub title: String,
    /// Excerpt, with highlight markers when the request asked for them.
    pub snippet: String,
    /// Last modification timestamp (ISO 8601).
    pub last_edited: String,
    /// Engine relevance; higher is better, `0.0` for inverted matches.
    pub relevance: f64,
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
pub struct ResultPage {
    pub items: Vec<SearchHit>,
    /// Number of matches across all pages.
    pub total: usize,
    pub start: usize,
    pub page_size: usize,
}

impl ResultPage {
    pub fn empty(start: usize, page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            start,
            page_size,
        }
    }

    pub fn has_more(&self) -> bool {
        self.start.saturating_add(self.items.len()) < self.total
    }

    /// Offset of the following page, if there is one.
    pub fn next_start(&self) -> Option<usize> {
        self.has_more()
            .then(|| self.start.saturating_add(self.page_size))
    }
}

/// Format a timestamp as ISO 8601.
pub fn format_ts_iso(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(total: usize, start: usize, len: usize) -> ResultPage {
        let items = (0..len)
            .map(|i| SearchHit {
                kind: HitKind::Page,
                id: i as i64,
                title: String::new(),
                snippet: String::new(),
                last_edited: String::new(),
                relevance: 0.0,
            })
            .collect();
        ResultPage {
            items,
            total,
            start,
            page_size: 10,
        }
    }

    #[test]
    fn test_next_start_when_more_remain() {
        let page = page_of(25, 10, 10);
        assert!(page.has_more());
        assert_eq!(page.next_start(), Some(20));
    }

    #[test]
    fn test_offset_near_usize_max_has_no_next() {
        let page = page_of(3, usize::MAX, 0);
        assert!(!page.has_more());
        assert_eq!(page.next_start(), None);
    }

    #[test]
    fn test_last_page_has_no_next() {
        let page = page_of(25, 20, 5);
        assert!(!page.has_more());
        assert_eq!(page.next_start(), None);
    }

    #[test]
    fn test_snapshot_defaults_missing_sections() {
        let snap: SiteSnapshot = serde_json::from_str(r#"{"pages": []}"#).unwrap();
        assert!(snap.files.is_empty());
        assert!(snap.permissions.is_empty());
    }
}
