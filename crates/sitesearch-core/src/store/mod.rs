//! Collaborator traits for Site Search.
//!
//! The search pipeline talks to storage only through these traits, so the
//! same dispatcher runs over SQLite in the application and over
//! [`memory::InMemorySite`] in tests.
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`ContentStore`] | Look up sections by URL segment, enumerate descendants |
//! | [`AttachmentTracker`] | Files referenced by a set of pages |
//! | [`SearchEngine`] | Full-text search with filters, sort and paging |
//! | [`PermissionSource`] | Known permission codes and labels |
//!
//! All lookups are read-only. Implementations must be `Send + Sync`.

pub mod memory;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::filter::Predicate;
use crate::models::{ContentNode, ResultPage};
use crate::sort::SortClause;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Find the page whose URL segment is `segment`.
    async fn find_by_segment(&self, segment: &str) -> Result<Option<ContentNode>>;

    /// Append the ids of every descendant of `id` (children, grandchildren,
    /// and so on) to `into`.
    async fn load_descendant_ids(&self, id: i64, into: &mut Vec<i64>) -> Result<()>;
}

#[async_trait]
pub trait AttachmentTracker: Send + Sync {
    /// Ids of files referenced by any of `content_ids`.
    async fn attachment_ids(&self, content_ids: &[i64]) -> Result<Vec<i64>>;
}

/// Everything a single search call carries.
#[derive(Debug, Clone, Serialize)]
pub struct EngineRequest {
    /// Query in the engine's boolean syntax.
    pub query: String,
    pub page_size: usize,
    pub start: usize,
    pub sort: SortClause,
    /// Applied to pages. `None` means unfiltered.
    pub content_filter: Option<Predicate>,
    /// Ask for highlighted excerpts.
    pub highlight: bool,
    /// Applied to files. `None` means unfiltered.
    pub attachment_filter: Option<Predicate>,
    /// Return documents that do NOT match `query`.
    pub inverted: bool,
}

#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn search(&self, request: &EngineRequest) -> Result<ResultPage>;
}

#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Map of permission code to label. Hidden codes are included only when
    /// `include_hidden` is set.
    async fn list_codes(&self, include_hidden: bool) -> Result<BTreeMap<String, String>>;
}
