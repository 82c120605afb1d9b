//! Section scoping.
//!
//! The form's `OnlyShow` checkboxes name site sections by URL segment. A
//! checkbox value may group several sections as a comma-joined list. Each
//! section pulls in its whole subtree and the files referenced from it.

use std::collections::BTreeSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::filter::Predicate;
use crate::store::{AttachmentTracker, ContentStore};

/// Section identifiers as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSelection {
    pub sections: Vec<String>,
}

impl ScopeSelection {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Individual URL segments, with comma-joined groups split apart.
    pub fn segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.sections
            .iter()
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Ids a scope selection resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedScope {
    pub content_ids: BTreeSet<i64>,
    pub attachment_ids: BTreeSet<i64>,
}

impl ResolvedScope {
    /// `ID IN (content ids)`, never-matching when nothing resolved.
    pub fn content_filter(&self) -> Predicate {
        Predicate::id_in(self.content_ids.iter().copied())
    }

    /// `ID IN (attachment ids)`, never-matching when there are none.
    pub fn attachment_filter(&self) -> Predicate {
        Predicate::id_in(self.attachment_ids.iter().copied())
    }
}

/// Resolve a selection into page and file ids.
///
/// Unknown segments are logged and skipped; only collaborator failures
/// abort resolution.
pub async fn resolve_scope<C, A>(
    content: &C,
    attachments: &A,
    selection: &ScopeSelection,
) -> Result<ResolvedScope>
where
    C: ContentStore + ?Sized,
    A: AttachmentTracker + ?Sized,
{
    let mut page_ids: Vec<i64> = Vec::new();
    let mut missing = 0usize;

    for segment in selection.segments() {
        let Some(node) = content.find_by_segment(segment).await? else {
            tracing::warn!(segment, "can't find a page with this URL segment, skipping");
            missing += 1;
            continue;
        };
        page_ids.push(node.id);
        content.load_descendant_ids(node.id, &mut page_ids).await?;
    }

    let content_ids: BTreeSet<i64> = page_ids.into_iter().collect();

    let attachment_ids: BTreeSet<i64> = if content_ids.is_empty() {
        BTreeSet::new()
    } else {
        let ids: Vec<i64> = content_ids.iter().copied().collect();
        attachments.attachment_ids(&ids).await?.into_iter().collect()
    };

    tracing::debug!(
        pages = content_ids.len(),
        files = attachment_ids.len(),
        missing,
        "scope resolved"
    );

    Ok(ResolvedScope {
        content_ids,
        attachment_ids,
    })
}
