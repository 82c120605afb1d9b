//! In-memory collaborators for tests and embedding.
//!
//! [`InMemorySite`] implements every trait in [`crate::store`] over plain
//! vectors. Matching follows [`BooleanQuery`] semantics and relevance is
//! the clause occurrence count. Excerpts are never highlighted.

use std::collections::{BTreeMap, HashSet, VecDeque};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::boolean::BooleanQuery;
use crate::filter::{Field, FilterValue, Predicate};
use crate::models::{
    format_ts_iso, ContentNode, HitKind, ImageTracking, Page, PermissionCode, ResultPage,
    SearchHit, SiteFile, SiteSnapshot,
};
use crate::sort::{Direction, SortField};

use super::{AttachmentTracker, ContentStore, EngineRequest, PermissionSource, SearchEngine};

const SNIPPET_CHARS: usize = 200;

/// In-memory site for testing.
#[derive(Debug, Default)]
pub struct InMemorySite {
    pages: Vec<Page>,
    files: Vec<SiteFile>,
    tracking: Vec<ImageTracking>,
    permissions: Vec<PermissionCode>,
}

impl InMemorySite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: SiteSnapshot) -> Self {
        Self {
            pages: snapshot.pages,
            files: snapshot.files,
            tracking: snapshot.tracking,
            permissions: snapshot.permissions,
        }
    }

    pub fn insert_page(&mut self, page: Page) {
        self.pages.retain(|p| p.id != page.id);
        self.pages.push(page);
    }

    pub fn insert_file(&mut self, file: SiteFile) {
        self.files.retain(|f| f.id != file.id);
        self.files.push(file);
    }

    pub fn track(&mut self, page_id: i64, file_id: i64) {
        self.tracking.push(ImageTracking { page_id, file_id });
    }

    pub fn insert_permission(&mut self, permission: PermissionCode) {
        self.permissions.retain(|p| p.code != permission.code);
        self.permissions.push(permission);
    }
}

fn record_lookup(id: i64, last_edited: &DateTime<Utc>) -> impl Fn(Field) -> Option<FilterValue> {
    let edited = last_edited.naive_utc();
    move |field| match field {
        Field::Id => Some(FilterValue::Int(id)),
        Field::LastEdited => Some(FilterValue::Timestamp(edited)),
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

struct Candidate {
    hit: SearchHit,
    edited: DateTime<Utc>,
}

fn admit(
    query: &BooleanQuery,
    inverted: bool,
    filter: Option<&Predicate>,
    lookup: impl Fn(Field) -> Option<FilterValue>,
    text: &str,
) -> Option<f64> {
    if let Some(filter) = filter {
        if !filter.evaluate(&lookup) {
            return None;
        }
    }
    if inverted {
        (!query.matches(text)).then_some(0.0)
    } else {
        query.score(text)
    }
}

#[async_trait]
impl ContentStore for InMemorySite {
    async fn find_by_segment(&self, segment: &str) -> Result<Option<ContentNode>> {
        Ok(self
            .pages
            .iter()
            .find(|p| p.url_segment == segment)
            .map(|p| ContentNode {
                id: p.id,
                url_segment: p.url_segment.clone(),
                title: p.title.clone(),
            }))
    }

    async fn load_descendant_ids(&self, id: i64, into: &mut Vec<i64>) -> Result<()> {
        let mut seen: HashSet<i64> = HashSet::from([id]);
        let mut queue: VecDeque<i64> = VecDeque::from([id]);

        while let Some(parent) = queue.pop_front() {
            for child in self.pages.iter().filter(|p| p.parent_id == Some(parent)) {
                if seen.insert(child.id) {
                    into.push(child.id);
                    queue.push_back(child.id);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AttachmentTracker for InMemorySite {
    async fn attachment_ids(&self, content_ids: &[i64]) -> Result<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .tracking
            .iter()
            .filter(|t| content_ids.contains(&t.page_id))
            .map(|t| t.file_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

#[async_trait]
impl SearchEngine for InMemorySite {
    async fn search(&self, req: &EngineRequest) -> Result<ResultPage> {
        let query = BooleanQuery::parse(&req.query);
        let mut candidates: Vec<Candidate> = Vec::new();

        for page in &self.pages {
            let text = format!("{} {}", page.title, page.content);
            let lookup = record_lookup(page.id, &page.last_edited);
            if let Some(relevance) =
                admit(&query, req.inverted, req.content_filter.as_ref(), lookup, &text)
            {
                candidates.push(Candidate {
                    hit: SearchHit {
                        kind: HitKind::Page,
                        id: page.id,
                        title: page.title.clone(),
                        snippet: excerpt(&page.content),
                        last_edited: format_ts_iso(&page.last_edited),
                        relevance,
                    },
                    edited: page.last_edited,
                });
            }
        }

        for file in &self.files {
            let text = format!("{} {} {}", file.title, file.filename, file.content);
            let lookup = record_lookup(file.id, &file.last_edited);
            if let Some(relevance) =
                admit(&query, req.inverted, req.attachment_filter.as_ref(), lookup, &text)
            {
                candidates.push(Candidate {
                    hit: SearchHit {
                        kind: HitKind::File,
                        id: file.id,
                        title: file.title.clone(),
                        snippet: excerpt(&file.content),
                        last_edited: format_ts_iso(&file.last_edited),
                        relevance,
                    },
                    edited: file.last_edited,
                });
            }
        }

        candidates.sort_by(|a, b| {
            let primary = match req.sort.field {
                SortField::Relevance => a
                    .hit
                    .relevance
                    .partial_cmp(&b.hit.relevance)
                    .unwrap_or(std::cmp::Ordering::Equal),
                SortField::LastEdited => a.edited.cmp(&b.edited),
                SortField::Title => a.hit.title.cmp(&b.hit.title),
            };
            let primary = match req.sort.direction {
                Direction::Asc => primary,
                Direction::Desc => primary.reverse(),
            };
            primary
                .then((a.hit.kind as u8).cmp(&(b.hit.kind as u8)))
                .then(a.hit.id.cmp(&b.hit.id))
        });

        let total = candidates.len();
        let items = candidates
            .into_iter()
            .skip(req.start)
            .take(req.page_size)
            .map(|c| c.hit)
            .collect();

        Ok(ResultPage {
            items,
            total,
            start: req.start,
            page_size: req.page_size,
        })
    }
}

#[async_trait]
impl PermissionSource for InMemorySite {
    async fn list_codes(&self, include_hidden: bool) -> Result<BTreeMap<String, String>> {
        Ok(self
            .permissions
            .iter()
            .filter(|p| include_hidden || !p.hidden)
            .map(|p| (p.code.clone(), p.label.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortKey;
    use chrono::TimeZone;

    fn page(id: i64, parent: Option<i64>, segment: &str, title: &str, content: &str) -> Page {
        Page {
            id,
            parent_id: parent,
            url_segment: segment.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            last_edited: Utc.with_ymd_and_hms(2024, 1, id as u32, 0, 0, 0).unwrap(),
        }
    }

    fn request(query: &str) -> EngineRequest {
        EngineRequest {
            query: query.to_string(),
            page_size: 10,
            start: 0,
            sort: SortKey::Relevance.clause(),
            content_filter: None,
            highlight: false,
            attachment_filter: None,
            inverted: false,
        }
    }

    fn site() -> InMemorySite {
        let mut site = InMemorySite::new();
        site.insert_page(page(1, None, "about", "About", "about our team"));
        site.insert_page(page(2, Some(1), "team", "Team", "team team members"));
        site.insert_page(page(3, Some(2), "alice", "Alice", "alice profile"));
        site.insert_page(page(4, None, "news", "News", "latest news"));
        site
    }

    #[tokio::test]
    async fn test_descendants_are_transitive() {
        let site = site();
        let mut ids = Vec::new();
        site.load_descendant_ids(1, &mut ids).await.unwrap();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_descendants_survive_cycles() {
        let mut site = site();
        site.insert_page(page(1, Some(3), "about", "About", ""));
        let mut ids = Vec::new();
        site.load_descendant_ids(1, &mut ids).await.unwrap();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_relevance_orders_hits() {
        let site = site();
        let page = site.search(&request("team")).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].id, 2);
    }

    #[tokio::test]
    async fn test_inverted_returns_non_matches() {
        let site = site();
        let mut req = request("team");
        req.inverted = true;
        let page = site.search(&req).await.unwrap();
        let ids: Vec<i64> = page.items.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_content_filter_applies_to_pages() {
        let site = site();
        let mut req = request("team about");
        req.content_filter = Some(Predicate::id_in([1]));
        let page = site.search(&req).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, 1);
    }

    #[tokio::test]
    async fn test_pagination_window() {
        let site = site();
        let mut req = request("");
        req.inverted = true;
        req.page_size = 2;
        req.start = 2;
        req.sort = SortKey::PageTitle.clause();
        let page = site.search(&req).await.unwrap();
        assert_eq!(page.total, 4);
        let titles: Vec<&str> = page.items.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["News", "Team"]);
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn test_hidden_permissions_filtered() {
        let mut site = InMemorySite::new();
        site.insert_permission(PermissionCode {
            code: "ADMIN".into(),
            label: "Full administrative rights".into(),
            hidden: false,
        });
        site.insert_permission(PermissionCode {
            code: "SECRET".into(),
            label: "Secret".into(),
            hidden: true,
        });
        assert_eq!(site.list_codes(false).await.unwrap().len(), 1);
        assert_eq!(site.list_codes(true).await.unwrap().len(), 2);
    }
}
