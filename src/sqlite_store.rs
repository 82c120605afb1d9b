//! SQLite-backed collaborators.
//!
//! [`SqliteSite`] implements every trait in `sitesearch_core::store` over
//! the schema created by [`migrate`](crate::migrate). Full-text matching
//! uses FTS5: pages and files are searched in one `UNION ALL`, ranked by
//! `bm25()`, excerpted with `snippet()`.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::{Row, SqlitePool};

use sitesearch_core::boolean::BooleanQuery;
use sitesearch_core::filter::Predicate;
use sitesearch_core::models::{format_ts_iso, ContentNode, HitKind, ResultPage, SearchHit};
use sitesearch_core::store::{
    AttachmentTracker, ContentStore, EngineRequest, PermissionSource, SearchEngine,
};

use crate::sql::{order_by, render_predicate, to_fts5, SqlFragment, SqlValue};

const PLAIN_EXCERPT_CHARS: usize = 200;

pub struct SqliteSite {
    pool: SqlitePool,
    snippet_tokens: u32,
}

impl SqliteSite {
    pub fn new(pool: SqlitePool, snippet_tokens: u32) -> Self {
        Self {
            pool,
            snippet_tokens,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    binds: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for b in binds {
        query = match b {
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Text(s) => query.bind(s.as_str()),
        };
    }
    query
}

fn iso_from_unix(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| format_ts_iso(&dt))
        .unwrap_or_else(|| ts.to_string())
}

/// Table layout for one side of the union.
struct Source {
    kind: &'static str,
    table: &'static str,
    fts: &'static str,
    alias: &'static str,
    /// Index of the `content` column inside the FTS table.
    content_column: u32,
}

const PAGES: Source = Source {
    kind: "page",
    table: "site_tree",
    fts: "site_tree_fts",
    alias: "p",
    content_column: 1,
};

const FILES: Source = Source {
    kind: "file",
    table: "files",
    fts: "files_fts",
    alias: "f",
    content_column: 2,
};

impl SqliteSite {
    /// One `SELECT` of the union. Without an expression the branch keeps
    /// every row, which callers only ask for on inverted requests.
    fn branch(
        &self,
        src: &Source,
        expr: Option<&str>,
        req: &EngineRequest,
        filter: Option<&Predicate>,
    ) -> SqlFragment {
        let a = src.alias;
        let plain = format!("substr({}.content, 1, {})", a, PLAIN_EXCERPT_CHARS);
        let mut frag = SqlFragment::default();

        match expr {
            Some(expr) if !req.inverted => {
                let snippet = if req.highlight {
                    format!(
                        "snippet({}, {}, '<b>', '</b>', '...', {})",
                        src.fts, src.content_column, self.snippet_tokens
                    )
                } else {
                    plain
                };
                frag.sql = format!(
                    "SELECT '{kind}' AS kind, {a}.id AS id, {a}.title AS title, \
                     {a}.last_edited AS last_edited, -bm25({fts}) AS relevance, \
                     {snippet} AS snippet \
                     FROM {fts} JOIN {table} {a} ON {a}.id = {fts}.rowid \
                     WHERE {fts} MATCH ?",
                    kind = src.kind,
                    fts = src.fts,
                    table = src.table,
                );
                frag.binds.push(SqlValue::Text(expr.to_string()));
            }
            expr => {
                frag.sql = format!(
                    "SELECT '{kind}' AS kind, {a}.id AS id, {a}.title AS title, \
                     {a}.last_edited AS last_edited, 0.0 AS relevance, \
                     {plain} AS snippet \
                     FROM {table} {a} WHERE 1 = 1",
                    kind = src.kind,
                    table = src.table,
                );
                if let Some(expr) = expr {
                    frag.sql.push_str(&format!(
                        " AND {a}.id NOT IN (SELECT rowid FROM {fts} WHERE {fts} MATCH ?)",
                        fts = src.fts
                    ));
                    frag.binds.push(SqlValue::Text(expr.to_string()));
                }
            }
        }

        if let Some(filter) = filter {
            let rendered = render_predicate(filter, a);
            frag.sql.push_str(" AND ");
            frag.sql.push_str(&rendered.sql);
            frag.binds.extend(rendered.binds);
        }
        frag
    }
}

#[async_trait]
impl ContentStore for SqliteSite {
    async fn find_by_segment(&self, segment: &str) -> Result<Option<ContentNode>> {
        let row =
            sqlx::query("SELECT id, url_segment, title FROM site_tree WHERE url_segment = ?")
                .bind(segment)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|row| ContentNode {
            id: row.get("id"),
            url_segment: row.get("url_segment"),
            title: row.get("title"),
        }))
    }

    async fn load_descendant_ids(&self, id: i64, into: &mut Vec<i64>) -> Result<()> {
        // UNION (not UNION ALL) stops on cycles.
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            WITH RECURSIVE descendants(id) AS (
                SELECT id FROM site_tree WHERE parent_id = ?
                UNION
                SELECT s.id FROM site_tree s JOIN descendants d ON s.parent_id = d.id
            )
            SELECT id FROM descendants WHERE id != ? ORDER BY id
            "#,
        )
        .bind(id)
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        into.extend(ids);
        Ok(())
    }
}

#[async_trait]
impl AttachmentTracker for SqliteSite {
    async fn attachment_ids(&self, content_ids: &[i64]) -> Result<Vec<i64>> {
        if content_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = serde_json::to_string(content_ids)?;
        let files: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT file_id FROM page_image_tracking
            WHERE page_id IN (SELECT value FROM json_each(?))
            ORDER BY file_id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(files)
    }
}

#[async_trait]
impl SearchEngine for SqliteSite {
    async fn search(&self, req: &EngineRequest) -> Result<ResultPage> {
        let expr = to_fts5(&BooleanQuery::parse(&req.query));
        if expr.is_none() && !req.inverted {
            return Ok(ResultPage::empty(req.start, req.page_size));
        }

        let pages = self.branch(&PAGES, expr.as_deref(), req, req.content_filter.as_ref());
        let files = self.branch(&FILES, expr.as_deref(), req, req.attachment_filter.as_ref());

        let union = format!("{} UNION ALL {}", pages.sql, files.sql);
        let mut binds = pages.binds;
        binds.extend(files.binds);

        let count_sql = format!("SELECT COUNT(*) FROM ({})", union);
        tracing::debug!(sql = %count_sql, "count query");
        let total: i64 = bind_all(sqlx::query(&count_sql), &binds)
            .fetch_one(&self.pool)
            .await?
            .get(0);

        let page_sql = format!(
            "SELECT kind, id, title, last_edited, relevance, snippet FROM ({}) \
             ORDER BY {} LIMIT ? OFFSET ?",
            union,
            order_by(&req.sort)
        );
        let mut page_binds = binds;
        page_binds.push(SqlValue::Int(i64::try_from(req.page_size)?));
        page_binds.push(SqlValue::Int(i64::try_from(req.start)?));

        let rows = bind_all(sqlx::query(&page_sql), &page_binds)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .iter()
            .map(|row| {
                let kind: String = row.get("kind");
                let last_edited: i64 = row.get("last_edited");
                SearchHit {
                    kind: if kind == "file" {
                        HitKind::File
                    } else {
                        HitKind::Page
                    },
                    id: row.get("id"),
                    title: row.get("title"),
                    snippet: row.get("snippet"),
                    last_edited: iso_from_unix(last_edited),
                    relevance: row.get("relevance"),
                }
            })
            .collect();

        Ok(ResultPage {
            items,
            total: total as usize,
            start: req.start,
            page_size: req.page_size,
        })
    }
}

#[async_trait]
impl PermissionSource for SqliteSite {
    async fn list_codes(&self, include_hidden: bool) -> Result<BTreeMap<String, String>> {
        let rows = sqlx::query(
            "SELECT code, label FROM permission_codes WHERE ? OR hidden = 0 ORDER BY code",
        )
        .bind(include_hidden)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("code"), row.get("label")))
            .collect())
    }
}
