//! Search dispatch.
//!
//! [`build_request`] runs the keyword parser, scope resolution, date filter
//! and sort resolver over a [`SearchForm`] and assembles one
//! [`EngineRequest`]. [`dispatch`] hands it to a [`SearchEngine`] and
//! narrows engine failures into [`SearchError::Unavailable`].
//!
//! # Filter composition
//!
//! | Form state | Content filter | Attachment filter |
//! |------------|----------------|-------------------|
//! | no sections, no dates | none | none |
//! | no sections, dates | dates | dates |
//! | sections | `ID IN (pages)` AND dates | `ID IN (files)` AND dates |
//!
//! An empty id set renders as the never-matching predicate, so a scope
//! that resolved to nothing returns nothing rather than everything.

use crate::error::SearchError;
use crate::filter::{date_filter, Predicate};
use crate::form::SearchForm;
use crate::models::ResultPage;
use crate::query::{add_stars_to_keywords, parse_keywords};
use crate::scope::resolve_scope;
use crate::store::{AttachmentTracker, ContentStore, EngineRequest, SearchEngine};

/// Knobs that come from configuration rather than the form.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub page_size: usize,
    /// Append `*` to bare words before dispatch.
    pub wildcard_terms: bool,
    pub highlight: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            wildcard_terms: true,
            highlight: true,
        }
    }
}

/// Assemble the engine request for a form submission.
pub async fn build_request<C, A>(
    content: &C,
    attachments: &A,
    form: &SearchForm,
    options: &SearchOptions,
) -> Result<EngineRequest, SearchError>
where
    C: ContentStore + ?Sized,
    A: AttachmentTracker + ?Sized,
{
    let parsed = parse_keywords(&form.keywords);
    let query = if options.wildcard_terms {
        add_stars_to_keywords(&parsed.text)
    } else {
        parsed.text
    };

    let (scope_content, scope_files) = if form.only_show.is_empty() {
        (None, None)
    } else {
        let scope = resolve_scope(content, attachments, &form.only_show).await?;
        (Some(scope.content_filter()), Some(scope.attachment_filter()))
    };

    let dates = date_filter(&form.dates);

    Ok(EngineRequest {
        query,
        page_size: options.page_size,
        start: form.start,
        sort: form.sort_key().clause(),
        content_filter: Predicate::and(scope_content, dates.clone()),
        highlight: options.highlight,
        attachment_filter: Predicate::and(scope_files, dates),
        inverted: parsed.inverted,
    })
}

/// Issue a single search call.
pub async fn dispatch<E>(engine: &E, request: &EngineRequest) -> Result<ResultPage, SearchError>
where
    E: SearchEngine + ?Sized,
{
    tracing::info!(
        query = %request.query,
        inverted = request.inverted,
        sort = %request.sort,
        start = request.start,
        page_size = request.page_size,
        "search_start"
    );

    let page = engine.search(request).await.map_err(|e| {
        tracing::error!(error = %e, "search engine call failed");
        SearchError::Unavailable(format!("{:#}", e))
    })?;

    tracing::info!(
        total = page.total,
        returned = page.items.len(),
        "search_done"
    );
    Ok(page)
}

/// Build and dispatch in one step.
pub async fn advanced_search<C, A, E>(
    content: &C,
    attachments: &A,
    engine: &E,
    form: &SearchForm,
    options: &SearchOptions,
) -> Result<ResultPage, SearchError>
where
    C: ContentStore + ?Sized,
    A: AttachmentTracker + ?Sized,
    E: SearchEngine + ?Sized,
{
    let request = build_request(content, attachments, form, options).await?;
    dispatch(engine, &request).await
}
