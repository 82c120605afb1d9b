//! CLI front-ends for searching and listing permission codes.
//!
//! Each command opens the configured database, wraps it in a
//! [`SqliteSite`] and runs the core pipeline, then prints a plain-text
//! report to stdout.

use anyhow::Result;

use sitesearch_core::form::SearchForm;
use sitesearch_core::models::{HitKind, ResultPage};
use sitesearch_core::permission::PermissionDropdownField;
use sitesearch_core::query::{add_stars_to_keywords, compose_keywords, parse_keywords};
use sitesearch_core::search::{advanced_search, SearchOptions};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteSite;

/// Run one search against the configured database.
pub async fn search_site(
    config: &Config,
    form: &SearchForm,
    page_size: Option<usize>,
) -> Result<ResultPage> {
    let pool = db::connect(config).await?;
    let site = SqliteSite::new(pool, config.search.snippet_tokens);

    let mut options: SearchOptions = config.search.options();
    if let Some(size) = page_size {
        options.page_size = size.max(1);
    }

    let result = advanced_search(&site, &site, &site, form, &options).await;
    site.pool().close().await;
    Ok(result?)
}

pub async fn run_search(
    config: &Config,
    form: &SearchForm,
    page_size: Option<usize>,
) -> Result<()> {
    let page = search_site(config, form, page_size).await?;

    if page.items.is_empty() {
        println!("No results.");
        return Ok(());
    }

    println!(
        "Results {}-{} of {} for: {}",
        page.start.saturating_add(1),
        page.start.saturating_add(page.items.len()),
        page.total,
        current_query(form)
    );
    println!();

    for (i, hit) in page.items.iter().enumerate() {
        let kind = match hit.kind {
            HitKind::Page => "page",
            HitKind::File => "file",
        };
        println!(
            "{}. [{:.2}] {} / {}",
            page.start.saturating_add(i + 1),
            hit.relevance,
            kind,
            hit.title
        );
        println!("    updated: {}", hit.last_edited);
        println!("    excerpt: \"{}\"", hit.snippet.replace('\n', " ").trim());
        println!("    id: {}", hit.id);
        println!();
    }

    if let Some(next) = page.next_start() {
        println!("More results: --start {}", next);
    }
    Ok(())
}

/// The keywords as the user submitted them, folded into one string.
///
/// Never inverted, even when the search itself is.
pub fn current_query(form: &SearchForm) -> String {
    compose_keywords(&form.keywords)
}

/// Print the query sent to the engine and the current-query text.
pub fn run_query(config: &Config, form: &SearchForm) {
    let parsed = parse_keywords(&form.keywords);
    let engine_text = if config.search.wildcard_terms {
        add_stars_to_keywords(&parsed.text)
    } else {
        parsed.text.clone()
    };

    println!("current:  {}", current_query(form));
    println!("engine:   {}", engine_text);
    println!("inverted: {}", parsed.inverted);
    println!("sort:     {}", form.sort_key().clause());
}

pub async fn list_permissions(config: &Config) -> Result<PermissionDropdownField> {
    let pool = db::connect(config).await?;
    let site = SqliteSite::new(pool, config.search.snippet_tokens);
    let field = PermissionDropdownField::new("Permission", "Permission", &site).await;
    site.pool().close().await;
    field
}

pub async fn run_permissions(config: &Config) -> Result<()> {
    let field = list_permissions(config).await?;

    if field.options.is_empty() {
        println!("No permission codes.");
        return Ok(());
    }
    for (code, label) in &field.options {
        println!("{}\t{}", code, label);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitesearch_core::query::KeywordInput;

    #[test]
    fn test_current_query_is_never_inverted() {
        let form = SearchForm {
            keywords: KeywordInput {
                without_words: Some("draft  old".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(current_query(&form), "-draft -old");
    }
}
