//! Site snapshot import.
//!
//! Loads a JSON [`SiteSnapshot`] and upserts it into the database in one
//! transaction. Pages and files keep the ids from the snapshot, and their
//! FTS rows are rewritten alongside them (`rowid = id`), so re-importing
//! the same file is a no-op.

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::{Sqlite, SqlitePool, Transaction};

use sitesearch_core::models::{ImageTracking, Page, PermissionCode, SiteFile, SiteSnapshot};

use crate::config::Config;
use crate::db;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub pages: usize,
    pub files: usize,
    pub tracking: usize,
    pub permissions: usize,
}

pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let snapshot: SiteSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;

    let pool = db::connect(config).await?;
    let stats = import_snapshot(&pool, &snapshot).await?;

    println!("import {}", path.display());
    println!("  pages: {}", stats.pages);
    println!("  files: {}", stats.files);
    println!("  tracking links: {}", stats.tracking);
    println!("  permission codes: {}", stats.permissions);
    println!("ok");

    pool.close().await;
    Ok(())
}

pub async fn import_snapshot(pool: &SqlitePool, snapshot: &SiteSnapshot) -> Result<ImportStats> {
    let mut tx = pool.begin().await?;
    let mut stats = ImportStats::default();

    for page in &snapshot.pages {
        upsert_page(&mut tx, page).await?;
        stats.pages += 1;
    }
    for file in &snapshot.files {
        upsert_file(&mut tx, file).await?;
        stats.files += 1;
    }
    for link in &snapshot.tracking {
        stats.tracking += insert_tracking(&mut tx, link).await?;
    }
    for permission in &snapshot.permissions {
        upsert_permission(&mut tx, permission).await?;
        stats.permissions += 1;
    }

    tx.commit().await?;
    tracing::info!(
        pages = stats.pages,
        files = stats.files,
        tracking = stats.tracking,
        permissions = stats.permissions,
        "snapshot imported"
    );
    Ok(stats)
}

async fn upsert_page(tx: &mut Transaction<'_, Sqlite>, page: &Page) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO site_tree (id, parent_id, url_segment, title, content, last_edited)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            parent_id = excluded.parent_id,
            url_segment = excluded.url_segment,
            title = excluded.title,
            content = excluded.content,
            last_edited = excluded.last_edited
        "#,
    )
    .bind(page.id)
    .bind(page.parent_id)
    .bind(&page.url_segment)
    .bind(&page.title)
    .bind(&page.content)
    .bind(page.last_edited.timestamp())
    .execute(&mut **tx)
    .await
    .with_context(|| format!("Failed to store page {} ({})", page.id, page.url_segment))?;

    sqlx::query("DELETE FROM site_tree_fts WHERE rowid = ?")
        .bind(page.id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("INSERT INTO site_tree_fts (rowid, title, content) VALUES (?, ?, ?)")
        .bind(page.id)
        .bind(&page.title)
        .bind(&page.content)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn upsert_file(tx: &mut Transaction<'_, Sqlite>, file: &SiteFile) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO files (id, filename, title, content, last_edited)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            filename = excluded.filename,
            title = excluded.title,
            content = excluded.content,
            last_edited = excluded.last_edited
        "#,
    )
    .bind(file.id)
    .bind(&file.filename)
    .bind(&file.title)
    .bind(&file.content)
    .bind(file.last_edited.timestamp())
    .execute(&mut **tx)
    .await
    .with_context(|| format!("Failed to store file {} ({})", file.id, file.filename))?;

    sqlx::query("DELETE FROM files_fts WHERE rowid = ?")
        .bind(file.id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("INSERT INTO files_fts (rowid, title, filename, content) VALUES (?, ?, ?, ?)")
        .bind(file.id)
        .bind(&file.title)
        .bind(&file.filename)
        .bind(&file.content)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Returns the number of new links (0 when already tracked).
async fn insert_tracking(tx: &mut Transaction<'_, Sqlite>, link: &ImageTracking) -> Result<usize> {
    let result =
        sqlx::query("INSERT OR IGNORE INTO page_image_tracking (page_id, file_id) VALUES (?, ?)")
            .bind(link.page_id)
            .bind(link.file_id)
            .execute(&mut **tx)
            .await?;
    Ok(result.rows_affected() as usize)
}

async fn upsert_permission(
    tx: &mut Transaction<'_, Sqlite>,
    permission: &PermissionCode,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO permission_codes (code, label, hidden) VALUES (?, ?, ?)
        ON CONFLICT(code) DO UPDATE SET
            label = excluded.label,
            hidden = excluded.hidden
        "#,
    )
    .bind(&permission.code)
    .bind(&permission.label)
    .bind(permission.hidden)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
