//! Schema migrations.
//!
//! Creates the site tables and their FTS5 indexes. Every statement is
//! idempotent, so `sitesearch init` can be run repeatedly.
//!
//! | Table | Contents |
//! |-------|----------|
//! | `site_tree` | pages, with `parent_id` forming the tree |
//! | `files` | uploaded files and images |
//! | `page_image_tracking` | page → file references |
//! | `permission_codes` | permission codes and labels |
//! | `site_tree_fts`, `files_fts` | FTS5 indexes keyed by `rowid = id` |

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS site_tree (
            id INTEGER PRIMARY KEY,
            parent_id INTEGER,
            url_segment TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            last_edited INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            id INTEGER PRIMARY KEY,
            filename TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            last_edited INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS page_image_tracking (
            page_id INTEGER NOT NULL,
            file_id INTEGER NOT NULL,
            PRIMARY KEY (page_id, file_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS permission_codes (
            code TEXT PRIMARY KEY,
            label TEXT NOT NULL,
            hidden INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    // FTS5 CREATE is not idempotent natively, so we check first
    for (table, columns) in [
        ("site_tree_fts", "title, content"),
        ("files_fts", "title, filename, content"),
    ] {
        let exists: bool = sqlx::query_scalar(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?",
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            sqlx::query(&format!(
                "CREATE VIRTUAL TABLE {} USING fts5({})",
                table, columns
            ))
            .execute(pool)
            .await?;
        }
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_site_tree_parent ON site_tree(parent_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_site_tree_last_edited ON site_tree(last_edited DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tracking_file ON page_image_tracking(file_id)")
        .execute(pool)
        .await?;

    Ok(())
}
