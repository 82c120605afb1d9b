//! # Site Search
//!
//! Advanced full-text search over a site tree and its uploaded files.
//!
//! The storage-agnostic pipeline (keyword parsing, scope and date filters,
//! sort resolution, dispatch) lives in the `sitesearch-core` crate. This
//! crate supplies the SQLite backend, site import, the CLI and the HTTP
//! server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Snapshot   │──▶│    Import    │──▶│    SQLite    │
//! │   (JSON)    │   │   (upsert)   │   │ tables+FTS5  │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │ SqliteSite
//!                        ┌────────────────────┤
//!                        ▼                    ▼
//!                   ┌──────────┐        ┌──────────┐
//!                   │   CLI    │        │   HTTP   │
//!                   └──────────┘        └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`ingest`] | Site snapshot import |
//! | [`sql`] | Predicate and FTS5 rendering |
//! | [`sqlite_store`] | SQLite implementation of the collaborator traits |
//! | [`search`] | CLI search, query and permission commands |
//! | [`server`] | HTTP server |

pub mod config;
pub mod db;
pub mod ingest;
pub mod migrate;
pub mod search;
pub mod server;
pub mod sql;
pub mod sqlite_store;
