//! # Site Search Core
//!
//! Storage-agnostic logic for the advanced site search: keyword parsing,
//! section scoping, date and sort resolution, engine dispatch, and the
//! collaborator traits a storage backend implements.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Backends live in
//! the application crate; [`store::memory::InMemorySite`] is provided for
//! tests and embedding.
//!
//! ## Request flow
//!
//! ```text
//! SearchForm ──┬─▶ query::parse_keywords ──┐
//!              ├─▶ scope::resolve_scope ───┤
//!              ├─▶ filter::date_filter ────┼─▶ EngineRequest ─▶ SearchEngine
//!              └─▶ SortKey::resolve ───────┘
//! ```

pub mod boolean;
pub mod error;
pub mod filter;
pub mod form;
pub mod models;
pub mod permission;
pub mod query;
pub mod scope;
pub mod search;
pub mod sort;
pub mod store;
