//! HTTP server.
//!
//! Serves the advanced search form over a JSON API. Form submissions are
//! accepted either as a query string (`GET`) or as an urlencoded body
//! (`POST`); both use the same field names as the HTML form.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`, `POST` | `/search` | Run a search, returns a result page |
//! | `GET`  | `/search/query` | The current query for a submission |
//! | `GET`  | `/search/form` | Field groups, names and sort options |
//! | `GET`  | `/permissions` | Permission code dropdown options |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid From date '2024-13-01': expected YYYY-MM-DD" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unavailable` (503), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use sitesearch_core::error::SearchError;
use sitesearch_core::form::{form_fields, FieldGroup, SearchForm, SUBMIT_ACTION};
use sitesearch_core::models::ResultPage;
use sitesearch_core::permission::PermissionDropdownField;
use sitesearch_core::query::{add_stars_to_keywords, parse_keywords};
use sitesearch_core::search::{advanced_search, SearchOptions};

use crate::config::Config;
use crate::db;
use crate::search::current_query;
use crate::sqlite_store::SqliteSite;

type Pairs = Vec<(String, String)>;

#[derive(Clone)]
struct AppState {
    site: Arc<SqliteSite>,
    options: Arc<SearchOptions>,
}

/// Starts the HTTP server on `[server].bind` and runs until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;

    let state = AppState {
        site: Arc::new(SqliteSite::new(pool, config.search.snippet_tokens)),
        options: Arc::new(config.search.options()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/search", get(handle_search_get).post(handle_search_post))
        .route("/search/query", get(handle_current_query))
        .route("/search/form", get(handle_form))
        .route("/permissions", get(handle_permissions))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    tracing::info!(bind = %bind_addr, "server listening");
    println!("Site search listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`).
    code: String,
    message: String,
}

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        let (status, code) = match &err {
            SearchError::InvalidDate { .. } | SearchError::InvalidStart(_) => {
                (StatusCode::BAD_REQUEST, "bad_request")
            }
            SearchError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            SearchError::Other(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        AppError {
            status,
            code: code.to_string(),
            message: format!("{:#}", err),
        }
    }
}

// ============ /search ============

async fn run_search(state: &AppState, pairs: Pairs) -> Result<Json<ResultPage>, AppError> {
    let form = SearchForm::from_pairs(pairs)?;
    let site = state.site.as_ref();
    let page = advanced_search(site, site, site, &form, &state.options).await?;
    Ok(Json(page))
}

async fn handle_search_get(
    State(state): State<AppState>,
    Query(pairs): Query<Pairs>,
) -> Result<Json<ResultPage>, AppError> {
    run_search(&state, pairs).await
}

async fn handle_search_post(
    State(state): State<AppState>,
    Form(pairs): Form<Pairs>,
) -> Result<Json<ResultPage>, AppError> {
    run_search(&state, pairs).await
}

// ============ GET /search/query ============

#[derive(Serialize)]
struct QueryResponse {
    /// Keywords as submitted, never inverted.
    current: String,
    /// Query text handed to the engine.
    engine: String,
    inverted: bool,
    sort: String,
}

async fn handle_current_query(
    State(state): State<AppState>,
    Query(pairs): Query<Pairs>,
) -> Result<Json<QueryResponse>, AppError> {
    let form = SearchForm::from_pairs(pairs)?;
    Ok(Json(describe_query(&form, &state.options)))
}

fn describe_query(form: &SearchForm, options: &SearchOptions) -> QueryResponse {
    let parsed = parse_keywords(&form.keywords);
    let engine = if options.wildcard_terms {
        add_stars_to_keywords(&parsed.text)
    } else {
        parsed.text
    };
    QueryResponse {
        current: current_query(form),
        engine,
        inverted: parsed.inverted,
        sort: form.sort_key().clause().to_string(),
    }
}

// ============ GET /search/form ============

#[derive(Serialize)]
struct FormResponse {
    groups: Vec<FieldGroup>,
    action: &'static str,
    submit: &'static str,
}

async fn handle_form() -> Json<FormResponse> {
    Json(FormResponse {
        groups: form_fields(),
        action: SUBMIT_ACTION.0,
        submit: SUBMIT_ACTION.1,
    })
}

// ============ GET /permissions ============

async fn handle_permissions(
    State(state): State<AppState>,
) -> Result<Json<PermissionDropdownField>, AppError> {
    let field = PermissionDropdownField::new("Permission", "Permission", state.site.as_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "permission lookup failed");
            internal(format!("{:#}", e))
        })?;
    Ok(Json(field))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
