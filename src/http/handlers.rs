//! Route handlers.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::request::SearchRequest;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::store::{CredentialMatch, Dataset, DatasetStats};

const INDEX_HTML: &str = include_str!("../../static/index.html");
const APP_JS: &str = include_str!("../../static/app.js");

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<DatasetStats>, ApiError> {
    Ok(Json(state.store.stats().await?))
}

pub async fn check_password(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Vec<CredentialMatch>>, ApiError> {
    search(state, Dataset::Passwords, payload).await
}

pub async fn check_username(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Vec<CredentialMatch>>, ApiError> {
    search(state, Dataset::Usernames, payload).await
}

/// Validate, then run one match query against `dataset`.
async fn search(
    state: AppState,
    dataset: Dataset,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Vec<CredentialMatch>>, ApiError> {
    let Json(request) = payload?;
    if let Err(violations) = request.validate(state.limits.max_query_chars) {
        metrics::record_rejected("validation");
        return Err(ApiError::Validation(violations));
    }

    let query = request.into_query(dataset);
    tracing::debug!(
        dataset = %dataset,
        ignore_case = query.ignore_case,
        substring = query.substring,
        "Running match query"
    );

    let started = Instant::now();
    let matches = state.store.search(query).await?;
    metrics::record_search(dataset, started);

    tracing::info!(dataset = %dataset, matches = matches.len(), "Search complete");
    Ok(Json(matches))
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn app_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], APP_JS)
}
