//! `/api/schemes/*`: static welfare scheme catalog.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::error::{ApiError, HandlerError, Summarize};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/schemes", get(list))
        .route("/api/schemes/search", get(search))
        .route("/api/schemes/categories/list", get(categories))
        .route("/api/schemes/active/list", get(active))
        .route("/api/schemes/category/{category}", get(by_category))
        .route("/api/schemes/{id}", get(by_id))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

async fn list(State(state): State<AppState>) -> Json<Value> {
    let all = state.schemes.all();
    Json(json!({
        "success": true,
        "count": all.len(),
        "data": all,
    }))
}

async fn by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let scheme = state
        .schemes
        .by_id(&id)
        .ok_or_else(|| ApiError::NotFound("Scheme not found".to_string()))
        .summarize("Failed to fetch scheme")?;
    Ok(Json(json!({
        "success": true,
        "data": scheme,
    })))
}

async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Json<Value> {
    let found = state.schemes.by_category(&category);
    Json(json!({
        "success": true,
        "category": category,
        "count": found.len(),
        "data": found,
    }))
}

async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Value>, HandlerError> {
    const SUMMARY: &str = "Search failed";
    let Query(p) = params.summarize(SUMMARY)?;
    let q = p
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::missing_query_param("q"))
        .summarize(SUMMARY)?;
    let found = state.schemes.search(&q);
    Ok(Json(json!({
        "success": true,
        "query": q,
        "count": found.len(),
        "data": found,
    })))
}

async fn categories(State(state): State<AppState>) -> Json<Value> {
    let cats = state.schemes.categories();
    Json(json!({
        "success": true,
        "count": cats.len(),
        "data": cats,
    }))
}

async fn active(State(state): State<AppState>) -> Json<Value> {
    let found = state.schemes.active(state.clock.now());
    Json(json!({
        "success": true,
        "count": found.len(),
        "data": found,
    }))
}
