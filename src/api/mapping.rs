use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::ax_state::AppState;
use crate::models::context::ResolveQuery;
use crate::models::schema::{CreateDataSourceRequest, DataSource};

/// 查询某个词在同义词表里对应的规范名
pub async fn resolve_synonym(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> impl IntoResponse {
    match state.index.find_match(&params.term) {
        Some(hit) => Json(json!({
            "term": params.term,
            "table": hit.table,
            "canonical": hit.canonical,
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("등록되지 않은 용어: {}", params.term) })),
        )
            .into_response(),
    }
}

pub async fn register_data_source(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDataSourceRequest>,
) -> impl IntoResponse {
    if payload.id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "id is required").into_response();
    }
    state.pool_manager.register(DataSource {
        id: payload.id,
        db_type: payload.db_type,
        connection_url: payload.connection_url,
        display_name: payload.display_name,
    });
    (StatusCode::CREATED, "Source Registered").into_response()
}

pub async fn list_data_sources(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let list = state.pool_manager.list();
    info!("数据源列表: {} 个", list.len());
    Json(list)
}

/// 当前生效的词表 (内置或内部库覆盖后的)
pub async fn get_vocabulary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "columns": state.vocabulary.columns,
        "values": state.vocabulary.values,
        "index_keys": state.index.len(),
    }))
}
