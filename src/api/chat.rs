use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::ax_state::AppState;
use crate::errors::AnalysisError;
use crate::infra::db_external::PoolManager;
use crate::models::context::{AnalyzeRequest, PreprocessRequest};
use crate::models::schema::DataTable;

/// 只做预处理，返回标准化后的指令文本
pub async fn preprocess(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PreprocessRequest>,
) -> impl IntoResponse {
    if payload.query.trim().is_empty() {
        return error_response(AnalysisError::EmptyQuery);
    }
    let directive = state.analyzer.preprocessor().process(&payload.query);
    info!("预处理完成: {}", directive);
    Json(json!({ "directive": directive.to_string() })).into_response()
}

/// 完整分析：预处理 -> 执行器 -> 统计 -> 洞察
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    if payload.query.trim().is_empty() {
        return error_response(AnalysisError::EmptyQuery);
    }

    let dataset = match resolve_dataset(&state.pool_manager, &payload).await {
        Ok(d) => d,
        Err(e) => return error_response(e),
    };

    match state.analyzer.analyze(&payload.query, &dataset).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

/// 请求里直接带的数据集优先，其次读取已注册的数据源
async fn resolve_dataset(pools: &PoolManager, req: &AnalyzeRequest) -> Result<DataTable, AnalysisError> {
    if let Some(dataset) = &req.dataset {
        return Ok(dataset.clone());
    }
    match (&req.source_id, &req.table) {
        (Some(source_id), Some(table)) => pools.fetch_table(source_id, table).await.map_err(|e| {
            warn!("数据集读取失败: {:#}", e);
            AnalysisError::DatasetUnavailable(format!("{:#}", e))
        }),
        _ => Err(AnalysisError::DatasetUnavailable(
            "dataset 또는 source_id + table 이 필요합니다".to_string(),
        )),
    }
}

fn error_response(err: AnalysisError) -> Response {
    let status = match &err {
        AnalysisError::EmptyQuery | AnalysisError::DatasetUnavailable(_) => StatusCode::BAD_REQUEST,
        AnalysisError::ExecutionFailed(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
