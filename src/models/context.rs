use serde::Deserialize;

use crate::models::schema::DataTable;

#[derive(Debug, Deserialize)]
pub struct PreprocessRequest {
    pub query: String, // 用户提问内容
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
    /// 直接携带的数据集
    #[serde(default)]
    pub dataset: Option<DataTable>,
    /// 或者从已注册的数据源读取
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub term: String,
}
