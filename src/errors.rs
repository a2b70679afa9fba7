use thiserror::Error;

/// 单次分析请求中会中断整条流水线的错误
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("분석 질문을 입력해주세요.")]
    EmptyQuery,

    #[error("데이터셋을 불러오지 못했습니다: {0}")]
    DatasetUnavailable(String),

    /// 执行器失败，唯一的致命错误类别
    #[error("분석 오류: {0}")]
    ExecutionFailed(String),
}

/// 文本生成服务调用失败，只会降级为占位文本
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API 키가 설정되지 않았습니다")]
    MissingApiKey,

    #[error("요청 실패: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API 오류 ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("응답에 내용이 없습니다")]
    EmptyResponse,
}
