use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::core::insight::{InsightComposer, SmartReport};
use crate::core::preprocessor::Preprocessor;
use crate::core::stats;
use crate::errors::AnalysisError;
use crate::infra::executor::QueryExecutor;
use crate::infra::llm::TextGenerator;
use crate::models::schema::DataTable;

#[derive(Debug, Serialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalysisReport {
    /// 执行结果是表：附带统计表与洞察
    Table {
        request_id: Uuid,
        directive: String,
        table: DataTable,
        #[serde(flatten)]
        report: SmartReport,
    },
    /// 执行结果不是表，原样返回
    Value {
        request_id: Uuid,
        directive: String,
        result: Value,
    },
}

/// 一次提问的完整流程：预处理 -> 执行 -> 统计 -> 洞察
pub struct Analyzer {
    preprocessor: Arc<Preprocessor>,
    composer: InsightComposer,
    executor: Arc<dyn QueryExecutor>,
    generator: Arc<dyn TextGenerator>,
}

impl Analyzer {
    pub fn new(
        preprocessor: Arc<Preprocessor>,
        composer: InsightComposer,
        executor: Arc<dyn QueryExecutor>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            preprocessor,
            composer,
            executor,
            generator,
        }
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    #[instrument(skip(self, dataset), fields(request_id))]
    pub async fn analyze(&self, query: &str, dataset: &DataTable) -> Result<AnalysisReport, AnalysisError> {
        if query.trim().is_empty() {
            return Err(AnalysisError::EmptyQuery);
        }
        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));

        let directive = self.preprocessor.process(query).to_string();

        let outcome = self
            .executor
            .execute(&directive, dataset)
            .await
            .map_err(|e| {
                warn!("执行器失败，终止本次分析: {:#}", e);
                AnalysisError::ExecutionFailed(format!("{:#}", e))
            })?;

        let table = match outcome.into_table() {
            Ok(table) => table,
            Err(other) => {
                info!("执行结果不是表，直接返回");
                return Ok(AnalysisReport::Value {
                    request_id,
                    directive,
                    result: other.into_value(),
                });
            }
        };

        let table_stats = stats::analyze(&table);
        let report = self
            .composer
            .compose(&table_stats, &directive, self.generator.as_ref())
            .await;
        info!("分析完成: 数值列 {} 个", table_stats.len());

        Ok(AnalysisReport::Table {
            request_id,
            directive,
            table,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comparison::ComparisonColumns;
    use crate::core::insight::Narrative;
    use crate::core::vocabulary::Vocabulary;
    use crate::errors::GenerationError;
    use crate::models::schema::ExecutionOutcome;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct StubExecutor {
        outcome: Option<ExecutionOutcome>,
        directives: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl QueryExecutor for StubExecutor {
        async fn execute(&self, directive: &str, _dataset: &DataTable) -> anyhow::Result<ExecutionOutcome> {
            self.directives.lock().unwrap().push(directive.to_string());
            self.outcome
                .clone()
                .ok_or_else(|| anyhow::anyhow!("코드 실행 실패"))
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, GenerationError> {
            Ok("인사이트".to_string())
        }
    }

    fn analyzer(outcome: Option<ExecutionOutcome>) -> (Analyzer, Arc<StubExecutor>) {
        let executor = Arc::new(StubExecutor {
            outcome,
            directives: Mutex::new(Vec::new()),
        });
        let analyzer = Analyzer::new(
            Arc::new(Preprocessor::new(Vocabulary::shared()).unwrap()),
            InsightComposer::new(ComparisonColumns::default()).unwrap(),
            executor.clone(),
            Arc::new(EchoGenerator),
        );
        (analyzer, executor)
    }

    #[tokio::test]
    async fn table_result_produces_report() {
        let outcome: ExecutionOutcome = serde_json::from_value(json!({
            "type": "dataframe",
            "value": { "columns": ["장비명", "길이"], "rows": [["A1B", 1], ["A1B", 3]] }
        }))
        .unwrap();
        let (analyzer, executor) = analyzer(Some(outcome));

        let report = analyzer
            .analyze("2층 드레인 물량 알려줘", &DataTable::default())
            .await
            .unwrap();

        assert_eq!(
            executor.directives.lock().unwrap().as_slice(),
            ["(Floor == \"2F\") AND (UT == \"Drain\") 물량들 데이터프레임으로 보여줘"]
        );
        match report {
            AnalysisReport::Table { report, .. } => {
                assert_eq!(report.statistics.cell("SUM", "길이"), Some("4"));
                assert_eq!(
                    report.narrative,
                    Narrative::Generated {
                        text: "인사이트".into()
                    }
                );
            }
            other => panic!("예상과 다른 결과: {:?}", other),
        }
    }

    #[tokio::test]
    async fn scalar_result_is_returned_verbatim() {
        let (analyzer, _) = analyzer(Some(ExecutionOutcome::Value(json!(42))));
        let report = analyzer.analyze("총합 알려줘", &DataTable::default()).await.unwrap();

        assert!(matches!(report, AnalysisReport::Value { result, .. } if result == json!(42)));
    }

    #[tokio::test]
    async fn executor_failure_aborts_analysis() {
        let (analyzer, _) = analyzer(None);
        let err = analyzer.analyze("물량 알려줘", &DataTable::default()).await.unwrap_err();

        assert!(matches!(err, AnalysisError::ExecutionFailed(ref msg) if msg.contains("코드 실행 실패")));
        assert!(err.to_string().starts_with("분석 오류:"));
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let (analyzer, executor) = analyzer(None);
        let err = analyzer.analyze("  ", &DataTable::default()).await.unwrap_err();

        assert!(matches!(err, AnalysisError::EmptyQuery));
        assert!(executor.directives.lock().unwrap().is_empty());
    }
}
