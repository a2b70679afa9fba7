use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, instrument, warn};

use crate::core::comparison::{ComparisonColumns, ComparisonEngine, ComparisonInsight};
use crate::core::numeric::{format_value, json_number};
use crate::core::stats::TableStats;
use crate::infra::llm::TextGenerator;

pub const SYSTEM_ROLE: &str = "You are a senior data analysis assistant.";

const PREFAB_KEY: &str = "사전제작_비진행_비교";

const INSIGHT_TEMPLATE: &str = "다음은 특정 설비 배관 데이터에 대한 정량 분석 결과이다.
주어진 수치를 참고하여 현장 엔지니어 관점에서 의미 있는 인사이트를 5문장 이내로 생성하라.

단:
- 어떤 항목을 강조할지 스스로 판단하라.
- 비율 및 변화량은 반드시 JSON에 제공된 숫자만 사용한다.
- '계획 대비 시공', '합계 대비 비율', '가장 큰 항목', '사전제작 진행물량' 등은 필요 시 선택적으로 언급하라.
- '사전제작 vs 비진행 비교'는 반드시 \"사전제작은 비진행 대비 xx% 수준\"으로 표현하라.
- 사전제작이 적은 경우 '작게 나타났다' 또는 '상대적으로 적다' 등의 표현을 사용할 것.
- 인사이트는 '데이터를 해석한 문장'이어야 하며, 다시 숫자를 나열하지 마라.

JSON 데이터:
";

const SUMMARY_CLOSING: &str = " — 데이터 기반으로 AI 분석을 통해 인사이트와 활용방안을 제공합니다.";

/// 叙述结果：成功文本，或带原因的降级占位
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Narrative {
    Generated { text: String },
    Degraded { reason: String },
}

impl Narrative {
    pub fn text(&self) -> String {
        match self {
            Narrative::Generated { text } => text.clone(),
            Narrative::Degraded { reason } => format!("⚠️ 인사이트 생성 실패: {}", reason),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StatsRow {
    pub label: String,
    pub values: Map<String, Value>,
}

/// SUM/MEAN/MAX/MIN × 数值列
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct StatsTable {
    pub columns: Vec<String>,
    pub rows: Vec<StatsRow>,
}

impl StatsTable {
    pub fn cell(&self, label: &str, column: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .and_then(|r| r.values.get(column))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SmartReport {
    pub summary: String,
    pub statistics: StatsTable,
    pub narrative: Narrative,
}

pub struct InsightComposer {
    engine: ComparisonEngine,
    cleanup: Vec<Regex>,
}

impl InsightComposer {
    pub fn new(columns: ComparisonColumns) -> Result<Self, regex::Error> {
        let cleanup = [
            r"데이터프레임으로\s*보여줘",
            "보여줘",
            "데이터프레임",
            "알려줘",
            "구해줘",
            "리스트해줘",
            "정리해줘",
            "목록화해줘",
            "결과는",
            "합은",
            "총합은",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            engine: ComparisonEngine::new(columns),
            cleanup,
        })
    }

    pub fn engine(&self) -> &ComparisonEngine {
        &self.engine
    }

    /// 发给文本生成服务的 JSON 负载
    pub fn build_payload(&self, stats: &TableStats, insight: &ComparisonInsight) -> Value {
        let mut entries = Map::new();

        for (column, s) in stats.iter() {
            let mut entry = Map::new();
            entry.insert("sum".into(), json_number(s.sum, 2));
            if let Some(ratio) = insight.ratio_of(column) {
                entry.insert("ratio_to_total".into(), json_number(ratio, 1));
            }
            // 计划对比挂在实际施工列上，与普通条目合并
            for pair in insight.plan_vs_actual.iter().filter(|p| p.actual_column == column) {
                entry.insert("plan_to_real_ratio".into(), json_number(pair.ratio, 1));
                entry.insert("plan_to_real_diff".into(), json_number(pair.diff, 2));
                entry.insert("plan_to_real_trend".into(), json!(pair.trend.label()));
            }
            entries.insert(column.to_string(), Value::Object(entry));
        }

        match &insight.prefab {
            Some(Ok(prefab)) => {
                entries.insert(
                    PREFAB_KEY.into(),
                    json!({
                        "사전제작_물량합계": json_number(prefab.prefab_sum, 2),
                        "비진행_물량합계": json_number(prefab.non_prefab_sum, 2),
                        "사전제작_비율(비진행_기준%)": json_number(prefab.ratio, 1),
                        "비교결과": prefab.trend,
                    }),
                );
            }
            Some(Err(e)) => {
                entries.insert(PREFAB_KEY.into(), json!({ "오류": e.to_string() }));
            }
            None => {}
        }

        json!({
            "stats": Value::Object(entries),
            "total_sum": json_number(insight.total_sum, 2),
        })
    }

    pub fn build_prompt(&self, payload: &Value) -> String {
        let body = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
        format!("{}{}", INSIGHT_TEMPLATE, body)
    }

    /// 合计列只显示 SUM，其余格子为 `-`
    pub fn statistics_table(&self, stats: &TableStats) -> StatsTable {
        let grand_total = &self.engine.columns().grand_total;
        let labels = ["SUM", "MEAN", "MAX", "MIN"];
        let mut rows: Vec<StatsRow> = labels
            .iter()
            .map(|label| StatsRow {
                label: label.to_string(),
                values: Map::new(),
            })
            .collect();

        for (column, s) in stats.iter() {
            let is_total = column == grand_total;
            let cells = [s.sum, s.mean, s.max, s.min];
            for (idx, (row, value)) in rows.iter_mut().zip(cells).enumerate() {
                let text = if is_total && idx > 0 {
                    "-".to_string()
                } else {
                    format_value(value)
                };
                row.values.insert(column.to_string(), Value::String(text));
            }
        }

        StatsTable {
            columns: stats.iter().map(|(c, _)| c.to_string()).collect(),
            rows,
        }
    }

    /// 展示用的指令复述：去掉控制短语，补上固定结尾
    pub fn clean_directive(&self, directive: &str) -> String {
        let mut clean = directive.to_string();
        for pattern in &self.cleanup {
            clean = pattern.replace_all(&clean, "").trim().to_string();
        }
        clean.push_str(SUMMARY_CLOSING);
        clean
    }

    #[instrument(skip_all, fields(columns = stats.len()))]
    pub async fn compose(
        &self,
        stats: &TableStats,
        directive: &str,
        generator: &dyn TextGenerator,
    ) -> SmartReport {
        let insight = self.engine.compare(stats);
        let payload = self.build_payload(stats, &insight);
        let prompt = self.build_prompt(&payload);

        let narrative = match generator.generate(SYSTEM_ROLE, &prompt).await {
            Ok(text) => {
                info!("洞察文本生成成功");
                Narrative::Generated {
                    text: text.trim().to_string(),
                }
            }
            Err(e) => {
                warn!("洞察文本生成失败，使用占位文本: {}", e);
                Narrative::Degraded {
                    reason: e.to_string(),
                }
            }
        };

        let summary = format!(
            "📌 **AI 스마트 분석 결과**\n\n💬 분석 요청 요약: **{}**\n\n🧠 **LLM 인사이트 요약:**\n\n{}\n",
            self.clean_directive(directive),
            narrative.text().trim()
        );

        SmartReport {
            summary,
            statistics: self.statistics_table(stats),
            narrative,
        }
    }
}
