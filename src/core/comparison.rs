use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::numeric::round_dp;
use crate::core::stats::TableStats;

/// 参与对比的指定列
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonColumns {
    pub grand_total: String,
    pub planned_marker: String,
    pub actual_marker: String,
    pub prefab: String,
    pub non_prefab: Vec<String>,
}

impl Default for ComparisonColumns {
    fn default() -> Self {
        Self {
            grand_total: "합계(1+2+4+5)".to_string(),
            planned_marker: "당초계획".to_string(),
            actual_marker: "실제시공".to_string(),
            prefab: "사전제작○_B(H_UP구간)(4)_실제시공_길이".to_string(),
            non_prefab: vec![
                "사전제작X_비대상(일부공정)(1)_길이".to_string(),
                "사전제작X_A(장비단Final)(2)_길이".to_string(),
                "사전제작X_C(TV단Final)(5)_길이".to_string(),
            ],
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum PlanTrend {
    AbovePlan,
    BelowPlan,
    OnPlan,
}

impl PlanTrend {
    pub fn label(&self) -> &'static str {
        match self {
            PlanTrend::AbovePlan => "시공이 계획보다 많음",
            PlanTrend::BelowPlan => "시공이 계획보다 적음",
            PlanTrend::OnPlan => "계획과 동일",
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PlanVsActual {
    pub planned_column: String,
    pub actual_column: String,
    pub ratio: f64,
    pub diff: f64,
    pub trend: PlanTrend,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PrefabComparison {
    pub prefab_sum: f64,
    pub non_prefab_sum: f64,
    pub ratio: f64,
    pub trend: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComparisonError {
    #[error("{column} 합계가 유한한 값이 아닙니다: {value}")]
    NonFinite { column: String, value: f64 },
}

/// 派生结论，每次请求重新计算
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonInsight {
    pub total_sum: f64,
    /// 合计列 sum <= 0 时为空
    pub ratio_to_total: Vec<(String, f64)>,
    pub plan_vs_actual: Vec<PlanVsActual>,
    /// 非预制合计 <= 0 时为 None
    pub prefab: Option<Result<PrefabComparison, ComparisonError>>,
}

impl ComparisonInsight {
    pub fn ratio_of(&self, column: &str) -> Option<f64> {
        self.ratio_to_total.iter().find(|(c, _)| c == column).map(|(_, r)| *r)
    }
}

pub struct ComparisonEngine {
    columns: ComparisonColumns,
}

impl ComparisonEngine {
    pub fn new(columns: ComparisonColumns) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &ComparisonColumns {
        &self.columns
    }

    pub fn compare(&self, stats: &TableStats) -> ComparisonInsight {
        let total_sum = stats.sum_of(&self.columns.grand_total);

        let ratio_to_total = if total_sum > 0.0 {
            stats
                .iter()
                .map(|(name, s)| (name.to_string(), round_dp(s.sum / total_sum * 100.0, 1)))
                .collect()
        } else {
            Vec::new()
        };

        let insight = ComparisonInsight {
            total_sum,
            ratio_to_total,
            plan_vs_actual: self.plan_vs_actual(stats),
            prefab: self.prefab(stats),
        };
        debug!(
            "对比计算完成: total={}, plan_pairs={}",
            insight.total_sum,
            insight.plan_vs_actual.len()
        );
        insight
    }

    fn plan_vs_actual(&self, stats: &TableStats) -> Vec<PlanVsActual> {
        let mut pairs = Vec::new();
        for (planned_column, planned) in stats.iter() {
            let has_plan = planned.sum > 0.0;
            if !planned_column.contains(&self.columns.planned_marker) || !has_plan {
                continue;
            }
            for (actual_column, actual) in stats.iter() {
                if !actual_column.contains(&self.columns.actual_marker) {
                    continue;
                }
                let (plan, real) = (planned.sum, actual.sum);
                let trend = if real > plan {
                    PlanTrend::AbovePlan
                } else if real < plan {
                    PlanTrend::BelowPlan
                } else {
                    PlanTrend::OnPlan
                };
                pairs.push(PlanVsActual {
                    planned_column: planned_column.to_string(),
                    actual_column: actual_column.to_string(),
                    ratio: round_dp(real / plan * 100.0, 1),
                    diff: round_dp(real - plan, 2),
                    trend,
                });
            }
        }
        pairs
    }

    fn prefab(&self, stats: &TableStats) -> Option<Result<PrefabComparison, ComparisonError>> {
        let prefab_sum = stats.sum_of(&self.columns.prefab);
        let non_prefab_sum: f64 = self.columns.non_prefab.iter().map(|c| stats.sum_of(c)).sum();

        if let Err(e) = self
            .ensure_finite(&self.columns.prefab, prefab_sum)
            .and_then(|_| self.ensure_finite("비진행_물량합계", non_prefab_sum))
        {
            warn!("预制对比计算失败: {}", e);
            return Some(Err(e));
        }
        let has_non_prefab = non_prefab_sum > 0.0;
        if !has_non_prefab {
            return None;
        }

        let ratio = round_dp(prefab_sum / non_prefab_sum * 100.0, 1);
        let trend = if ratio > 100.0 {
            format!(
                "사전제작 진행물량은 비진행 물량보다 {:?}배 많습니다.",
                round_dp(ratio / 100.0, 2)
            )
        } else if ratio == 100.0 {
            "사전제작 진행물량과 비진행 물량은 동일한 수준입니다.".to_string()
        } else {
            format!(
                "사전제작 진행물량은 비진행 물량 대비 {:?}% 수준으로 상대적으로 적습니다.",
                ratio
            )
        };

        Some(Ok(PrefabComparison {
            prefab_sum,
            non_prefab_sum,
            ratio,
            trend,
        }))
    }

    fn ensure_finite(&self, column: &str, value: f64) -> Result<(), ComparisonError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(ComparisonError::NonFinite {
                column: column.to_string(),
                value,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stats::{analyze, ColumnStats};
    use crate::models::schema::DataTable;
    use rstest::*;
    use serde_json::json;

    const PLANNED: &str = "사전제작○_B(H_UP구간)(3)_당초계획_길이";
    const ACTUAL: &str = "사전제작○_B(H_UP구간)(4)_실제시공_길이";
    const TOTAL: &str = "합계(1+2+4+5)";

    fn stats(sums: &[(&str, f64)]) -> TableStats {
        sums.iter()
            .map(|(name, sum)| {
                (
                    name.to_string(),
                    ColumnStats {
                        sum: *sum,
                        mean: *sum,
                        max: *sum,
                        min: *sum,
                    },
                )
            })
            .collect()
    }

    #[fixture]
    fn engine() -> ComparisonEngine {
        ComparisonEngine::new(ComparisonColumns::default())
    }

    #[rstest]
    #[case::above(100.0, 120.0, 120.0, 20.0, PlanTrend::AbovePlan)]
    #[case::below(200.0, 150.0, 75.0, -50.0, PlanTrend::BelowPlan)]
    #[case::equal(80.0, 80.0, 100.0, 0.0, PlanTrend::OnPlan)]
    fn plan_vs_actual(
        engine: ComparisonEngine,
        #[case] plan: f64,
        #[case] real: f64,
        #[case] ratio: f64,
        #[case] diff: f64,
        #[case] trend: PlanTrend,
    ) {
        let insight = engine.compare(&stats(&[(PLANNED, plan), (ACTUAL, real)]));

        assert_eq!(
            insight.plan_vs_actual,
            vec![PlanVsActual {
                planned_column: PLANNED.to_string(),
                actual_column: ACTUAL.to_string(),
                ratio,
                diff,
                trend,
            }]
        );
    }

    #[rstest]
    fn nan_plan_omits_comparison(engine: ComparisonEngine) {
        let insight = engine.compare(&stats(&[(PLANNED, f64::NAN), (ACTUAL, 120.0)]));
        assert!(insight.plan_vs_actual.is_empty());
    }

    #[rstest]
    fn nan_cells_do_not_reach_plan_comparison(engine: ComparisonEngine) {
        let table = DataTable::new(
            vec![PLANNED.into(), ACTUAL.into(), "x".into()],
            vec![
                vec![json!("nan"), json!(120), json!(5)],
                vec![json!(null), json!(0), json!("NaN")],
            ],
        );
        let insight = engine.compare(&analyze(&table));
        assert!(insight.plan_vs_actual.is_empty());
    }

    #[rstest]
    fn trend_label_for_overrun(engine: ComparisonEngine) {
        let insight = engine.compare(&stats(&[(PLANNED, 100.0), (ACTUAL, 120.0)]));
        assert_eq!(insight.plan_vs_actual[0].trend.label(), "시공이 계획보다 많음");
    }

    #[rstest]
    fn zero_plan_omits_comparison(engine: ComparisonEngine) {
        let insight = engine.compare(&stats(&[(PLANNED, 0.0), (ACTUAL, 120.0)]));
        assert!(insight.plan_vs_actual.is_empty());
    }

    #[rstest]
    fn ratio_to_total_needs_positive_total(engine: ComparisonEngine) {
        let insight = engine.compare(&stats(&[("a", 25.0), (TOTAL, 75.0)]));
        assert_eq!(insight.ratio_of("a"), Some(33.3));
        assert_eq!(insight.ratio_of(TOTAL), Some(100.0));

        let insight = engine.compare(&stats(&[("a", 25.0), (TOTAL, 0.0)]));
        assert!(insight.ratio_to_total.is_empty());

        let insight = engine.compare(&stats(&[("a", 25.0)]));
        assert!(insight.ratio_to_total.is_empty());
    }

    #[rstest]
    #[case::more(
        300.0,
        "사전제작 진행물량은 비진행 물량보다 1.5배 많습니다."
    )]
    #[case::equal(200.0, "사전제작 진행물량과 비진행 물량은 동일한 수준입니다.")]
    #[case::less(
        50.0,
        "사전제작 진행물량은 비진행 물량 대비 25.0% 수준으로 상대적으로 적습니다."
    )]
    fn prefab_trend(engine: ComparisonEngine, #[case] prefab: f64, #[case] expected: &str) {
        let insight = engine.compare(&stats(&[
            ("사전제작X_비대상(일부공정)(1)_길이", 50.0),
            ("사전제작X_A(장비단Final)(2)_길이", 100.0),
            ("사전제작X_C(TV단Final)(5)_길이", 50.0),
            (ACTUAL, prefab),
        ]));

        let prefab = insight.prefab.unwrap().unwrap();
        assert_eq!(prefab.non_prefab_sum, 200.0);
        assert_eq!(prefab.trend, expected);
    }

    #[rstest]
    fn prefab_skipped_without_non_prefab(engine: ComparisonEngine) {
        let insight = engine.compare(&stats(&[(ACTUAL, 10.0)]));
        assert!(insight.prefab.is_none());
    }

    #[rstest]
    fn non_finite_sum_becomes_inline_error(engine: ComparisonEngine) {
        let insight = engine.compare(&stats(&[
            ("사전제작X_비대상(일부공정)(1)_길이", 10.0),
            (ACTUAL, f64::INFINITY),
        ]));

        assert!(matches!(
            insight.prefab,
            Some(Err(ComparisonError::NonFinite { .. }))
        ));
    }
}
