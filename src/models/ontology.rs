use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
        }
    }
}

/// 单个等值约束，只由条件抽取阶段产生
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl Condition {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Eq,
            value: value.into(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} \"{}\")", self.field, self.operator.symbol(), self.value)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
        }
    }
}

/// 交给外部执行器的查询指令
///
/// 渲染语法:
/// `[c1 AND c2 ...] [출력컬럼 = [...]] [차원컬럼 = [...] 집계방식 = 'sum'] <剩余文本>`
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct QueryDirective {
    pub conditions: Vec<Condition>,
    /// 已包含固定的身份列前缀；没有选中任何列时为空
    pub output_columns: Vec<String>,
    pub dimension_columns: Vec<String>,
    pub aggregation: Option<Aggregation>,
    pub remainder: String,
}

impl QueryDirective {
    pub fn is_empty(&self) -> bool {
        self.to_string().is_empty()
    }
}

impl fmt::Display for QueryDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        if !self.conditions.is_empty() {
            let conds: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
            parts.push(conds.join(" AND "));
        }
        if !self.output_columns.is_empty() {
            parts.push(format!("출력컬럼 = {}", quoted_list(&self.output_columns)));
        }
        if !self.dimension_columns.is_empty() {
            parts.push(format!("차원컬럼 = {}", quoted_list(&self.dimension_columns)));
            if let Some(agg) = self.aggregation {
                parts.push(format!("집계방식 = '{}'", agg.as_str()));
            }
        }
        parts.push(self.remainder.clone());

        // 折叠所有空白
        let joined = parts.join(" ");
        let collapsed: Vec<&str> = joined.split_whitespace().collect();
        f.write_str(&collapsed.join(" "))
    }
}

fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("'{}'", i)).collect();
    format!("[{}]", quoted.join(", "))
}
