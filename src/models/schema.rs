use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// 结果表：有序列名 + 行数据 (JSON 单元格)
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DataTable {
    pub columns: Vec<String>,
    #[serde(alias = "data")]
    pub rows: Vec<Vec<Value>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| row.get(idx).unwrap_or(&Value::Null))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaggedResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
}

/// 执行器返回值：`{type: "dataframe", value}`、裸表或标量
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ExecutionOutcome {
    Tagged(TaggedResult),
    Table(DataTable),
    Value(Value),
}

impl ExecutionOutcome {
    pub fn is_table(&self) -> bool {
        match self {
            ExecutionOutcome::Tagged(t) => t.kind == "dataframe",
            ExecutionOutcome::Table(_) => true,
            ExecutionOutcome::Value(_) => false,
        }
    }

    /// 取出结果表；不是表时原样返回
    pub fn into_table(self) -> Result<DataTable, Self> {
        match self {
            ExecutionOutcome::Table(table) => Ok(table),
            ExecutionOutcome::Tagged(t) if t.kind == "dataframe" => {
                match serde_json::from_value::<DataTable>(t.value.clone()) {
                    Ok(table) => Ok(table),
                    Err(_) => Err(ExecutionOutcome::Tagged(t)),
                }
            }
            other => Err(other),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            ExecutionOutcome::Tagged(t) => t.value,
            ExecutionOutcome::Table(table) => serde_json::to_value(table).unwrap_or(Value::Null),
            ExecutionOutcome::Value(v) => v,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DataSource {
    pub id: String,
    pub db_type: String,
    pub connection_url: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDataSourceRequest {
    pub id: String,
    pub db_type: String,
    pub connection_url: String,
    pub display_name: String,
}

/// 内部库 `synonym_entries` 的一行
#[derive(Debug, Clone, FromRow)]
pub struct SynonymRow {
    pub table_kind: String,
    pub canonical: String,
    pub alias_names: Vec<String>,
    pub position: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagged_dataframe_is_a_table() {
        let outcome: ExecutionOutcome = serde_json::from_value(json!({
            "type": "dataframe",
            "value": { "columns": ["a"], "rows": [[1], [2]] }
        }))
        .unwrap();

        assert!(outcome.is_table());
        let table = outcome.into_table().unwrap();
        assert_eq!(table.columns, vec!["a"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn raw_table_accepts_split_orientation() {
        let outcome: ExecutionOutcome = serde_json::from_value(json!({
            "columns": ["a", "b"],
            "data": [[1, "x"]]
        }))
        .unwrap();
        assert!(matches!(outcome, ExecutionOutcome::Table(_)));
    }

    #[test]
    fn scalar_results_are_not_tables() {
        let outcome: ExecutionOutcome = serde_json::from_value(json!(42)).unwrap();
        assert!(!outcome.is_table());
        assert_eq!(outcome.into_table().unwrap_err().into_value(), json!(42));

        let tagged: ExecutionOutcome =
            serde_json::from_value(json!({ "type": "string", "value": "없음" })).unwrap();
        assert!(!tagged.is_table());
        assert_eq!(tagged.into_value(), json!("없음"));
    }
}
