use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::models::schema::DataTable;

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub sum: f64,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

impl ColumnStats {
    /// 空序列：sum 为 0，其余为 NaN
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                sum: 0.0,
                mean: f64::NAN,
                max: f64::NAN,
                min: f64::NAN,
            };
        }
        let sum: f64 = values.iter().sum();
        Self {
            sum,
            mean: sum / values.len() as f64,
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

/// 数值列统计，保持结果表中的列顺序
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct TableStats {
    columns: Vec<(String, ColumnStats)>,
}

impl TableStats {
    pub fn get(&self, column: &str) -> Option<&ColumnStats> {
        self.columns.iter().find(|(name, _)| name == column).map(|(_, s)| s)
    }

    pub fn sum_of(&self, column: &str) -> f64 {
        self.get(column).map(|s| s.sum).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnStats)> {
        self.columns.iter().map(|(name, s)| (name.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<(String, ColumnStats)> for TableStats {
    fn from_iter<I: IntoIterator<Item = (String, ColumnStats)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// 尝试把整列转成数值；任何单元格无法转换时放弃整列
fn coerce_column<'a>(cells: impl Iterator<Item = &'a Value>) -> Option<Vec<f64>> {
    let mut values = Vec::new();
    for cell in cells {
        match cell {
            Value::Null => {}
            Value::Number(n) => values.push(n.as_f64()?),
            Value::String(s) if s.trim().is_empty() => {}
            Value::String(s) => {
                let v = s.trim().parse::<f64>().ok()?;
                // "nan" 视为缺失值
                if !v.is_nan() {
                    values.push(v);
                }
            }
            _ => return None,
        }
    }
    Some(values)
}

/// 逐列计算 SUM/MEAN/MAX/MIN；没有数值列时返回空结果
pub fn analyze(table: &DataTable) -> TableStats {
    let stats: TableStats = table
        .columns
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let values = coerce_column(table.column_values(idx))?;
            Some((name.clone(), ColumnStats::from_values(&values)))
        })
        .collect();

    debug!("数值列统计完成: {}/{} 列", stats.len(), table.columns.len());
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> DataTable {
        DataTable::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    #[test]
    fn single_numeric_column() {
        let t = table(&["길이"], vec![vec![json!(1)], vec![json!(2)], vec![json!(3)], vec![json!(4)]]);
        let stats = analyze(&t);

        assert_eq!(
            stats.get("길이"),
            Some(&ColumnStats {
                sum: 10.0,
                mean: 2.5,
                max: 4.0,
                min: 1.0
            })
        );
    }

    #[test]
    fn text_columns_are_excluded_and_order_kept() {
        let t = table(
            &["장비명", "B", "A"],
            vec![
                vec![json!("5TFSP1001"), json!("1.5"), json!(2)],
                vec![json!("5TFSP1002"), json!(null), json!(3.5)],
                vec![json!("5TFSP1003"), json!(""), json!(1)],
            ],
        );
        let stats = analyze(&t);

        let names: Vec<&str> = stats.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(stats.sum_of("B"), 1.5);
        assert_eq!(stats.get("A").map(|s| s.max), Some(3.5));
        assert_eq!(stats.sum_of("장비명"), 0.0);
    }

    #[test]
    fn mixed_column_is_dropped() {
        let t = table(&["Floor"], vec![vec![json!(1)], vec![json!("2F")], vec![json!(true)]]);
        assert!(analyze(&t).is_empty());
    }

    #[test]
    fn nan_strings_count_as_missing() {
        let t = table(
            &["계획", "x"],
            vec![vec![json!("nan"), json!(5)], vec![json!(null), json!("NaN")]],
        );
        let stats = analyze(&t);
        assert_eq!(stats.sum_of("계획"), 0.0);
        assert_eq!(stats.sum_of("x"), 5.0);
        assert_eq!(stats.get("x").map(|s| s.mean), Some(5.0));
    }

    #[test]
    fn all_missing_column_has_zero_sum() {
        let t = table(&["x"], vec![vec![json!(null)], vec![]]);
        let stats = analyze(&t);
        let x = stats.get("x").unwrap();
        assert_eq!(x.sum, 0.0);
        assert!(x.mean.is_nan());
    }
}
