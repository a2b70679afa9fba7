use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};
use sqlx::{mysql::MySqlRow, postgres::PgRow, Column, Row, TypeInfo};

/// 按数据库原生类型名把一行转成 JSON 单元格
pub fn pg_row_to_cells(row: &PgRow) -> Vec<Value> {
    row.columns()
        .iter()
        .map(|col| {
            let name = col.name();
            match col.type_info().name() {
                "INT2" => json!(row.try_get::<Option<i16>, _>(name).unwrap_or(None)),
                "INT4" => json!(row.try_get::<Option<i32>, _>(name).unwrap_or(None)),
                "INT8" => json!(row.try_get::<Option<i64>, _>(name).unwrap_or(None)),
                "FLOAT4" => json!(row.try_get::<Option<f32>, _>(name).unwrap_or(None)),
                "FLOAT8" => json!(row.try_get::<Option<f64>, _>(name).unwrap_or(None)),
                "NUMERIC" => {
                    let v: Option<rust_decimal::Decimal> = row.try_get(name).unwrap_or(None);
                    // 物量统计只需要 f64
                    json!(v.and_then(|d| d.to_f64()))
                }
                "BOOL" => json!(row.try_get::<Option<bool>, _>(name).unwrap_or(None)),
                "DATE" => json!(row
                    .try_get::<Option<NaiveDate>, _>(name)
                    .unwrap_or(None)
                    .map(|d| d.to_string())),
                "TIMESTAMP" => json!(row
                    .try_get::<Option<NaiveDateTime>, _>(name)
                    .unwrap_or(None)
                    .map(|dt| dt.to_string())),
                "TIMESTAMPTZ" => json!(row
                    .try_get::<Option<DateTime<Utc>>, _>(name)
                    .unwrap_or(None)
                    .map(|dt| dt.to_rfc3339())),
                _ => json!(row.try_get::<Option<String>, _>(name).unwrap_or(None)),
            }
        })
        .collect()
}

/// MySQL 列按解码方式归类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MySqlCell {
    Signed,
    Unsigned,
    Bool,
    Float,
    Decimal,
    Date,
    DateTime,
    Text,
}

pub fn mysql_cell_kind(type_name: &str) -> MySqlCell {
    match type_name {
        "BOOLEAN" => MySqlCell::Bool,
        "TINYINT" | "SMALLINT" | "INT" | "MEDIUMINT" | "BIGINT" => MySqlCell::Signed,
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "INT UNSIGNED" | "MEDIUMINT UNSIGNED"
        | "BIGINT UNSIGNED" => MySqlCell::Unsigned,
        "FLOAT" | "DOUBLE" => MySqlCell::Float,
        "DECIMAL" | "NEWDECIMAL" => MySqlCell::Decimal,
        "DATE" => MySqlCell::Date,
        "DATETIME" | "TIMESTAMP" => MySqlCell::DateTime,
        _ => MySqlCell::Text,
    }
}

pub fn mysql_row_to_cells(row: &MySqlRow) -> Vec<Value> {
    row.columns()
        .iter()
        .map(|col| {
            let name = col.name();
            match mysql_cell_kind(col.type_info().name()) {
                MySqlCell::Bool => json!(row.try_get::<Option<bool>, _>(name).unwrap_or(None)),
                MySqlCell::Signed => json!(row.try_get::<Option<i64>, _>(name).unwrap_or(None)),
                MySqlCell::Unsigned => json!(row.try_get::<Option<u64>, _>(name).unwrap_or(None)),
                MySqlCell::Float => json!(row.try_get::<Option<f64>, _>(name).unwrap_or(None)),
                MySqlCell::Decimal => {
                    let v: Option<rust_decimal::Decimal> = row.try_get(name).unwrap_or(None);
                    json!(v.and_then(|d| d.to_f64()))
                }
                MySqlCell::Date => json!(row
                    .try_get::<Option<NaiveDate>, _>(name)
                    .unwrap_or(None)
                    .map(|d| d.to_string())),
                MySqlCell::DateTime => json!(row
                    .try_get::<Option<NaiveDateTime>, _>(name)
                    .unwrap_or(None)
                    .map(|dt| dt.to_string())),
                MySqlCell::Text => json!(row.try_get::<Option<String>, _>(name).unwrap_or(None)),
            }
        })
        .collect()
}

pub fn column_names<R: Row>(row: &R) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// 只允许 `table` 或 `schema.table` 形式的标识符
pub fn is_safe_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|p| {
            let mut chars = p.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("BOOLEAN", MySqlCell::Bool)]
    #[case("TINYINT", MySqlCell::Signed)]
    #[case("BIGINT", MySqlCell::Signed)]
    #[case("INT UNSIGNED", MySqlCell::Unsigned)]
    #[case("BIGINT UNSIGNED", MySqlCell::Unsigned)]
    #[case("NEWDECIMAL", MySqlCell::Decimal)]
    #[case("VARCHAR", MySqlCell::Text)]
    fn mysql_types_pick_a_decoder(#[case] type_name: &str, #[case] kind: MySqlCell) {
        assert_eq!(mysql_cell_kind(type_name), kind);
    }

    #[test]
    fn table_names_are_validated() {
        assert!(is_safe_table_name("pipe_quantities"));
        assert!(is_safe_table_name("public.pipe_2024"));
        assert!(!is_safe_table_name("x; DROP TABLE y"));
        assert!(!is_safe_table_name("a.b.c"));
        assert!(!is_safe_table_name(""));
        assert!(!is_safe_table_name("1abc"));
    }
}
