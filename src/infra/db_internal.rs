use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres};
use tracing::{info, warn};

use crate::core::vocabulary::{SynonymEntry, SynonymTable, TableKind, Vocabulary};
use crate::models::schema::SynonymRow;

pub async fn init_db(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("内部库连接失败")
}

/// 从内部库读取同义词表；查询失败或为空时沿用内置词表
pub async fn load_vocabulary(db: &PgPool, base: Vocabulary) -> Vocabulary {
    let rows = sqlx::query_as::<Postgres, SynonymRow>(
        "SELECT table_kind, canonical, alias_names, position FROM synonym_entries ORDER BY table_kind, position",
    )
    .fetch_all(db)
    .await;

    match rows {
        Ok(rows) => apply_synonym_rows(base, rows),
        Err(e) => {
            warn!("同义词表读取失败，使用内置词表: {}", e);
            base
        }
    }
}

/// 某一类没有任何行时保留内置表
pub fn apply_synonym_rows(mut base: Vocabulary, mut rows: Vec<SynonymRow>) -> Vocabulary {
    rows.sort_by_key(|r| r.position);

    let mut columns = Vec::new();
    let mut values = Vec::new();
    for row in rows {
        let entry = SynonymEntry {
            canonical: row.canonical,
            aliases: row.alias_names,
        };
        match TableKind::parse(&row.table_kind) {
            Some(TableKind::Column) => columns.push(entry),
            Some(TableKind::Value) => values.push(entry),
            None => warn!("忽略未知词表类型: {}", row.table_kind),
        }
    }

    if !columns.is_empty() {
        info!("列同义词表已由内部库覆盖: {} 条", columns.len());
        base.columns = SynonymTable::new(columns);
    }
    if !values.is_empty() {
        info!("值同义词表已由内部库覆盖: {} 条", values.len());
        base.values = SynonymTable::new(values);
    }
    base
}
