use anyhow::Context;
use dashmap::DashMap;
use sqlx::{mysql::MySqlPoolOptions, postgres::PgPoolOptions, MySql, Pool, Postgres};
use std::sync::Arc;
use tracing::info;

use crate::infra::utils::{column_names, is_safe_table_name, mysql_row_to_cells, pg_row_to_cells};
use crate::models::schema::{DataSource, DataTable};

pub enum DynamicPool {
    Postgres(Pool<Postgres>),
    MySql(Pool<MySql>),
}

/// 已注册的数据源与按需创建的连接池
pub struct PoolManager {
    sources: DashMap<String, DataSource>,
    pools: DashMap<String, Arc<DynamicPool>>,
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolManager {
    pub fn new() -> Self {
        Self {
            sources: DashMap::new(),
            pools: DashMap::new(),
        }
    }

    /// 注册或覆盖数据源；覆盖时丢弃旧连接池
    pub fn register(&self, source: DataSource) {
        self.pools.remove(&source.id);
        info!("数据源配置已更新: id={}", source.id);
        self.sources.insert(source.id.clone(), source);
    }

    pub fn list(&self) -> Vec<DataSource> {
        let mut list: Vec<DataSource> = self.sources.iter().map(|e| e.value().clone()).collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    pub fn get(&self, id: &str) -> Option<DataSource> {
        self.sources.get(id).map(|e| e.value().clone())
    }

    pub async fn get_or_create_pool(&self, source: &DataSource) -> anyhow::Result<Arc<DynamicPool>> {
        if let Some(pool) = self.pools.get(&source.id) {
            return Ok(pool.clone());
        }
        let new_pool = match source.db_type.to_lowercase().as_str() {
            "postgres" | "postgresql" => {
                let pool = PgPoolOptions::new().max_connections(5).connect(&source.connection_url).await?;
                Arc::new(DynamicPool::Postgres(pool))
            }
            "mysql" => {
                let pool = MySqlPoolOptions::new().max_connections(5).connect(&source.connection_url).await?;
                Arc::new(DynamicPool::MySql(pool))
            }
            _ => return Err(anyhow::anyhow!("Unsupported DB type: {}", source.db_type)),
        };
        self.pools.insert(source.id.clone(), new_pool.clone());
        Ok(new_pool)
    }

    /// 读取整张表作为当前数据集
    pub async fn fetch_table(&self, source_id: &str, table: &str) -> anyhow::Result<DataTable> {
        if !is_safe_table_name(table) {
            return Err(anyhow::anyhow!("非法表名: {}", table));
        }
        let source = self
            .get(source_id)
            .with_context(|| format!("数据源不存在: {}", source_id))?;
        let pool = self.get_or_create_pool(&source).await?;

        let sql = format!("SELECT * FROM {}", table);
        let dataset = match &*pool {
            DynamicPool::Postgres(p) => {
                let rows = sqlx::query(&sql).fetch_all(p).await?;
                DataTable::new(
                    rows.first().map(column_names).unwrap_or_default(),
                    rows.iter().map(pg_row_to_cells).collect(),
                )
            }
            DynamicPool::MySql(p) => {
                let rows = sqlx::query(&sql).fetch_all(p).await?;
                DataTable::new(
                    rows.first().map(column_names).unwrap_or_default(),
                    rows.iter().map(mysql_row_to_cells).collect(),
                )
            }
        };
        info!("数据集读取完成: {}.{} ({} 行)", source_id, table, dataset.rows.len());
        Ok(dataset)
    }
}
