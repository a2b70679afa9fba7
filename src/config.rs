use anyhow::Context;
use std::env;
use std::net::SocketAddr;
use tracing::info;

pub const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// 可选：内部库，用于覆盖内置同义词表
    pub database_url: Option<String>,
    pub executor_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub llm_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("BIND_ADDR 格式错误")?;

        let config = Self {
            bind_addr,
            database_url: non_empty_var("DATABASE_URL"),
            executor_url: env::var("EXECUTOR_URL")
                .unwrap_or_else(|_| "http://localhost:8000/execute".to_string()),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            temperature: parse_var("LLM_TEMPERATURE", 0.7)?,
            max_tokens: parse_var("LLM_MAX_TOKENS", 400)?,
        };

        info!(
            "配置加载完成: bind={}, executor={}, model={}, 内部库={}",
            config.bind_addr,
            config.executor_url,
            config.llm_model,
            config.database_url.is_some()
        );
        Ok(config)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_var(key) {
        Some(raw) => raw.parse().with_context(|| format!("{} 格式错误: {}", key, raw)),
        None => Ok(default),
    }
}
