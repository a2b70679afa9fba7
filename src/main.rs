use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use smart_query::api::chat::{analyze, preprocess};
use smart_query::api::mapping::{
    get_vocabulary, list_data_sources, register_data_source, resolve_synonym,
};
use smart_query::ax_state::AppState;
use smart_query::config::AppConfig;
use smart_query::core::analysis::Analyzer;
use smart_query::core::comparison::ComparisonColumns;
use smart_query::core::fst_engine::SynonymIndex;
use smart_query::core::insight::InsightComposer;
use smart_query::core::preprocessor::Preprocessor;
use smart_query::core::vocabulary::Vocabulary;
use smart_query::infra::db_external::PoolManager;
use smart_query::infra::db_internal;
use smart_query::infra::executor::HttpQueryExecutor;
use smart_query::infra::llm::OpenAiGenerator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("smart_query=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // 有内部库时用库里的同义词表覆盖内置表
    let vocabulary = match &config.database_url {
        Some(url) => {
            let db = db_internal::init_db(url).await?;
            Arc::new(db_internal::load_vocabulary(&db, Vocabulary::builtin()).await)
        }
        None => Vocabulary::shared(),
    };

    let index = SynonymIndex::build(&vocabulary)?;
    let preprocessor = Arc::new(Preprocessor::new(vocabulary.clone())?);
    let analyzer = Analyzer::new(
        preprocessor,
        InsightComposer::new(ComparisonColumns::default())?,
        Arc::new(HttpQueryExecutor::new(config.executor_url.clone())),
        Arc::new(OpenAiGenerator::new(&config)),
    );

    let state = Arc::new(AppState {
        vocabulary,
        index,
        analyzer,
        pool_manager: PoolManager::new(),
    });

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = Router::new()
        .route("/api/preprocess", post(preprocess))
        .route("/api/analyze", post(analyze))
        .route("/api/synonyms/resolve", get(resolve_synonym))
        .route("/api/vocabulary", get(get_vocabulary))
        .route("/api/datasource", post(register_data_source))
        .route("/api/datasources", get(list_data_sources))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!("🚀 Smart Query 运行在 http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
