pub mod api;
pub mod config;
pub mod core;
pub mod errors;
pub mod infra;
pub mod models;

pub mod ax_state {
    use std::sync::Arc;

    use crate::core::analysis::Analyzer;
    use crate::core::fst_engine::SynonymIndex;
    use crate::core::vocabulary::Vocabulary;
    use crate::infra::db_external::PoolManager;

    pub struct AppState {
        pub vocabulary: Arc<Vocabulary>,
        pub index: SynonymIndex,
        pub analyzer: Analyzer,
        pub pool_manager: PoolManager,
    }
}
