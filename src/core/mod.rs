pub mod analysis;
pub mod comparison;
pub mod fst_engine;
pub mod insight;
pub mod normalizer;
pub mod numeric;
pub mod preprocessor;
pub mod stats;
pub mod vocabulary;
