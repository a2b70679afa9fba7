pub mod db_external;
pub mod db_internal;
pub mod executor;
pub mod llm;
pub mod utils;
