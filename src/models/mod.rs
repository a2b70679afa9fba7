pub mod context;
pub mod ontology;
pub mod schema;
