pub mod chat;
pub mod mapping;
