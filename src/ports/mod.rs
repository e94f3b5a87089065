pub mod embedding_provider;
pub mod profile_store;
pub mod user_document_store;
