pub mod openai_embedding_client;
pub mod profile_in_memory_repository;
pub mod profile_postgres_repository;
pub mod user_document_in_memory_repository;
pub mod user_document_postgres_repository;
