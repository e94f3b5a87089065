pub mod ingest_profiles;
pub mod match_researchers;
pub mod register_user_document;
pub mod search_similar_profiles;
