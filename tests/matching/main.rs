
mod ingestion;
mod match_researchers;
mod user_documents;
