pub mod mean_pooling;
pub mod profile_embedding;
pub mod text_chunking;
