use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::configuration::{DatabaseSettings, Settings};
use crate::repositories::openai_embedding_client::OpenAiEmbeddingClient;
use crate::repositories::profile_postgres_repository::ProfilePostgresRepository;
use crate::use_cases::ingest_profiles::{
    IngestProfilesError, IngestProfilesUseCase, IngestionSummary,
};

/// Wires the ingestion pipeline: Postgres pool (with migrations applied),
/// embedding client and the profile store, all explicitly constructed and
/// injected rather than held as process-wide singletons.
pub struct Application {
    ingest_profiles: IngestProfilesUseCase,
    csv_path: PathBuf,
}

impl Application {
    #[tracing::instrument(name = "Building ingestion application", skip(settings))]
    pub async fn build(settings: Settings) -> Result<Self, ApplicationError> {
        let connection_pool = get_connection_pool(&settings.database);
        sqlx::migrate!().run(&connection_pool).await?;

        let embedding_client = Arc::new(OpenAiEmbeddingClient::try_new(&settings.embedding)?);
        let profile_store = Arc::new(ProfilePostgresRepository::new(
            connection_pool,
            settings.embedding.dimension,
        ));

        let ingest_profiles = IngestProfilesUseCase::new(
            embedding_client,
            profile_store,
            settings.ingestion.max_abstracts_per_profile,
        );

        Ok(Self {
            ingest_profiles,
            csv_path: settings.ingestion.csv_path.into(),
        })
    }

    /// Runs the ingestion until completion
    pub async fn run_until_stopped(self) -> Result<IngestionSummary, ApplicationError> {
        let summary = self.ingest_profiles.ingest_csv(&self.csv_path).await?;

        info!(
            rows_read = summary.rows_read,
            profiles_upserted = summary.profiles_upserted,
            rows_without_key = summary.rows_without_key,
            profiles_deleted = summary.profiles_deleted,
            "Ingestion run finished"
        );

        info!("👋 Bye!");
        Ok(summary)
    }
}

pub fn get_connection_pool(settings: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(settings.with_db())
}

#[derive(thiserror::Error, Debug)]
pub enum ApplicationError {
    #[error(transparent)]
    MigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("Could not build the embedding HTTP client: {0}")]
    EmbeddingClientError(#[from] reqwest::Error),
    #[error(transparent)]
    IngestionError(#[from] IngestProfilesError),
}
