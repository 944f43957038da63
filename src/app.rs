use tracing_subscriber::EnvFilter;

use crate::application::{IngestPipeline, IngestReport};
use crate::domain::error::Result;
use crate::infrastructure::config::ConfigService;

pub async fn run() -> Result<IngestReport> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = ConfigService::new().load()?;
    tracing::info!(
        command = ?config.command,
        mode = %config.mode,
        category = %config.category,
        "Starting ingestion"
    );

    IngestPipeline::new(config).run().await
}
