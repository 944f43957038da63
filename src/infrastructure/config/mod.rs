use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;

use crate::domain::error::{AppError, Result};
use crate::domain::ingest_config::IngestConfig;

pub const CONFIG_FILE_ENV: &str = "QUIZ_INGEST_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "quiz_ingest.toml";
pub const ENV_PREFIX: &str = "QUIZ_INGEST_";

/// Layered run configuration: defaults, then the TOML file, then
/// `QUIZ_INGEST_*` environment variables
pub struct ConfigService {
    figment: Figment,
}

impl ConfigService {
    pub fn new() -> Self {
        dotenvy::dotenv().ok();

        let path = std::env::var(CONFIG_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        tracing::debug!(path = %path.display(), "Config file");

        Self::from_figment(
            Figment::from(Serialized::defaults(IngestConfig::default()))
                .merge(Toml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"])),
        )
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn load(&self) -> Result<IngestConfig> {
        let mut config: IngestConfig = self.figment.extract()?;

        if config.database_url.is_none() {
            config.database_url = std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty());
        }

        config.validate().map_err(AppError::ValidationError)?;
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingest_config::{CommitPolicy, IdAssignment, PipelineCommand};
    use crate::domain::question::ReconcileMode;

    fn service(toml: &str) -> ConfigService {
        ConfigService::from_figment(
            Figment::from(Serialized::defaults(IngestConfig::default())).merge(Toml::string(toml)),
        )
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = service(
            r#"
            command = "import_days"
            database_url = "sqlite://quiz.db"
            output_dir = "split_days"
            id_strategy = "from_column"
            mode = "update_existing"
            category = "AWS Certified Developer - Associate DVA-C02"
            "#,
        )
        .load()
        .unwrap();

        assert_eq!(config.command, PipelineCommand::ImportDays);
        assert_eq!(config.id_assignment(), IdAssignment::FromColumn);
        assert_eq!(config.mode, ReconcileMode::UpdateExisting);
        assert_eq!(config.day_file_commit_policy(), CommitPolicy::Every(10));
        assert_eq!(config.chunk_size, 20);
        assert_eq!(config.file_prefix, "DVA-C02_Day_");
    }

    #[test]
    fn test_sequential_defaults() {
        let config = service(
            r#"
            input_path = "Data.csv"
            database_url = "sqlite::memory:"
            start_id = 2000
            "#,
        )
        .load()
        .unwrap();

        assert_eq!(config.id_assignment(), IdAssignment::Sequential { start_id: 2000 });
        assert_eq!(config.commit_policy(), CommitPolicy::AtEnd);
        assert_eq!(config.default_correct_option, 'A');
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = service(
            r#"
            command = "split"
            input_path = "Data.csv"
            output_dir = "out"
            chunk_size = 0
            "#,
        )
        .load()
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service(r#"mode = "overwrite""#).load().unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
