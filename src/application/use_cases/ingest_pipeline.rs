// ============================================================
// INGEST PIPELINE USE CASE
// ============================================================
// Orchestrate reading rows, building drafts, splitting into day files
// and reconciling against the question store

use std::path::Path;

use serde::Serialize;

use crate::application::use_cases::chunking::{ChunkConfig, ChunkEngine};
use crate::application::use_cases::draft_builder::{DraftBuilder, DraftOutcome};
use crate::application::use_cases::reconciliation::ReconciliationEngine;
use crate::domain::csv::{CsvTable, RowShape};
use crate::domain::error::{AppError, Result};
use crate::domain::ingest_config::{IngestConfig, PipelineCommand};
use crate::domain::question::QuestionDraft;
use crate::domain::store::QuestionStore;
use crate::infrastructure::artifact_store::{load_drafts, save_drafts};
use crate::infrastructure::csv::{day_label, CsvParser, DayFileWriter};
use crate::infrastructure::db::SqliteQuestionStore;

/// Aggregate counts of one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub rows_read: usize,
    pub drafts_built: usize,
    /// Rows skipped for empty content or missing options
    pub dropped: usize,
    pub imported: usize,
    /// Drafts whose id already existed in skip mode
    pub skipped: usize,
    pub files_written: usize,
}

impl IngestReport {
    pub fn log(&self) {
        tracing::info!(
            rows_read = self.rows_read,
            drafts_built = self.drafts_built,
            dropped = self.dropped,
            imported = self.imported,
            skipped = self.skipped,
            files_written = self.files_written,
            "Ingestion finished"
        );
    }
}

/// Drafts built from one table plus the number of rows that produced none
#[derive(Debug, Clone, Default)]
pub struct DraftBatch {
    pub drafts: Vec<QuestionDraft>,
    pub dropped: usize,
}

pub struct IngestPipeline {
    config: IngestConfig,
}

impl IngestPipeline {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Run the configured command, opening and always closing the store
    /// for commands that need one
    pub async fn run(&self) -> Result<IngestReport> {
        let report = match self.config.command {
            PipelineCommand::Import => {
                let table = CsvParser::new().parse_file(self.input_path()?)?;
                match &self.config.save_artifact_path {
                    Some(artifact) => self.save_artifact(&table, artifact)?,
                    None => {
                        let mut store = self.open_store().await?;
                        let result = self.import_table(&mut store, &table).await;
                        store.close().await;
                        result?
                    }
                }
            }
            PipelineCommand::Split => self.split_file(self.input_path()?, self.output_dir()?)?,
            PipelineCommand::ImportDays => {
                let dir = self.output_dir()?;
                let mut store = self.open_store().await?;
                let result = self.import_day_files(&mut store, dir).await;
                store.close().await;
                result?
            }
            PipelineCommand::ImportArtifact => {
                let path = self.input_path()?;
                let mut store = self.open_store().await?;
                let result = self.import_artifact(&mut store, path).await;
                store.close().await;
                result?
            }
        };

        report.log();
        Ok(report)
    }

    /// Build drafts for every row, counting skipped rows.
    ///
    /// `row_offset` continues sequential ids across several tables.
    pub fn build_drafts(&self, table: &CsvTable, question_set: &str, row_offset: usize) -> Result<DraftBatch> {
        let headers = table.header_names();
        let shape = RowShape::detect(&headers).ok_or_else(|| {
            AppError::ValidationError(format!(
                "Unrecognized CSV columns: {}",
                headers.join(", ")
            ))
        })?;
        tracing::debug!(shape = %shape, rows = table.len(), "Building drafts");

        let builder = DraftBuilder::new(
            shape,
            self.config.id_assignment(),
            self.config.category.as_str(),
            question_set,
        )
        .with_default_correct_option(self.config.default_correct_option)
        .with_row_offset(row_offset);

        let mut batch = DraftBatch::default();
        for row in &table.rows {
            match builder.build(row)? {
                DraftOutcome::Built(draft) => batch.drafts.push(draft),
                DraftOutcome::Skipped(_) => batch.dropped += 1,
            }
        }

        Ok(batch)
    }

    /// Write drafts to an artifact instead of importing them
    pub fn save_artifact(&self, table: &CsvTable, path: &Path) -> Result<IngestReport> {
        let batch = self.non_empty_batch(table)?;
        save_drafts(path, &batch.drafts)?;

        Ok(IngestReport {
            rows_read: table.len(),
            drafts_built: batch.drafts.len(),
            dropped: batch.dropped,
            files_written: 1,
            ..IngestReport::default()
        })
    }

    /// Build drafts for one table and reconcile them in a single pass
    pub async fn import_table<S>(&self, store: &mut S, table: &CsvTable) -> Result<IngestReport>
    where
        S: QuestionStore + ?Sized,
    {
        let batch = self.non_empty_batch(table)?;
        tracing::info!(drafts = batch.drafts.len(), dropped = batch.dropped, "Parsed questions from CSV");

        let engine = ReconciliationEngine::new(self.config.mode, self.config.commit_policy());
        let summary = engine.reconcile(store, &batch.drafts).await?;

        Ok(IngestReport {
            rows_read: table.len(),
            drafts_built: batch.drafts.len(),
            dropped: batch.dropped,
            imported: summary.imported,
            skipped: summary.skipped,
            files_written: 0,
        })
    }

    /// Split a CSV into numbered day files with the input's columns
    pub fn split_file(&self, input: &Path, output_dir: &Path) -> Result<IngestReport> {
        let table = CsvParser::new().parse_file(input)?;

        let chunker = ChunkEngine::new(ChunkConfig {
            size: self.config.chunk_size,
            max_groups: self.config.max_chunks,
        })?;
        let groups = chunker.chunk(&table.rows);

        let writer = DayFileWriter::new(output_dir, self.config.file_prefix.as_str());
        let written = writer.write_groups(&table.headers, &groups)?;

        tracing::info!(
            rows = table.len(),
            files = written.len(),
            dir = %output_dir.display(),
            "Split CSV into day files"
        );

        Ok(IngestReport {
            rows_read: table.len(),
            files_written: written.len(),
            ..IngestReport::default()
        })
    }

    /// Import every day file of `dir` in sequence order through one store.
    /// Each file's stem becomes the question-set label of its questions.
    pub async fn import_day_files<S>(&self, store: &mut S, dir: &Path) -> Result<IngestReport>
    where
        S: QuestionStore + ?Sized,
    {
        let files = DayFileWriter::new(dir, self.config.file_prefix.as_str()).discover()?;
        if files.is_empty() {
            return Err(AppError::NotFound(format!(
                "No day files matching '{}<n>.csv' in {}",
                self.config.file_prefix,
                dir.display()
            )));
        }

        let engine = ReconciliationEngine::new(self.config.mode, self.config.day_file_commit_policy());
        let mut report = IngestReport::default();

        for file in &files {
            let label = day_label(file);
            let table = CsvParser::new().parse_file(file)?;
            let batch = self.build_drafts(&table, &label, report.rows_read)?;

            let summary = match engine.reconcile(store, &batch.drafts).await {
                Ok(summary) => summary,
                Err(AppError::ImportAborted {
                    question_id,
                    committed,
                    reason,
                }) => {
                    return Err(AppError::ImportAborted {
                        question_id,
                        committed: report.imported + committed,
                        reason: format!("{}: {}", file.display(), reason),
                    })
                }
                Err(e) => return Err(e),
            };

            tracing::info!(
                file = %label,
                imported = summary.imported,
                skipped = summary.skipped,
                dropped = batch.dropped,
                "Imported day file"
            );

            report.rows_read += table.len();
            report.drafts_built += batch.drafts.len();
            report.dropped += batch.dropped;
            report.imported += summary.imported;
            report.skipped += summary.skipped;
        }

        Ok(report)
    }

    /// Reconcile drafts from a saved artifact
    pub async fn import_artifact<S>(&self, store: &mut S, path: &Path) -> Result<IngestReport>
    where
        S: QuestionStore + ?Sized,
    {
        let drafts = load_drafts(path)?;
        if drafts.is_empty() {
            return Err(AppError::ValidationError(format!(
                "Artifact {} contains no questions",
                path.display()
            )));
        }

        let engine = ReconciliationEngine::new(self.config.mode, self.config.commit_policy());
        let summary = engine.reconcile(store, &drafts).await?;

        Ok(IngestReport {
            drafts_built: drafts.len(),
            imported: summary.imported,
            skipped: summary.skipped,
            ..IngestReport::default()
        })
    }

    fn non_empty_batch(&self, table: &CsvTable) -> Result<DraftBatch> {
        let batch = self.build_drafts(table, &self.config.question_set, 0)?;
        if batch.drafts.is_empty() {
            return Err(AppError::ValidationError(
                "No valid questions found in CSV".to_string(),
            ));
        }
        Ok(batch)
    }

    async fn open_store(&self) -> Result<SqliteQuestionStore> {
        let url = self
            .config
            .database_url
            .as_deref()
            .ok_or_else(|| AppError::ValidationError("database_url is not configured".to_string()))?;

        let store = SqliteQuestionStore::connect(url).await?;
        store.ensure_schema().await?;
        Ok(store)
    }

    fn input_path(&self) -> Result<&Path> {
        let path = self
            .config
            .input_path
            .as_deref()
            .ok_or_else(|| AppError::ValidationError("input_path is not configured".to_string()))?;

        if !path.exists() {
            return Err(AppError::NotFound(format!("File not found: {}", path.display())));
        }
        Ok(path)
    }

    fn output_dir(&self) -> Result<&Path> {
        self.config
            .output_dir
            .as_deref()
            .ok_or_else(|| AppError::ValidationError("output_dir is not configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingest_config::IdStrategy;
    use crate::domain::question::ReconcileMode;
    use crate::infrastructure::config::ConfigService;
    use crate::infrastructure::db::sqlite::memory_store;
    use figment::providers::{Format, Serialized, Toml};
    use figment::Figment;
    use std::fmt::Write as _;

    const MARKDOWN_CSV: &str = "\
No,Content,A,B,C,D,Answered
2,\"[\"\"Which service runs code without servers?\"\"]\",EC2,Lambda,EBS,,\"# Answer
- **Correct option:** B
- **Reason:** Lambda is serverless.\"
3,,x,y,z,w,\"**Correct option:** A\"
4,Which two are databases?,RDS,S3,DynamoDB,SQS,\"**Correct options:** A and C\"";

    fn exam_dump_csv(rows: usize) -> String {
        let mut csv = String::from("ID,Question,Chose_A,Chose_B,Chose_C,Chose_D,Answered,Explain\n");
        for i in 1..=rows {
            writeln!(
                csv,
                "{i},Question {i},a{i},b{i},c{i},d{i},\"[{{\"\"voted_answers\"\": \"\"B\"\"}}]\",Reason {i}"
            )
            .unwrap();
        }
        csv
    }

    fn config() -> IngestConfig {
        IngestConfig {
            database_url: Some("sqlite::memory:".to_string()),
            ..IngestConfig::default()
        }
    }

    fn table(content: &str) -> CsvTable {
        CsvParser::new().parse_content(content).unwrap()
    }

    #[test]
    fn test_build_drafts_drops_empty_rows() {
        let pipeline = IngestPipeline::new(config());
        let batch = pipeline
            .build_drafts(&table(MARKDOWN_CSV), "AWS DVA-C02 Dump 1", 0)
            .unwrap();

        assert_eq!(batch.dropped, 1);
        assert_eq!(batch.drafts.len(), 2);
        assert_eq!(batch.drafts[0].id, 1000);
        assert_eq!(batch.drafts[0].content, "Which service runs code without servers?");
        assert_eq!(batch.drafts[1].id, 1002);
        let flags: Vec<bool> = batch.drafts[1].answers.iter().map(|a| a.is_correct).collect();
        assert_eq!(flags, vec![true, false, true, false]);
    }

    #[test]
    fn test_unknown_columns_rejected() {
        let pipeline = IngestPipeline::new(config());
        let err = pipeline
            .build_drafts(&table("name,age\nAlice,30"), "set", 0)
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_import_table_is_idempotent() {
        let pipeline = IngestPipeline::new(config());
        let mut store = memory_store().await;
        let input = table(MARKDOWN_CSV);

        let first = pipeline.import_table(&mut store, &input).await.unwrap();
        assert_eq!(first.rows_read, 3);
        assert_eq!(first.dropped, 1);
        assert_eq!(first.imported, 2);

        let second = pipeline.import_table(&mut store, &input).await.unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(store.count_questions().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalid_id_aborts_before_store_access() {
        let pipeline = IngestPipeline::new(IngestConfig {
            id_strategy: IdStrategy::FromColumn,
            ..config()
        });
        let mut store = memory_store().await;
        let input = table("ID,Question,Chose_A,Answered\n1,Q1,a,A\nx2,Q2,b,A\n");

        let err = pipeline.import_table(&mut store, &input).await.unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
        assert_eq!(store.count_questions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_split_then_import_day_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Data.csv");
        std::fs::write(&input, exam_dump_csv(530)).unwrap();
        let days = dir.path().join("split_days");

        let pipeline = IngestPipeline::new(IngestConfig {
            id_strategy: IdStrategy::FromColumn,
            category: "AWS Certified Developer - Associate DVA-C02".to_string(),
            max_chunks: Some(25),
            ..config()
        });

        let split = pipeline.split_file(&input, &days).unwrap();
        assert_eq!(split.rows_read, 530);
        assert_eq!(split.files_written, 25);

        let last_day = CsvParser::new()
            .parse_file(&days.join("DVA-C02_Day_25.csv"))
            .unwrap();
        assert_eq!(last_day.len(), 20);
        assert_eq!(last_day.rows[19].get("ID"), Some("500"));
        assert_eq!(last_day.headers[0], "ID");
        assert!(!days.join("DVA-C02_Day_26.csv").exists());

        let mut store = memory_store().await;
        let report = pipeline.import_day_files(&mut store, &days).await.unwrap();
        assert_eq!(report.rows_read, 500);
        assert_eq!(report.imported, 500);
        assert_eq!(store.count_questions().await.unwrap(), 500);

        let question = store.find_question(21).await.unwrap().unwrap();
        assert_eq!(question.question_set.as_deref(), Some("DVA-C02_Day_2"));
        let answers = store.list_answers(21).await.unwrap();
        assert!(answers[1].is_correct);
        assert_eq!(answers[1].explanation.as_deref(), Some("Reason 21"));

        let again = pipeline.import_day_files(&mut store, &days).await.unwrap();
        assert_eq!(again.imported, 0);
        assert_eq!(again.skipped, 500);
    }

    #[tokio::test]
    async fn test_artifact_round_trip_with_update() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("drafts.yaml");
        let pipeline = IngestPipeline::new(config());

        let saved = pipeline.save_artifact(&table(MARKDOWN_CSV), &artifact).unwrap();
        assert_eq!(saved.drafts_built, 2);
        assert_eq!(saved.files_written, 1);

        let mut store = memory_store().await;
        let first = pipeline.import_artifact(&mut store, &artifact).await.unwrap();
        assert_eq!(first.imported, 2);

        let edited = std::fs::read_to_string(&artifact)
            .unwrap()
            .replace("Which two are databases?", "Which two are managed databases?");
        std::fs::write(&artifact, edited).unwrap();

        let updating = IngestPipeline::new(IngestConfig {
            mode: ReconcileMode::UpdateExisting,
            ..config()
        });
        let second = updating.import_artifact(&mut store, &artifact).await.unwrap();
        assert_eq!(second.imported, 2);
        assert_eq!(
            store.find_question(1002).await.unwrap().unwrap().content,
            "Which two are managed databases?"
        );
        assert_eq!(store.count_answers().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_run_split_command() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("dump.csv");
        std::fs::write(&input, exam_dump_csv(45)).unwrap();

        let report = IngestPipeline::new(IngestConfig {
            command: PipelineCommand::Split,
            input_path: Some(input),
            output_dir: Some(dir.path().join("out")),
            ..config()
        })
        .run()
        .await
        .unwrap();

        assert_eq!(report.files_written, 3);
    }

    fn split_config(dir: &Path, extra: &str) -> IngestConfig {
        let toml = format!(
            "command = \"split\"\ninput_path = {:?}\noutput_dir = {:?}\n{}",
            dir.join("Data.csv"),
            dir.join("days"),
            extra
        );
        ConfigService::from_figment(
            Figment::from(Serialized::defaults(IngestConfig::default())).merge(Toml::string(&toml)),
        )
        .load()
        .unwrap()
    }

    #[tokio::test]
    async fn test_configured_split_bounded_and_unbounded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Data.csv"), exam_dump_csv(530)).unwrap();

        let unbounded = split_config(dir.path(), "");
        assert_eq!(unbounded.max_chunks, None);
        let report = IngestPipeline::new(unbounded).run().await.unwrap();
        assert_eq!(report.files_written, 27);
        let last = CsvParser::new()
            .parse_file(&dir.path().join("days").join("DVA-C02_Day_27.csv"))
            .unwrap();
        assert_eq!(last.len(), 10);
        assert_eq!(last.rows[9].get("ID"), Some("530"));

        let bounded = split_config(dir.path(), "max_chunks = 25");
        assert_eq!(bounded.max_chunks, Some(25));
        let report = IngestPipeline::new(bounded).run().await.unwrap();
        assert_eq!(report.files_written, 25);
        assert!(!dir.path().join("days").join("DVA-C02_Day_26.csv").exists());
    }

    #[tokio::test]
    async fn test_run_import_missing_file() {
        let err = IngestPipeline::new(IngestConfig {
            input_path: Some("does/not/exist.csv".into()),
            ..config()
        })
        .run()
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
