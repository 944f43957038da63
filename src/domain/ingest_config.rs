// ============================================================
// INGESTION CONFIGURATION
// ============================================================
// Run parameters for the exam-dump ingestion pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::question::ReconcileMode;

/// Commits every N imported questions during day-file imports unless
/// `commit_every` overrides it
pub const DAY_FILE_COMMIT_EVERY: usize = 10;

/// What a pipeline run does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineCommand {
    /// Read one CSV, build drafts, reconcile them (or save the draft artifact)
    #[default]
    Import,
    /// Split one CSV into numbered day files, no store access
    Split,
    /// Import every day file of a directory in sequence order
    ImportDays,
    /// Reconcile drafts from a previously saved artifact
    ImportArtifact,
}

/// How question ids are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Parse the row's id column
    FromColumn,
    /// `start_id + row_index`
    #[default]
    Sequential,
}

/// Resolved id assignment for one pipeline invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdAssignment {
    FromColumn,
    Sequential { start_id: i64 },
}

/// When the reconciliation engine commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPolicy {
    /// One commit after the whole run
    AtEnd,
    /// Commit after every N imported questions, plus a final commit
    Every(usize),
}

impl CommitPolicy {
    pub fn from_option(commit_every: Option<usize>) -> Self {
        match commit_every {
            Some(n) => CommitPolicy::Every(n),
            None => CommitPolicy::AtEnd,
        }
    }
}

/// Configuration for an ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub command: PipelineCommand,

    /// CSV file (or draft artifact for `import_artifact`)
    pub input_path: Option<PathBuf>,

    /// Falls back to `DATABASE_URL` when unset
    pub database_url: Option<String>,

    pub id_strategy: IdStrategy,

    /// First id for sequential assignment (default: 1000)
    pub start_id: i64,

    pub category: String,

    pub question_set: String,

    pub mode: ReconcileMode,

    /// Commit batch size; unset commits once at the end of the run
    pub commit_every: Option<usize>,

    /// Option marked correct when no correctness annotation can be parsed.
    /// Keeps every question answerable; change only with a product decision.
    pub default_correct_option: char,

    /// Save drafts here instead of importing
    pub save_artifact_path: Option<PathBuf>,

    /// Day-file directory, written by `split` and read by `import_days`
    pub output_dir: Option<PathBuf>,

    /// Day-file name prefix; files are named `<prefix><n>.csv`, n from 1
    pub file_prefix: String,

    /// Rows per day file (default: 20)
    pub chunk_size: usize,

    /// Maximum number of day files; rows past `chunk_size * max_chunks`
    /// are dropped. Unset splits every row.
    pub max_chunks: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            command: PipelineCommand::Import,
            input_path: None,
            database_url: None,
            id_strategy: IdStrategy::Sequential,
            start_id: 1000,
            category: "aws".to_string(),
            question_set: "AWS DVA-C02 Dump 1".to_string(),
            mode: ReconcileMode::SkipExisting,
            commit_every: None,
            default_correct_option: 'A',
            save_artifact_path: None,
            output_dir: None,
            file_prefix: "DVA-C02_Day_".to_string(),
            chunk_size: 20,
            max_chunks: None,
        }
    }
}

impl IngestConfig {
    pub fn id_assignment(&self) -> IdAssignment {
        match self.id_strategy {
            IdStrategy::FromColumn => IdAssignment::FromColumn,
            IdStrategy::Sequential => IdAssignment::Sequential {
                start_id: self.start_id,
            },
        }
    }

    pub fn commit_policy(&self) -> CommitPolicy {
        CommitPolicy::from_option(self.commit_every)
    }

    /// Day-file imports always batch, 10 at a time unless configured
    pub fn day_file_commit_policy(&self) -> CommitPolicy {
        CommitPolicy::Every(self.commit_every.unwrap_or(DAY_FILE_COMMIT_EVERY))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }
        if self.max_chunks == Some(0) {
            return Err("max_chunks must be > 0 when set".to_string());
        }
        if self.commit_every == Some(0) {
            return Err("commit_every must be > 0 when set".to_string());
        }
        if !('A'..='E').contains(&self.default_correct_option) {
            return Err(format!(
                "default_correct_option must be one of A-E, got '{}'",
                self.default_correct_option
            ));
        }
        if self.file_prefix.trim().is_empty() {
            return Err("file_prefix must not be empty".to_string());
        }

        match self.command {
            PipelineCommand::Import => {
                self.require_input()?;
                if self.save_artifact_path.is_none() {
                    self.require_database()?;
                }
            }
            PipelineCommand::Split => {
                self.require_input()?;
                self.require_output_dir()?;
            }
            PipelineCommand::ImportDays => {
                self.require_output_dir()?;
                self.require_database()?;
            }
            PipelineCommand::ImportArtifact => {
                self.require_input()?;
                self.require_database()?;
            }
        }
        Ok(())
    }

    fn require_input(&self) -> Result<(), String> {
        match self.input_path {
            Some(_) => Ok(()),
            None => Err(format!("input_path is required for {:?}", self.command)),
        }
    }

    fn require_output_dir(&self) -> Result<(), String> {
        match self.output_dir {
            Some(_) => Ok(()),
            None => Err(format!("output_dir is required for {:?}", self.command)),
        }
    }

    fn require_database(&self) -> Result<(), String> {
        match self.database_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(()),
            _ => Err(format!(
                "database_url (or DATABASE_URL) is required for {:?}",
                self.command
            )),
        }
    }
}
