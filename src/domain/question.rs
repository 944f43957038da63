use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};

/// One answer option of a draft question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerDraft {
    pub content: String,
    pub is_correct: bool,
    /// Only the first correct answer of a question carries the explanation
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Normalized question built from one input row, not yet persisted.
///
/// `id` is the idempotency key: re-running the pipeline over the same input
/// must produce the same id for the same logical question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: i64,
    pub content: String,
    pub category: String,
    pub question_set: String,
    pub answers: Vec<AnswerDraft>,
}

impl QuestionDraft {
    /// Check the invariants a draft must hold before it reaches the store
    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(AppError::ValidationError(format!(
                "Question {} has empty content",
                self.id
            )));
        }
        if self.answers.is_empty() {
            return Err(AppError::ValidationError(format!(
                "Question {} has no answers",
                self.id
            )));
        }
        Ok(())
    }
}

/// Question row as stored
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedQuestion {
    pub id: i64,
    pub content: String,
    pub category: Option<String>,
    pub question_set: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Answer row as stored. `question_id` is a back-reference; answers are
/// deleted together with their question's answer set on replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedAnswer {
    pub id: i64,
    pub question_id: i64,
    pub content: Option<String>,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// What to do with a draft whose id already exists in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    #[default]
    SkipExisting,
    UpdateExisting,
}

impl std::fmt::Display for ReconcileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileMode::SkipExisting => write!(f, "skip_existing"),
            ReconcileMode::UpdateExisting => write!(f, "update_existing"),
        }
    }
}

/// Counters returned by one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub imported: usize,
    pub skipped: usize,
}
