// ============================================================
// DRAFT BUILDER
// ============================================================
// Turn one raw CSV row into a normalized question draft

use crate::application::use_cases::correctness::{extract_correct_options, extract_explanation};
use crate::application::use_cases::text_normalizer::{clean_content, clean_text};
use crate::domain::csv::{CsvRow, RowShape};
use crate::domain::error::{AppError, Result};
use crate::domain::ingest_config::IdAssignment;
use crate::domain::question::{AnswerDraft, QuestionDraft};

/// Why a row produced no draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyContent,
    NoOptions,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptyContent => write!(f, "empty content"),
            SkipReason::NoOptions => write!(f, "no answer options"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftOutcome {
    Built(QuestionDraft),
    Skipped(SkipReason),
}

/// Builds drafts for rows of one shape with fixed labels and id assignment
pub struct DraftBuilder {
    shape: RowShape,
    id_assignment: IdAssignment,
    category: String,
    question_set: String,
    default_correct_option: char,
    row_offset: usize,
}

impl DraftBuilder {
    pub fn new(
        shape: RowShape,
        id_assignment: IdAssignment,
        category: impl Into<String>,
        question_set: impl Into<String>,
    ) -> Self {
        Self {
            shape,
            id_assignment,
            category: category.into(),
            question_set: question_set.into(),
            default_correct_option: 'A',
            row_offset: 0,
        }
    }

    /// Option marked correct when the annotation cannot be parsed
    pub fn with_default_correct_option(mut self, option: char) -> Self {
        self.default_correct_option = option.to_ascii_uppercase();
        self
    }

    /// Rows already consumed by earlier files, so sequential ids keep counting
    pub fn with_row_offset(mut self, offset: usize) -> Self {
        self.row_offset = offset;
        self
    }

    pub fn build(&self, row: &CsvRow) -> Result<DraftOutcome> {
        let raw_content = row.first_of(self.shape.content_columns()).unwrap_or("");
        let content = match self.shape {
            RowShape::ExamDump => clean_text(raw_content),
            RowShape::MarkdownAnswered => clean_content(raw_content),
        };

        if content.is_empty() {
            tracing::warn!(row = row.line_number(), "Skipping row: empty content");
            return Ok(DraftOutcome::Skipped(SkipReason::EmptyContent));
        }

        let options = self.option_texts(row);
        if options.is_empty() {
            tracing::warn!(row = row.line_number(), "Skipping row: no answer options");
            return Ok(DraftOutcome::Skipped(SkipReason::NoOptions));
        }

        let id = self.resolve_id(row)?;

        let annotation = row.first_of(self.shape.correctness_columns()).unwrap_or("");
        let mut correct = extract_correct_options(annotation);
        if correct.is_empty() {
            let fallback = self.fallback_option(&options);
            tracing::warn!(
                question_id = id,
                default = %fallback,
                "Could not parse correct answer, using default option"
            );
            correct.insert(fallback);
        }

        let explanation = self.explanation(row, annotation);

        let mut answers = Vec::with_capacity(options.len());
        let mut explanation_added = false;
        for (letter, text) in options {
            let is_correct = correct.contains(&letter);
            let attach = is_correct && !explanation_added;
            if attach {
                explanation_added = true;
            }

            answers.push(AnswerDraft {
                content: text,
                is_correct,
                explanation: if attach { explanation.clone() } else { None },
            });
        }

        if !explanation_added {
            tracing::warn!(
                question_id = id,
                correct = ?correct,
                "No present option is marked correct"
            );
        }

        Ok(DraftOutcome::Built(QuestionDraft {
            id,
            content,
            category: self.category.clone(),
            question_set: self.question_set.clone(),
            answers,
        }))
    }

    /// Non-empty option texts in letter order
    fn option_texts(&self, row: &CsvRow) -> Vec<(char, String)> {
        self.shape
            .option_letters()
            .iter()
            .filter_map(|&letter| {
                let raw = self
                    .shape
                    .option_columns(letter)
                    .iter()
                    .find_map(|column| row.get(column))
                    .unwrap_or("");

                let text = match self.shape {
                    RowShape::ExamDump => clean_text(raw),
                    RowShape::MarkdownAnswered => raw.trim().to_string(),
                };

                (!text.is_empty()).then_some((letter, text))
            })
            .collect()
    }

    /// The configured default letter, or the first present option when the
    /// default has no text
    fn fallback_option(&self, options: &[(char, String)]) -> char {
        let default = self.default_correct_option;
        if options.iter().any(|(letter, _)| *letter == default) {
            return default;
        }
        options.first().map_or(default, |(letter, _)| *letter)
    }

    fn resolve_id(&self, row: &CsvRow) -> Result<i64> {
        match self.id_assignment {
            IdAssignment::Sequential { start_id } => self
                .row_offset
                .checked_add(row.index)
                .and_then(|offset| i64::try_from(offset).ok())
                .and_then(|offset| start_id.checked_add(offset))
                .ok_or_else(|| {
                    AppError::ValidationError(format!(
                        "Sequential id overflows on row {} (start_id {})",
                        row.line_number(),
                        start_id
                    ))
                }),
            IdAssignment::FromColumn => {
                let raw = row.first_of(self.shape.id_columns()).unwrap_or("").trim();
                raw.parse::<i64>().map_err(|e| {
                    AppError::ParseError(format!(
                        "Invalid question id '{}' on row {}: {}",
                        raw,
                        row.line_number(),
                        e
                    ))
                })
            }
        }
    }

    fn explanation(&self, row: &CsvRow, annotation: &str) -> Option<String> {
        match self.shape {
            RowShape::ExamDump => {
                let text = clean_text(row.first_of(self.shape.explanation_columns()).unwrap_or(""));
                (!text.is_empty()).then_some(text)
            }
            RowShape::MarkdownAnswered => extract_explanation(annotation),
        }
    }
}
