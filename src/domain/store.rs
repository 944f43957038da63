use async_trait::async_trait;

use crate::domain::error::Result;
use crate::domain::question::{AnswerDraft, PersistedQuestion, QuestionDraft};

/// Transactional question store the reconciliation engine writes through.
///
/// Every write joins the store's open transaction (one is begun on demand).
/// `commit` makes the pending writes durable; `rollback` discards them.
#[async_trait]
pub trait QuestionStore: Send {
    async fn find_question(&mut self, id: i64) -> Result<Option<PersistedQuestion>>;

    /// Insert a question under the draft's caller-supplied id
    async fn insert_question(&mut self, draft: &QuestionDraft) -> Result<()>;

    /// Overwrite content, category, question set and the update timestamp
    async fn update_question(&mut self, draft: &QuestionDraft) -> Result<()>;

    /// Delete every answer of a question, returning how many were removed
    async fn delete_answers(&mut self, question_id: i64) -> Result<u64>;

    async fn insert_answer(&mut self, question_id: i64, answer: &AnswerDraft) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}
