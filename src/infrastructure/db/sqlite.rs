use crate::domain::error::{AppError, Result};
use crate::domain::question::{AnswerDraft, PersistedAnswer, PersistedQuestion, QuestionDraft};
use crate::domain::store::QuestionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Sqlite, Transaction,
};
use std::str::FromStr;

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS questions (
        id INTEGER PRIMARY KEY,
        content TEXT NOT NULL,
        image_url TEXT,
        category TEXT,
        question_set TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        deleted_at DATETIME
    )",
    "CREATE TABLE IF NOT EXISTS answers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
        content TEXT,
        image_url TEXT,
        is_correct BOOLEAN NOT NULL DEFAULT 0,
        explanation TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        deleted_at DATETIME
    )",
    "CREATE INDEX IF NOT EXISTS idx_answers_question_id ON answers(question_id)",
];

/// Question store over one SQLite connection.
///
/// All reads and writes go through a single transaction that is begun on
/// first use and ends at `commit`, `rollback` or `close`.
pub struct SqliteQuestionStore {
    pool: SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteQuestionStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to parse connection string: {}", e))
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        // One connection: the pipeline is sequential and in-memory databases
        // live only as long as their connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        Ok(Self { pool, tx: None })
    }

    /// Create the question and answer tables when they are missing
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to create table: {}", e)))?;
        }
        Ok(())
    }

    /// Release the connection, discarding anything left uncommitted
    pub async fn close(mut self) {
        if let Some(tx) = self.tx.take() {
            if let Err(e) = tx.rollback().await {
                tracing::warn!("Failed to roll back open transaction on close: {}", e);
            }
        }
        self.pool.close().await;
    }

    async fn tx(&mut self) -> Result<&mut Transaction<'static, Sqlite>> {
        if self.tx.is_none() {
            let tx = self
                .pool
                .begin()
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;
            self.tx = Some(tx);
        }

        self.tx
            .as_mut()
            .ok_or_else(|| AppError::Internal("Transaction missing after begin".to_string()))
    }

    pub async fn list_answers(&mut self, question_id: i64) -> Result<Vec<PersistedAnswer>> {
        let tx = self.tx().await?;
        let answers = sqlx::query_as::<_, AnswerEntity>(
            "SELECT id, question_id, content, is_correct, explanation
             FROM answers WHERE question_id = ? ORDER BY id ASC",
        )
        .bind(question_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list answers: {}", e)))?;

        Ok(answers.into_iter().map(|a| a.into()).collect())
    }

    pub async fn count_questions(&mut self) -> Result<i64> {
        let tx = self.tx().await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions")
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count questions: {}", e)))?;

        Ok(count)
    }

    pub async fn count_answers(&mut self) -> Result<i64> {
        let tx = self.tx().await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM answers")
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count answers: {}", e)))?;

        Ok(count)
    }
}

#[async_trait]
impl QuestionStore for SqliteQuestionStore {
    async fn find_question(&mut self, id: i64) -> Result<Option<PersistedQuestion>> {
        let tx = self.tx().await?;
        let question = sqlx::query_as::<_, QuestionEntity>(
            "SELECT id, content, category, question_set, created_at, updated_at
             FROM questions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch question {}: {}", id, e)))?;

        Ok(question.map(|q| q.into()))
    }

    async fn insert_question(&mut self, draft: &QuestionDraft) -> Result<()> {
        let now = Utc::now();
        let tx = self.tx().await?;
        sqlx::query(
            "INSERT INTO questions (id, content, category, question_set, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(draft.id)
        .bind(&draft.content)
        .bind(&draft.category)
        .bind(&draft.question_set)
        .bind(now)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to insert question {}: {}", draft.id, e))
        })?;

        Ok(())
    }

    async fn update_question(&mut self, draft: &QuestionDraft) -> Result<()> {
        let tx = self.tx().await?;
        let result = sqlx::query(
            "UPDATE questions SET content = ?, category = ?, question_set = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&draft.content)
        .bind(&draft.category)
        .bind(&draft.question_set)
        .bind(Utc::now())
        .bind(draft.id)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to update question {}: {}", draft.id, e))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Question {} vanished before update", draft.id)));
        }

        Ok(())
    }

    async fn delete_answers(&mut self, question_id: i64) -> Result<u64> {
        let tx = self.tx().await?;
        let result = sqlx::query("DELETE FROM answers WHERE question_id = ?")
            .bind(question_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to delete answers of question {}: {}",
                    question_id, e
                ))
            })?;

        Ok(result.rows_affected())
    }

    async fn insert_answer(&mut self, question_id: i64, answer: &AnswerDraft) -> Result<()> {
        let now = Utc::now();
        let tx = self.tx().await?;
        sqlx::query(
            "INSERT INTO answers (question_id, content, is_correct, explanation, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(question_id)
        .bind(&answer.content)
        .bind(answer.is_correct)
        .bind(&answer.explanation)
        .bind(now)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to insert answer for question {}: {}",
                question_id, e
            ))
        })?;

        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit()
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to commit: {}", e)))?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback()
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to roll back: {}", e)))?;
        }
        Ok(())
    }
}

// Internal entities for database mapping
#[derive(sqlx::FromRow)]
struct QuestionEntity {
    id: i64,
    content: String,
    category: Option<String>,
    question_set: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<QuestionEntity> for PersistedQuestion {
    fn from(e: QuestionEntity) -> Self {
        Self {
            id: e.id,
            content: e.content,
            category: e.category,
            question_set: e.question_set,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AnswerEntity {
    id: i64,
    question_id: i64,
    content: Option<String>,
    is_correct: bool,
    explanation: Option<String>,
}

impl From<AnswerEntity> for PersistedAnswer {
    fn from(e: AnswerEntity) -> Self {
        Self {
            id: e.id,
            question_id: e.question_id,
            content: e.content,
            is_correct: e.is_correct,
            explanation: e.explanation,
        }
    }
}

#[cfg(test)]
pub(crate) async fn memory_store() -> SqliteQuestionStore {
    let store = SqliteQuestionStore::connect("sqlite::memory:").await.unwrap();
    store.ensure_schema().await.unwrap();
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(id: i64, content: &str) -> QuestionDraft {
        QuestionDraft {
            id,
            content: content.to_string(),
            category: "aws".to_string(),
            question_set: "Dump 1".to_string(),
            answers: Vec::new(),
        }
    }

    fn answer(content: &str, is_correct: bool) -> AnswerDraft {
        AnswerDraft {
            content: content.to_string(),
            is_correct,
            explanation: is_correct.then(|| "because".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_question_with_caller_id() {
        let mut store = memory_store().await;
        store.insert_question(&draft(1042, "Which service?")).await.unwrap();
        store.insert_answer(1042, &answer("S3", true)).await.unwrap();
        store.insert_answer(1042, &answer("EBS", false)).await.unwrap();
        store.commit().await.unwrap();

        let found = store.find_question(1042).await.unwrap().unwrap();
        assert_eq!(found.id, 1042);
        assert_eq!(found.content, "Which service?");
        assert!(found.created_at.is_some());

        let answers = store.list_answers(1042).await.unwrap();
        assert_eq!(answers.len(), 2);
        assert!(answers[0].is_correct);
        assert_eq!(answers[0].explanation.as_deref(), Some("because"));
        assert_eq!(answers[1].explanation, None);
        assert!(store.find_question(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_answers() {
        let mut store = memory_store().await;
        store.insert_question(&draft(1, "old")).await.unwrap();
        store.insert_answer(1, &answer("a", true)).await.unwrap();
        store.insert_answer(1, &answer("b", false)).await.unwrap();
        store.commit().await.unwrap();

        store.update_question(&draft(1, "new")).await.unwrap();
        assert_eq!(store.delete_answers(1).await.unwrap(), 2);
        store.commit().await.unwrap();

        assert_eq!(store.find_question(1).await.unwrap().unwrap().content, "new");
        assert!(store.list_answers(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rollback_discards_pending_writes() {
        let mut store = memory_store().await;
        store.insert_question(&draft(1, "kept")).await.unwrap();
        store.commit().await.unwrap();

        store.insert_question(&draft(2, "dropped")).await.unwrap();
        store.rollback().await.unwrap();

        assert_eq!(store.count_questions().await.unwrap(), 1);
        assert!(store.find_question(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_a_database_error() {
        let mut store = memory_store().await;
        store.insert_question(&draft(1, "first")).await.unwrap();
        let err = store.insert_question(&draft(1, "second")).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert!(err.to_string().contains("question 1"));
    }

    #[tokio::test]
    async fn test_update_missing_question_is_not_found() {
        let mut store = memory_store().await;
        let err = store.update_question(&draft(9, "x")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
