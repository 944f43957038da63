// ============================================================
// RECONCILIATION ENGINE
// ============================================================
// Insert, update or skip drafts against the question store with
// bounded transactions

use crate::domain::error::{AppError, Result};
use crate::domain::ingest_config::CommitPolicy;
use crate::domain::question::{QuestionDraft, ReconcileMode, ReconcileSummary};
use crate::domain::store::QuestionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Imported,
    Skipped,
}

pub struct ReconciliationEngine {
    mode: ReconcileMode,
    commit_policy: CommitPolicy,
}

impl ReconciliationEngine {
    pub fn new(mode: ReconcileMode, commit_policy: CommitPolicy) -> Self {
        Self {
            mode,
            commit_policy,
        }
    }

    /// Reconcile drafts in order.
    ///
    /// On any failure the open transaction is rolled back and the run stops
    /// with `AppError::ImportAborted`; batches committed earlier are kept.
    pub async fn reconcile<S>(&self, store: &mut S, drafts: &[QuestionDraft]) -> Result<ReconcileSummary>
    where
        S: QuestionStore + ?Sized,
    {
        let mut summary = ReconcileSummary::default();
        let mut committed = 0usize;

        for draft in drafts {
            match self.apply(store, draft).await {
                Ok(Applied::Imported) => summary.imported += 1,
                Ok(Applied::Skipped) => {
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => return Err(abort(store, Some(draft.id), committed, e).await),
            }

            if let CommitPolicy::Every(batch) = self.commit_policy {
                if summary.imported % batch == 0 {
                    if let Err(e) = store.commit().await {
                        return Err(abort(store, Some(draft.id), committed, e).await);
                    }
                    committed = summary.imported;
                    tracing::info!(imported = summary.imported, "Committed batch");
                }
            }
        }

        if let Err(e) = store.commit().await {
            return Err(abort(store, None, committed, e).await);
        }

        tracing::info!(
            imported = summary.imported,
            skipped = summary.skipped,
            mode = %self.mode,
            "Reconciliation complete"
        );
        Ok(summary)
    }

    async fn apply<S>(&self, store: &mut S, draft: &QuestionDraft) -> Result<Applied>
    where
        S: QuestionStore + ?Sized,
    {
        draft.validate()?;

        match store.find_question(draft.id).await? {
            Some(_) if self.mode == ReconcileMode::SkipExisting => {
                tracing::info!(question_id = draft.id, "Skipping existing question");
                return Ok(Applied::Skipped);
            }
            Some(_) => {
                tracing::info!(question_id = draft.id, "Updating question");
                store.update_question(draft).await?;
                let removed = store.delete_answers(draft.id).await?;
                tracing::debug!(question_id = draft.id, removed, "Deleted old answers");
            }
            None => {
                tracing::info!(question_id = draft.id, "Adding question");
                store.insert_question(draft).await?;
            }
        }

        for answer in &draft.answers {
            store.insert_answer(draft.id, answer).await?;
        }

        Ok(Applied::Imported)
    }
}

/// Roll back the open transaction and describe where the run stopped
async fn abort<S>(store: &mut S, question_id: Option<i64>, committed: usize, cause: AppError) -> AppError
where
    S: QuestionStore + ?Sized,
{
    tracing::error!(
        question_id = ?question_id,
        committed,
        "Import failed, rolling back: {}",
        cause
    );

    let mut reason = cause.to_string();
    if let Err(rollback_err) = store.rollback().await {
        tracing::error!("Rollback failed: {}", rollback_err);
        reason = format!("{}; rollback also failed: {}", reason, rollback_err);
    }

    AppError::ImportAborted {
        question_id,
        committed,
        reason,
    }
}
