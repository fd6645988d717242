use super::Orchestrator;
use crate::error::{RelayError, Result};
use crate::storage::PublishRecord;
use crate::submission::Submission;
use chrono::Utc;

pub(crate) const ROUND_TWO_COMMIT_MESSAGE: &str = "Round 2 automated update";

impl Orchestrator {
    pub(super) async fn run_round_two(&self, submission: &Submission) -> Result<PublishRecord> {
        let previous = self
            .store
            .find_latest(&submission.email, &submission.task)
            .await?
            .ok_or_else(|| RelayError::NoPriorRound {
                email: submission.email.clone(),
                task: submission.task.clone(),
            })?;

        // Matching is by (email, task) only; a different nonce is not rejected.
        if previous.nonce != submission.nonce {
            tracing::debug!(previous_nonce = ?previous.nonce, "Round 2 nonce differs from the recorded one");
        }

        let site_dir = self.scratch.create("updateapp_")?;
        self.generator
            .generate(&submission.task, &submission.brief, &submission.attachments, site_dir.path())
            .await?;

        let clone_dir = self.scratch.create("clonerepo_")?;
        let working_dir = self
            .publisher
            .clone_repository(&previous.repo_full, clone_dir.path())
            .await?;
        let commit_sha = self
            .publisher
            .update_with_directory(&working_dir, site_dir.path(), ROUND_TWO_COMMIT_MESSAGE)
            .await?;
        let pages_url = self.publisher.enable_hosting(&previous.repo_full).await?;

        let mut record = PublishRecord {
            id: None,
            email: submission.email.clone(),
            task: submission.task.clone(),
            round: submission.round.number(),
            nonce: submission.nonce.clone(),
            repo_full: previous.repo_full,
            repo_url: previous.repo_url,
            commit_sha,
            pages_url,
            created_at: Utc::now(),
        };
        record.id = Some(self.store.insert(&record).await?);

        self.notify(submission, &record).await;
        Ok(record)
    }
}
