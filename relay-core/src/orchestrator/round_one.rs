use super::Orchestrator;
use crate::error::Result;
use crate::security::sanitize_repo_name;
use crate::storage::PublishRecord;
use crate::submission::Submission;
use chrono::Utc;
use uuid::Uuid;

/// `<task>-<6 hex digits>`; 24 random bits make accidental reuse negligible.
pub(crate) fn repository_name(task: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", sanitize_repo_name(task), &suffix[..6])
}

impl Orchestrator {
    pub(super) async fn run_round_one(&self, submission: &Submission) -> Result<PublishRecord> {
        let site_dir = self.scratch.create("genapp_")?;
        let site = self
            .generator
            .generate(&submission.task, &submission.brief, &submission.attachments, site_dir.path())
            .await?;
        tracing::debug!(files = ?site.files, "Generated site");

        let repo = self.publisher.create_repository(&repository_name(&submission.task)).await?;
        let repo_full = repo.full_name();
        let commit_sha = self.publisher.push(site_dir.path(), &repo_full).await?;
        let pages_url = self.publisher.enable_hosting(&repo_full).await?;

        let mut record = PublishRecord {
            id: None,
            email: submission.email.clone(),
            task: submission.task.clone(),
            round: submission.round.number(),
            nonce: submission.nonce.clone(),
            repo_full,
            repo_url: repo.html_url,
            commit_sha,
            pages_url,
            created_at: Utc::now(),
        };
        record.id = Some(self.store.insert(&record).await?);

        self.notify(submission, &record).await;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_name_shape() {
        let name = repository_name("captcha solver");
        let (base, suffix) = name.rsplit_once('-').unwrap();
        assert_eq!(base, "captcha-solver");
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_repository_names_differ() {
        assert_ne!(repository_name("t"), repository_name("t"));
    }
}
