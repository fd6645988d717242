//! Round-based publish-and-notify orchestration.
//!
//! `handle` authenticates, validates the round, and runs the matching
//! workflow to completion before returning. Round 1 creates a repository,
//! round 2 updates the one recorded for the same `(email, task)`.
//!
//! Nothing here rolls back: a repository created before a later step fails
//! stays created, and a record inserted before notification fails stays
//! inserted.

mod round_one;
mod round_two;
pub mod scratch;

pub use scratch::ScratchSpace;

use crate::error::{ErrorKind, RelayError, Result};
use crate::generator::SiteGenerator;
use crate::log_workflow;
use crate::notifier::{NotificationPayload, Notifier};
use crate::observability::{MetricsCollector, SubmissionOutcome};
use crate::publisher::RepositoryPublisher;
use crate::security::verify_secret;
use crate::storage::{PublishRecord, RecordStore};
use crate::submission::{Acknowledgement, Round, Submission, SubmissionRequest};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

pub struct Orchestrator {
    expected_secret: String,
    store: Arc<dyn RecordStore>,
    generator: Arc<dyn SiteGenerator>,
    publisher: Arc<dyn RepositoryPublisher>,
    notifier: Notifier,
    scratch: ScratchSpace,
    notify_in_background: bool,
    metrics: Option<MetricsCollector>,
}

impl Orchestrator {
    pub fn new(
        expected_secret: impl Into<String>,
        store: Arc<dyn RecordStore>,
        generator: Arc<dyn SiteGenerator>,
        publisher: Arc<dyn RepositoryPublisher>,
        notifier: Notifier,
    ) -> Self {
        Self {
            expected_secret: expected_secret.into(),
            store,
            generator,
            publisher,
            notifier,
            scratch: ScratchSpace::default(),
            notify_in_background: false,
            metrics: None,
        }
    }

    pub fn with_scratch_root(mut self, root: Option<PathBuf>) -> Self {
        self.scratch = ScratchSpace::new(root);
        self
    }

    pub fn with_background_notify(mut self, enabled: bool) -> Self {
        self.notify_in_background = enabled;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Authenticates and runs the submission's round. The acknowledgement is
    /// decided at dispatch and does not reflect whether notification worked.
    pub async fn handle(&self, request: &SubmissionRequest) -> Result<Acknowledgement> {
        if !verify_secret(request.secret.as_deref(), &self.expected_secret) {
            tracing::warn!(email = ?request.email, task = ?request.task, "Rejected submission with invalid secret");
            self.record_outcome(SubmissionOutcome::Unauthorized);
            return Err(RelayError::Authentication);
        }

        let submission = match request.validate() {
            Ok(submission) => submission,
            Err(e) => {
                tracing::warn!(email = ?request.email, task = ?request.task, round = ?request.round, error = %e, "Rejected submission");
                self.record_outcome(SubmissionOutcome::Rejected);
                return Err(e);
            }
        };

        let span = tracing::info_span!(
            "submission",
            email = %submission.email,
            task = %submission.task,
            round = submission.round.number(),
        );

        if let Some(metrics) = &self.metrics {
            metrics.increment_active();
        }
        let started = Instant::now();
        let result = self.dispatch(&submission).instrument(span).await;
        if let Some(metrics) = &self.metrics {
            metrics.decrement_active();
            metrics.observe_workflow(started.elapsed().as_secs_f64());
        }

        match result {
            Ok(record) => {
                log_workflow!(info, submission, repo = %record.repo_full, commit = %record.commit_sha, "Round complete");
                self.record_outcome(SubmissionOutcome::Accepted);
                Ok(Acknowledgement::accepted(&submission))
            }
            Err(e) => {
                match e.kind() {
                    ErrorKind::Downstream => {
                        log_workflow!(error, submission, error = %e, "Round failed");
                        self.record_outcome(SubmissionOutcome::Failed);
                    }
                    _ => {
                        log_workflow!(warn, submission, error = %e, "Round rejected");
                        self.record_outcome(SubmissionOutcome::Rejected);
                    }
                }
                Err(e)
            }
        }
    }

    async fn dispatch(&self, submission: &Submission) -> Result<PublishRecord> {
        match submission.round {
            Round::Create => self.run_round_one(submission).await,
            Round::Update => self.run_round_two(submission).await,
        }
    }

    /// Inline by default; with background notify the request returns without
    /// waiting for the callback. Either way the outcome is only logged.
    async fn notify(&self, submission: &Submission, record: &PublishRecord) {
        let payload = NotificationPayload {
            email: record.email.clone(),
            task: record.task.clone(),
            round: record.round,
            nonce: record.nonce.clone(),
            repo_url: record.repo_url.clone(),
            commit_sha: record.commit_sha.clone(),
            pages_url: record.pages_url.clone(),
        };

        if self.notify_in_background {
            let notifier = self.notifier.clone();
            let url = submission.evaluation_url.clone();
            tokio::spawn(
                async move {
                    notifier.notify(&url, &payload).await;
                }
                .in_current_span(),
            );
        } else if !self.notifier.notify(&submission.evaluation_url, &payload).await {
            log_workflow!(warn, submission, "Evaluator was not notified; publish stands");
        }
    }

    fn record_outcome(&self, outcome: SubmissionOutcome) {
        if let Some(metrics) = &self.metrics {
            metrics.record_submission(outcome);
        }
    }
}
