//! Evaluator notification with exponential backoff.
//!
//! A notification succeeds only on HTTP 200. Any other status, a transport
//! error, or a per-attempt timeout counts as a failed attempt. The outcome is
//! advisory: callers log it and carry on.

use crate::config::NotifierConfig;
use crate::error::{RelayError, Result};
use crate::observability::MetricsCollector;
use crate::resilience::{retry_with_policy, ExponentialBackoffRetry};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Body posted to the evaluation callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub email: String,
    pub task: String,
    pub round: u8,
    pub nonce: Option<String>,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: Option<String>,
}

/// One POST to the callback. Returns the response status code.
#[async_trait]
pub trait CallbackClient: Send + Sync {
    async fn post_json(&self, url: &str, payload: &NotificationPayload, timeout: Duration) -> Result<u16>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpCallbackClient {
    client: Client,
}

impl HttpCallbackClient {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

#[async_trait]
impl CallbackClient for HttpCallbackClient {
    async fn post_json(&self, url: &str, payload: &NotificationPayload, timeout: Duration) -> Result<u16> {
        // `json` sets Content-Type: application/json.
        let response = self
            .client
            .post(url)
            .json(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::Timeout(format!("callback did not answer within {:?}", timeout))
                } else {
                    RelayError::Network(e)
                }
            })?;

        Ok(response.status().as_u16())
    }
}

#[derive(Clone)]
pub struct Notifier {
    client: Arc<dyn CallbackClient>,
    policy: ExponentialBackoffRetry,
    attempt_timeout: Duration,
    metrics: Option<MetricsCollector>,
}

impl Notifier {
    pub fn new(client: Arc<dyn CallbackClient>, config: &NotifierConfig) -> Self {
        Self {
            client,
            policy: ExponentialBackoffRetry::new(config.max_attempts, config.initial_delay()),
            attempt_timeout: config.attempt_timeout(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// `true` once the callback answers 200; `false` after the last attempt fails.
    pub async fn notify(&self, url: &str, payload: &NotificationPayload) -> bool {
        let client = self.client.as_ref();
        let timeout = self.attempt_timeout;
        let metrics = self.metrics.as_ref();

        let outcome = retry_with_policy(
            &self.policy,
            move || async move {
                if let Some(metrics) = metrics {
                    metrics.record_notify_attempt();
                }
                match client.post_json(url, payload, timeout).await {
                    Ok(200) => Ok(()),
                    Ok(status) => Err(RelayError::CallbackStatus(status)),
                    Err(e) => Err(e),
                }
            },
            |attempt, error| {
                tracing::warn!(attempt, url, error = %error, "Evaluation callback attempt failed");
            },
        )
        .await;

        match outcome {
            Ok(()) => {
                tracing::info!(url, task = %payload.task, round = payload.round, "Evaluator notified");
                true
            }
            Err(error) => {
                if let Some(metrics) = metrics {
                    metrics.record_notify_failure();
                }
                tracing::error!(
                    url,
                    email = %payload.email,
                    task = %payload.task,
                    round = payload.round,
                    error = %error,
                    "Giving up on evaluation callback"
                );
                false
            }
        }
    }
}
