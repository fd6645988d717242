#![allow(dead_code)]

use async_trait::async_trait;
use relay_core::config::NotifierConfig;
use relay_core::error::{RelayError, Result};
use relay_core::generator::{GeneratedSite, SiteGenerator, StaticSiteGenerator};
use relay_core::notifier::{CallbackClient, NotificationPayload, Notifier};
use relay_core::publisher::{RepositoryInfo, RepositoryPublisher};
use relay_core::storage::RecordStore;
use relay_core::submission::{AttachmentDescriptor, SubmissionRequest};
use relay_core::Orchestrator;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SECRET: &str = "topsecret";

/// Real generator that also remembers every directory it wrote into.
#[derive(Default)]
pub struct RecordingGenerator {
    inner: StaticSiteGenerator,
    pub dirs: Mutex<Vec<PathBuf>>,
    pub outputs: Mutex<Vec<GeneratedSite>>,
}

#[async_trait]
impl SiteGenerator for RecordingGenerator {
    async fn generate(
        &self,
        task: &str,
        brief: &str,
        attachments: &[AttachmentDescriptor],
        target_dir: &Path,
    ) -> Result<GeneratedSite> {
        self.dirs.lock().unwrap().push(target_dir.to_path_buf());
        let site = self.inner.generate(task, brief, attachments, target_dir).await?;
        self.outputs.lock().unwrap().push(site.clone());
        Ok(site)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublisherCall {
    Create(String),
    Push { repo: String, files: Vec<String> },
    EnableHosting(String),
    Clone(String),
    Update { working_dir: PathBuf, message: String },
}

/// In-process stand-in for the hosting provider.
#[derive(Default)]
pub struct FakePublisher {
    pub calls: Mutex<Vec<PublisherCall>>,
    pub scratch_dirs: Mutex<Vec<PathBuf>>,
    pub fail_push: bool,
    pub hosting_url: Option<String>,
    commits: AtomicUsize,
}

impl FakePublisher {
    pub fn with_hosting() -> Self {
        Self {
            hosting_url: Some("https://octo.github.io/site/".to_string()),
            ..Self::default()
        }
    }

    pub fn failing_push() -> Self {
        Self {
            fail_push: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<PublisherCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: PublisherCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_sha(&self) -> String {
        format!("sha-{}", self.commits.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn list_files(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

#[async_trait]
impl RepositoryPublisher for FakePublisher {
    async fn create_repository(&self, name: &str) -> Result<RepositoryInfo> {
        self.record(PublisherCall::Create(name.to_string()));
        Ok(RepositoryInfo {
            owner: "octo".to_string(),
            name: name.to_string(),
            html_url: format!("https://github.com/octo/{}", name),
        })
    }

    async fn push(&self, directory: &Path, repo_full: &str) -> Result<String> {
        self.scratch_dirs.lock().unwrap().push(directory.to_path_buf());
        self.record(PublisherCall::Push {
            repo: repo_full.to_string(),
            files: list_files(directory),
        });
        if self.fail_push {
            return Err(RelayError::Git("git push failed (exit 128): remote rejected".to_string()));
        }
        Ok(self.next_sha())
    }

    async fn enable_hosting(&self, repo_full: &str) -> Result<Option<String>> {
        self.record(PublisherCall::EnableHosting(repo_full.to_string()));
        Ok(self.hosting_url.clone())
    }

    async fn clone_repository(&self, repo_full: &str, target_dir: &Path) -> Result<PathBuf> {
        self.record(PublisherCall::Clone(repo_full.to_string()));
        self.scratch_dirs.lock().unwrap().push(target_dir.to_path_buf());
        let working = target_dir.join(repo_full.rsplit('/').next().unwrap_or(repo_full));
        std::fs::create_dir_all(&working)?;
        Ok(working)
    }

    async fn update_with_directory(
        &self,
        working_dir: &Path,
        new_files_dir: &Path,
        message: &str,
    ) -> Result<String> {
        self.scratch_dirs.lock().unwrap().push(new_files_dir.to_path_buf());
        self.record(PublisherCall::Update {
            working_dir: working_dir.to_path_buf(),
            message: message.to_string(),
        });
        Ok(self.next_sha())
    }
}

/// Callback that fails a fixed number of times, then answers 200.
pub struct ScriptedCallback {
    failures_left: AtomicUsize,
    pub received: Mutex<Vec<(String, NotificationPayload)>>,
    /// When set, every delivery notes whether the record was already stored.
    watched_store: Option<Arc<dyn RecordStore>>,
    pub stored_at_delivery: Mutex<Vec<bool>>,
}

impl ScriptedCallback {
    pub fn succeeding() -> Self {
        Self::failing(0)
    }

    pub fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            received: Mutex::new(Vec::new()),
            watched_store: None,
            stored_at_delivery: Mutex::new(Vec::new()),
        }
    }

    pub fn watching(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.watched_store = Some(store);
        self
    }

    pub fn received(&self) -> Vec<(String, NotificationPayload)> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallbackClient for ScriptedCallback {
    async fn post_json(&self, url: &str, payload: &NotificationPayload, _timeout: Duration) -> Result<u16> {
        if let Some(store) = &self.watched_store {
            let stored = store.find_latest(&payload.email, &payload.task).await?.is_some();
            self.stored_at_delivery.lock().unwrap().push(stored);
        }
        self.received.lock().unwrap().push((url.to_string(), payload.clone()));
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Ok(503);
        }
        Ok(200)
    }
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub store: Arc<dyn RecordStore>,
    pub generator: Arc<RecordingGenerator>,
    pub publisher: Arc<FakePublisher>,
    pub callback: Arc<ScriptedCallback>,
}

pub fn harness(
    store: Arc<dyn RecordStore>,
    publisher: FakePublisher,
    callback: ScriptedCallback,
) -> Harness {
    build_harness(store, publisher, callback, false)
}

/// Same collaborators, but notification runs on a spawned task.
pub fn background_harness(
    store: Arc<dyn RecordStore>,
    publisher: FakePublisher,
    callback: ScriptedCallback,
) -> Harness {
    build_harness(store, publisher, callback, true)
}

fn build_harness(
    store: Arc<dyn RecordStore>,
    publisher: FakePublisher,
    callback: ScriptedCallback,
    background: bool,
) -> Harness {
    let generator = Arc::new(RecordingGenerator::default());
    let publisher = Arc::new(publisher);
    let callback = Arc::new(callback);

    let notifier_config = NotifierConfig {
        initial_delay_ms: 1,
        ..NotifierConfig::default()
    };

    let orchestrator = Orchestrator::new(
        SECRET,
        store.clone(),
        generator.clone(),
        publisher.clone(),
        Notifier::new(callback.clone(), &notifier_config),
    )
    .with_background_notify(background);

    Harness {
        orchestrator,
        store,
        generator,
        publisher,
        callback,
    }
}

pub fn request(round: Value) -> SubmissionRequest {
    request_with(json!({ "round": round }))
}

/// Baseline valid submission with `overrides` merged on top.
pub fn request_with(overrides: Value) -> SubmissionRequest {
    let mut body = json!({
        "secret": SECRET,
        "email": "student@example.com",
        "task": "captcha-solver",
        "brief": "Create a captcha solver that handles ?url=https://.../image.png",
        "round": 1,
        "nonce": "ab12-cd34",
        "attachments": [
            { "name": "sample.txt", "url": "data:text/plain;base64,aGVsbG8=" },
            { "name": "remote.png", "url": "https://example.com/remote.png" }
        ],
        "evaluation_url": "https://eval.example.com/notify"
    });

    if let (Some(base), Value::Object(extra)) = (body.as_object_mut(), overrides) {
        for (key, value) in extra {
            base.insert(key, value);
        }
    }

    serde_json::from_value(body).unwrap()
}
