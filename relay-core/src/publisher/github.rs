//! GitHub-backed publisher: REST API for repositories and Pages, `git` for content.

use super::git::{overlay_directory, GitOps};
use super::{RepositoryInfo, RepositoryPublisher};
use crate::config::GithubConfig;
use crate::error::{RelayError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

#[derive(Debug, Deserialize)]
struct RepoOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct CreateRepoResponse {
    name: String,
    html_url: String,
    owner: RepoOwner,
}

#[derive(Debug, Deserialize)]
struct PagesResponse {
    #[serde(default)]
    html_url: Option<String>,
}

pub struct GithubPublisher {
    client: Client,
    api_url: String,
    web_url: String,
    token: String,
    owner: Option<String>,
    branch: String,
    git: GitOps,
}

impl GithubPublisher {
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("task-pages-relay"));
        if !config.token.is_empty() {
            let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
                .map_err(|_| RelayError::InvalidConfig("github token is not a valid header value".into()))?;
            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let git = GitOps::new(&config.author_name, &config.author_email)
            .with_secret(Some(config.token.clone()));

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            web_url: config.web_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            owner: config.owner.clone().filter(|o| !o.is_empty()),
            branch: config.branch.clone(),
            git,
        })
    }

    /// Authenticated HTTPS remote for `repo_full`.
    fn remote_url(&self, repo_full: &str) -> String {
        match self.web_url.split_once("://") {
            Some((scheme, host)) if !self.token.is_empty() => {
                format!("{}://x-access-token:{}@{}/{}.git", scheme, self.token, host, repo_full)
            }
            _ => format!("{}/{}.git", self.web_url, repo_full),
        }
    }

    async fn pages_url_from(&self, response: Response, repo_full: &str) -> Result<Option<String>> {
        let pages: PagesResponse = response.json().await?;
        Ok(pages.html_url.or_else(|| conventional_pages_url(repo_full)))
    }
}

/// `https://{owner}.github.io/{name}/`, used when the API omits `html_url`.
fn conventional_pages_url(repo_full: &str) -> Option<String> {
    let (owner, name) = repo_full.split_once('/')?;
    Some(format!("https://{}.github.io/{}/", owner.to_lowercase(), name))
}

const MAX_ERROR_BODY_CHARS: usize = 512;

async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: String = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect();
    Err(RelayError::Publish(format!("{} returned {}: {}", action, status, body)))
}

#[async_trait]
impl RepositoryPublisher for GithubPublisher {
    async fn create_repository(&self, name: &str) -> Result<RepositoryInfo> {
        let url = match &self.owner {
            Some(owner) => format!("{}/orgs/{}/repos", self.api_url, owner),
            None => format!("{}/user/repos", self.api_url),
        };

        let response = self
            .client
            .post(&url)
            .json(&json!({ "name": name, "private": false, "auto_init": false }))
            .send()
            .await?;
        let created: CreateRepoResponse = ensure_success(response, "create repository")
            .await?
            .json()
            .await?;

        tracing::info!(repo = %created.html_url, "Created repository");
        Ok(RepositoryInfo {
            owner: created.owner.login,
            name: created.name,
            html_url: created.html_url,
        })
    }

    async fn push(&self, directory: &Path, repo_full: &str) -> Result<String> {
        let remote = self.remote_url(repo_full);

        self.git.run(directory, &["init", "-b", &self.branch]).await?;
        self.git.run(directory, &["add", "-A"]).await?;
        self.git.run(directory, &["commit", "-m", INITIAL_COMMIT_MESSAGE]).await?;
        self.git.run(directory, &["remote", "add", "origin", &remote]).await?;
        self.git.run(directory, &["push", "-u", "origin", &self.branch]).await?;

        let sha = self.git.head_sha(directory).await?;
        tracing::info!(repo = repo_full, commit = %sha, "Pushed initial commit");
        Ok(sha)
    }

    async fn enable_hosting(&self, repo_full: &str) -> Result<Option<String>> {
        let url = format!("{}/repos/{}/pages", self.api_url, repo_full);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "source": { "branch": self.branch, "path": "/" } }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => self.pages_url_from(response, repo_full).await,
            StatusCode::CONFLICT => {
                // Already enabled; read the existing site back.
                let existing = self.client.get(&url).send().await?;
                if existing.status().is_success() {
                    self.pages_url_from(existing, repo_full).await
                } else {
                    tracing::warn!(repo = repo_full, status = %existing.status(), "Could not read Pages site");
                    Ok(None)
                }
            }
            status => {
                tracing::warn!(repo = repo_full, %status, "Enabling Pages did not succeed");
                Ok(None)
            }
        }
    }

    async fn clone_repository(&self, repo_full: &str, target_dir: &Path) -> Result<PathBuf> {
        let name = repo_full.rsplit('/').next().unwrap_or(repo_full);
        let dest = target_dir.join(name);
        let dest_arg = dest.to_string_lossy().to_string();
        let remote = self.remote_url(repo_full);

        self.git
            .run(target_dir, &["clone", "--depth", "1", &remote, &dest_arg])
            .await?;

        Ok(dest)
    }

    async fn update_with_directory(
        &self,
        working_dir: &Path,
        new_files_dir: &Path,
        message: &str,
    ) -> Result<String> {
        let source = new_files_dir.to_path_buf();
        let dest = working_dir.to_path_buf();
        let copied = tokio::task::spawn_blocking(move || overlay_directory(&source, &dest))
            .await
            .map_err(|e| RelayError::Unknown(format!("overlay task failed: {}", e)))??;
        tracing::debug!(files = copied.len(), "Overlaid generated files");

        let refspec = format!("HEAD:{}", self.branch);
        self.git.run(working_dir, &["add", "-A"]).await?;
        self.git.run(working_dir, &["commit", "--allow-empty", "-m", message]).await?;
        self.git.run(working_dir, &["push", "origin", &refspec]).await?;

        self.git.head_sha(working_dir).await
    }
}
