//! Hosted repository operations.

pub mod git;
pub mod github;

pub use git::GitOps;
pub use github::GithubPublisher;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub owner: String,
    pub name: String,
    pub html_url: String,
}

impl RepositoryInfo {
    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// None of these calls are retried by the caller; a failure aborts the workflow.
#[async_trait]
pub trait RepositoryPublisher: Send + Sync {
    async fn create_repository(&self, name: &str) -> Result<RepositoryInfo>;

    /// Publishes the contents of `directory` as the first commit; returns its sha.
    async fn push(&self, directory: &Path, repo_full: &str) -> Result<String>;

    /// Turns on static hosting. `None` when the provider does not report a URL yet.
    async fn enable_hosting(&self, repo_full: &str) -> Result<Option<String>>;

    /// Clones into a subdirectory of `target_dir` and returns the working copy path.
    async fn clone_repository(&self, repo_full: &str, target_dir: &Path) -> Result<PathBuf>;

    /// Overlays `new_files_dir` onto `working_dir`, commits and pushes; returns the new sha.
    /// Files absent from `new_files_dir` are left in place.
    async fn update_with_directory(
        &self,
        working_dir: &Path,
        new_files_dir: &Path,
        message: &str,
    ) -> Result<String>;
}
