//! Thin wrapper around the `git` CLI.

use crate::error::{RelayError, Result};
use std::path::Path;
use tokio::process::Command;
use walkdir::WalkDir;

/// Result of a git command execution
#[derive(Debug)]
pub struct GitResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

#[derive(Debug, Clone, Default)]
pub struct GitOps {
    author_name: String,
    author_email: String,
    /// Scrubbed from anything that ends up in an error message.
    secret: Option<String>,
}

impl GitOps {
    pub fn new(author_name: impl Into<String>, author_email: impl Into<String>) -> Self {
        Self {
            author_name: author_name.into(),
            author_email: author_email.into(),
            secret: None,
        }
    }

    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret.filter(|s| !s.is_empty());
        self
    }

    pub async fn execute(&self, cwd: &Path, args: &[&str]) -> Result<GitResult> {
        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GCM_INTERACTIVE", "never")
            .env("GIT_AUTHOR_NAME", &self.author_name)
            .env("GIT_AUTHOR_EMAIL", &self.author_email)
            .env("GIT_COMMITTER_NAME", &self.author_name)
            .env("GIT_COMMITTER_EMAIL", &self.author_email)
            .output()
            .await
            .map_err(|e| RelayError::Git(format!("failed to execute git: {}", e)))?;

        Ok(GitResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Runs git and returns trimmed stdout, or an error carrying the redacted stderr.
    pub async fn run(&self, cwd: &Path, args: &[&str]) -> Result<String> {
        let result = self.execute(cwd, args).await?;
        if result.success {
            return Ok(result.stdout.trim().to_string());
        }

        let subcommand = args.first().copied().unwrap_or("");
        Err(RelayError::Git(format!(
            "git {} failed (exit {}): {}",
            subcommand,
            result.exit_code,
            self.redact(result.stderr.trim())
        )))
    }

    pub async fn head_sha(&self, cwd: &Path) -> Result<String> {
        self.run(cwd, &["rev-parse", "HEAD"]).await
    }

    fn redact(&self, text: &str) -> String {
        match &self.secret {
            Some(secret) => text.replace(secret.as_str(), "***"),
            None => text.to_string(),
        }
    }
}

/// Copies every file under `source` into `dest`, replacing same-named files.
/// Nothing in `dest` is deleted, and `.git` directories in `source` are ignored.
pub fn overlay_directory(source: &Path, dest: &Path) -> Result<Vec<String>> {
    let mut copied = Vec::new();

    let entries = WalkDir::new(source)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in entries {
        let entry = entry.map_err(|e| RelayError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| RelayError::Unknown(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            copied.push(relative.to_string_lossy().to_string());
        }
    }

    Ok(copied)
}
