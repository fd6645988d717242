//! Static site generation for a submitted task.

pub mod data_uri;
pub mod static_site;

pub use data_uri::DataUri;
pub use static_site::StaticSiteGenerator;

use crate::error::Result;
use crate::submission::AttachmentDescriptor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File names written into the target directory, relative to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSite {
    pub files: Vec<String>,
}

/// Deterministic apart from the filesystem writes into `target_dir`. Each call
/// starts from scratch; nothing from earlier rounds is merged in.
#[async_trait]
pub trait SiteGenerator: Send + Sync {
    async fn generate(
        &self,
        task: &str,
        brief: &str,
        attachments: &[AttachmentDescriptor],
        target_dir: &Path,
    ) -> Result<GeneratedSite>;
}
