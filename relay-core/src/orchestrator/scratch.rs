use crate::error::Result;
use std::path::PathBuf;
use tempfile::{Builder, TempDir};

/// Hands out private scratch directories. Each one is deleted when its
/// [`TempDir`] guard drops, on success and on every early return.
#[derive(Debug, Clone, Default)]
pub struct ScratchSpace {
    root: Option<PathBuf>,
}

impl ScratchSpace {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn create(&self, prefix: &str) -> Result<TempDir> {
        let mut builder = Builder::new();
        builder.prefix(prefix);

        let dir = match &self.root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}
