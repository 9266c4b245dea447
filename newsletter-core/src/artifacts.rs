//! Local copies of everything a run produced, kept for human review.

use std::path::{Path, PathBuf};

use crate::error::NewsletterResult;

#[derive(Debug, Clone)]
pub struct Artifacts {
    dir: PathBuf,
}

impl Artifacts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Artifacts { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write `contents` to `<dir>/<name>`, creating the directory as needed.
    pub fn write(&self, name: &str, contents: &str) -> NewsletterResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(name);
        std::fs::write(&path, contents)?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

/// File-name-safe form of a campaign id.
pub fn safe_name(id: &str) -> String {
    id.replace(['/', '\\', ':'], "_")
}
