use crate::error::Result;
use ignore::WalkBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A repository's working directory for the duration of one analysis.
///
/// Owned copies (fresh clones) are deleted when the value drops, on the
/// success path and on every error path alike. Borrowed copies (local
/// repositories) are never touched.
#[derive(Debug)]
pub struct WorkingCopy {
    path: PathBuf,
    owned: bool,
}

impl WorkingCopy {
    pub fn borrowed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
        }
    }

    /// Creates the directory at `path` and takes ownership of it. Fails
    /// with `AlreadyExists` when the directory is already there, so a
    /// path is owned by at most one working copy at a time.
    pub fn claim(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir(&path)?;
        Ok(Self::owned(path))
    }

    fn owned(path: PathBuf) -> Self {
        Self { path, owned: true }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkingCopy {
    fn drop(&mut self) {
        if !self.owned || !self.path.exists() {
            return;
        }
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed working copy"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove working copy"),
        }
    }
}

/// Every regular file below `root`, sorted. Hidden entries (including
/// `.git`) are skipped; ignore files are not honored.
pub fn enumerate_files(root: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .parents(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_some_and(|t| t.is_file()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
