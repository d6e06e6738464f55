//! Scoped temporary workspaces for the external-memory operations.
//!
//! Each external sort or group-partition call owns one workspace for its
//! spill files. The workspace is created on entry and removed recursively
//! when the guard drops, so early returns and panics inside the operation
//! still clean up. A cleanup failure is logged but never masks the
//! operation's own error.

use crate::common::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// RAII guard around a process-unique temporary directory.
pub struct TempWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl TempWorkspace {
    /// Create a workspace under `base`, or under the OS temp root when
    /// `base` is `None`.
    pub fn create(prefix: &str, base: Option<&Path>) -> Result<Self> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix(prefix);
            b
        };

        let dir = match base {
            Some(base) => builder.tempdir_in(base),
            None => builder.tempdir(),
        }
        .map_err(|e| Error::TempDir(e.to_string()))?;

        let path = dir.path().to_path_buf();
        log::debug!("created temp workspace {}", path.display());

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Path of the workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path for a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("failed to remove temp workspace {}: {e}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_removed_on_drop() {
        let path;
        {
            let ws = TempWorkspace::create("tatami-test-", None).unwrap();
            path = ws.path().to_path_buf();
            std::fs::write(ws.file("chunk_0.tmp"), b"data").unwrap();
            std::fs::create_dir(ws.file("nested")).unwrap();
            std::fs::write(ws.file("nested/inner.tmp"), b"data").unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_workspace_in_override_dir() {
        let base = tempfile::tempdir().unwrap();
        let ws = TempWorkspace::create("tatami-test-", Some(base.path())).unwrap();
        assert!(ws.path().starts_with(base.path()));
    }
}
