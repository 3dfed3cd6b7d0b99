//! Per-job temporary directory for intermediate audio

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "audiobook_rip_";

/// Private scratch directory owned by one job.
///
/// Removed by [`Workspace::close`], or on drop if the job unwinds some
/// other way. Removal is best-effort.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a workspace under `root`, or the system temp directory
    pub fn create(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        tracing::debug!(path = %dir.path().display(), "Created workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the workspace
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove an intermediate file that no later stage needs
    pub async fn discard(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed intermediate file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove intermediate file")
            }
        }
    }

    /// Remove the directory and anything left inside it
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed workspace"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove workspace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_close() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Some(root.path())).unwrap();
        let path = ws.path().to_path_buf();
        assert!(path.is_dir());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(WORKSPACE_PREFIX));

        std::fs::write(ws.file("stray.bin"), b"x").unwrap();
        ws.close();
        assert!(!path.exists());
    }

    #[test]
    fn dropped_workspace_is_removed() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let ws = Workspace::create(Some(root.path())).unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn discard_tolerates_missing_files() {
        let ws = Workspace::create(None).unwrap();
        let file = ws.file("full_disc.wav");
        std::fs::write(&file, b"pcm").unwrap();

        ws.discard(&file).await;
        assert!(!file.exists());
        ws.discard(&file).await;
        ws.close();
    }
}
