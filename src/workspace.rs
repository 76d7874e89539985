//! Per-run temporary workspaces
//!
//! A `Workspace` is a uniquely named directory that is removed with all of
//! its contents when the handle is dropped, whichever way the run ends.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, warn};

const WORKSPACE_PREFIX: &str = "verdict-";

/// Exclusively owned temporary directory
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a workspace under the system temp directory
    pub fn acquire() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()?;
        debug!("Acquired workspace {:?}", dir.path());
        Ok(Self { dir })
    }

    /// Create a workspace under `root`, creating `root` if needed
    pub fn acquire_in(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)?;
        debug!("Acquired workspace {:?}", dir.path());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file directly inside the workspace
    pub async fn write_file(&self, name: &str, content: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, content).await?;
        Ok(path)
    }

    /// Remove the workspace now, reporting failures instead of ignoring them
    pub fn close(self) -> std::io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            warn!("Failed to remove workspace {:?}: {}", path, e);
            e
        })?;
        debug!("Released workspace {:?}", path);
        Ok(())
    }
}
