use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::Result;

/// Scoped scratch directory for one job's intermediate artifacts
///
/// Frame dumps, downloaded audio and pre-publish videos all live inside a
/// single temporary directory that is removed when the workspace drops,
/// on success and failure alike. Finished results leave the workspace only
/// through [`Workspace::publish`], so a caller never observes a partial
/// file at the destination.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("photomorph-").tempdir()?;
        debug!(path = %dir.path().display(), "created job workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path for a named artifact inside the workspace
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Create (if needed) and return a subdirectory inside the workspace
    pub fn subdir(&self, name: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Move a finished artifact out of the workspace to its destination.
    ///
    /// Rename is atomic on the same filesystem; when the destination lives
    /// elsewhere the artifact is copied and the workspace copy removed.
    pub fn publish(&self, artifact: &Path, destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        match fs::rename(artifact, destination) {
            Ok(()) => Ok(()),
            Err(_) => {
                fs::copy(artifact, destination)?;
                fs::remove_file(artifact)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_artifacts_live_inside_the_workspace() {
        let workspace = Workspace::new().unwrap();
        let artifact = workspace.artifact("silent.mp4");
        assert!(artifact.starts_with(workspace.path()));
    }

    #[test]
    fn test_subdir_is_created() {
        let workspace = Workspace::new().unwrap();
        let frames = workspace.subdir("frames").unwrap();
        assert!(frames.is_dir());
    }

    #[test]
    fn test_publish_moves_the_artifact() {
        let workspace = Workspace::new().unwrap();
        let artifact = workspace.artifact("result.mp4");
        fs::write(&artifact, b"video bytes").unwrap();

        let dest_dir = tempdir().unwrap();
        let destination = dest_dir.path().join("nested").join("out.mp4");
        workspace.publish(&artifact, &destination).unwrap();

        assert!(!artifact.exists());
        assert_eq!(fs::read(&destination).unwrap(), b"video bytes");
    }

    #[test]
    fn test_drop_releases_every_artifact() {
        let leftover;
        {
            let workspace = Workspace::new().unwrap();
            leftover = workspace.path().to_path_buf();
            fs::write(workspace.artifact("frame.png"), b"pixels").unwrap();
            workspace.subdir("frames").unwrap();
        }
        assert!(!leftover.exists());
    }
}
