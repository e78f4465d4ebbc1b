//! Per-submission scratch directories.
//!
//! Every judging run owns exactly one [`Workspace`]. The directory is removed
//! by [`Workspace::release`] on the normal path, and by `Drop` on every other
//! path (early return, panic, or the judging future being dropped). Removal is
//! synchronous; a workspace only holds a source file and a build artifact.

use std::{
    io,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

use crate::lang::LanguageSpec;

pub const WORKSPACE_PREFIX: &str = "judge-";

/// Creates workspaces under a common parent directory.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceManager {
    /// Parent directory. `None` means the OS temp directory.
    root: Option<PathBuf>,
}

impl WorkspaceManager {
    pub fn new(root: Option<PathBuf>) -> Self {
        WorkspaceManager { root }
    }

    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Create a fresh, uniquely-named directory laid out for `lang`, on the
    /// blocking thread pool.
    pub async fn acquire(&self, lang: &LanguageSpec) -> io::Result<Workspace> {
        let mgr = self.clone();
        let lang = lang.clone();
        tokio::task::spawn_blocking(move || mgr.acquire_blocking(&lang))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }

    /// Synchronous version of [`WorkspaceManager::acquire`].
    pub fn acquire_blocking(&self, lang: &LanguageSpec) -> io::Result<Workspace> {
        let root = self.root();
        std::fs::create_dir_all(&root)?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .rand_bytes(12)
            .tempdir_in(&root)?;

        let root_path = dir.path().to_owned();
        let source_file_path = root_path.join(lang.source_file_name());
        let build_artifact_path = lang
            .compile_template
            .as_ref()
            .and(lang.artifact.as_ref())
            .map(|artifact| root_path.join(artifact));

        Ok(Workspace {
            dir: Some(dir),
            root_path,
            source_file_path,
            build_artifact_path,
        })
    }
}

/// An isolated scratch directory for one judging run.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    root_path: PathBuf,
    source_file_path: PathBuf,
    build_artifact_path: Option<PathBuf>,
}

impl Workspace {
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn source_file_path(&self) -> &Path {
        &self.source_file_path
    }

    pub fn build_artifact_path(&self) -> Option<&Path> {
        self.build_artifact_path.as_deref()
    }

    /// The file the run template should point at: the build artifact when
    /// there is one, otherwise the source itself.
    pub fn run_target(&self) -> &Path {
        self.build_artifact_path
            .as_deref()
            .unwrap_or(&self.source_file_path)
    }

    /// Write the submitted source verbatim.
    pub async fn write_source(&self, source_code: &str) -> io::Result<()> {
        tokio::fs::write(&self.source_file_path, source_code.as_bytes()).await
    }

    /// Remove the workspace and everything inside it.
    pub fn release(mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => {
                let res = dir.close();
                tracing::debug!(path = %self.root_path.display(), ok = res.is_ok(), "Workspace released");
                res
            }
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                tracing::error!(
                    "Failed to remove workspace {}: {}",
                    self.root_path.display(),
                    e
                );
            } else {
                tracing::debug!(path = %self.root_path.display(), "Workspace removed on drop");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lang::LanguageRegistry;

    fn manager() -> (TempDir, WorkspaceManager) {
        let root = tempfile::tempdir().unwrap();
        let mgr = WorkspaceManager::new(Some(root.path().to_owned()));
        (root, mgr)
    }

    #[test]
    fn test_layout() {
        let (_root, mgr) = manager();
        let reg = LanguageRegistry::with_builtins(None);

        let ws = mgr.acquire_blocking(&reg.resolve("cpp").unwrap()).unwrap();
        assert!(ws.root_path().is_dir());
        assert!(ws
            .root_path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(WORKSPACE_PREFIX));
        assert_eq!(ws.source_file_path(), ws.root_path().join("solution.cpp"));
        assert_eq!(ws.run_target(), ws.root_path().join("a.out"));

        let ws = mgr.acquire_blocking(&reg.resolve("python").unwrap()).unwrap();
        assert_eq!(ws.build_artifact_path(), None);
        assert_eq!(ws.run_target(), ws.source_file_path());
    }

    #[test]
    fn test_unique_paths() {
        let (_root, mgr) = manager();
        let lang = LanguageSpec::interpreted("sh", ".sh", &["sh", "$src"]);
        let a = mgr.acquire_blocking(&lang).unwrap();
        let b = mgr.acquire_blocking(&lang).unwrap();
        assert_ne!(a.root_path(), b.root_path());
    }

    #[tokio::test]
    async fn test_release_removes_everything() {
        let (_root, mgr) = manager();
        let lang = LanguageSpec::interpreted("sh", ".sh", &["sh", "$src"]);
        let ws = mgr.acquire(&lang).await.unwrap();
        ws.write_source("echo hi\n").await.unwrap();
        std::fs::create_dir(ws.root_path().join("nested")).unwrap();
        std::fs::write(ws.root_path().join("nested/file"), "x").unwrap();

        let path = ws.root_path().to_owned();
        ws.release().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_everything() {
        let (_root, mgr) = manager();
        let lang = LanguageSpec::interpreted("sh", ".sh", &["sh", "$src"]);
        let path = {
            let ws = mgr.acquire(&lang).await.unwrap();
            ws.write_source("echo hi\n").await.unwrap();
            ws.root_path().to_owned()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_source_written_verbatim() {
        let (_root, mgr) = manager();
        let lang = LanguageSpec::interpreted("sh", ".sh", &["sh", "$src"]);
        let ws = mgr.acquire(&lang).await.unwrap();
        let code = "print('héllo')\r\n\tindented  \n";
        ws.write_source(code).await.unwrap();
        assert_eq!(std::fs::read_to_string(ws.source_file_path()).unwrap(), code);
        ws.release().unwrap();
    }
}
