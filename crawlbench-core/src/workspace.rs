use crate::error::{BenchError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspacePolicy {
	/// An existing directory is fine; the crawler overwrites what it downloads.
	Reuse,
	/// The directory must not exist yet, since everything under it is counted and removed.
	Exclusive,
}

/// Download destination owned by one harness run.
///
/// Removed by [`Workspace::cleanup`], or on drop if the run bails out early.
#[derive(Debug)]
pub struct Workspace {
	root: PathBuf,
	keep: bool,
	cleaned: bool,
}

impl Workspace {
	pub async fn prepare(root: impl Into<PathBuf>, policy: WorkspacePolicy) -> Result<Self> {
		let root = root.into();
		if policy == WorkspacePolicy::Exclusive && tokio::fs::try_exists(&root).await? {
			return Err(BenchError::WorkspaceExists(root));
		}
		tokio::fs::create_dir_all(&root).await?;
		debug!(path = %root.display(), ?policy, "workspace ready");
		Ok(Self { root, keep: false, cleaned: false })
	}

	pub fn path(&self) -> &Path { &self.root }

	pub fn subdir(&self, name: &str) -> PathBuf { self.root.join(name) }

	/// Leave the directory in place after the run.
	pub fn keep(&mut self) { self.keep = true; }

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleaned = true;
		if self.keep {
			debug!(path = %self.root.display(), "keeping workspace");
			return Ok(());
		}
		match tokio::fs::remove_dir_all(&self.root).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}

impl Drop for Workspace {
	fn drop(&mut self) {
		if self.cleaned || self.keep { return; }
		if let Err(e) = std::fs::remove_dir_all(&self.root) {
			if e.kind() != ErrorKind::NotFound {
				warn!(path = %self.root.display(), "failed to remove workspace: {e}");
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn reuse_accepts_existing_and_cleanup_removes() {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path().join("speed");
		std::fs::create_dir_all(root.join("old")).unwrap();
		let ws = Workspace::prepare(&root, WorkspacePolicy::Reuse).await.unwrap();
		assert!(ws.path().exists());
		ws.cleanup().await.unwrap();
		assert!(!root.exists());
	}

	#[tokio::test]
	async fn exclusive_refuses_existing() {
		let dir = tempfile::tempdir().unwrap();
		let err = Workspace::prepare(dir.path(), WorkspacePolicy::Exclusive).await.unwrap_err();
		assert!(matches!(err, BenchError::WorkspaceExists(_)));
		assert!(dir.path().exists());
	}

	#[tokio::test]
	async fn drop_removes_and_keep_preserves() {
		let dir = tempfile::tempdir().unwrap();
		let gone = dir.path().join("gone");
		drop(Workspace::prepare(&gone, WorkspacePolicy::Exclusive).await.unwrap());
		assert!(!gone.exists());

		let kept = dir.path().join("kept");
		let mut ws = Workspace::prepare(&kept, WorkspacePolicy::Reuse).await.unwrap();
		ws.keep();
		ws.cleanup().await.unwrap();
		assert!(kept.exists());
	}

	#[tokio::test]
	async fn cleanup_of_vanished_directory_is_fine() {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path().join("speed");
		let ws = Workspace::prepare(&root, WorkspacePolicy::Reuse).await.unwrap();
		std::fs::remove_dir_all(&root).unwrap();
		ws.cleanup().await.unwrap();
	}
}
