//! Fixed-duration comparison of several downloaders crawling the same site.
//!
//! Each contender gets its own subdirectory of the workspace, runs as
//! `<command> <url>` from inside it for the configured time, and is then
//! terminated. The score is how many files it managed to write.

use crate::config::{Contender, ShootoutConfig};
use crate::error::{BenchError, Result};
use crate::process::{AbortSignal, ChildHandle, Exit};
use crate::workspace::Workspace;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq)]
pub struct ShootoutEntry {
	pub name: String,
	pub command: PathBuf,
	/// Regular files found under the contender's directory.
	pub files: u64,
	pub ran_for: Duration,
	/// The contender exited on its own before its time was up.
	pub finished_early: bool,
}

pub trait ShootoutObserver {
	fn contender_started(&mut self, _contender: &Contender, _run_time: Duration) {}
	fn contender_finished(&mut self, _entry: &ShootoutEntry) {}
}

impl ShootoutObserver for () {}

#[derive(Debug, Clone)]
pub struct Shootout {
	url: String,
	run_time: Duration,
	contenders: Vec<Contender>,
}

impl Shootout {
	pub fn new(url: impl Into<String>, run_time: Duration, contenders: Vec<Contender>) -> Self {
		Self { url: url.into(), run_time, contenders }
	}

	pub fn from_config(cfg: &ShootoutConfig) -> Self {
		Self::new(&cfg.url, cfg.run_time(), cfg.contenders.clone())
	}

	/// Contenders run one after another so they never compete for bandwidth.
	pub async fn run<O>(&self, workspace: &Workspace, abort: &AbortSignal, observer: &mut O) -> Result<Vec<ShootoutEntry>>
	where
		O: ShootoutObserver + ?Sized,
	{
		let mut entries = Vec::with_capacity(self.contenders.len());
		for contender in &self.contenders {
			if abort.is_aborted() {
				return Err(BenchError::aborted(format!("shootout stopped before {}", contender.name)));
			}
			observer.contender_started(contender, self.run_time);
			let entry = self.run_one(contender, &workspace.subdir(&contender.name), abort).await?;
			info!(name = %entry.name, files = entry.files, "contender finished");
			observer.contender_finished(&entry);
			entries.push(entry);
		}
		Ok(entries)
	}

	async fn run_one(&self, contender: &Contender, dir: &Path, abort: &AbortSignal) -> Result<ShootoutEntry> {
		tokio::fs::create_dir_all(dir).await?;
		let mut cmd = Command::new(&contender.command);
		cmd.arg(&self.url).current_dir(dir);

		let start = Instant::now();
		let mut child = ChildHandle::spawn(cmd, &contender.command)?;
		let finished_early = match child.wait_until(abort, Some(self.run_time)).await? {
			Exit::Aborted => return Err(BenchError::aborted(format!("{} interrupted", contender.name))),
			Exit::LimitReached => false,
			Exit::Exited(status) => {
				warn!(name = %contender.name, %status, "contender exited before its time was up");
				true
			}
		};
		let ran_for = start.elapsed();

		Ok(ShootoutEntry {
			name: contender.name.clone(),
			command: contender.command.clone(),
			files: count_files(dir).await?,
			ran_for,
			finished_early,
		})
	}
}

/// Count regular files below `root`. Symlinks are not followed.
pub async fn count_files(root: &Path) -> Result<u64> {
	let root = root.to_path_buf();
	let count = tokio::task::spawn_blocking(move || -> std::io::Result<u64> {
		let mut count = 0;
		for entry in WalkDir::new(&root) {
			if entry.map_err(std::io::Error::from)?.file_type().is_file() {
				count += 1;
			}
		}
		Ok(count)
	})
	.await
	.map_err(|e| BenchError::Io(std::io::Error::other(e)))??;
	Ok(count)
}
