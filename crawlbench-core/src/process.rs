//! Child process handle and the abort request observed while waiting on it.

use crate::error::{BenchError, Result};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Operator request to stop the current run. Cloning shares the same request.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
	token: CancellationToken,
}

impl AbortSignal {
	pub fn new() -> Self { Self::default() }

	pub fn abort(&self) { self.token.cancel(); }

	pub fn is_aborted(&self) -> bool { self.token.is_cancelled() }

	/// Resolves once [`AbortSignal::abort`] has been called.
	pub async fn aborted(&self) { self.token.cancelled().await }
}

/// How a waited-on child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
	Exited(ExitStatus),
	/// Abort was requested; the child has been terminated and reaped.
	Aborted,
	/// The wait limit elapsed; the child has been terminated and reaped.
	LimitReached,
}

/// A running child with both output streams discarded.
#[derive(Debug)]
pub struct ChildHandle {
	child: Child,
	program: PathBuf,
}

impl ChildHandle {
	/// Spawn `command`, sending stdin, stdout and stderr to the null device.
	pub fn spawn(mut command: Command, program: &Path) -> Result<Self> {
		command
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.kill_on_drop(true);
		let child = command
			.spawn()
			.map_err(|source| BenchError::Spawn { binary: program.to_path_buf(), source })?;
		debug!(program = %program.display(), pid = ?child.id(), "spawned child");
		Ok(Self { child, program: program.to_path_buf() })
	}

	pub fn program(&self) -> &Path { &self.program }

	pub async fn wait(&mut self) -> Result<ExitStatus> {
		Ok(self.child.wait().await?)
	}

	/// Kill the child and reap it so no orphan outlives the harness.
	///
	/// On Unix this is SIGKILL, not SIGINT: the child gets no chance to flush or finish
	/// writing files it has open. A shootout therefore only counts what was already on
	/// disk when the time ran out.
	pub async fn terminate(&mut self) -> Result<()> {
		if let Err(e) = self.child.start_kill() {
			// Already exited; reaping below is still required.
			debug!(program = %self.program.display(), "kill skipped: {e}");
		}
		let status = self.child.wait().await?;
		debug!(program = %self.program.display(), %status, "child terminated");
		Ok(())
	}

	/// Wait for exit, an abort request, or `limit`, whichever comes first.
	pub async fn wait_until(&mut self, abort: &AbortSignal, limit: Option<Duration>) -> Result<Exit> {
		let outcome = tokio::select! {
			biased;
			_ = abort.aborted() => Exit::Aborted,
			res = wait_with_limit(&mut self.child, limit) => match res {
				Some(status) => Exit::Exited(status?),
				None => Exit::LimitReached,
			},
		};
		if outcome == Exit::Aborted {
			warn!(program = %self.program.display(), "abort requested, terminating child");
		}
		if !matches!(outcome, Exit::Exited(_)) {
			self.terminate().await?;
		}
		Ok(outcome)
	}
}

async fn wait_with_limit(child: &mut Child, limit: Option<Duration>) -> Option<std::io::Result<ExitStatus>> {
	match limit {
		Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
		None => Some(child.wait().await),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn abort_signal_is_shared_between_clones() {
		let a = AbortSignal::new();
		let b = a.clone();
		assert!(!b.is_aborted());
		a.abort();
		assert!(b.is_aborted());
		b.aborted().await;
	}

	#[tokio::test]
	async fn spawn_of_missing_program_names_it() {
		let program = Path::new("/nonexistent/crawlbench/crawler");
		let err = ChildHandle::spawn(Command::new(program), program).unwrap_err();
		assert!(matches!(err, BenchError::Spawn { .. }));
		assert!(err.to_string().contains("/nonexistent/crawlbench/crawler"));
	}
}
