//! Error taxonomy shared by every harness component.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = BenchError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BenchError {
	/// The binary under test could not be started.
	#[error("failed to spawn {}: {source}", binary.display())]
	Spawn {
		binary: PathBuf,
		#[source]
		source: std::io::Error,
	},
	/// Nothing to compare against; raised before any trial runs.
	#[error("no baseline in {}: {reason}", path.display())]
	MissingBaseline { path: PathBuf, reason: String },
	/// The new record could not be appended to the result log.
	#[error("could not write to {}: {source}", path.display())]
	Persist {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("invariant violated: {0}")]
	Invariant(String),
	#[error("aborted: {0}")]
	Aborted(String),
	#[error("{} did not finish within {:.1}s", binary.display(), after.as_secs_f64())]
	TimedOut { binary: PathBuf, after: Duration },
	#[error("config: {0}")]
	Config(String),
	#[error("refusing to use existing directory {}: its contents would be counted and removed", .0.display())]
	WorkspaceExists(PathBuf),
	#[error("refusing to overwrite existing file: {}", .0.display())]
	AlreadyExists(PathBuf),
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
}

impl BenchError {
	pub fn config(msg: impl Into<String>) -> Self { Self::Config(msg.into()) }
	pub fn invariant(msg: impl Into<String>) -> Self { Self::Invariant(msg.into()) }
	pub fn aborted(msg: impl Into<String>) -> Self { Self::Aborted(msg.into()) }

	/// Losing history is the only failure that still lets a run report its findings.
	pub fn is_fatal(&self) -> bool {
		!matches!(self, Self::Persist { .. })
	}
}
