//! One timed crawl of the binary under test.

use crate::config::RegressConfig;
use crate::error::{BenchError, Result};
use crate::process::{AbortSignal, ChildHandle, Exit};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// A single measurement at one concurrency level.
#[async_trait]
pub trait Trial: Send + Sync {
	/// Run to completion and return the elapsed wall-clock time.
	async fn run(&self, concurrency: u32, abort: &AbortSignal) -> Result<Duration>;
}

/// Times `<binary> -j <concurrency> -o <destination> <url>` from spawn to exit.
#[derive(Debug, Clone)]
pub struct ProcessTrial {
	binary: PathBuf,
	url: String,
	destination: PathBuf,
	timeout: Option<Duration>,
}

impl ProcessTrial {
	pub fn new(binary: impl Into<PathBuf>, url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
		Self { binary: binary.into(), url: url.into(), destination: destination.into(), timeout: None }
	}

	pub fn from_config(cfg: &RegressConfig) -> Self {
		Self::new(&cfg.binary, &cfg.url, &cfg.output).with_timeout(cfg.trial_timeout())
	}

	pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn binary(&self) -> &Path { &self.binary }

	fn command(&self, concurrency: u32) -> Command {
		let mut cmd = Command::new(&self.binary);
		cmd.arg("-j").arg(concurrency.to_string()).arg("-o").arg(&self.destination).arg(&self.url);
		cmd
	}
}

#[async_trait]
impl Trial for ProcessTrial {
	async fn run(&self, concurrency: u32, abort: &AbortSignal) -> Result<Duration> {
		let start = Instant::now();
		let mut child = ChildHandle::spawn(self.command(concurrency), &self.binary)?;
		let exit = child.wait_until(abort, self.timeout).await?;
		let elapsed = start.elapsed();
		match exit {
			Exit::Exited(status) => {
				if !status.success() {
					warn!(binary = %self.binary.display(), concurrency, %status, "crawler exited unsuccessfully, keeping its time");
				}
				debug!(concurrency, secs = elapsed.as_secs_f64(), "trial finished");
				Ok(elapsed)
			}
			Exit::Aborted => Err(BenchError::aborted(format!("trial with {concurrency} job(s) interrupted"))),
			Exit::LimitReached => Err(BenchError::TimedOut { binary: self.binary.clone(), after: self.timeout.unwrap_or(elapsed) }),
		}
	}
}
