use crate::baseline::ResultVector;
use crate::config::validate_levels;
use crate::error::{BenchError, Result};
use crate::process::AbortSignal;
use crate::trial::Trial;
use std::time::Duration;
use tracing::info;

/// Display label for a concurrency level, e.g. "Single thread" or "Four threads".
pub fn level_label(level: u32) -> String {
	const WORDS: [&str; 8] = ["Single", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight"];
	match level {
		1 => "Single thread".into(),
		2..=8 => format!("{} threads", WORDS[level as usize - 1]),
		n => format!("{n} threads"),
	}
}

pub fn level_labels(levels: &[u32]) -> Vec<String> {
	levels.iter().map(|&l| level_label(l)).collect()
}

/// Progress hooks invoked as the sweep advances. Every hook defaults to a no-op.
pub trait SweepObserver {
	fn level_started(&mut self, _level: u32, _retries: u32) {}
	/// `iteration` counts from 1.
	fn trial_finished(&mut self, _level: u32, _iteration: u32, _retries: u32, _elapsed: Duration) {}
	fn level_finished(&mut self, _level: u32, _mean_secs: f64) {}
}

impl SweepObserver for () {}

/// Runs every concurrency level `retries` times, in order, and averages per level.
#[derive(Debug, Clone)]
pub struct Sweep {
	levels: Vec<u32>,
	retries: u32,
}

impl Sweep {
	pub fn new(levels: Vec<u32>, retries: u32) -> Result<Self> {
		validate_levels(&levels)?;
		if retries == 0 {
			return Err(BenchError::config("retries must be at least 1"));
		}
		Ok(Self { levels, retries })
	}

	pub fn levels(&self) -> &[u32] { &self.levels }

	pub fn retries(&self) -> u32 { self.retries }

	/// One mean per level, same order as the levels. Any failure abandons the remaining
	/// levels and no partial vector is returned.
	pub async fn run<T, O>(&self, trial: &T, abort: &AbortSignal, observer: &mut O) -> Result<ResultVector>
	where
		T: Trial + ?Sized,
		O: SweepObserver + ?Sized,
	{
		let mut results = Vec::with_capacity(self.levels.len());
		for &level in &self.levels {
			observer.level_started(level, self.retries);
			let mut total = 0.0_f64;
			for iteration in 1..=self.retries {
				if abort.is_aborted() {
					return Err(BenchError::aborted(format!("sweep stopped before {} run {iteration}/{}", level_label(level), self.retries)));
				}
				let elapsed = trial.run(level, abort).await?;
				total += elapsed.as_secs_f64();
				observer.trial_finished(level, iteration, self.retries, elapsed);
			}
			let mean = total / f64::from(self.retries);
			info!(level, retries = self.retries, mean_secs = mean, "level finished");
			observer.level_finished(level, mean);
			results.push(mean);
		}
		Ok(results)
	}
}
