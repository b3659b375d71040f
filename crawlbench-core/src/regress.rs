//! The regression run: baseline first, then the sweep, then the comparison.

use crate::baseline::{ResultLog, ResultVector};
use crate::config::RegressConfig;
use crate::error::{BenchError, Result};
use crate::process::AbortSignal;
use crate::report::{check_compatible, report, Verdict};
use crate::sweep::{level_labels, Sweep, SweepObserver};
use crate::trial::Trial;
use crate::workspace::{Workspace, WorkspacePolicy};
use tracing::{info, warn};

/// Outcome of one sweep compared against the stored baseline.
#[derive(Debug, Clone)]
pub struct Measurement {
	pub results: ResultVector,
	pub verdicts: Vec<Verdict>,
}

/// A regression run whose baseline has already been loaded and checked.
#[derive(Debug)]
pub struct Regression<'a> {
	cfg: &'a RegressConfig,
	log: ResultLog,
	baseline: ResultVector,
	sweep: Sweep,
}

impl<'a> Regression<'a> {
	/// Load the baseline and check it against the configured levels. Nothing is spawned here,
	/// so an unusable result file fails fast.
	pub fn load(cfg: &'a RegressConfig) -> Result<Self> {
		let sweep = Sweep::new(cfg.levels.clone(), cfg.retries)?;
		let log = ResultLog::new(&cfg.result_file);
		let baseline = log.load_baseline(cfg.mode)?;
		check_compatible(cfg.levels.len(), &baseline)?;
		Ok(Self { cfg, log, baseline, sweep })
	}

	pub fn baseline(&self) -> &[f64] { &self.baseline }

	pub fn sweep(&self) -> &Sweep { &self.sweep }

	/// Run the sweep inside a fresh workspace and compare it with the baseline.
	/// The workspace is removed whether or not the sweep succeeded.
	pub async fn measure<T, O>(&self, trial: &T, abort: &AbortSignal, observer: &mut O) -> Result<Measurement>
	where
		T: Trial + ?Sized,
		O: SweepObserver + ?Sized,
	{
		let results = sweep_in_workspace(self.cfg, &self.sweep, trial, abort, observer).await?;
		let verdicts = report(&level_labels(self.sweep.levels()), &self.baseline, &results)?;
		Ok(Measurement { results, verdicts })
	}

	/// Append the new results to the log. A [`BenchError::Persist`] here loses history only.
	pub fn record(&self, measurement: &Measurement) -> Result<()> {
		self.log.append(&measurement.results)?;
		info!(path = %self.log.path().display(), "recorded new result");
		Ok(())
	}
}

/// Measure without comparing and start a new result log from it.
pub async fn seed<T, O>(cfg: &RegressConfig, overwrite: bool, trial: &T, abort: &AbortSignal, observer: &mut O) -> Result<ResultVector>
where
	T: Trial + ?Sized,
	O: SweepObserver + ?Sized,
{
	let sweep = Sweep::new(cfg.levels.clone(), cfg.retries)?;
	let log = ResultLog::new(&cfg.result_file);
	// Checked up front as well, so a long sweep is not wasted on a file we won't write.
	if log.path().exists() && !overwrite {
		return Err(BenchError::AlreadyExists(log.path().to_path_buf()));
	}
	let results = sweep_in_workspace(cfg, &sweep, trial, abort, observer).await?;
	log.create(&results, overwrite)?;
	Ok(results)
}

async fn sweep_in_workspace<T, O>(cfg: &RegressConfig, sweep: &Sweep, trial: &T, abort: &AbortSignal, observer: &mut O) -> Result<ResultVector>
where
	T: Trial + ?Sized,
	O: SweepObserver + ?Sized,
{
	let mut workspace = Workspace::prepare(&cfg.output, WorkspacePolicy::Reuse).await?;
	if cfg.keep_output {
		workspace.keep();
	}
	let swept = sweep.run(trial, abort, observer).await;
	// Best effort; the sweep's outcome stands either way.
	if let Err(e) = workspace.cleanup().await {
		warn!(path = %cfg.output.display(), "could not remove download directory: {e}");
	}
	swept
}
