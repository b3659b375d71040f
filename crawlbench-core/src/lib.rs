#![forbid(unsafe_code)]
//! Speed-regression harness for website downloaders.
//!
//! A [`Sweep`] times the crawler at each concurrency level through a [`Trial`],
//! the [`ResultLog`] supplies the baseline and keeps history, and [`report`]
//! turns both into per-level verdicts. [`Shootout`] is the fixed-duration
//! comparison of several downloaders.

pub mod baseline;
pub mod config;
pub mod error;
pub mod process;
pub mod regress;
pub mod report;
pub mod shootout;
pub mod sweep;
pub mod trial;
pub mod workspace;

pub use baseline::{BaselineMode, ResultLog, ResultVector};
pub use config::{Contender, HarnessConfig, RegressConfig, ShootoutConfig};
pub use error::{BenchError, Result};
pub use process::{AbortSignal, ChildHandle, Exit};
pub use regress::{seed, Measurement, Regression};
pub use report::{report, Direction, Verdict};
pub use shootout::{Shootout, ShootoutEntry, ShootoutObserver};
pub use sweep::{level_label, level_labels, Sweep, SweepObserver};
pub use trial::{ProcessTrial, Trial};
pub use workspace::{Workspace, WorkspacePolicy};
