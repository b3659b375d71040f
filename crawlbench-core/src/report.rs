//! Relative speed of a new run against the baseline, per concurrency level.

use crate::error::{BenchError, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Faster,
	Slower,
	Unchanged,
}

impl Direction {
	/// Sign of the percentage decides; there is no separate flag to disagree with it.
	pub fn of(percent: f64) -> Self {
		if percent < 0.0 {
			Self::Faster
		} else if percent > 0.0 {
			Self::Slower
		} else {
			Self::Unchanged
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
	pub label: String,
	/// Negative means the new run took less time.
	pub percent: f64,
	pub direction: Direction,
}

impl Verdict {
	pub fn new(label: impl Into<String>, baseline: f64, new: f64) -> Self {
		let percent = speedup_percent(baseline, new);
		Self { label: label.into(), percent, direction: Direction::of(percent) }
	}

	/// The "N% faster" part of the line.
	pub fn change(&self) -> String {
		match self.direction {
			Direction::Faster => format!("{:.2}% faster", self.percent.abs()),
			Direction::Slower => format!("{:.2}% slower", self.percent),
			Direction::Unchanged => "0.00% faster/slower (no change)".into(),
		}
	}
}

impl fmt::Display for Verdict {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} was {}", self.label, self.change())
	}
}

/// `new * 100 / baseline - 100`, rearranged so the sign is exactly that of `new - baseline`
/// and equal inputs give exactly zero.
pub fn speedup_percent(baseline: f64, new: f64) -> f64 {
	(new - baseline) * 100.0 / baseline
}

/// Reject a baseline that cannot be compared with a sweep over `width` levels.
pub fn check_compatible(width: usize, baseline: &[f64]) -> Result<()> {
	if baseline.len() != width {
		return Err(BenchError::invariant(format!(
			"baseline has {} values but {width} concurrency levels are configured; was it recorded for another level set?",
			baseline.len()
		)));
	}
	if let Some((i, v)) = baseline.iter().enumerate().find(|(_, v)| **v <= 0.0 || !v.is_finite()) {
		return Err(BenchError::invariant(format!("baseline value {v} at position {} is not a valid duration", i + 1)));
	}
	Ok(())
}

/// Every verdict, or an error before any of them is produced.
pub fn report(labels: &[String], baseline: &[f64], new: &[f64]) -> Result<Vec<Verdict>> {
	if labels.len() != new.len() {
		return Err(BenchError::invariant(format!("{} labels for {} results", labels.len(), new.len())));
	}
	check_compatible(labels.len(), baseline)?;
	Ok(labels
		.iter()
		.zip(baseline.iter().zip(new))
		.map(|(label, (&b, &n))| Verdict::new(label.as_str(), b, n))
		.collect())
}
