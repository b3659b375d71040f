//! Append-only result log and baseline selection.
//!
//! The log is plain text, one record per line, fields separated by `, `:
//!
//! ```text
//! 10.52, 6.01, 3.87
//! 10.31, 5.97, 3.90
//! ```
//!
//! Fields are durations in seconds, one per concurrency level, in level order.

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Mean duration per concurrency level, in level order.
pub type ResultVector = Vec<f64>;

/// Which stored record a new run is compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaselineMode {
	/// The most recently appended record.
	#[default]
	Latest,
	/// Fastest time ever recorded for each level, taken field by field.
	BestEver,
}

impl FromStr for BaselineMode {
	type Err = BenchError;
	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_ascii_lowercase().as_str() {
			"latest" | "last" => Ok(Self::Latest),
			"best-ever" | "best" => Ok(Self::BestEver),
			other => Err(BenchError::config(format!("invalid baseline mode: {other} (expected latest or best-ever)"))),
		}
	}
}

impl fmt::Display for BaselineMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self { Self::Latest => "latest", Self::BestEver => "best-ever" })
	}
}

/// Handle on the result file. Holds no state besides the path; every call hits the disk.
#[derive(Debug, Clone)]
pub struct ResultLog {
	path: PathBuf,
}

impl ResultLog {
	pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

	pub fn path(&self) -> &Path { &self.path }

	/// Every parsable record, oldest first. Blank lines are ignored and malformed ones skipped.
	pub fn records(&self) -> Result<Vec<ResultVector>> {
		let text = std::fs::read_to_string(&self.path).map_err(|e| self.missing(e.to_string()))?;
		let mut out = Vec::new();
		for (n, line) in text.lines().enumerate() {
			if line.trim().is_empty() { continue; }
			match parse_record(line) {
				Some(rec) => out.push(rec),
				None => warn!(path = %self.path.display(), line = n + 1, "skipping malformed result line: {line:?}"),
			}
		}
		Ok(out)
	}

	pub fn load_baseline(&self, mode: BaselineMode) -> Result<ResultVector> {
		let records = self.records()?;
		let latest = records.last().ok_or_else(|| self.missing("no parsable result line".into()))?;
		let baseline = match mode {
			BaselineMode::Latest => latest.clone(),
			BaselineMode::BestEver => {
				let width = latest.len();
				let mut best = vec![f64::INFINITY; width];
				for (n, rec) in records.iter().enumerate() {
					if rec.len() != width {
						warn!(path = %self.path.display(), record = n + 1, "skipping record with {} fields, expected {width}", rec.len());
						continue;
					}
					for (b, v) in best.iter_mut().zip(rec) {
						*b = b.min(*v);
					}
				}
				best
			}
		};
		debug!(path = %self.path.display(), %mode, ?baseline, "loaded baseline");
		Ok(baseline)
	}

	/// Append one record as a single write so concurrent appenders never split a line.
	/// A hand-written last line without a trailing newline is terminated first.
	pub fn append(&self, record: &[f64]) -> Result<()> {
		let mut line = format_record(record);
		let mut file = std::fs::OpenOptions::new()
			.read(true)
			.append(true)
			.create(true)
			.open(&self.path)
			.map_err(|source| self.persist(source))?;
		if lacks_final_newline(&mut file).map_err(|source| self.persist(source))? {
			line.insert(0, '\n');
		}
		file.write_all(line.as_bytes()).map_err(|source| self.persist(source))?;
		Ok(())
	}

	/// Start a new log holding `record` as its only line.
	pub fn create(&self, record: &[f64], overwrite: bool) -> Result<()> {
		if self.path.exists() && !overwrite {
			return Err(BenchError::AlreadyExists(self.path.clone()));
		}
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent).map_err(|source| self.persist(source))?;
		}
		std::fs::write(&self.path, format_record(record)).map_err(|source| self.persist(source))
	}

	fn missing(&self, reason: String) -> BenchError {
		BenchError::MissingBaseline { path: self.path.clone(), reason }
	}

	fn persist(&self, source: std::io::Error) -> BenchError {
		BenchError::Persist { path: self.path.clone(), source }
	}
}

fn lacks_final_newline(file: &mut File) -> std::io::Result<bool> {
	if file.metadata()?.len() == 0 {
		return Ok(false);
	}
	// Writes still go to the end in append mode, whatever the cursor.
	file.seek(SeekFrom::End(-1))?;
	let mut last = [0u8; 1];
	file.read_exact(&mut last)?;
	Ok(last[0] != b'\n')
}

pub fn parse_record(line: &str) -> Option<ResultVector> {
	line.split(',').map(|f| f.trim().parse::<f64>().ok()).collect()
}

/// `{}` on f64 prints the shortest text that parses back to the same value.
pub fn format_record(record: &[f64]) -> String {
	let fields: Vec<String> = record.iter().map(|v| format!("{v}")).collect();
	format!("{}\n", fields.join(", "))
}
