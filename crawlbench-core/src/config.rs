use crate::baseline::BaselineMode;
use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, str::FromStr, time::Duration};

pub const DEFAULT_LEVELS: [u32; 3] = [1, 2, 4];

/// Resolved harness settings. Built once at startup and only read afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
	pub regress: RegressConfig,
	pub shootout: ShootoutConfig,
	pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegressConfig {
	/// Crawler binary under test.
	pub binary: PathBuf,
	pub url: String,
	/// Append-only CSV log holding one record per run.
	pub result_file: PathBuf,
	/// Trials per concurrency level; the level result is their mean.
	pub retries: u32,
	pub levels: Vec<u32>,
	/// Download destination handed to the crawler with `-o`.
	pub output: PathBuf,
	pub mode: BaselineMode,
	/// Per-trial limit. Unset means wait for the crawler forever.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timeout_secs: Option<u64>,
	/// Leave the downloaded files in `output` after the run.
	pub keep_output: bool,
}

impl Default for RegressConfig {
	fn default() -> Self {
		Self {
			binary: PathBuf::from("suckit"),
			url: "http://0.0.0.0".into(),
			result_file: PathBuf::from("speed.csv"),
			retries: 20,
			levels: DEFAULT_LEVELS.to_vec(),
			output: PathBuf::from("/tmp/suckit_speed"),
			mode: BaselineMode::Latest,
			timeout_secs: None,
			keep_output: false,
		}
	}
}

impl RegressConfig {
	pub fn trial_timeout(&self) -> Option<Duration> { self.timeout_secs.map(Duration::from_secs) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShootoutConfig {
	pub url: String,
	/// Parent directory; every contender downloads into its own subdirectory.
	pub output: PathBuf,
	pub run_time_secs: u64,
	pub contenders: Vec<Contender>,
}

impl Default for ShootoutConfig {
	fn default() -> Self {
		Self {
			url: "https://forum.httrack.com".into(),
			output: PathBuf::from("/tmp/suckit_bench"),
			run_time_secs: 120,
			contenders: vec![Contender::new("suckit", "suckit"), Contender::new("httrack", "httrack")],
		}
	}
}

impl ShootoutConfig {
	pub fn run_time(&self) -> Duration { Duration::from_secs(self.run_time_secs) }
}

/// A downloader taking part in a shootout, invoked as `<command> <url>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contender {
	pub name: String,
	pub command: PathBuf,
}

impl Contender {
	pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
		Self { name: name.into(), command: command.into() }
	}
}

impl FromStr for Contender {
	type Err = BenchError;

	/// Accepts `name=command` or a bare command, named after its file stem.
	fn from_str(s: &str) -> Result<Self> {
		let s = s.trim();
		if let Some((name, command)) = s.split_once('=') {
			let (name, command) = (name.trim(), command.trim());
			if name.is_empty() || command.is_empty() {
				return Err(BenchError::config(format!("invalid contender {s:?}, expected name=command")));
			}
			return Ok(Self::new(name, command));
		}
		let name = Path::new(s)
			.file_stem()
			.and_then(|n| n.to_str())
			.ok_or_else(|| BenchError::config(format!("invalid contender {s:?}")))?;
		Ok(Self::new(name, s))
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
	pub level: String,
}

impl Default for LogConfig {
	fn default() -> Self { Self { level: "warn".into() } }
}

impl HarnessConfig {
	pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
		let data = fs::read_to_string(path.as_ref())?;
		Self::from_toml_str(&data)
	}

	pub fn from_toml_str(data: &str) -> Result<Self> {
		toml::from_str(data).map_err(|e| BenchError::config(format!("toml parse error: {e}")))
	}

	pub fn to_toml_string(&self) -> Result<String> {
		toml::to_string_pretty(self).map_err(|e| BenchError::config(format!("toml encode error: {e}")))
	}

	/// Apply `CRAWLBENCH_*` overrides from the process environment.
	pub fn apply_env(&mut self) -> Result<()> {
		self.apply_env_with(|k| std::env::var(k).ok())
	}

	/// Apply overrides through `lookup`; blank values are ignored.
	pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
		let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
		if let Some(v) = get("CRAWLBENCH_BINARY") { self.regress.binary = PathBuf::from(v); }
		if let Some(v) = get("CRAWLBENCH_URL") { self.regress.url = v; }
		if let Some(v) = get("CRAWLBENCH_RESULT_FILE") { self.regress.result_file = PathBuf::from(v); }
		if let Some(v) = get("CRAWLBENCH_OUTPUT") { self.regress.output = PathBuf::from(v); }
		if let Some(v) = get("CRAWLBENCH_RETRIES") {
			self.regress.retries = v.parse().map_err(|_| BenchError::config(format!("invalid CRAWLBENCH_RETRIES: {v}")))?;
		}
		if let Some(v) = get("CRAWLBENCH_MODE") { self.regress.mode = v.parse()?; }
		if let Some(v) = get("CRAWLBENCH_LOG_LEVEL") { self.log.level = v; }
		Ok(())
	}

	pub fn validate(&self) -> Result<()> {
		let allowed = ["trace", "debug", "info", "warn", "error"];
		if !allowed.contains(&self.log.level.as_str()) {
			return Err(BenchError::config(format!("invalid log level: {}", self.log.level)));
		}
		self.regress.validate()?;
		self.shootout.validate()
	}
}

impl RegressConfig {
	pub fn validate(&self) -> Result<()> {
		if self.binary.as_os_str().is_empty() { return Err(BenchError::config("binary path is empty")); }
		if self.url.trim().is_empty() { return Err(BenchError::config("target url is empty")); }
		if self.result_file.as_os_str().is_empty() { return Err(BenchError::config("result file path is empty")); }
		if self.output.as_os_str().is_empty() { return Err(BenchError::config("output directory is empty")); }
		if self.retries == 0 { return Err(BenchError::config("retries must be at least 1")); }
		validate_levels(&self.levels)?;
		if self.timeout_secs == Some(0) { return Err(BenchError::config("timeout must be at least 1 second")); }
		Ok(())
	}
}

impl ShootoutConfig {
	pub fn validate(&self) -> Result<()> {
		if self.url.trim().is_empty() { return Err(BenchError::config("shootout url is empty")); }
		if self.output.as_os_str().is_empty() { return Err(BenchError::config("shootout output directory is empty")); }
		if self.run_time_secs == 0 { return Err(BenchError::config("shootout run time must be at least 1 second")); }
		if self.contenders.is_empty() { return Err(BenchError::config("shootout needs at least one contender")); }
		let mut seen = std::collections::HashSet::new();
		for c in &self.contenders {
			// The name becomes a subdirectory of the shootout output.
			if c.name.is_empty() || c.name == "." || c.name == ".." || c.name.contains(['/', '\\']) {
				return Err(BenchError::config(format!("invalid contender name: {:?}", c.name)));
			}
			if !seen.insert(c.name.as_str()) {
				return Err(BenchError::config(format!("duplicate contender name: {}", c.name)));
			}
		}
		Ok(())
	}
}

pub fn validate_levels(levels: &[u32]) -> Result<()> {
	if levels.is_empty() { return Err(BenchError::config("at least one concurrency level is required")); }
	if let Some(bad) = levels.iter().find(|&&l| l == 0) {
		return Err(BenchError::config(format!("invalid concurrency level: {bad}")));
	}
	Ok(())
}
