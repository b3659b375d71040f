mod common;

use async_trait::async_trait;
use common::ScriptedTrial;
use crawlbench_core::{seed, AbortSignal, BaselineMode, BenchError, Direction, RegressConfig, Regression, Trial};
use std::path::PathBuf;
use std::time::Duration;

fn config_in(dir: &std::path::Path, retries: u32) -> RegressConfig {
    RegressConfig {
        result_file: dir.join("speed.csv"),
        output: dir.join("download"),
        retries,
        ..RegressConfig::default()
    }
}

#[tokio::test]
async fn compares_against_latest_record_and_appends() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path(), 2);
    std::fs::write(&cfg.result_file, "1, 1, 1\n10.0, 5.0, 2.5\n").unwrap();

    let trial = ScriptedTrial::new()
        .with_durations(1, &[8.0, 8.0])
        .with_durations(2, &[4.0, 6.0])
        .with_durations(4, &[3.0, 3.0]);
    let regression = Regression::load(&cfg).unwrap();
    assert_eq!(regression.baseline(), &[10.0, 5.0, 2.5]);

    let m = regression.measure(&trial, &AbortSignal::new(), &mut ()).await.unwrap();
    let lines: Vec<String> = m.verdicts.iter().map(|v| v.to_string()).collect();
    assert_eq!(
        lines,
        vec![
            "Single thread was 20.00% faster",
            "Two threads was 0.00% faster/slower (no change)",
            "Four threads was 20.00% slower",
        ]
    );
    assert!(!cfg.output.exists(), "download directory should be removed after the sweep");

    regression.record(&m).unwrap();
    let text = std::fs::read_to_string(&cfg.result_file).unwrap();
    assert_eq!(text.lines().last(), Some("8, 5, 3"));
    assert_eq!(text.lines().count(), 3);
}

#[tokio::test]
async fn best_ever_mode_uses_fastest_times() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_in(dir.path(), 1);
    cfg.mode = BaselineMode::BestEver;
    std::fs::write(&cfg.result_file, "10.0, 4.0, 3.0\n12.0, 5.0, 2.0\n").unwrap();

    let regression = Regression::load(&cfg).unwrap();
    assert_eq!(regression.baseline(), &[10.0, 4.0, 2.0]);

    let trial = ScriptedTrial::new().with_durations(1, &[10.0]).with_durations(2, &[5.0]).with_durations(4, &[1.0]);
    let m = regression.measure(&trial, &AbortSignal::new(), &mut ()).await.unwrap();
    let dirs: Vec<Direction> = m.verdicts.iter().map(|v| v.direction).collect();
    assert_eq!(dirs, vec![Direction::Unchanged, Direction::Slower, Direction::Faster]);
}

#[tokio::test]
async fn missing_or_empty_baseline_runs_no_trials() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path(), 3);
    let trial = ScriptedTrial::new();

    let err = Regression::load(&cfg).unwrap_err();
    assert!(matches!(err, BenchError::MissingBaseline { .. }));

    std::fs::write(&cfg.result_file, "").unwrap();
    let err = Regression::load(&cfg).unwrap_err();
    assert!(matches!(err, BenchError::MissingBaseline { .. }));

    assert!(trial.calls().is_empty());
    assert!(!cfg.output.exists());
}

#[tokio::test]
async fn baseline_for_other_levels_is_rejected_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path(), 1);
    std::fs::write(&cfg.result_file, "1.0, 2.0\n").unwrap();
    assert!(matches!(Regression::load(&cfg).unwrap_err(), BenchError::Invariant(_)));

    std::fs::write(&cfg.result_file, "1.0, 0, 2.0\n").unwrap();
    assert!(matches!(Regression::load(&cfg).unwrap_err(), BenchError::Invariant(_)));
}

#[tokio::test]
async fn failed_sweep_cleans_up_and_records_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path(), 1);
    std::fs::write(&cfg.result_file, "10.0, 5.0, 2.5\n").unwrap();

    let regression = Regression::load(&cfg).unwrap();
    let trial = ScriptedTrial::new().failing_at(4);
    let err = regression.measure(&trial, &AbortSignal::new(), &mut ()).await.unwrap_err();
    assert!(matches!(err, BenchError::Spawn { .. }));
    assert!(!cfg.output.exists());
    assert_eq!(std::fs::read_to_string(&cfg.result_file).unwrap(), "10.0, 5.0, 2.5\n");
}

/// Swaps the download directory for a plain file, so removing it as a directory fails.
struct ClobberingTrial {
    output: PathBuf,
}

#[async_trait]
impl Trial for ClobberingTrial {
    async fn run(&self, _concurrency: u32, _abort: &AbortSignal) -> crawlbench_core::Result<Duration> {
        if self.output.is_dir() {
            std::fs::remove_dir_all(&self.output).unwrap();
            std::fs::write(&self.output, "left behind").unwrap();
        }
        Ok(Duration::from_secs(2))
    }
}

#[tokio::test]
async fn failed_cleanup_still_yields_the_measurement() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path(), 1);
    std::fs::write(&cfg.result_file, "1.0, 1.0, 1.0\n").unwrap();

    let regression = Regression::load(&cfg).unwrap();
    let trial = ClobberingTrial { output: cfg.output.clone() };
    let m = regression.measure(&trial, &AbortSignal::new(), &mut ()).await.unwrap();
    assert_eq!(m.results, vec![2.0, 2.0, 2.0]);
    assert!(m.verdicts.iter().all(|v| v.direction == Direction::Slower));
    assert!(cfg.output.is_file());

    regression.record(&m).unwrap();
    assert_eq!(std::fs::read_to_string(&cfg.result_file).unwrap(), "1.0, 1.0, 1.0\n2, 2, 2\n");
}

#[tokio::test]
async fn keep_output_leaves_downloads_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_in(dir.path(), 1);
    cfg.keep_output = true;
    std::fs::write(&cfg.result_file, "10.0, 5.0, 2.5\n").unwrap();

    let regression = Regression::load(&cfg).unwrap();
    regression.measure(&ScriptedTrial::new(), &AbortSignal::new(), &mut ()).await.unwrap();
    assert!(cfg.output.exists());
}

#[tokio::test]
async fn seed_creates_log_but_never_overwrites_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path(), 1);
    let trial = ScriptedTrial::new().with_durations(1, &[9.5]).with_durations(2, &[5.25]).with_durations(4, &[3.0]);

    let results = seed(&cfg, false, &trial, &AbortSignal::new(), &mut ()).await.unwrap();
    assert_eq!(results, vec![9.5, 5.25, 3.0]);
    assert_eq!(std::fs::read_to_string(&cfg.result_file).unwrap(), "9.5, 5.25, 3\n");

    let again = ScriptedTrial::new();
    let err = seed(&cfg, false, &again, &AbortSignal::new(), &mut ()).await.unwrap_err();
    assert!(matches!(err, BenchError::AlreadyExists(_)));
    assert!(again.calls().is_empty());
}
