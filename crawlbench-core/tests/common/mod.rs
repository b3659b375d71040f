#![allow(dead_code)]

use async_trait::async_trait;
use crawlbench_core::{AbortSignal, BenchError, Result, Trial};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Tests that exec freshly written scripts run one at a time, otherwise a concurrent
/// fork can still hold the script open for writing and exec fails with ETXTBSY.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

pub fn spawn_lock() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Write an executable `/bin/sh` script.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perm = std::fs::metadata(&path).unwrap().permissions();
    perm.set_mode(0o755);
    std::fs::set_permissions(&path, perm).unwrap();
    path
}

/// Trial double returning canned durations per level and recording every call.
#[derive(Default)]
pub struct ScriptedTrial {
    durations: HashMap<u32, Vec<f64>>,
    fail_at: Option<u32>,
    calls: Mutex<Vec<u32>>,
}

impl ScriptedTrial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_durations(mut self, level: u32, secs: &[f64]) -> Self {
        self.durations.insert(level, secs.to_vec());
        self
    }

    /// Fail with a spawn error whenever `level` is run.
    pub fn failing_at(mut self, level: u32) -> Self {
        self.fail_at = Some(level);
        self
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Trial for ScriptedTrial {
    async fn run(&self, concurrency: u32, _abort: &AbortSignal) -> Result<Duration> {
        let nth = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(concurrency);
            calls.iter().filter(|&&c| c == concurrency).count() - 1
        };
        if self.fail_at == Some(concurrency) {
            return Err(BenchError::Spawn {
                binary: PathBuf::from("/nonexistent/crawler"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        let secs = self
            .durations
            .get(&concurrency)
            .and_then(|d| d.get(nth).copied())
            .unwrap_or(1.0);
        Ok(Duration::from_secs_f64(secs))
    }
}
