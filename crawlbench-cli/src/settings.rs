use anyhow::Context;
use crawlbench_core::HarnessConfig;
use serde_json::json;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "crawlbench.toml";

/// Build the configuration from defaults, the first config file found, and `CRAWLBENCH_*`
/// variables. Returns the file that was used, if any.
pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<(HarnessConfig, Option<PathBuf>)> {
    let source = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => candidates().into_iter().find(|p| p.is_file()),
    };

    let mut cfg = match &source {
        Some(path) => HarnessConfig::load_from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => HarnessConfig::default(),
    };
    cfg.apply_env()?;
    Ok((cfg, source))
}

/// Search order: $CRAWLBENCH_CONFIG -> ./crawlbench.toml -> platform config dir
fn candidates() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(p) = std::env::var("CRAWLBENCH_CONFIG") {
        if !p.trim().is_empty() { out.push(PathBuf::from(p)); }
    }
    out.push(PathBuf::from(CONFIG_FILE_NAME));
    if cfg!(windows) {
        if let Ok(app_data) = std::env::var("APPDATA") {
            out.push(PathBuf::from(app_data).join("crawlbench").join(CONFIG_FILE_NAME));
        }
    } else {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            out.push(PathBuf::from(xdg).join("crawlbench").join(CONFIG_FILE_NAME));
        }
        if let Ok(home) = std::env::var("HOME") {
            out.push(PathBuf::from(home).join(".config").join("crawlbench").join(CONFIG_FILE_NAME));
        }
    }
    out
}

pub fn show(cfg: &HarnessConfig, source: Option<&Path>) -> anyhow::Result<()> {
    let out = json!({
        "config_file": source.map(|p| p.display().to_string()),
        "regress": cfg.regress,
        "shootout": cfg.shootout,
        "log_level": cfg.log.level,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub const TEMPLATE_CRAWLBENCH_TOML: &str = r#"# crawlbench configuration (template)
# Every key is optional; anything left out keeps its built-in default.
# CRAWLBENCH_* environment variables and command line flags override this file.

[regress]
# Crawler under test, invoked as: <binary> -j <level> -o <output> <url>
binary = "suckit"
url = "http://0.0.0.0"
# One line per run, one comma separated value per level
result_file = "speed.csv"
retries = 20
levels = [1, 2, 4]
output = "/tmp/suckit_speed"
# "latest" compares with the previous run, "best-ever" with the fastest time per level
mode = "latest"
# timeout_secs = 600
keep_output = false

[shootout]
url = "https://forum.httrack.com"
# Must not exist yet: it is counted and removed afterwards
output = "/tmp/suckit_bench"
run_time_secs = 120

[[shootout.contenders]]
name = "suckit"
command = "suckit"

[[shootout.contenders]]
name = "httrack"
command = "httrack"

[log]
level = "warn"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_to_defaults() {
        let cfg = HarnessConfig::from_toml_str(TEMPLATE_CRAWLBENCH_TOML).unwrap();
        assert_eq!(cfg, HarnessConfig::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = resolve(Some(Path::new("/nonexistent/crawlbench.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
