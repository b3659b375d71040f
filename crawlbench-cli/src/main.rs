#![forbid(unsafe_code)]

//! crawlbench - speed regression and shootout harness for website downloaders

use clap::{Args, Parser, Subcommand};
use console::style;
use crawlbench_core::{
    seed, AbortSignal, BaselineMode, BenchError, Contender, HarnessConfig, ProcessTrial, RegressConfig, Regression,
    Shootout, ShootoutConfig, Workspace, WorkspacePolicy,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod settings;
mod ui;

#[derive(Debug, Parser)]
#[command(name = "crawlbench", version, about = "Speed regression harness for website downloaders")]
struct Cli {
    /// Config file. Default: $CRAWLBENCH_CONFIG, ./crawlbench.toml, then the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Time the crawler at each concurrency level and compare with the stored baseline
    Regress(SweepArgs),
    /// Run one sweep and start a new result file from it
    Init {
        #[command(flatten)]
        sweep: SweepArgs,
        /// Overwrite the result file if it exists
        #[arg(long)]
        force: bool,
    },
    /// Show every recorded run and the best time per level
    History {
        /// Result file to read
        #[arg(short = 'f', long, visible_alias = "filename")]
        result_file: Option<PathBuf>,
        /// Concurrency levels the records were taken at, used for column labels
        #[arg(short = 'j', long, value_delimiter = ',')]
        levels: Vec<u32>,
    },
    /// Run several downloaders for a fixed time each and compare how much they fetched
    Shootout(ShootoutArgs),
    /// Config helpers
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCmd {
    /// Show the effective configuration (defaults, file, env and flags resolved)
    Show,
    /// Write a crawlbench.toml template
    WriteTemplate {
        /// Destination path (default: ./crawlbench.toml)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite if file exists
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
struct SweepArgs {
    /// Path to the crawler binary
    #[arg(short = 's', long, visible_alias = "suckit")]
    binary: Option<PathBuf>,
    /// URL to crawl
    #[arg(short, long)]
    url: Option<String>,
    /// Result file holding one line per run
    #[arg(short = 'f', long, visible_alias = "filename")]
    result_file: Option<PathBuf>,
    /// Trials per concurrency level
    #[arg(short, long)]
    retries: Option<u32>,
    /// Comma separated concurrency levels, e.g. 1,2,4
    #[arg(short = 'j', long, value_delimiter = ',')]
    levels: Vec<u32>,
    /// Download directory handed to the crawler
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Baseline to compare against: latest or best-ever
    #[arg(long, value_parser = parse_mode)]
    mode: Option<BaselineMode>,
    /// Give up on a single trial after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Keep the downloaded files after the run
    #[arg(long)]
    keep_output: bool,
}

impl SweepArgs {
    fn apply(self, cfg: &mut RegressConfig) {
        if let Some(v) = self.binary { cfg.binary = v; }
        if let Some(v) = self.url { cfg.url = v; }
        if let Some(v) = self.result_file { cfg.result_file = v; }
        if let Some(v) = self.retries { cfg.retries = v; }
        if !self.levels.is_empty() { cfg.levels = self.levels; }
        if let Some(v) = self.output { cfg.output = v; }
        if let Some(v) = self.mode { cfg.mode = v; }
        if let Some(v) = self.timeout_secs { cfg.timeout_secs = Some(v); }
        if self.keep_output { cfg.keep_output = true; }
    }
}

#[derive(Debug, Args)]
struct ShootoutArgs {
    /// URL every contender crawls
    #[arg(short, long)]
    url: Option<String>,
    /// Parent output directory; must not exist yet
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Seconds given to each contender
    #[arg(short, long)]
    time: Option<u64>,
    /// Contender as name=command (repeatable). Replaces the configured list
    #[arg(short, long = "contender", value_parser = parse_contender)]
    contenders: Vec<Contender>,
}

impl ShootoutArgs {
    fn apply(self, cfg: &mut ShootoutConfig) {
        if let Some(v) = self.url { cfg.url = v; }
        if let Some(v) = self.output { cfg.output = v; }
        if let Some(v) = self.time { cfg.run_time_secs = v; }
        if !self.contenders.is_empty() { cfg.contenders = self.contenders; }
    }
}

fn parse_mode(s: &str) -> Result<BaselineMode, String> {
    s.parse().map_err(|e: BenchError| e.to_string())
}

fn parse_contender(s: &str) -> Result<Contender, String> {
    s.parse().map_err(|e: BenchError| e.to_string())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", style("error:").red().bold());
            match e.downcast_ref::<BenchError>() {
                Some(BenchError::Aborted(_)) => ExitCode::from(130),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Defaults, then config file, then env, then flags
    let (mut cfg, source) = settings::resolve(cli.config.as_deref())?;
    if let Some(level) = cli.log_level { cfg.log.level = level; }

    match cli.command {
        Commands::Regress(args) => {
            args.apply(&mut cfg.regress);
            let cfg = finish(cfg)?;
            cmd_regress(&cfg.regress, &install_abort_handler()).await
        }
        Commands::Init { sweep, force } => {
            sweep.apply(&mut cfg.regress);
            let cfg = finish(cfg)?;
            cmd_init(&cfg.regress, force, &install_abort_handler()).await
        }
        Commands::History { result_file, levels } => {
            if let Some(v) = result_file { cfg.regress.result_file = v; }
            if !levels.is_empty() { cfg.regress.levels = levels; }
            let cfg = finish(cfg)?;
            ui::print_history(&cfg.regress)
        }
        Commands::Shootout(args) => {
            args.apply(&mut cfg.shootout);
            let cfg = finish(cfg)?;
            cmd_shootout(&cfg.shootout, &install_abort_handler()).await
        }
        Commands::Config { action } => match action {
            ConfigCmd::Show => {
                let cfg = finish(cfg)?;
                settings::show(&cfg, source.as_deref())
            }
            ConfigCmd::WriteTemplate { path, force } => {
                let path = path.unwrap_or_else(|| PathBuf::from(settings::CONFIG_FILE_NAME));
                if path.exists() && !force {
                    anyhow::bail!("refusing to overwrite existing file: {} (use --force)", path.display());
                }
                tokio::fs::write(&path, settings::TEMPLATE_CRAWLBENCH_TOML).await?;
                eprintln!("wrote {}", path.display());
                Ok(())
            }
        },
    }
}

/// Validate, start logging, and freeze the configuration for the rest of the run.
fn finish(cfg: HarnessConfig) -> anyhow::Result<HarnessConfig> {
    cfg.validate()?;
    init_tracing(&cfg.log.level);
    Ok(cfg)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// First Ctrl-C stops the running crawler and the sweep; a second one exits at once.
fn install_abort_handler() -> AbortSignal {
    let abort = AbortSignal::new();
    let handle = abort.clone();
    let res = ctrlc::set_handler(move || {
        if handle.is_aborted() {
            std::process::exit(130);
        }
        eprintln!("{}", style("interrupted, stopping the current run...").yellow());
        handle.abort();
    });
    if let Err(e) = res {
        warn!("could not install Ctrl-C handler: {e}");
    }
    abort
}

async fn cmd_regress(cfg: &RegressConfig, abort: &AbortSignal) -> anyhow::Result<()> {
    // Loading first: no baseline means no trials.
    let regression = Regression::load(cfg)?;
    ui::print_regress_header(cfg, regression.baseline());

    let trial = ProcessTrial::from_config(cfg);
    let mut progress = ui::SweepProgress::new();
    let measured = regression.measure(&trial, abort, &mut progress).await;
    progress.finish();
    let measurement = measured?;

    for verdict in &measurement.verdicts {
        println!("{}", ui::styled_verdict(verdict));
    }

    if let Err(e) = regression.record(&measurement) {
        if e.is_fatal() {
            return Err(e.into());
        }
        warn!("{e}");
        eprintln!("{} {e}; this run was not added to the history", style("warning:").yellow().bold());
    }
    Ok(())
}

async fn cmd_init(cfg: &RegressConfig, force: bool, abort: &AbortSignal) -> anyhow::Result<()> {
    let trial = ProcessTrial::from_config(cfg);
    let mut progress = ui::SweepProgress::new();
    let seeded = seed(cfg, force, &trial, abort, &mut progress).await;
    progress.finish();
    let results = seeded?;
    ui::print_seeded(cfg, &results);
    Ok(())
}

async fn cmd_shootout(cfg: &ShootoutConfig, abort: &AbortSignal) -> anyhow::Result<()> {
    ui::print_shootout_info(cfg);
    let workspace = Workspace::prepare(&cfg.output, WorkspacePolicy::Exclusive).await?;
    let mut progress = ui::ShootoutProgress::new();
    let ran = Shootout::from_config(cfg).run(&workspace, abort, &mut progress).await;
    progress.finish();
    let cleaned = workspace.cleanup().await;
    let entries = ran?;
    ui::print_shootout_table(&entries);
    cleaned?;
    Ok(())
}
