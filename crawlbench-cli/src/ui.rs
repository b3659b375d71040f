//! Terminal rendering: progress bars, colored verdicts and tables.

use comfy_table::{presets::UTF8_FULL, Cell, Table};
use console::{style, StyledObject};
use crawlbench_core::{
    level_label, level_labels, BaselineMode, Contender, Direction, RegressConfig, ResultLog, ShootoutConfig,
    ShootoutEntry, ShootoutObserver, SweepObserver, Verdict,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// One bar per concurrency level, advanced after every finished trial.
pub struct SweepProgress {
    bar: ProgressBar,
}

impl SweepProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(bar_style());
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl SweepObserver for SweepProgress {
    fn level_started(&mut self, level: u32, retries: u32) {
        self.bar.reset();
        self.bar.set_length(u64::from(retries));
        self.bar.set_message(level_label(level));
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn trial_finished(&mut self, level: u32, iteration: u32, _retries: u32, _elapsed: Duration) {
        self.bar.set_position(u64::from(iteration));
        self.bar.set_message(format!("completed {iteration} iteration(s) for job with {level} thread(s)"));
    }

    fn level_finished(&mut self, level: u32, mean_secs: f64) {
        self.bar.println(format!("{}: {:.3}s average", level_label(level), mean_secs));
    }
}

pub struct ShootoutProgress {
    bar: ProgressBar,
}

impl ShootoutProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ShootoutObserver for ShootoutProgress {
    fn contender_started(&mut self, contender: &Contender, run_time: Duration) {
        self.bar.reset_elapsed();
        self.bar.set_message(format!("running {} for {}s", contender.name, run_time.as_secs()));
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn contender_finished(&mut self, entry: &ShootoutEntry) {
        let note = if entry.finished_early { " (exited early)" } else { "" };
        self.bar.println(format!("{}: {} files in {:.1}s{note}", entry.name, entry.files, entry.ran_for.as_secs_f64()));
    }
}

/// Green when faster, red when slower.
pub fn styled_verdict(v: &Verdict) -> String {
    let change: StyledObject<String> = match v.direction {
        Direction::Faster => style(v.change()).green(),
        Direction::Slower => style(v.change()).red(),
        Direction::Unchanged => style(v.change()).dim(),
    };
    format!("{} was {}", v.label, change)
}

pub fn print_regress_header(cfg: &RegressConfig, baseline: &[f64]) {
    println!(
        "{} {} against {} baseline from {}",
        style("Benchmarking").bold(),
        style(cfg.binary.display()).bold(),
        cfg.mode,
        cfg.result_file.display()
    );
    println!(
        "{}",
        style(format!("{} run(s) per level, levels {:?}, baseline {:?}", cfg.retries, cfg.levels, baseline)).dim()
    );
}

pub fn print_seeded(cfg: &RegressConfig, results: &[f64]) {
    println!("{} {}", style("Created").green().bold(), cfg.result_file.display());
    for (label, secs) in level_labels(&cfg.levels).iter().zip(results) {
        println!("{label}: {secs:.3}s");
    }
}

pub fn print_history(cfg: &RegressConfig) -> anyhow::Result<()> {
    let log = ResultLog::new(&cfg.result_file);
    let records = log.records()?;
    if records.is_empty() {
        println!("{} has no records", cfg.result_file.display());
        return Ok(());
    }
    let width = records.iter().map(Vec::len).max().unwrap_or(0);
    let mut header = vec!["run".to_string()];
    if width == cfg.levels.len() {
        header.extend(level_labels(&cfg.levels));
    } else {
        header.extend((1..=width).map(|i| format!("#{i}")));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    for (n, rec) in records.iter().enumerate() {
        let mut row = vec![Cell::new(n + 1)];
        row.extend(rec.iter().map(|v| Cell::new(format!("{v:.3}"))));
        table.add_row(row);
    }
    let best = log.load_baseline(BaselineMode::BestEver)?;
    let mut row = vec![Cell::new("best")];
    row.extend(best.iter().map(|v| Cell::new(format!("{v:.3}"))));
    table.add_row(row);

    println!("{table}");
    Ok(())
}

pub fn print_shootout_info(cfg: &ShootoutConfig) {
    println!(
        "{}",
        style("This benchmark compares website downloaders by how much each one fetches in the same time").blue()
    );
    println!("Each program will run for {} seconds against {}", cfg.run_time_secs, cfg.url);
}

pub fn print_shootout_table(entries: &[ShootoutEntry]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["name", "pages downloaded"]);
    for e in entries {
        table.add_row(vec![Cell::new(&e.name), Cell::new(e.files)]);
    }
    println!("{table}");
}
