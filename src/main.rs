pub mod app_dirs;
pub mod config;
pub mod deviation;
pub mod finder;
pub mod loader;
pub mod locate;
pub mod metrics;
pub mod report;
pub mod session;
pub mod stats;
pub mod util;

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::error::Error;
use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigStore, FileConfigStore};
use crate::finder::ArrivalPolicy;
use crate::loader::{collect_session_files, load_record, resolve_input, INPUT_ENV};
use crate::metrics::{analyze, standard_metrics, MetricOutcome, MetricSpec};
use crate::report::{append_summary, SessionReport};
use crate::stats::HistoryDb;

/// analyzes recorded multiplayer session logs for client/server desync
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Reads recorded multiplayer session logs, correlates client inputs with their \
observable world effects, and scores how far client prediction drifted from the \
authoritative state while each effect was in flight."
)]
pub struct Cli {
    /// session log file or directory of logs (falls back to the LAGSCOPE_FILE environment variable)
    input: Option<PathBuf>,

    /// directory to write per-session report files into
    #[clap(short = 'o', long, default_value = "reports")]
    output: PathBuf,

    /// running CSV summary file (defaults to summary.csv inside the output directory)
    #[clap(long)]
    summary: Option<PathBuf>,

    /// arrival detection variant used by the move metric
    #[clap(long, value_enum)]
    move_arrival: Option<ArrivalPolicy>,

    /// skip recording results into the metric history database
    #[clap(long)]
    no_history: bool,

    /// explicit path for the metric history database
    #[clap(long)]
    history_db: Option<PathBuf>,

    /// pretty-print the JSON reports
    #[clap(long)]
    pretty: bool,
}

impl Cli {
    fn effective_config(&self, mut cfg: Config) -> Config {
        if let Some(policy) = self.move_arrival {
            cfg.move_arrival = policy;
        }
        if self.no_history {
            cfg.record_history = false;
        }
        cfg
    }

    fn summary_path(&self) -> PathBuf {
        self.summary
            .clone()
            .unwrap_or_else(|| self.output.join("summary.csv"))
    }
}

fn open_history(cli: &Cli, cfg: &Config) -> Option<HistoryDb> {
    if !cfg.record_history {
        return None;
    }
    let db = match &cli.history_db {
        Some(path) => HistoryDb::with_path(path),
        None => HistoryDb::new(),
    };
    match db {
        Ok(db) => Some(db),
        Err(e) => {
            eprintln!("history database unavailable, continuing without it: {}", e);
            None
        }
    }
}

fn session_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_outcome(outcome: &MetricOutcome) -> String {
    match &outcome.result {
        Ok(r) => match (r.delay_ms, r.deviation_sq) {
            (Some(delay), Some(dev)) => {
                format!("{} delay {}ms dev {}", outcome.name, delay, dev)
            }
            _ => format!("{} unresolved", outcome.name),
        },
        Err(e) => format!("{} failed ({})", outcome.name, e),
    }
}

fn analyze_file(
    path: &Path,
    specs: &[MetricSpec],
    cli: &Cli,
    history: &mut Option<HistoryDb>,
) -> Result<(), Box<dyn Error>> {
    let name = session_name(path);
    let record = load_record(path)?;
    let outcomes = analyze(&record, specs);

    for outcome in &outcomes {
        if let Ok(r) = &outcome.result {
            if r.skipped > 0 {
                eprintln!(
                    "{}: {} skipped {} of {} windowed snapshots",
                    name,
                    outcome.name,
                    r.skipped,
                    r.compared + r.skipped
                );
            }
        }
    }

    let report = SessionReport::new(&name, &outcomes);
    report.write_json(&cli.output, cli.pretty)?;
    append_summary(&cli.summary_path(), &report)?;

    if let Some(db) = history {
        if let Err(e) = db.record_session(&name, &outcomes) {
            eprintln!("{}: history not recorded: {}", name, e);
        }
    }

    let line = outcomes
        .iter()
        .map(format_outcome)
        .collect::<Vec<_>>()
        .join(" | ");
    println!("{}: {}", name, line);

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let cfg = cli.effective_config(FileConfigStore::new().load());
    if let Some(policy) = cli.move_arrival {
        println!("move arrival detection: {}", policy);
    }

    let input = match resolve_input(cli.input.clone()) {
        Some(path) => path,
        None => {
            let mut cmd = Cli::command();
            cmd.error(
                ErrorKind::MissingRequiredArgument,
                format!("no input given and {} is not set", INPUT_ENV),
            )
            .exit();
        }
    };

    let files = collect_session_files(&input)?;
    if files.is_empty() {
        println!("no session logs found in {}", input.display());
        return Ok(());
    }

    std::fs::create_dir_all(&cli.output)?;

    let specs = standard_metrics(&cfg);
    let mut history = open_history(&cli, &cfg);

    let mut failed = 0usize;
    for file in &files {
        if let Err(e) = analyze_file(file, &specs, &cli, &mut history) {
            eprintln!("{}: skipped: {}", file.display(), e);
            failed += 1;
        }
    }

    println!(
        "analyzed {} of {} session(s), reports in {}",
        files.len() - failed,
        files.len(),
        cli.output.display()
    );

    Ok(())
}
