use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use bizdash::data::preview::pretty_head;
use bizdash::pipeline::{analyze_all, clean_all, prepare_dirs, run_all, RunReport};
use bizdash::{datasets, load_table, Analysis, DashboardConfig, DatasetSource, Encoding};
use clap::{Parser, Subcommand};
use log::info;

/// Clean the raw business datasets and compute the dashboard's analyses.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the raw input files
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Directory for cleaned datasets and analysis outputs
    #[arg(long)]
    processed_dir: Option<PathBuf>,

    /// Directory for per-segment customer files
    #[arg(long)]
    outputs_dir: Option<PathBuf>,

    /// Seed for k-means, the train/test split and demo columns
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean raw datasets (all when none are named)
    Clean { datasets: Vec<String> },
    /// Run analyses over cleaned datasets (all when none are named)
    Analyze { analyses: Vec<String> },
    /// Clean everything, then run every analysis
    Run,
    /// Print the first rows of a file as a table
    Preview {
        file: PathBuf,
        #[arg(short = 'n', long, default_value = "10")]
        rows: usize,
        #[arg(short, long, default_value = ",")]
        delimiter: char,
        /// Decode as ISO-8859-1 instead of UTF-8
        #[arg(long)]
        latin1: bool,
    },
}

impl Cli {
    fn config(&self) -> Result<DashboardConfig> {
        let mut config = DashboardConfig::load(self.config.as_deref())?;
        if let Some(dir) = &self.raw_dir {
            config.raw_dir = dir.clone();
        }
        if let Some(dir) = &self.processed_dir {
            config.processed_dir = dir.clone();
        }
        if let Some(dir) = &self.outputs_dir {
            config.outputs_dir = dir.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config().context("loading configuration")?;

    let report = match &cli.command {
        Command::Clean { datasets: names } => {
            let selected = names
                .iter()
                .map(|n| datasets::find(n).with_context(|| format!("unknown dataset {n}")))
                .collect::<Result<Vec<_>>>()?;
            let selected = if selected.is_empty() {
                datasets::ALL.to_vec()
            } else {
                selected
            };
            prepare_dirs(&config).context("creating output directories")?;
            let mut report = RunReport::default();
            clean_all(&selected, &config, &mut report);
            report
        }
        Command::Analyze { analyses } => {
            let selected = analyses
                .iter()
                .map(|n| Analysis::from_name(n).with_context(|| format!("unknown analysis {n}")))
                .collect::<Result<Vec<_>>>()?;
            let selected = if selected.is_empty() {
                Analysis::ALL.to_vec()
            } else {
                selected
            };
            prepare_dirs(&config).context("creating output directories")?;
            let mut report = RunReport::default();
            analyze_all(&selected, &config, &mut report);
            report
        }
        Command::Run => run_all(&config),
        Command::Preview {
            file,
            rows,
            delimiter,
            latin1,
        } => {
            preview(file, *rows, *delimiter, *latin1)?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    print!("{report}");
    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn preview(file: &Path, rows: usize, delimiter: char, latin1: bool) -> Result<()> {
    if !delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character");
    }
    let name = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("preview");
    let encoding = if latin1 { Encoding::Latin1 } else { Encoding::Utf8 };
    let source = DatasetSource::new(name, file)
        .delimiter(delimiter as u8)
        .encoding(encoding)
        .lenient();

    let table = load_table(&source)?;
    info!("{}: {} rows, {} columns", file.display(), table.len(), table.columns().len());
    println!("{}", pretty_head(&table, rows)?);
    Ok(())
}
