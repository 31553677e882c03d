//! Run driver: cleaning first, then analyses, each stage isolated so one
//! failing dataset does not stop the others.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use log::{error, info};

use crate::analysis::Analysis;
use crate::clean::clean;
use crate::config::DashboardConfig;
use crate::data::loader::load_table;
use crate::data::writer::write_csv;
use crate::datasets::RawDataset;
use crate::error::{PipelineError, Result};

/// Result of one stage of a run.
#[derive(Debug)]
pub struct StageOutcome {
    /// `clean:<dataset>` or `analyze:<analysis>`.
    pub stage: String,
    pub result: Result<Vec<PathBuf>>,
}

/// Everything that happened during a run, in execution order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<StageOutcome>,
}

impl RunReport {
    fn record(&mut self, stage: String, result: Result<Vec<PathBuf>>) {
        match &result {
            Ok(paths) => {
                for p in paths {
                    info!("{stage}: wrote {}", p.display());
                }
            }
            Err(e) => error!("{stage}: {} error: {e}", e.stage()),
        }
        self.outcomes.push(StageOutcome { stage, result });
    }

    pub fn failures(&self) -> impl Iterator<Item = &StageOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Every file written during the run.
    pub fn written(&self) -> Vec<&PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
            .collect()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        writeln!(
            f,
            "{} stages, {} succeeded, {failed} failed",
            self.outcomes.len(),
            self.outcomes.len() - failed
        )?;
        for o in &self.outcomes {
            match &o.result {
                Ok(paths) => writeln!(f, "  ok     {} ({} files)", o.stage, paths.len())?,
                Err(e) => writeln!(f, "  FAILED {} [{}] {e}", o.stage, e.stage())?,
            }
        }
        Ok(())
    }
}

/// Create every output directory the run writes into.
pub fn prepare_dirs(config: &DashboardConfig) -> Result<()> {
    for dir in config.output_dirs() {
        fs::create_dir_all(dir).map_err(|e| PipelineError::persist(dir, e.to_string()))?;
    }
    Ok(())
}

/// Ingest, clean and persist one raw dataset to `<name>_cleaned.csv`.
pub fn clean_dataset(dataset: RawDataset, config: &DashboardConfig) -> Result<PathBuf> {
    let raw = load_table(&dataset.source(&config.raw_dir))?;
    let cleaned = clean(raw, &dataset.plan())?;
    let path = config.cleaned_path(dataset.name);
    write_csv(&cleaned, &path)?;
    Ok(path)
}

/// Clean each dataset in turn; failures are recorded, not propagated.
pub fn clean_all(datasets: &[RawDataset], config: &DashboardConfig, report: &mut RunReport) {
    for &dataset in datasets {
        let result = clean_dataset(dataset, config).map(|p| vec![p]);
        report.record(format!("clean:{}", dataset.name), result);
    }
}

/// Run each analysis in turn. Analyses whose input dataset failed to clean
/// earlier in `report` are recorded as ingestion failures without running,
/// so a stale cleaned file is never analysed.
pub fn analyze_all(analyses: &[Analysis], config: &DashboardConfig, report: &mut RunReport) {
    let failed_cleaning: HashSet<String> = report
        .failures()
        .filter_map(|o| o.stage.strip_prefix("clean:"))
        .map(String::from)
        .collect();

    for &analysis in analyses {
        let input = analysis.input_dataset();
        let result = if failed_cleaning.contains(input) {
            Err(PipelineError::ingestion(
                &config.cleaned_path(input),
                format!("cleaning {input} failed in this run"),
            ))
        } else {
            analysis.run(config)
        };
        report.record(format!("analyze:{analysis}"), result);
    }
}

/// Clean every dataset, then run every analysis.
pub fn run_all(config: &DashboardConfig) -> RunReport {
    let mut report = RunReport::default();
    if let Err(e) = prepare_dirs(config) {
        report.record("prepare".into(), Err(e));
        return report;
    }
    clean_all(&crate::datasets::ALL, config, &mut report);
    analyze_all(&Analysis::ALL, config, &mut report);
    info!("run finished: {}", report.to_string().trim_end());
    report
}
