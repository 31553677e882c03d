//! Analyses over cleaned datasets.
//!
//! Every analysis reads one `<dataset>_cleaned.csv`, derives what it needs,
//! fits its model, and writes its output files. Outputs are fully computed
//! before anything is written, and a run writes either all of its files or
//! none of them.

pub mod ad_campaign;
pub mod audience;
pub mod clv;
pub mod competitor;
pub mod price_sensitivity;
pub mod sales_forecast;
pub mod segmentation;

use std::fmt;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clean::CellParser;
use crate::config::DashboardConfig;
use crate::data::loader::{load_table, DatasetSource};
use crate::data::model::Table;
use crate::data::writer::write_all;
use crate::error::Result;

/// The analyses the driver knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Analysis {
    Segmentation,
    Clv,
    PriceSensitivity,
    AdCampaign,
    SalesForecast,
    Competitor,
    Audience,
}

impl Analysis {
    pub const ALL: [Analysis; 7] = [
        Analysis::Segmentation,
        Analysis::Clv,
        Analysis::PriceSensitivity,
        Analysis::AdCampaign,
        Analysis::SalesForecast,
        Analysis::Competitor,
        Analysis::Audience,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Analysis::Segmentation => "segmentation",
            Analysis::Clv => "clv",
            Analysis::PriceSensitivity => "price_sensitivity",
            Analysis::AdCampaign => "ad_campaign",
            Analysis::SalesForecast => "sales_forecast",
            Analysis::Competitor => "competitor",
            Analysis::Audience => "audience",
        }
    }

    pub fn from_name(name: &str) -> Option<Analysis> {
        Analysis::ALL.iter().copied().find(|a| a.name() == name)
    }

    /// The cleaned dataset this analysis reads.
    pub fn input_dataset(&self) -> &'static str {
        match self {
            Analysis::Segmentation => "retail",
            Analysis::Clv
            | Analysis::PriceSensitivity
            | Analysis::AdCampaign
            | Analysis::Audience => "ads",
            Analysis::SalesForecast => "day_sell",
            Analysis::Competitor => "mock_kaggle",
        }
    }

    /// Run the analysis and return the paths it wrote.
    pub fn run(&self, config: &DashboardConfig) -> Result<Vec<PathBuf>> {
        let input = load_cleaned(config, self.input_dataset())?;
        let outputs = match self {
            Analysis::Segmentation => segmentation::run(input, config)?,
            Analysis::Clv => clv::run(input, config)?,
            Analysis::PriceSensitivity => price_sensitivity::run(input, config)?,
            Analysis::AdCampaign => ad_campaign::run(input, config)?,
            Analysis::SalesForecast => sales_forecast::run(input, config)?,
            Analysis::Competitor => competitor::run(input, config)?,
            Analysis::Audience => audience::run(input, config)?,
        };
        persist_all(&outputs)
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A computed table and the file it belongs in.
#[derive(Debug, Clone)]
pub struct Output {
    pub path: PathBuf,
    pub table: Table,
}

impl Output {
    pub fn new(path: PathBuf, table: Table) -> Self {
        Output { path, table }
    }
}

fn persist_all(outputs: &[Output]) -> Result<Vec<PathBuf>> {
    write_all(outputs.iter().map(|o| (&o.table, o.path.as_path())))
}

/// Read `<processed_dir>/<dataset>_cleaned.csv`.
pub fn load_cleaned(config: &DashboardConfig, dataset: &str) -> Result<Table> {
    load_table(&DatasetSource::new(dataset, config.cleaned_path(dataset)))
}

/// Re-parse a date column written by the cleaner.
fn parse_dates(table: Table, column: &str) -> Table {
    let parser = CellParser::Date { day_first: false };
    table.map_column(column, |v| parser.parse(v))
}

/// RNG for `synthetic_` demo columns.
fn demo_rng(config: &DashboardConfig) -> StdRng {
    StdRng::seed_from_u64(config.seed)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
