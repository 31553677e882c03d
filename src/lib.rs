//! Batch cleaning and analytics pipelines whose CSV outputs feed a small
//! business dashboard.
//!
//! Raw flat files are ingested into [`Table`]s, cleaned by declarative
//! [`clean::CleaningPlan`]s, fed to one model per [`Analysis`], and written
//! back as CSV. [`pipeline::run_all`] runs the whole thing.

pub mod analysis;
pub mod clean;
pub mod config;
pub mod data;
pub mod datasets;
pub mod error;
pub mod model;
pub mod pipeline;

pub use analysis::Analysis;
pub use config::DashboardConfig;
pub use data::{load_table, write_csv, DatasetSource, Encoding, Table, Value};
pub use error::{PipelineError, Result};
pub use pipeline::{run_all, RunReport};
