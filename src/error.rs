use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure taxonomy shared by every pipeline stage.
///
/// Each variant names the stage that failed; the driver uses it to decide
/// which downstream outputs to skip.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source absent, unreadable, undecodable, or without a single usable row.
    #[error("ingestion failed for {path}: {message}")]
    Ingestion { path: PathBuf, message: String },

    /// A rule's declared input columns are entirely missing from the table.
    #[error("cleaning failed for {dataset}: {message}")]
    Cleaning { dataset: String, message: String },

    /// Not enough (or degenerate) data for the chosen model.
    #[error("model fit failed for {model}: {message}")]
    ModelFit { model: String, message: String },

    /// Destination missing or unwritable.
    #[error("persisting {path} failed: {message}")]
    Persist { path: PathBuf, message: String },

    #[error("invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl PipelineError {
    pub fn ingestion(path: &Path, message: impl Into<String>) -> Self {
        PipelineError::Ingestion {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn cleaning(dataset: &str, message: impl Into<String>) -> Self {
        PipelineError::Cleaning {
            dataset: dataset.to_string(),
            message: message.into(),
        }
    }

    pub fn model_fit(model: &str, message: impl Into<String>) -> Self {
        PipelineError::ModelFit {
            model: model.to_string(),
            message: message.into(),
        }
    }

    pub fn persist(path: &Path, message: impl Into<String>) -> Self {
        PipelineError::Persist {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn config(path: &Path, message: impl Into<String>) -> Self {
        PipelineError::Config {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Short stage label used in run reports.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Ingestion { .. } => "ingestion",
            PipelineError::Cleaning { .. } => "cleaning",
            PipelineError::ModelFit { .. } => "model",
            PipelineError::Persist { .. } => "persist",
            PipelineError::Config { .. } => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
