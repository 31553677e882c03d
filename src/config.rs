use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::model::{ForestSettings, KMeansSettings};

/// Directories and model parameters for a pipeline run.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// raw_dir = "data/raw"
/// seed = 7
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub data_dir: PathBuf,
    pub seed: u64,
    pub rfm_clusters: usize,
    pub clv_clusters: usize,
    pub forecast_horizon: usize,
    pub test_fraction: f64,
    pub n_trees: usize,
    pub kmeans_max_iters: u64,
    pub kmeans_tolerance: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            outputs_dir: PathBuf::from("outputs"),
            data_dir: PathBuf::from("data"),
            seed: 42,
            rfm_clusters: 4,
            clv_clusters: 3,
            forecast_horizon: 30,
            test_fraction: 0.2,
            n_trees: 100,
            kmeans_max_iters: 300,
            kmeans_tolerance: 1e-4,
        }
    }
}

impl DashboardConfig {
    /// Defaults, or the TOML file at `path` layered over them.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .map_err(|e| PipelineError::config(path, format!("failed to read: {e}")))?;
        let config: DashboardConfig =
            toml::from_str(&content).map_err(|e| PipelineError::config(path, e.to_string()))?;
        config.validate(path)?;
        info!("configuration loaded from {}", path.display());
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::config(
                path,
                format!("test_fraction must be in (0, 1), got {}", self.test_fraction),
            ));
        }
        if self.rfm_clusters == 0 || self.clv_clusters == 0 || self.n_trees == 0 {
            return Err(PipelineError::config(path, "cluster and tree counts must be positive"));
        }
        Ok(())
    }

    pub fn raw_path(&self, file: &str) -> PathBuf {
        self.raw_dir.join(file)
    }

    pub fn processed_path(&self, file: &str) -> PathBuf {
        self.processed_dir.join(file)
    }

    /// `<processed_dir>/<dataset>_cleaned.csv`
    pub fn cleaned_path(&self, dataset: &str) -> PathBuf {
        self.processed_dir.join(format!("{dataset}_cleaned.csv"))
    }

    pub fn output_path(&self, file: &str) -> PathBuf {
        self.outputs_dir.join(file)
    }

    pub fn data_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Directories the driver creates before a run.
    pub fn output_dirs(&self) -> [&Path; 3] {
        [&self.processed_dir, &self.outputs_dir, &self.data_dir]
    }

    pub fn kmeans(&self, n_clusters: usize) -> KMeansSettings {
        KMeansSettings {
            n_clusters,
            max_iters: self.kmeans_max_iters,
            tolerance: self.kmeans_tolerance,
            seed: self.seed,
        }
    }

    pub fn forest(&self) -> ForestSettings {
        ForestSettings {
            n_trees: self.n_trees,
            max_depth: None,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_gives_defaults() {
        let config = DashboardConfig::load(None).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.seed, 42);
        assert_eq!(
            config.cleaned_path("retail"),
            PathBuf::from("data/processed/retail_cleaned.csv")
        );
    }

    #[test]
    fn partial_file_overrides_only_its_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "seed = 7\nraw_dir = \"/tmp/raw\"").unwrap();
        let config = DashboardConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.raw_dir, PathBuf::from("/tmp/raw"));
        assert_eq!(config.rfm_clusters, 4);
        assert_eq!(config.kmeans(4).seed, 7);
    }

    #[test]
    fn bad_values_are_config_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "test_fraction = 1.5").unwrap();
        let err = DashboardConfig::load(Some(file.path())).unwrap_err();
        assert_eq!(err.stage(), "config");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sead = 1").unwrap();
        assert!(DashboardConfig::load(Some(file.path())).is_err());
    }
}
