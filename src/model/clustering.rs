//! K-Means segmentation with tier naming.

use linfa::prelude::*;
use linfa_clustering::KMeans;
use log::info;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::scaling::StandardScaler;
use crate::error::{PipelineError, Result};

/// K-Means settings. The seed makes centroid initialisation reproducible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansSettings {
    pub n_clusters: usize,
    pub max_iters: u64,
    pub tolerance: f64,
    pub seed: u64,
}

impl KMeansSettings {
    pub fn new(n_clusters: usize, seed: u64) -> Self {
        KMeansSettings {
            n_clusters,
            max_iters: 300,
            tolerance: 1e-4,
            seed,
        }
    }
}

/// Fitted segmentation. Cluster ids are already re-numbered by tier, so
/// cluster `0` is the lowest tier and `tier_names[label]` names a row's tier.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Tier-ordered cluster id per input row.
    pub labels: Vec<usize>,
    /// Tier names, lowest first.
    pub tier_names: Vec<String>,
    /// Centroids in standardized space, one row per tier.
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares (inertia).
    pub inertia: f64,
    pub scaler: StandardScaler,
}

impl Segmentation {
    /// Tier name for each input row.
    pub fn row_tiers(&self) -> Vec<&str> {
        self.labels
            .iter()
            .map(|&l| self.tier_names[l].as_str())
            .collect()
    }

    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.tier_names.len()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Standardize `features`, cluster them, then name clusters by ascending mean
/// of `ranking` (one value per row, typically the monetary column).
///
/// `tier_names` must hold one name per cluster, lowest tier first.
pub fn segment(
    features: &Array2<f64>,
    ranking: &[f64],
    tier_names: &[&str],
    settings: KMeansSettings,
) -> Result<Segmentation> {
    let k = settings.n_clusters;
    if k == 0 || tier_names.len() != k {
        return Err(PipelineError::model_fit(
            "kmeans",
            format!("{} tier names for {k} clusters", tier_names.len()),
        ));
    }
    if features.nrows() < k {
        return Err(PipelineError::model_fit(
            "kmeans",
            format!(
                "number of rows ({}) must be at least the number of clusters ({k})",
                features.nrows()
            ),
        ));
    }
    if ranking.len() != features.nrows() {
        return Err(PipelineError::model_fit("kmeans", "ranking length mismatch"));
    }
    if features.iter().any(|v| !v.is_finite()) {
        return Err(PipelineError::model_fit("kmeans", "features contain missing values"));
    }

    let (scaler, scaled) = StandardScaler::fit_transform(features);

    let dataset = DatasetBase::from(scaled.clone());
    let rng = StdRng::seed_from_u64(settings.seed);
    let model = KMeans::params_with_rng(k, rng)
        .max_n_iterations(settings.max_iters)
        .tolerance(settings.tolerance)
        .fit(&dataset)
        .map_err(|e| PipelineError::model_fit("kmeans", e.to_string()))?;

    let raw_labels: Array1<usize> = model.predict(&scaled);
    let raw_centroids = model.centroids().clone();

    // Rank clusters by the mean ranking value of their members.
    let mut sums = vec![(0.0f64, 0usize); k];
    for (&label, &r) in raw_labels.iter().zip(ranking) {
        sums[label].0 += r;
        sums[label].1 += 1;
    }
    let means: Vec<f64> = sums
        .iter()
        .map(|&(s, n)| if n == 0 { f64::NAN } else { s / n as f64 })
        .collect();
    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| means[a].total_cmp(&means[b]));
    let mut rank = vec![0usize; k];
    for (tier, &cluster) in order.iter().enumerate() {
        rank[cluster] = tier;
    }

    let labels: Vec<usize> = raw_labels.iter().map(|&l| rank[l]).collect();
    let centroids = raw_centroids.select(ndarray::Axis(0), &order);
    let inertia = compute_inertia(&scaled, &labels, &centroids);

    info!(
        "kmeans: {k} clusters over {} rows, inertia {inertia:.3}",
        features.nrows()
    );

    Ok(Segmentation {
        labels,
        tier_names: tier_names.iter().map(|t| t.to_string()).collect(),
        centroids,
        inertia,
        scaler,
    })
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(features: &Array2<f64>, labels: &[usize], centroids: &Array2<f64>) -> f64 {
    labels
        .iter()
        .enumerate()
        .map(|(i, &cluster)| {
            features
                .row(i)
                .iter()
                .zip(centroids.row(cluster).iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
        })
        .sum()
}
