//! Bagged decision-tree ensemble and reproducible train/test splitting.

use std::collections::BTreeMap;

use linfa::prelude::*;
use linfa_trees::{DecisionTree, SplitQuality};
use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};

use crate::error::{PipelineError, Result};

/// Shuffle `0..n` with a fixed seed and cut off the first
/// `ceil(n * test_fraction)` indices as the test partition.
///
/// Returns `(train, test)`. With at least two rows both sides are non-empty.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut n_test = (n as f64 * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    if n >= 2 {
        n_test = n_test.clamp(1, n - 1);
    }
    let train = indices.split_off(n_test.min(n));
    (train, indices)
}

/// Ensemble settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestSettings {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

impl Default for ForestSettings {
    fn default() -> Self {
        ForestSettings {
            n_trees: 100,
            max_depth: None,
            seed: 42,
        }
    }
}

/// Random forest: every tree sees a bootstrap sample of the rows and a random
/// subset of `ceil(sqrt(n_features))` columns; predictions are a majority vote.
pub struct RandomForest {
    /// Each tree with the global indices of the columns it was trained on.
    trees: Vec<(DecisionTree<f64, usize>, Vec<usize>)>,
    n_features: usize,
}

impl RandomForest {
    pub fn fit(x: &Array2<f64>, y: &Array1<usize>, settings: ForestSettings) -> Result<Self> {
        let (n_rows, n_features) = x.dim();
        if n_rows == 0 || n_features == 0 {
            return Err(PipelineError::model_fit(
                "random forest",
                format!("empty training matrix ({n_rows} x {n_features})"),
            ));
        }
        if y.len() != n_rows {
            return Err(PipelineError::model_fit("random forest", "target length mismatch"));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::model_fit(
                "random forest",
                "features contain missing values",
            ));
        }
        if settings.n_trees == 0 {
            return Err(PipelineError::model_fit("random forest", "n_trees must be positive"));
        }

        let subspace = ((n_features as f64).sqrt().ceil() as usize).clamp(1, n_features);
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let mut trees = Vec::with_capacity(settings.n_trees);

        for t in 0..settings.n_trees {
            let rows: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
            let mut cols = index::sample(&mut rng, n_features, subspace).into_vec();
            cols.sort_unstable();

            let records = x.select(Axis(0), &rows).select(Axis(1), &cols);
            let targets = y.select(Axis(0), &rows);
            let dataset = Dataset::new(records, targets);

            let tree = DecisionTree::<f64, usize>::params()
                .split_quality(SplitQuality::Gini)
                .max_depth(settings.max_depth)
                .fit(&dataset)
                .map_err(|e| PipelineError::model_fit("random forest", e.to_string()))?;
            debug!("tree {t}: columns {cols:?}");
            trees.push((tree, cols));
        }

        info!(
            "random forest: {} trees, {subspace} of {n_features} features per tree, {n_rows} rows",
            trees.len()
        );
        Ok(RandomForest { trees, n_features })
    }

    /// Majority vote over all trees; ties go to the smaller label.
    pub fn predict(&self, x: &Array2<f64>) -> Array1<usize> {
        let votes: Vec<Array1<usize>> = self
            .trees
            .iter()
            .map(|(tree, cols)| tree.predict(&x.select(Axis(1), cols)))
            .collect();

        Array1::from_shape_fn(x.nrows(), |r| {
            let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
            for v in &votes {
                *counts.entry(v[r]).or_default() += 1;
            }
            counts
                .iter()
                .fold((0usize, 0usize), |best, (&label, &n)| {
                    if n > best.1 {
                        (label, n)
                    } else {
                        best
                    }
                })
                .0
        })
    }

    /// Mean impurity-decrease importance per feature, normalized to sum to 1.
    pub fn feature_importance(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        for (tree, cols) in &self.trees {
            for (&col, imp) in cols.iter().zip(tree.feature_importance()) {
                if imp.is_finite() {
                    total[col] += imp;
                }
            }
        }
        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for v in &mut total {
                *v /= sum;
            }
        }
        total
    }
}
