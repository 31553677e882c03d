//! Customer lifetime value tiers over demo purchase data.

use log::info;
use ndarray::Array2;
use rand::Rng;

use super::{demo_rng, Output};
use crate::config::DashboardConfig;
use crate::data::model::{Table, Value};
use crate::error::{PipelineError, Result};
use crate::model::clustering::segment;

pub const CLV_TIERS: [&str; 3] = ["Low CLV", "Medium CLV", "High CLV"];

/// Adds `synthetic_purchase_value` U(20, 200), `synthetic_purchase_frequency`
/// U{1..9}, `CLV` (their product), `CLV_scaled` and the `CLV_segment` tier.
pub fn run(ads: Table, config: &DashboardConfig) -> Result<Vec<Output>> {
    let table = with_clv(ads, config)?;
    Ok(vec![Output::new(config.processed_path("clv.csv"), table)])
}

pub fn with_clv(ads: Table, config: &DashboardConfig) -> Result<Table> {
    if ads.is_empty() {
        return Err(PipelineError::model_fit("clv", "no rows"));
    }
    let mut rng = demo_rng(config);
    let n = ads.len();
    let value: Vec<f64> = (0..n).map(|_| rng.gen_range(20.0..200.0)).collect();
    let frequency: Vec<i64> = (0..n).map(|_| rng.gen_range(1..10)).collect();
    let clv: Vec<f64> = value
        .iter()
        .zip(&frequency)
        .map(|(v, &f)| v * f as f64)
        .collect();
    info!("clv: generated synthetic purchase value and frequency for {n} rows");

    let features = Array2::from_shape_fn((n, 1), |(r, _)| clv[r]);
    let seg = segment(&features, &clv, &CLV_TIERS, config.kmeans(config.clv_clusters))?;
    let scaled = seg.scaler.transform(&features);
    info!("clv: cluster sizes {:?}", seg.cluster_sizes());

    let tiers: Vec<Value> = seg
        .row_tiers()
        .into_iter()
        .map(|t| Value::Str(t.to_string()))
        .collect();

    Ok(ads
        .with_column(
            "synthetic_purchase_value",
            value.into_iter().map(Value::Float).collect(),
        )
        .with_column(
            "synthetic_purchase_frequency",
            frequency.into_iter().map(Value::Int).collect(),
        )
        .with_column("CLV", clv.into_iter().map(Value::Float).collect())
        .with_column("CLV_scaled", scaled.column(0).iter().map(|&v| Value::Float(v)).collect())
        .with_column("CLV_segment", tiers))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ads(n: usize) -> Table {
        Table::from_rows(
            vec!["id".into()],
            (0..n).map(|i| vec![Value::Int(i as i64)]).collect(),
        )
    }

    #[test]
    fn clv_is_value_times_frequency_and_tiers_are_ordered() {
        let table = with_clv(ads(60), &DashboardConfig::default()).unwrap();
        assert_eq!(table.len(), 60);

        let mut tier_max = [f64::MIN; 3];
        let mut tier_min = [f64::MAX; 3];
        for r in 0..table.len() {
            let v = table.get(r, "synthetic_purchase_value").and_then(Value::as_f64).unwrap();
            let f = table.get(r, "synthetic_purchase_frequency").and_then(Value::as_f64).unwrap();
            let clv = table.get(r, "CLV").and_then(Value::as_f64).unwrap();
            assert!((20.0..200.0).contains(&v));
            assert!((1.0..=9.0).contains(&f));
            assert!((clv - v * f).abs() < 1e-9);

            let tier = table.get(r, "CLV_segment").unwrap().to_string();
            let t = CLV_TIERS.iter().position(|n| *n == tier).unwrap();
            tier_max[t] = tier_max[t].max(clv);
            tier_min[t] = tier_min[t].min(clv);
        }
        // One-dimensional clusters are contiguous ranges.
        assert!(tier_max[0] < tier_min[1]);
        assert!(tier_max[1] < tier_min[2]);
    }

    #[test]
    fn same_seed_same_demo_values() {
        let a = with_clv(ads(10), &DashboardConfig::default()).unwrap();
        let b = with_clv(ads(10), &DashboardConfig::default()).unwrap();
        assert_eq!(a, b);
    }
}
