//! Age-quartile audience segments with a demo CLV, for the dashboard's
//! audience page.

use log::{info, warn};
use rand::Rng;

use super::{demo_rng, Output};
use crate::config::DashboardConfig;
use crate::data::model::{Table, Value};
use crate::error::Result;

pub const AGE_SEGMENTS: [&str; 4] = ["Young", "Mid-Young", "Mid-Old", "Old"];
pub const UNKNOWN: &str = "Unknown";

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Quartile bin edges, or `None` when there are no ages or the edges collapse.
fn quartile_edges(ages: &[f64]) -> Option<[f64; 5]> {
    let mut sorted: Vec<f64> = ages.iter().copied().filter(|a| a.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let edges = [0.0, 0.25, 0.5, 0.75, 1.0].map(|q| quantile(&sorted, q));
    edges.windows(2).all(|w| w[0] < w[1]).then_some(edges)
}

/// Label each age by quartile. Bins are right-closed, the first one also
/// includes the minimum. Missing ages get `Unknown`, and so does everyone
/// when the quartiles cannot be formed.
pub fn age_segments(ages: &[f64]) -> Vec<&'static str> {
    let Some(edges) = quartile_edges(ages) else {
        warn!("audience: age quartiles not computable, segment set to {UNKNOWN}");
        return vec![UNKNOWN; ages.len()];
    };
    ages.iter()
        .map(|&age| {
            if !age.is_finite() {
                return UNKNOWN;
            }
            let bin = edges[1..].iter().position(|&e| age <= e).unwrap_or(3);
            AGE_SEGMENTS[bin]
        })
        .collect()
}

/// Adds `segment` and `synthetic_clv` U{500..9999}.
pub fn with_segments(ads: Table, config: &DashboardConfig) -> Table {
    let ages = ads
        .numeric_column("age")
        .unwrap_or_else(|| vec![f64::NAN; ads.len()]);
    let segments: Vec<Value> = age_segments(&ages)
        .into_iter()
        .map(|s| Value::Str(s.to_string()))
        .collect();

    let mut rng = demo_rng(config);
    let clv: Vec<Value> = (0..ads.len())
        .map(|_| Value::Int(rng.gen_range(500..10000)))
        .collect();
    info!("audience: generated synthetic_clv for {} rows", ads.len());

    ads.with_column("segment", segments)
        .with_column("synthetic_clv", clv)
}

pub fn run(ads: Table, config: &DashboardConfig) -> Result<Vec<Output>> {
    let table = with_segments(ads, config);
    Ok(vec![Output::new(config.data_path("final_output.csv"), table)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quartiles_split_evenly() {
        let ages: Vec<f64> = (1..=8).map(f64::from).collect();
        assert_eq!(
            age_segments(&ages),
            ["Young", "Young", "Mid-Young", "Mid-Young", "Mid-Old", "Mid-Old", "Old", "Old"]
        );
    }

    #[test]
    fn missing_age_is_unknown() {
        let segs = age_segments(&[18.0, f64::NAN, 30.0, 45.0, 60.0]);
        assert_eq!(segs[0], "Young");
        assert_eq!(segs[1], UNKNOWN);
        assert_eq!(segs[4], "Old");
    }

    #[test]
    fn degenerate_ages_fall_back_to_unknown() {
        assert_eq!(age_segments(&[30.0, 30.0, 30.0]), [UNKNOWN; 3]);
        assert_eq!(age_segments(&[f64::NAN]), [UNKNOWN]);
    }

    #[test]
    fn demo_clv_in_range() {
        let ads = Table::from_rows(
            vec!["age".into()],
            (0..20).map(|i| vec![Value::Int(18 + i)]).collect(),
        );
        let out = with_segments(ads, &DashboardConfig::default());
        for r in 0..out.len() {
            let clv = out.get(r, "synthetic_clv").and_then(Value::as_f64).unwrap();
            assert!((500.0..10000.0).contains(&clv));
        }
    }
}
