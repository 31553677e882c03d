//! Clicks against a demo ad price.

use log::info;
use rand::Rng;

use super::{demo_rng, Output};
use crate::config::DashboardConfig;
use crate::data::model::{Table, Value};
use crate::error::{PipelineError, Result};
use crate::model::regression::LinearFit;

/// Regress `y` on `x` and append `predicted_<y>`.
pub fn regress(table: Table, x: &str, y: &str) -> Result<(LinearFit, Table)> {
    let xs = table.numeric_column(x).ok_or_else(|| {
        PipelineError::model_fit("linear regression", format!("missing column {x}"))
    })?;
    let ys = table.numeric_column(y).ok_or_else(|| {
        PipelineError::model_fit("linear regression", format!("missing column {y}"))
    })?;
    let fit = LinearFit::fit(&xs, &ys)?;

    let predicted: Vec<Value> = xs
        .iter()
        .map(|&v| if v.is_finite() { Value::Float(fit.predict(v)) } else { Value::Null })
        .collect();
    Ok((fit, table.with_column(&format!("predicted_{y}"), predicted)))
}

/// Adds `synthetic_price` U(10, 100), fills missing `click` with 0, computes
/// `revenue = click * synthetic_price`, then regresses click on price.
pub fn with_price_sensitivity(ads: Table, config: &DashboardConfig) -> Result<(LinearFit, Table)> {
    if !ads.has_column("click") {
        return Err(PipelineError::model_fit("price sensitivity", "missing column click"));
    }
    let mut rng = demo_rng(config);
    let price: Vec<f64> = (0..ads.len()).map(|_| rng.gen_range(10.0..100.0)).collect();
    info!("price sensitivity: generated synthetic price for {} rows", ads.len());

    let table = ads
        .map_column("click", |v| if v.is_missing() { Value::Int(0) } else { v.clone() })
        .with_column("synthetic_price", price.iter().map(|&p| Value::Float(p)).collect());
    let revenue: Vec<Value> = table
        .numeric_column("click")
        .unwrap_or_default()
        .iter()
        .zip(&price)
        .map(|(c, p)| if c.is_finite() { Value::Float(c * p) } else { Value::Null })
        .collect();
    let table = table.with_column("revenue", revenue);

    let (fit, table) = regress(table, "synthetic_price", "click")?;
    info!("price sensitivity: {fit}");
    Ok((fit, table))
}

pub fn run(ads: Table, config: &DashboardConfig) -> Result<Vec<Output>> {
    let (_, table) = with_price_sensitivity(ads, config)?;
    Ok(vec![Output::new(config.processed_path("price_sensitivity.csv"), table)])
}
