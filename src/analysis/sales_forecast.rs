use chrono::NaiveTime;
use log::info;

use super::{parse_dates, Output};
use crate::config::DashboardConfig;
use crate::data::model::{Table, Value};
use crate::error::{PipelineError, Result};
use crate::model::forecast::{forecast_dates, resample_daily, HoltWinters};

pub const METRICS: [&str; 4] = ["zn", "sb", "tax", "marza"];
pub const SEASONAL_PERIOD: usize = 7;

/// Daily resample, then one Holt-Winters fit per metric. Output columns are
/// `Date` followed by the metrics, one row per forecast day.
pub fn forecast_table(daily_sales: Table, metrics: &[&str], horizon: usize) -> Result<Table> {
    let table = parse_dates(daily_sales, "Date");
    let series = resample_daily(&table, "Date", metrics)?;
    let last = *series
        .dates
        .last()
        .ok_or_else(|| PipelineError::model_fit("holt-winters", "no daily observations"))?;
    info!(
        "sales forecast: {} daily points from {} to {last}",
        series.len(),
        series.dates[0]
    );

    let mut forecasts = Vec::with_capacity(metrics.len());
    for (m, metric) in metrics.iter().enumerate() {
        let model = HoltWinters::fit(&series.values[m], SEASONAL_PERIOD).map_err(|e| match e {
            PipelineError::ModelFit { message, .. } => {
                PipelineError::model_fit(&format!("holt-winters ({metric})"), message)
            }
            other => other,
        })?;
        forecasts.push(model.forecast(horizon));
    }

    let mut out = Table::new(
        std::iter::once("Date")
            .chain(metrics.iter().copied())
            .map(String::from)
            .collect(),
    );
    for (h, day) in forecast_dates(last, horizon).into_iter().enumerate() {
        let mut row = vec![Value::Date(day.and_time(NaiveTime::MIN))];
        row.extend(forecasts.iter().map(|f| Value::Float(f[h])));
        out.push_row(row);
    }
    Ok(out)
}

pub fn run(day_sell: Table, config: &DashboardConfig) -> Result<Vec<Output>> {
    let table = forecast_table(day_sell, &METRICS, config.forecast_horizon)?;
    Ok(vec![Output::new(config.processed_path("sales_forecast.csv"), table)])
}
