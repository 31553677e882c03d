//! Daily resampling and Holt-Winters forecasting.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use log::{debug, info};

use crate::data::model::Table;
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Daily series
// ---------------------------------------------------------------------------

/// Several metrics on one gap-free daily calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    /// Strictly consecutive calendar days.
    pub dates: Vec<NaiveDate>,
    pub metrics: Vec<String>,
    /// `values[m][d]`: metric `m` on day `d`. Never missing.
    pub values: Vec<Vec<f64>>,
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn metric(&self, name: &str) -> Option<&[f64]> {
        let idx = self.metrics.iter().position(|m| m == name)?;
        Some(&self.values[idx])
    }
}

/// Average rows per calendar day, reindex to every day between the first and
/// last observation, and fill the gaps.
///
/// Interior gaps are linearly interpolated, trailing gaps carry the last
/// observation forward, and leading days on which some metric has not been
/// observed yet are dropped. `date_column` must already hold dates.
pub fn resample_daily(table: &Table, date_column: &str, metrics: &[&str]) -> Result<DailySeries> {
    let date_idx = table.column_index(date_column).ok_or_else(|| {
        PipelineError::model_fit("resample", format!("missing date column {date_column}"))
    })?;
    let metric_idx: Vec<usize> = metrics
        .iter()
        .map(|m| {
            table.column_index(m).ok_or_else(|| {
                PipelineError::model_fit("resample", format!("missing metric column {m}"))
            })
        })
        .collect::<Result<_>>()?;

    // day -> per-metric (sum, count)
    let mut days: BTreeMap<NaiveDate, Vec<(f64, usize)>> = BTreeMap::new();
    for row in table.rows() {
        let Some(day) = row[date_idx].as_date().map(|d| d.date()) else {
            continue;
        };
        let acc = days.entry(day).or_insert_with(|| vec![(0.0, 0); metrics.len()]);
        for (slot, &i) in acc.iter_mut().zip(&metric_idx) {
            if let Some(v) = row[i].as_f64() {
                slot.0 += v;
                slot.1 += 1;
            }
        }
    }

    let (Some(&first), Some(&last)) = (days.keys().next(), days.keys().next_back()) else {
        return Err(PipelineError::model_fit("resample", "no dated rows"));
    };

    let dates: Vec<NaiveDate> = first.iter_days().take_while(|d| *d <= last).collect();
    let mut values: Vec<Vec<f64>> = (0..metrics.len())
        .map(|m| {
            dates
                .iter()
                .map(|d| match days.get(d) {
                    Some(acc) if acc[m].1 > 0 => acc[m].0 / acc[m].1 as f64,
                    _ => f64::NAN,
                })
                .collect()
        })
        .collect();

    let gaps = values.iter().flatten().filter(|v| v.is_nan()).count();
    for series in &mut values {
        interpolate(series);
    }

    // Leading days still missing a metric are unusable.
    let start = (0..dates.len())
        .find(|&d| values.iter().all(|s| !s[d].is_nan()))
        .unwrap_or(dates.len());
    let dates = dates[start..].to_vec();
    for series in &mut values {
        series.drain(..start);
    }

    debug!("resample: filled {gaps} missing metric-days, dropped {start} leading days");
    Ok(DailySeries {
        dates,
        metrics: metrics.iter().map(|m| m.to_string()).collect(),
        values,
    })
}

/// Linear interpolation between known points; trailing gaps repeat the last
/// known value. Leading gaps are left as NaN.
fn interpolate(series: &mut [f64]) {
    let mut prev: Option<usize> = None;
    for i in 0..series.len() {
        if series[i].is_nan() {
            continue;
        }
        if let Some(p) = prev {
            let gap = i - p;
            for j in 1..gap {
                let t = j as f64 / gap as f64;
                series[p + j] = series[p] + t * (series[i] - series[p]);
            }
        }
        prev = Some(i);
    }
    if let Some(p) = prev {
        let last = series[p];
        for v in &mut series[p + 1..] {
            *v = last;
        }
    }
}

/// `horizon` consecutive days starting the day after `last`.
pub fn forecast_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as u64)
        .filter_map(|h| last.checked_add_days(Days::new(h)))
        .collect()
}

// ---------------------------------------------------------------------------
// Holt-Winters
// ---------------------------------------------------------------------------

/// Triple exponential smoothing with additive trend and additive seasonality.
#[derive(Debug, Clone, PartialEq)]
pub struct HoltWinters {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub period: usize,
    /// Sum of squared one-step-ahead errors over the training series.
    pub sse: f64,
    n_obs: usize,
    level: f64,
    trend: f64,
    /// Seasonal component indexed by `t % period`.
    season: Vec<f64>,
}

/// Final state after one smoothing pass.
struct Pass {
    sse: f64,
    level: f64,
    trend: f64,
    season: Vec<f64>,
}

const GRID_STEPS: usize = 19;

impl HoltWinters {
    /// Fit smoothing weights by grid search on the one-step-ahead SSE.
    ///
    /// Needs at least two full seasonal periods.
    pub fn fit(series: &[f64], period: usize) -> Result<Self> {
        if period == 0 || series.len() < 2 * period {
            return Err(PipelineError::model_fit(
                "holt-winters",
                format!(
                    "need at least {} observations (two periods of {period}), got {}",
                    2 * period,
                    series.len()
                ),
            ));
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::model_fit("holt-winters", "series has missing values"));
        }

        let grid: Vec<f64> = (1..=GRID_STEPS).map(|i| i as f64 * 0.05).collect();
        let mut best: Option<(f64, f64, f64, Pass)> = None;
        for &alpha in &grid {
            for &beta in &grid {
                for &gamma in &grid {
                    let pass = smooth(series, period, alpha, beta, gamma);
                    if best.as_ref().map_or(true, |b| pass.sse < b.3.sse) {
                        best = Some((alpha, beta, gamma, pass));
                    }
                }
            }
        }

        let Some((alpha, beta, gamma, pass)) = best else {
            return Err(PipelineError::model_fit("holt-winters", "empty parameter grid"));
        };
        info!(
            "holt-winters: alpha {alpha:.2}, beta {beta:.2}, gamma {gamma:.2}, sse {:.3}",
            pass.sse
        );
        Ok(HoltWinters {
            alpha,
            beta,
            gamma,
            period,
            sse: pass.sse,
            n_obs: series.len(),
            level: pass.level,
            trend: pass.trend,
            season: pass.season,
        })
    }

    /// Point forecasts for the next `horizon` steps.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        (1..=horizon)
            .map(|h| {
                let s = self.season[(self.n_obs + h - 1) % self.period];
                self.level + h as f64 * self.trend + s
            })
            .collect()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn smooth(series: &[f64], period: usize, alpha: f64, beta: f64, gamma: f64) -> Pass {
    let first = &series[..period];
    let second = &series[period..2 * period];
    let mut trend = (mean(second) - mean(first)) / period as f64;
    // Trend line value at t = 0; the first period's mean sits at its midpoint.
    let base = mean(first) - trend * (period - 1) as f64 / 2.0;
    let mut season: Vec<f64> = first
        .iter()
        .enumerate()
        .map(|(i, y)| y - (base + trend * i as f64))
        .collect();
    let mut level = base - trend;

    let mut sse = 0.0;
    for (t, &y) in series.iter().enumerate() {
        let s = season[t % period];
        let err = y - (level + trend + s);
        sse += err * err;

        let new_level = alpha * (y - s) + (1.0 - alpha) * (level + trend);
        trend = beta * (new_level - level) + (1.0 - beta) * trend;
        season[t % period] = gamma * (y - new_level) + (1.0 - gamma) * s;
        level = new_level;
    }

    Pass {
        sse,
        level,
        trend,
        season,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;
    use chrono::NaiveTime;

    const PATTERN: [f64; 7] = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0];

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 1, 1).unwrap() + Days::new(d as u64)
    }

    fn weekly_table(weeks: usize, skip: usize) -> Table {
        let rows = (0..weeks * 7)
            .filter(|&d| d != skip)
            .map(|d| {
                vec![
                    Value::Date(day(d as u32).and_time(NaiveTime::MIN)),
                    Value::Float(PATTERN[d % 7]),
                ]
            })
            .collect();
        Table::from_rows(vec!["Date".into(), "zn".into()], rows)
    }

    #[test]
    fn resample_fills_the_missing_day() {
        let series = resample_daily(&weekly_table(4, 10), "Date", &["zn"]).unwrap();
        assert_eq!(series.len(), 28);
        let zn = series.metric("zn").unwrap();
        assert!(zn.iter().all(|v| v.is_finite()));
        assert_eq!(zn[10], PATTERN[3]);
        for pair in series.dates.windows(2) {
            assert_eq!(pair[1], pair[0].succ_opt().unwrap());
        }
    }

    #[test]
    fn duplicate_days_are_averaged_and_trailing_gaps_carried() {
        let d = |n| Value::Date(day(n).and_time(NaiveTime::MIN));
        let t = Table::from_rows(
            vec!["Date".into(), "a".into(), "b".into()],
            vec![
                vec![d(0), Value::Float(1.0), Value::Null],
                vec![d(0), Value::Float(3.0), Value::Null],
                vec![d(1), Value::Float(4.0), Value::Float(7.0)],
                vec![d(3), Value::Float(8.0), Value::Null],
            ],
        );
        let s = resample_daily(&t, "Date", &["a", "b"]).unwrap();
        // day 0 has no `b` yet and is dropped.
        assert_eq!(s.dates, vec![day(1), day(2), day(3)]);
        assert_eq!(s.metric("a").unwrap(), &[4.0, 6.0, 8.0]);
        assert_eq!(s.metric("b").unwrap(), &[7.0, 7.0, 7.0]);
    }

    #[test]
    fn periodic_series_forecasts_the_pattern() {
        let series = resample_daily(&weekly_table(4, 10), "Date", &["zn"]).unwrap();
        let model = HoltWinters::fit(series.metric("zn").unwrap(), 7).unwrap();
        let forecast = model.forecast(30);
        assert_eq!(forecast.len(), 30);
        for (h, v) in forecast.iter().enumerate() {
            assert!((v - PATTERN[h % 7]).abs() < 1e-6, "step {h}: {v}");
        }
    }

    #[test]
    fn trend_is_extrapolated() {
        let series: Vec<f64> = (0..42).map(|t| t as f64 * 2.0 + PATTERN[t % 7]).collect();
        let model = HoltWinters::fit(&series, 7).unwrap();
        let forecast = model.forecast(7);
        for (h, v) in forecast.iter().enumerate() {
            let expected = (42 + h) as f64 * 2.0 + PATTERN[(42 + h) % 7];
            assert!((v - expected).abs() < 1.0, "step {h}: {v} vs {expected}");
        }
    }

    #[test]
    fn short_series_is_a_fit_error() {
        let err = HoltWinters::fit(&[1.0; 13], 7).unwrap_err();
        assert_eq!(err.stage(), "model");
    }

    #[test]
    fn forecast_dates_start_after_last_day() {
        let dates = forecast_dates(day(27), 30);
        assert_eq!(dates.len(), 30);
        assert_eq!(dates[0], day(28));
        assert_eq!(dates[29], day(57));
    }
}
