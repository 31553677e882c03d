use std::fmt;

use crate::error::{PipelineError, Result};

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination on the training data.
    pub r_squared: f64,
}

impl LinearFit {
    /// Fit on paired observations. Pairs with a missing side are ignored.
    ///
    /// Fails with fewer than two usable pairs or a constant `x`.
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
        let pairs: Vec<(f64, f64)> = x
            .iter()
            .zip(y)
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .map(|(&a, &b)| (a, b))
            .collect();
        if pairs.len() < 2 {
            return Err(PipelineError::model_fit(
                "linear regression",
                format!("need at least 2 observations, got {}", pairs.len()),
            ));
        }

        let n = pairs.len() as f64;
        let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
        let sxx: f64 = pairs.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
        let sxy: f64 = pairs.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
        if sxx == 0.0 {
            return Err(PipelineError::model_fit(
                "linear regression",
                "independent variable is constant",
            ));
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        let ss_res: f64 = pairs
            .iter()
            .map(|&(a, b)| (b - (slope * a + intercept)).powi(2))
            .sum();
        let ss_tot: f64 = pairs.iter().map(|p| (p.1 - mean_y).powi(2)).sum();
        // Constant target: perfect fit scores 1, anything else 0.
        let r_squared = if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };

        Ok(LinearFit {
            slope,
            intercept,
            r_squared,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

impl fmt::Display for LinearFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slope {:.4}, intercept {:.4}, R-squared {:.4}",
            self.slope, self.intercept, self.r_squared
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_against_clicks_slopes_down() {
        let fit = LinearFit::fit(&[10.0, 20.0, 30.0, 40.0], &[1.0, 1.0, 0.0, 0.0]).unwrap();
        assert!(fit.slope < 0.0);
        assert!((fit.slope + 0.04).abs() < 1e-12);
        assert!((fit.intercept - 1.5).abs() < 1e-12);
        assert!((fit.r_squared - 0.8).abs() < 1e-12);
    }

    #[test]
    fn exact_line_has_r_squared_one() {
        let fit = LinearFit::fit(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!((fit.predict(3.0) - 7.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_fail() {
        assert!(LinearFit::fit(&[1.0], &[1.0]).is_err());
        assert!(LinearFit::fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(LinearFit::fit(&[1.0, f64::NAN], &[1.0, 2.0]).is_err());
    }
}
