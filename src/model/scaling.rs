use ndarray::{Array1, Array2, Axis};

/// Per-column standardization: `(x - mean) / std` with the population
/// standard deviation (ddof = 0).
///
/// Columns with zero variance scale to all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(x: &Array2<f64>) -> Self {
        let cols = x.ncols();
        if x.nrows() == 0 {
            return StandardScaler {
                mean: Array1::zeros(cols),
                std: Array1::zeros(cols),
            };
        }
        let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(cols));
        let std = x.std_axis(Axis(0), 0.0);
        StandardScaler { mean, std }
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = x - &self.mean;
        for (mut col, &s) in out.axis_iter_mut(Axis(1)).zip(self.std.iter()) {
            if s > 0.0 && s.is_finite() {
                col /= s;
            } else {
                col.fill(0.0);
            }
        }
        out
    }

    pub fn fit_transform(x: &Array2<f64>) -> (Self, Array2<f64>) {
        let scaler = Self::fit(x);
        let scaled = scaler.transform(x);
        (scaler, scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn constant_column_scales_to_zero() {
        let x = array![[5.0, 1.0], [5.0, 2.0], [5.0, 3.0]];
        let (_, scaled) = StandardScaler::fit_transform(&x);
        assert!(scaled.column(0).iter().all(|&v| v == 0.0));
        assert!(scaled.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn scaled_columns_have_zero_mean_unit_variance() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let (scaler, scaled) = StandardScaler::fit_transform(&x);
        assert!((scaler.mean[0] - 2.5).abs() < 1e-12);
        let mean: f64 = scaled.column(0).sum() / 4.0;
        let var: f64 = scaled.column(0).iter().map(|v| v * v).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn single_row_is_all_zero() {
        let x = array![[3.0, 4.0]];
        let (_, scaled) = StandardScaler::fit_transform(&x);
        assert_eq!(scaled, array![[0.0, 0.0]]);
    }
}
