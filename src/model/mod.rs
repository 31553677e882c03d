//! Feature and model step: scaling, clustering, regression, forecasting,
//! classification and categorical encoding.

pub mod clustering;
pub mod encoding;
pub mod forecast;
pub mod forest;
pub mod metrics;
pub mod regression;
pub mod scaling;

pub use clustering::{segment, KMeansSettings, Segmentation};
pub use encoding::{one_hot_encode, to_matrix};
pub use forecast::{forecast_dates, resample_daily, DailySeries, HoltWinters};
pub use forest::{train_test_split, ForestSettings, RandomForest};
pub use metrics::ClassificationReport;
pub use regression::LinearFit;
pub use scaling::StandardScaler;
