//! Ad-click classification with a random forest.

use log::info;
use ndarray::{Array1, Axis};

use super::Output;
use crate::config::DashboardConfig;
use crate::data::filter::complete_indices;
use crate::data::model::{Table, Value};
use crate::error::{PipelineError, Result};
use crate::model::encoding::{one_hot_encode, to_matrix};
use crate::model::forest::{train_test_split, RandomForest};
use crate::model::metrics::ClassificationReport;

pub const TARGET: &str = "click";
pub const IDENTIFIERS: [&str; 2] = ["id", "full_name"];

/// Everything the classification step produces.
pub struct AdCampaignResult {
    pub report: ClassificationReport,
    /// Test rows: encoded features, `actual_click`, `predicted_click`.
    pub predictions: Table,
    /// `feature,importance`, most important first.
    pub importance: Table,
}

pub fn classify(ads: Table, config: &DashboardConfig) -> Result<AdCampaignResult> {
    if !ads.has_column(TARGET) {
        return Err(PipelineError::model_fit("random forest", "missing column click"));
    }
    let ads = ads.drop_columns(&IDENTIFIERS.map(String::from));
    let complete = complete_indices(&ads, ads.columns());
    let ads = ads.take_rows(&complete);

    let encoded = one_hot_encode(&ads, true);
    let features: Vec<String> = encoded
        .columns()
        .iter()
        .filter(|c| c.as_str() != TARGET)
        .cloned()
        .collect();
    let labels = encoded
        .column(TARGET)
        .into_iter()
        .flatten()
        .map(|v| match v.as_f64() {
            Some(x) if x >= 0.0 && x.fract() == 0.0 => Ok(x as usize),
            _ => Err(PipelineError::model_fit(
                "random forest",
                format!("non-integer click label {v}"),
            )),
        })
        .collect::<Result<Vec<usize>>>()?;
    if labels.len() < 2 {
        return Err(PipelineError::model_fit(
            "random forest",
            format!("need at least 2 complete rows, got {}", labels.len()),
        ));
    }

    let x = to_matrix(&encoded, &features);
    let y = Array1::from(labels);
    let (train, test) = train_test_split(y.len(), config.test_fraction, config.seed);
    info!(
        "ad campaign: {} features, {} train rows, {} test rows",
        features.len(),
        train.len(),
        test.len()
    );

    let forest = RandomForest::fit(
        &x.select(Axis(0), &train),
        &y.select(Axis(0), &train),
        config.forest(),
    )?;
    let actual = y.select(Axis(0), &test);
    let predicted = forest.predict(&x.select(Axis(0), &test));

    let report = ClassificationReport::new(&actual.to_vec(), &predicted.to_vec());
    info!("ad campaign classification report:\n{report}");
    info!("ad campaign confusion matrix: {:?}", report.confusion);

    let feature_refs: Vec<&str> = features.iter().map(String::as_str).collect();
    let predictions = encoded
        .select(&feature_refs)
        .take_rows(&test)
        .with_column(
            "actual_click",
            actual.iter().map(|&c| Value::Int(c as i64)).collect(),
        )
        .with_column(
            "predicted_click",
            predicted.iter().map(|&c| Value::Int(c as i64)).collect(),
        );

    let mut ranked: Vec<(String, f64)> = features
        .into_iter()
        .zip(forest.feature_importance())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut importance = Table::new(vec!["feature".into(), "importance".into()]);
    for (feature, score) in ranked {
        importance.push_row(vec![Value::Str(feature), Value::Float(score)]);
    }

    Ok(AdCampaignResult {
        report,
        predictions,
        importance,
    })
}

pub fn run(ads: Table, config: &DashboardConfig) -> Result<Vec<Output>> {
    let result = classify(ads, config)?;
    Ok(vec![
        Output::new(config.processed_path("ad_campaign_predictions.csv"), result.predictions),
        Output::new(config.processed_path("feature_importance.csv"), result.importance),
    ])
}
