//! RFM customer segmentation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDateTime};
use log::info;
use ndarray::Array2;

use super::{parse_dates, round2, Output};
use crate::config::DashboardConfig;
use crate::data::model::{Table, Value};
use crate::error::{PipelineError, Result};
use crate::model::clustering::{segment, Segmentation};

/// Tier names by ascending mean Monetary.
pub const RFM_TIERS: [&str; 4] = ["Budget Shopper", "Low Value", "Mid Value", "High Value"];

pub const OUTPUT_COLUMNS: [&str; 6] = [
    "CustomerID",
    "Recency",
    "Frequency",
    "Monetary",
    "Cluster",
    "Segment",
];

/// Recency / Frequency / Monetary per customer, in ascending customer order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rfm {
    pub customers: Vec<Value>,
    pub recency: Vec<i64>,
    pub frequency: Vec<usize>,
    pub monetary: Vec<f64>,
}

impl Rfm {
    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    fn features(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.len(), 3), |(r, c)| match c {
            0 => self.recency[r] as f64,
            1 => self.frequency[r] as f64,
            _ => self.monetary[r],
        })
    }
}

#[derive(Default)]
struct Customer {
    last: Option<NaiveDateTime>,
    invoices: BTreeSet<String>,
    monetary: f64,
}

/// Aggregate transactions per `CustomerID`.
///
/// Snapshot is the latest invoice date plus one day; rows without a date or
/// customer are ignored.
pub fn compute_rfm(transactions: &Table) -> Result<Rfm> {
    for col in ["CustomerID", "InvoiceNo", "InvoiceDate", "Quantity", "UnitPrice"] {
        if !transactions.has_column(col) {
            return Err(PipelineError::model_fit("rfm", format!("missing column {col}")));
        }
    }

    let mut customers: BTreeMap<Value, Customer> = BTreeMap::new();
    for r in 0..transactions.len() {
        let cell = |c: &str| transactions.get(r, c).cloned().unwrap_or(Value::Null);
        let (id, date) = (cell("CustomerID"), cell("InvoiceDate").as_date());
        let Some(date) = date.filter(|_| !id.is_missing()) else {
            continue;
        };
        let amount = match (cell("Quantity").as_f64(), cell("UnitPrice").as_f64()) {
            (Some(q), Some(p)) => q * p,
            _ => 0.0,
        };

        let entry = customers.entry(id).or_default();
        entry.last = entry.last.max(Some(date));
        if !cell("InvoiceNo").is_missing() {
            entry.invoices.insert(cell("InvoiceNo").to_string());
        }
        entry.monetary += amount;
    }

    let latest = customers.values().filter_map(|c| c.last).max().ok_or_else(|| {
        PipelineError::model_fit("rfm", "no transactions with a customer and a date")
    })?;
    let snapshot = latest
        .checked_add_days(Days::new(1))
        .ok_or_else(|| PipelineError::model_fit("rfm", "snapshot date out of range"))?;

    let mut rfm = Rfm {
        customers: Vec::with_capacity(customers.len()),
        recency: Vec::with_capacity(customers.len()),
        frequency: Vec::with_capacity(customers.len()),
        monetary: Vec::with_capacity(customers.len()),
    };
    for (id, c) in customers {
        let last = c.last.unwrap_or(latest);
        rfm.customers.push(id);
        rfm.recency.push((snapshot - last).num_days());
        rfm.frequency.push(c.invoices.len());
        rfm.monetary.push(c.monetary);
    }
    info!("rfm: {} customers, snapshot {}", rfm.len(), snapshot.date());
    Ok(rfm)
}

/// Cluster RFM rows and name them by ascending Monetary.
pub fn segment_customers(rfm: &Rfm, config: &DashboardConfig) -> Result<Segmentation> {
    segment(
        &rfm.features(),
        &rfm.monetary,
        &RFM_TIERS,
        config.kmeans(config.rfm_clusters),
    )
}

fn segments_table(rfm: &Rfm, seg: &Segmentation) -> Table {
    let mut table = Table::new(OUTPUT_COLUMNS.iter().map(|c| c.to_string()).collect());
    for (i, tier) in seg.row_tiers().into_iter().enumerate() {
        table.push_row(vec![
            rfm.customers[i].clone(),
            Value::Int(rfm.recency[i]),
            Value::Int(rfm.frequency[i] as i64),
            Value::Float(rfm.monetary[i]),
            Value::Int(seg.labels[i] as i64),
            Value::Str(tier.to_string()),
        ]);
    }
    table
}

/// Mean Recency / Frequency / Monetary per segment, rounded to 2 decimals,
/// segments in name order.
pub fn segment_summary(segments: &Table) -> Table {
    let metrics = ["Recency", "Frequency", "Monetary"];
    let mut groups: BTreeMap<String, (Vec<f64>, usize)> = BTreeMap::new();
    for r in 0..segments.len() {
        let Some(name) = segments.get(r, "Segment") else {
            continue;
        };
        let entry = groups
            .entry(name.to_string())
            .or_insert_with(|| (vec![0.0; metrics.len()], 0));
        for (m, metric) in metrics.iter().enumerate() {
            entry.0[m] += segments.get(r, metric).and_then(Value::as_f64).unwrap_or(0.0);
        }
        entry.1 += 1;
    }

    let mut summary = Table::new(
        std::iter::once("Segment")
            .chain(metrics)
            .map(String::from)
            .collect(),
    );
    for (name, (sums, n)) in groups {
        let mut row = vec![Value::Str(name)];
        row.extend(sums.iter().map(|s| Value::Float(round2(s / n as f64))));
        summary.push_row(row);
    }
    summary
}

/// `"High Value"` -> `"high_value"`
pub fn snake_case(segment: &str) -> String {
    segment.replace(' ', "_").to_lowercase()
}

/// `customer_segments.csv`, `segment_summary.csv`, and one
/// `<segment>_customers.csv` per populated segment under `outputs_dir`.
pub fn run(retail: Table, config: &DashboardConfig) -> Result<Vec<Output>> {
    let retail = parse_dates(retail, "InvoiceDate");
    let rfm = compute_rfm(&retail)?;
    let seg = segment_customers(&rfm, config)?;
    info!(
        "segmentation: cluster sizes {:?}, inertia {:.3}",
        seg.cluster_sizes(),
        seg.inertia
    );

    let segments = segments_table(&rfm, &seg);
    let mut outputs = vec![
        Output::new(config.processed_path("segment_summary.csv"), segment_summary(&segments)),
    ];
    for (label, tier) in seg.tier_names.iter().enumerate() {
        let rows: Vec<usize> = (0..seg.labels.len()).filter(|&i| seg.labels[i] == label).collect();
        if rows.is_empty() {
            continue;
        }
        let path = config.output_path(&format!("{}_customers.csv", snake_case(tier)));
        outputs.push(Output::new(path, segments.take_rows(&rows)));
    }
    outputs.insert(0, Output::new(config.processed_path("customer_segments.csv"), segments));
    Ok(outputs)
}
