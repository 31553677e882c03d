//! Declarative table cleaning.
//!
//! Each raw dataset is described by a [`CleaningPlan`]: an ordered list of
//! [`CleaningRule`]s plus the columns that must be present in every output
//! row. [`clean`] is the one executor that interprets all plans.

pub mod parsers;

use log::{debug, info};

use crate::data::filter::{complete_indices, filtered_indices, NumericPredicate};
use crate::data::model::{Table, Value};
use crate::error::{PipelineError, Result};

pub use parsers::CellParser;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// One cleaning step. Rules take a table by value and return a new one.
#[derive(Debug, Clone, PartialEq)]
pub enum CleaningRule {
    /// Trim surrounding whitespace from every header.
    StripHeaders,
    /// Replace all headers positionally; the count must match.
    SetHeaders(Vec<String>),
    /// Rename `from` to `to`. No-op when `from` is absent or `to` already exists.
    Rename { from: String, to: String },
    /// Remove columns.
    DropColumns(Vec<String>),
    /// Drop rows where any of the columns is missing.
    DropNulls(Vec<String>),
    /// Drop rows where every cell is missing.
    DropEmptyRows,
    /// Replace missing cells of a column with a constant.
    FillNull { column: String, value: Value },
    /// Run every present column through a cell parser.
    Coerce { columns: Vec<String>, parser: CellParser },
    /// Keep rows whose numeric cell satisfies the predicate.
    Filter { column: String, predicate: NumericPredicate },
}

impl CleaningRule {
    pub fn drop_nulls(columns: &[&str]) -> Self {
        CleaningRule::DropNulls(owned(columns))
    }

    pub fn coerce(columns: &[&str], parser: CellParser) -> Self {
        CleaningRule::Coerce {
            columns: owned(columns),
            parser,
        }
    }

    pub fn keep_positive(column: &str) -> Self {
        CleaningRule::Filter {
            column: column.to_string(),
            predicate: NumericPredicate::POSITIVE,
        }
    }

    pub fn rename(from: &str, to: &str) -> Self {
        CleaningRule::Rename {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Columns the rule reads. A rule whose inputs are all absent is a
    /// schema mismatch.
    fn input_columns(&self) -> &[String] {
        match self {
            CleaningRule::DropColumns(cols)
            | CleaningRule::DropNulls(cols)
            | CleaningRule::Coerce { columns: cols, .. } => cols,
            CleaningRule::FillNull { column, .. } | CleaningRule::Filter { column, .. } => {
                std::slice::from_ref(column)
            }
            CleaningRule::StripHeaders
            | CleaningRule::SetHeaders(_)
            | CleaningRule::Rename { .. }
            | CleaningRule::DropEmptyRows => &[],
        }
    }

    /// Apply the rule. Fails only on a schema mismatch.
    pub fn apply(&self, table: Table, dataset: &str) -> Result<Table> {
        let inputs = self.input_columns();
        if !inputs.is_empty() && !inputs.iter().any(|c| table.has_column(c)) {
            return Err(PipelineError::cleaning(
                dataset,
                format!("none of the columns [{}] are present", inputs.join(", ")),
            ));
        }

        Ok(match self {
            CleaningRule::StripHeaders => table.rename_columns(|c| c.trim().to_string()),
            CleaningRule::SetHeaders(names) => {
                if names.len() != table.columns().len() {
                    return Err(PipelineError::cleaning(
                        dataset,
                        format!(
                            "expected {} columns to rename, found {}",
                            names.len(),
                            table.columns().len()
                        ),
                    ));
                }
                let (_, rows) = table.into_parts();
                Table::from_rows(names.clone(), rows)
            }
            CleaningRule::Rename { from, to } => {
                if !table.has_column(from) || table.has_column(to) {
                    debug!("{dataset}: rename {from} -> {to} skipped");
                    table
                } else {
                    table.rename_columns(|c| {
                        if c == from.as_str() {
                            to.clone()
                        } else {
                            c.to_string()
                        }
                    })
                }
            }
            CleaningRule::DropColumns(cols) => table.drop_columns(cols),
            CleaningRule::DropNulls(cols) => {
                let keep = complete_indices(&table, cols);
                table.take_rows(&keep)
            }
            CleaningRule::DropEmptyRows => {
                table.filter_rows(|row| !row.iter().all(Value::is_missing))
            }
            CleaningRule::FillNull { column, value } => table.map_column(column, |v| {
                if v.is_missing() {
                    value.clone()
                } else {
                    v.clone()
                }
            }),
            CleaningRule::Coerce { columns, parser } => columns
                .iter()
                .fold(table, |t, c| t.map_column(c, |v| parser.parse(v))),
            CleaningRule::Filter { column, predicate } => {
                let keep = filtered_indices(&table, column, *predicate);
                table.take_rows(&keep)
            }
        })
    }
}

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// Ordered rules for one dataset plus the columns every output row must fill.
#[derive(Debug, Clone, Default)]
pub struct CleaningPlan {
    pub dataset: String,
    pub rules: Vec<CleaningRule>,
    pub required: Vec<String>,
}

impl CleaningPlan {
    pub fn new(dataset: &str) -> Self {
        CleaningPlan {
            dataset: dataset.to_string(),
            ..Default::default()
        }
    }

    pub fn rule(mut self, rule: CleaningRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn require(mut self, columns: &[&str]) -> Self {
        self.required.extend(owned(columns));
        self
    }

    /// Explicit requirements plus every column named by a `DropNulls` rule.
    pub fn required_columns(&self) -> Vec<String> {
        let mut cols = self.required.clone();
        for rule in &self.rules {
            if let CleaningRule::DropNulls(c) = rule {
                for name in c {
                    if !cols.contains(name) {
                        cols.push(name.clone());
                    }
                }
            }
        }
        cols
    }
}

/// Run every rule of `plan` in order, then drop rows missing a required value.
pub fn clean(table: Table, plan: &CleaningPlan) -> Result<Table> {
    let rows_in = table.len();
    let mut table = table;
    for rule in &plan.rules {
        table = rule.apply(table, &plan.dataset)?;
        debug!("{}: {:?} -> {} rows", plan.dataset, rule, table.len());
    }

    let keep = complete_indices(&table, &plan.required_columns());
    let table = table.take_rows(&keep);

    info!(
        "{}: cleaned {} rows -> {} rows",
        plan.dataset,
        rows_in,
        table.len()
    );
    Ok(table)
}
