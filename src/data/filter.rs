use serde::{Deserialize, Serialize};

use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Numeric row predicates
// ---------------------------------------------------------------------------

/// Comparison applied to one numeric cell.
///
/// A cell that is missing or not numeric never passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPredicate {
    Gt(f64),
    Ge(f64),
    Lt(f64),
    Le(f64),
}

impl NumericPredicate {
    /// Shorthand for "strictly positive".
    pub const POSITIVE: NumericPredicate = NumericPredicate::Gt(0.0);

    pub fn matches(&self, value: &Value) -> bool {
        let Some(x) = value.as_f64() else {
            return false;
        };
        match *self {
            NumericPredicate::Gt(t) => x > t,
            NumericPredicate::Ge(t) => x >= t,
            NumericPredicate::Lt(t) => x < t,
            NumericPredicate::Le(t) => x <= t,
        }
    }
}

/// Return indices of rows whose `column` cell satisfies `predicate`.
///
/// An unknown column selects nothing.
pub fn filtered_indices(table: &Table, column: &str, predicate: NumericPredicate) -> Vec<usize> {
    let Some(cells) = table.column(column) else {
        return Vec::new();
    };
    cells
        .enumerate()
        .filter(|(_, v)| predicate.matches(v))
        .map(|(i, _)| i)
        .collect()
}

/// Return indices of rows with no missing value in any of `columns`.
///
/// Columns absent from the table impose no constraint.
pub fn complete_indices(table: &Table, columns: &[String]) -> Vec<usize> {
    let idx: Vec<usize> = columns
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();
    table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| idx.iter().all(|&i| !row[i].is_missing()))
        .map(|(i, _)| i)
        .collect()
}
