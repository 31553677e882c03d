use std::fmt;

use chrono::{NaiveDateTime, NaiveTime};

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a CSV column ends up with.
/// Used as a `BTreeMap` key when grouping, so `Value` must be `Ord`.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord so Value can key ordered maps --

/// Equality follows [`Ord`]: `Float(NaN) == Float(NaN)`, and an `Int` never
/// equals a `Float`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Int(_) => 2,
                Float(_) => 3,
                Str(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            // Ints and floats compare numerically with each other.
            if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
                return a.total_cmp(&b).then(da.cmp(&db));
            }
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Str(a), Str(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Str(s) => s.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Null => {}
        }
    }
}

/// CSV cell rendering. Missing values render as an empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) if v.is_nan() => Ok(()),
            // Debug keeps a trailing `.0` so the column re-ingests as float.
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) if d.time() == NaiveTime::MIN => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            Value::Null => Ok(()),
        }
    }
}

/// Cell texts read as missing.
const MISSING_MARKERS: &[&str] = &[
    "NaN", "nan", "-NaN", "-nan", "NA", "N/A", "n/a", "<NA>", "#N/A", "NULL", "null", "None",
];

impl Value {
    /// Guess the type of a raw text cell.
    ///
    /// Only `.`-decimal numbers are recognised here; locale-formatted numbers
    /// and dates stay text until a cleaning rule coerces them. Empty cells,
    /// the usual missing-value markers and non-finite numbers are `Null`.
    pub fn infer(s: &str) -> Value {
        let s = s.trim();
        if s.is_empty() || MISSING_MARKERS.contains(&s) {
            return Value::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return if f.is_finite() { Value::Float(f) } else { Value::Null };
        }
        match s {
            "true" | "True" | "TRUE" => Value::Bool(true),
            "false" | "False" | "FALSE" => Value::Bool(false),
            _ => Value::Str(s.to_string()),
        }
    }

    /// Numeric view of the value; `None` for missing or non-numeric cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) if !v.is_nan() => Some(*v),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// `Null` and `NaN` both count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Table – ordered columns, ordered rows
// ---------------------------------------------------------------------------

/// An in-memory table. Every row holds exactly one value per column, in
/// column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// An empty table with the given header.
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from rows; short rows are padded with `Null` and long
    /// rows truncated to the header width.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Table { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Decompose into header and rows.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Cell lookup by row number and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Iterate over one column's cells.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Numeric copy of a column, `NaN` where a cell is missing or non-numeric.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name)
            .map(|it| it.map(|v| v.as_f64().unwrap_or(f64::NAN)).collect())
    }

    /// Append a column, or replace it in place when the name already exists.
    pub fn with_column(mut self, name: &str, values: Vec<Value>) -> Self {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
        self
    }

    /// Replace every cell of an existing column through `f`.
    pub fn map_column(mut self, name: &str, f: impl Fn(&Value) -> Value) -> Self {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                row[idx] = f(&row[idx]);
            }
        }
        self
    }

    /// Keep only the named columns, in the order given. Unknown names are skipped.
    pub fn select(&self, names: &[&str]) -> Table {
        let indices: Vec<usize> = names.iter().filter_map(|n| self.column_index(n)).collect();
        Table {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        }
    }

    /// Remove the named columns if present.
    pub fn drop_columns(self, names: &[String]) -> Table {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i]))
            .collect();
        Table {
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        }
    }

    /// Rename headers through `f`.
    pub fn rename_columns(mut self, f: impl Fn(&str) -> String) -> Table {
        self.columns = self.columns.iter().map(|c| f(c)).collect();
        self
    }

    /// Keep rows for which `keep` returns true.
    pub fn filter_rows(mut self, keep: impl Fn(&[Value]) -> bool) -> Table {
        self.rows.retain(|r| keep(r));
        self
    }

    /// Keep rows at the given indices, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Stable sort on one column; missing values sort first.
    pub fn sort_by_column(mut self, name: &str) -> Table {
        if let Some(idx) = self.column_index(name) {
            self.rows.sort_by(|a, b| a[idx].cmp(&b[idx]));
        }
        self
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                vec![Value::Int(3), Value::Str("x".into())],
                vec![Value::Int(1), Value::Null],
                vec![Value::Float(2.5)],
            ],
        )
    }

    #[test]
    fn infers_cell_types() {
        assert_eq!(Value::infer(""), Value::Null);
        assert_eq!(Value::infer(" 42 "), Value::Int(42));
        assert_eq!(Value::infer("2.55"), Value::Float(2.55));
        assert_eq!(Value::infer("true"), Value::Bool(true));
        assert_eq!(Value::infer("2,55"), Value::Str("2,55".into()));
    }

    #[test]
    fn missing_markers_and_non_finite_numbers_are_null() {
        for cell in ["NaN", "nan", " N/A ", "NULL", "inf", "-infinity"] {
            assert_eq!(Value::infer(cell), Value::Null, "{cell}");
        }
        assert_eq!(Value::infer("Nancy"), Value::Str("Nancy".into()));
    }

    #[test]
    fn equality_agrees_with_ordering() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(nan.cmp(&nan.clone()), std::cmp::Ordering::Equal);
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Int(1).cmp(&Value::Float(1.0)), std::cmp::Ordering::Equal);

        let mut groups = std::collections::BTreeMap::new();
        *groups.entry(Value::Float(f64::NAN)).or_insert(0) += 1;
        *groups.entry(Value::Float(f64::NAN)).or_insert(0) += 1;
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn short_rows_are_padded() {
        let t = sample();
        assert_eq!(t.get(2, "b"), Some(&Value::Null));
        assert!(t.get(2, "b").unwrap().is_missing());
    }

    #[test]
    fn float_display_keeps_decimal_point() {
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Float(f64::NAN).to_string(), "");
    }

    #[test]
    fn ints_and_floats_sort_numerically() {
        let t = sample().sort_by_column("a");
        let a: Vec<f64> = t.numeric_column("a").unwrap();
        assert_eq!(a, vec![1.0, 2.5, 3.0]);
    }

    #[test]
    fn select_and_drop_preserve_order() {
        let t = sample().with_column("c", vec![Value::Int(0); 3]);
        assert_eq!(t.select(&["c", "a"]).columns(), ["c", "a"]);
        let dropped = t.drop_columns(&["b".to_string()]);
        assert_eq!(dropped.columns(), ["a", "c"]);
        assert_eq!(dropped.rows()[0].len(), 2);
    }
}
