use std::collections::BTreeSet;

use ndarray::Array2;

use crate::data::model::{Table, Value};

/// Whether a column holds categories rather than numbers: any present cell
/// that is not an int or float makes it categorical.
fn is_categorical(table: &Table, column: &str) -> bool {
    table
        .column(column)
        .map(|mut cells| cells.any(|v| !v.is_missing() && v.as_f64().is_none()))
        .unwrap_or(false)
}

/// Dummy-encode categorical columns.
///
/// Numeric columns keep their position; each categorical column is replaced
/// by `<column>_<category>` indicator columns (0/1) appended after them, one
/// per category in sorted order. With `drop_first` the first category of each
/// column is omitted. Missing cells get 0 in every indicator.
pub fn one_hot_encode(table: &Table, drop_first: bool) -> Table {
    let categorical: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| is_categorical(table, c))
        .cloned()
        .collect();

    let numeric: Vec<&str> = table
        .columns()
        .iter()
        .filter(|c| !categorical.contains(c))
        .map(|c| c.as_str())
        .collect();
    let mut out = table.select(&numeric);

    for column in &categorical {
        let categories: BTreeSet<String> = table
            .column(column)
            .into_iter()
            .flatten()
            .filter(|v| !v.is_missing())
            .map(|v| v.to_string())
            .collect();
        let skip = usize::from(drop_first);
        for category in categories.iter().skip(skip) {
            let values: Vec<Value> = table
                .column(column)
                .into_iter()
                .flatten()
                .map(|v| Value::Int(i64::from(!v.is_missing() && v.to_string() == *category)))
                .collect();
            out = out.with_column(&format!("{column}_{category}"), values);
        }
    }
    out
}

/// Numeric matrix of the given columns, row-major. Missing or non-numeric
/// cells become `NaN`.
pub fn to_matrix(table: &Table, columns: &[String]) -> Array2<f64> {
    let data: Vec<Vec<f64>> = columns
        .iter()
        .map(|c| table.numeric_column(c).unwrap_or_else(|| vec![f64::NAN; table.len()]))
        .collect();
    Array2::from_shape_fn((table.len(), columns.len()), |(r, c)| data[c][r])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::Str(v.into())
    }

    fn ads() -> Table {
        Table::from_rows(
            vec!["age".into(), "device".into(), "slot".into()],
            vec![
                vec![Value::Int(22), s("Mobile"), s("Night")],
                vec![Value::Int(35), s("Desktop"), Value::Null],
                vec![Value::Int(41), s("Tablet"), s("Morning")],
            ],
        )
    }

    #[test]
    fn drop_first_omits_the_first_sorted_category() {
        let enc = one_hot_encode(&ads(), true);
        assert_eq!(
            enc.columns(),
            ["age", "device_Mobile", "device_Tablet", "slot_Night"]
        );
        assert_eq!(enc.get(0, "device_Mobile"), Some(&Value::Int(1)));
        assert_eq!(enc.get(1, "device_Mobile"), Some(&Value::Int(0)));
        assert_eq!(enc.get(1, "slot_Night"), Some(&Value::Int(0)));
    }

    #[test]
    fn full_encoding_has_one_indicator_per_row_and_column() {
        let enc = one_hot_encode(&ads(), false);
        let devices = ["device_Desktop", "device_Mobile", "device_Tablet"];
        for row in 0..enc.len() {
            let hot: f64 = devices
                .iter()
                .map(|c| enc.get(row, c).and_then(Value::as_f64).unwrap())
                .sum();
            assert_eq!(hot, 1.0);
        }
    }

    #[test]
    fn matrix_follows_column_order() {
        let enc = one_hot_encode(&ads(), true);
        let cols: Vec<String> = enc.columns().to_vec();
        let m = to_matrix(&enc, &cols);
        assert_eq!(m.shape(), &[3, 4]);
        assert_eq!(m[[2, 0]], 41.0);
        assert_eq!(m[[2, 2]], 1.0);
    }
}
