use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use super::model::Table;

/// Convert a table to an all-text Arrow record batch. Missing cells become
/// Arrow nulls.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch, ArrowError> {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|c| Field::new(c, DataType::Utf8, true))
        .collect();

    let arrays: Vec<ArrayRef> = (0..table.columns().len())
        .map(|i| {
            let values: Vec<Option<String>> = table
                .rows()
                .iter()
                .map(|row| (!row[i].is_missing()).then(|| row[i].to_string()))
                .collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
}

/// Box-drawn rendering of the first `rows` rows.
pub fn pretty_head(table: &Table, rows: usize) -> Result<String, ArrowError> {
    let batch = to_record_batch(&table.head(rows))?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;
    use arrow::array::Array;

    #[test]
    fn renders_header_and_nulls() {
        let t = Table::from_rows(
            vec!["name".into(), "qty".into()],
            vec![
                vec![Value::Str("mug".into()), Value::Int(6)],
                vec![Value::Str("lamp".into()), Value::Null],
                vec![Value::Str("hidden".into()), Value::Int(1)],
            ],
        );
        let batch = to_record_batch(&t).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.column(1).null_count(), 1);

        let text = pretty_head(&t, 2).unwrap();
        assert!(text.contains("name"));
        assert!(text.contains("lamp"));
        assert!(!text.contains("hidden"));
    }
}
