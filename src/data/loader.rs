use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Date32Type, Float32Type, Float64Type, Int32Type, Int64Type};
use chrono::NaiveTime;
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Table, Value};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Dataset descriptor
// ---------------------------------------------------------------------------

/// Text encoding of a raw delimited file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte is one code point.
    Latin1,
}

/// Where a dataset lives and how to read it.
#[derive(Debug, Clone)]
pub struct DatasetSource {
    pub name: String,
    pub path: PathBuf,
    pub delimiter: u8,
    pub encoding: Encoding,
    /// Skip malformed rows instead of failing the whole read.
    pub lenient: bool,
    /// Columns the dataset is expected to carry (checked, warned on).
    pub expected_columns: Vec<String>,
}

impl DatasetSource {
    /// Comma-delimited UTF-8 source, strict.
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        DatasetSource {
            name: name.to_string(),
            path: path.into(),
            delimiter: b',',
            encoding: Encoding::Utf8,
            lenient: false,
            expected_columns: Vec::new(),
        }
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    pub fn expect_columns(mut self, columns: &[&str]) -> Self {
        self.expected_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset into a [`Table`].  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – scalar columns read through Arrow record batches
/// * `.json`    – `[{ "col": value, ... }, ...]`
/// * anything else – delimited text with a header row
///
/// Fails when the file is absent or unreadable, or when no row survives.
pub fn load_table(source: &DatasetSource) -> Result<Table> {
    let path = source.path.as_path();
    if !path.is_file() {
        return Err(PipelineError::ingestion(path, "file not found"));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        _ => load_delimited(source)?,
    };

    if table.is_empty() {
        return Err(PipelineError::ingestion(path, "no parseable rows"));
    }

    let missing: Vec<&str> = source
        .expected_columns
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.as_str())
        .collect();
    if !missing.is_empty() {
        warn!("{}: expected columns not found: {}", source.name, missing.join(", "));
    }

    info!(
        "{}: loaded {} rows x {} columns from {}",
        source.name,
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

fn decode(path: &Path, bytes: Vec<u8>, encoding: Encoding) -> Result<String> {
    match encoding {
        Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        Encoding::Utf8 => {
            let text = String::from_utf8(bytes)
                .map_err(|e| PipelineError::ingestion(path, format!("invalid UTF-8: {e}")))?;
            Ok(match text.strip_prefix('\u{feff}') {
                Some(rest) => rest.to_string(),
                None => text,
            })
        }
    }
}

/// Header row plus one row per record. Cells are type-inferred with
/// [`Value::infer`].
fn load_delimited(source: &DatasetSource) -> Result<Table> {
    let path = source.path.as_path();
    let bytes = std::fs::read(path).map_err(|e| PipelineError::ingestion(path, e.to_string()))?;
    let text = decode(path, bytes, source.encoding)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(source.delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::ingestion(path, format!("reading header: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = Table::new(headers);
    let width = table.columns().len();
    let mut skipped = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let malformed = match result {
            Ok(record) if record.len() == width => {
                table.push_row(record.iter().map(Value::infer).collect());
                continue;
            }
            Ok(record) => format!("row {row_no}: expected {width} fields, found {}", record.len()),
            Err(e) => format!("row {row_no}: {e}"),
        };
        if !source.lenient {
            return Err(PipelineError::ingestion(path, malformed));
        }
        debug!("{}: skipping {malformed}", source.name);
        skipped += 1;
    }

    if skipped > 0 {
        warn!("{}: skipped {skipped} malformed rows", source.name);
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON: an array of flat objects. Column order is the order
/// in which keys are first seen.
fn load_json(path: &Path) -> Result<Table> {
    let text =
        std::fs::read_to_string(path).map_err(|e| PipelineError::ingestion(path, e.to_string()))?;
    let root: JsonValue = serde_json::from_str(&text)
        .map_err(|e| PipelineError::ingestion(path, format!("parsing JSON: {e}")))?;

    let records = root
        .as_array()
        .ok_or_else(|| PipelineError::ingestion(path, "expected top-level JSON array"))?;

    let mut columns: Vec<String> = Vec::new();
    for rec in records {
        if let Some(obj) = rec.as_object() {
            for key in obj.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let mut table = Table::new(columns.clone());
    for rec in records {
        // Non-object entries carry no cells; skip them like malformed CSV rows.
        let Some(obj) = rec.as_object() else {
            continue;
        };
        let row = columns
            .iter()
            .map(|c| obj.get(c).map(json_to_value).unwrap_or(Value::Null))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::Str(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Str(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::Str(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas or Polars. Scalar columns only;
/// nested types are rendered as their type name.
fn load_parquet(path: &Path) -> Result<Table> {
    let file =
        std::fs::File::open(path).map_err(|e| PipelineError::ingestion(path, e.to_string()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|b| b.build())
        .map_err(|e| PipelineError::ingestion(path, format!("reading parquet metadata: {e}")))?;

    let mut table: Option<Table> = None;

    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| PipelineError::ingestion(path, format!("reading record batch: {e}")))?;
        let schema = batch.schema();
        let table = table.get_or_insert_with(|| {
            Table::new(schema.fields().iter().map(|f| f.name().clone()).collect())
        });

        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| arrow_cell(col, row))
                .collect();
            table.push_row(cells);
        }
    }

    Ok(table.unwrap_or_default())
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    let cell = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|s| Value::Str(s.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|s| Value::Str(s.value(row).to_string())),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| Value::Int(a.value(row) as i64)),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| Value::Int(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| Value::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| Value::Float(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map(|a| Value::Bool(a.value(row))),
        DataType::Date32 => col
            .as_primitive_opt::<Date32Type>()
            .and_then(|a| a.value_as_date(row))
            .map(|d| Value::Date(d.and_time(NaiveTime::MIN))),
        other => Some(Value::Str(format!("{other:?}"))),
    };
    cell.unwrap_or(Value::Null)
}
