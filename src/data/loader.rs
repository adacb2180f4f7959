use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset, Record};
use crate::config::DatasetSchema;

/// One parsed row: column name → raw cell.
type Row = BTreeMap<String, CellValue>;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a record table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one scalar column per attribute (recommended)
/// * `.json`    – `[{ "name": "...", "type1": "...", "hp": 45, ... }, ...]`
/// * `.csv`     – header row, one column per attribute
pub fn load_file(path: &Path, schema: &DatasetSchema) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (headers, rows) = match ext.as_str() {
        "parquet" | "pq" => read_parquet(path)?,
        "json" => read_json(path)?,
        "csv" => read_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let dataset = build_dataset(&headers, rows, schema)?;
    log::info!(
        "Loaded {} records from {} with dimensions {:?}",
        dataset.len(),
        path.display(),
        dataset.dimensions
    );
    Ok(dataset)
}

/// Turn raw rows into a [`Dataset`] according to `schema`.
///
/// Rows without an identity are a hard error; rows without a primary
/// category are skipped. Numeric and ordinal gaps stay on the record as
/// missing values and are excluded later, per analysis.
pub fn build_dataset(headers: &[String], rows: Vec<Row>, schema: &DatasetSchema) -> Result<Dataset> {
    let dimensions = if schema.dimensions.is_empty() {
        infer_dimensions(headers, &rows, schema)
    } else {
        schema.dimensions.clone()
    };

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for (i, row) in rows.iter().enumerate() {
        let name = row
            .get(&schema.identity_column)
            .and_then(CellValue::as_text)
            .with_context(|| format!("Row {i}: missing identity '{}'", schema.identity_column))?;

        let Some(primary) = row.get(&schema.primary_column).and_then(CellValue::as_text) else {
            log::warn!("Row {i} ('{name}'): no '{}' value, skipped", schema.primary_column);
            skipped += 1;
            continue;
        };

        let secondary = row
            .get(&schema.secondary_column)
            .and_then(CellValue::as_text)
            .unwrap_or_else(|| schema.none_sentinel.clone());

        let ordinal = row.get(&schema.ordinal_column).and_then(CellValue::as_ordinal);

        let values = dimensions
            .iter()
            .filter_map(|dim| Some((dim.clone(), row.get(dim)?.as_f64()?)))
            .collect();

        records.push(Record {
            name,
            primary,
            secondary,
            ordinal,
            values,
        });
    }

    if skipped > 0 {
        log::warn!("{skipped} rows skipped for lack of a primary category");
    }

    Dataset::from_records(records, dimensions, &schema.none_sentinel).context("building dataset")
}

/// Numeric columns, in header order, that are not one of the schema's named columns.
fn infer_dimensions(headers: &[String], rows: &[Row], schema: &DatasetSchema) -> Vec<String> {
    let reserved = [
        &schema.identity_column,
        &schema.primary_column,
        &schema.secondary_column,
        &schema.ordinal_column,
    ];
    headers
        .iter()
        .filter(|h| !reserved.contains(h))
        .filter(|h| {
            rows.iter().any(|row| {
                matches!(row.get(*h), Some(CellValue::Integer(_) | CellValue::Float(_)))
            })
        })
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "name": "Bulbasaur", "type1": "Grass", "type2": "Poison", "generation": 1, "hp": 45 },
///   ...
/// ]
/// ```
fn read_json(path: &Path) -> Result<(Vec<String>, Vec<Row>)> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub(crate) fn parse_json(text: &str) -> Result<(Vec<String>, Vec<Row>)> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = Row::new();
        for (key, val) in obj {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
            row.insert(key.clone(), json_to_cell(val));
        }
        rows.push(row);
    }

    Ok((headers, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Cell types are guessed per cell; empty cells are null.
fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Row>)> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    parse_csv(reader)
}

pub(crate) fn parse_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<(Vec<String>, Vec<Row>)> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), guess_cell_type(value)))
            .collect();
        rows.push(row);
    }

    Ok((headers, rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per attribute.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<(Vec<String>, Vec<Row>)> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let cells: Row = schema
                .fields()
                .iter()
                .enumerate()
                .map(|(col_idx, field)| {
                    (field.name().clone(), extract_cell(batch.column(col_idx), row))
                })
                .collect();
            rows.push(cells);
        }
    }

    Ok((headers, rows))
}

/// Extract a single scalar cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => match any.downcast_ref::<StringArray>() {
            Some(s) => CellValue::String(s.value(row).to_string()),
            None => CellValue::Null,
        },
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Null, |a| CellValue::Bool(a.value(row))),
        other => CellValue::String(format!("{other:?}")),
    }
}
