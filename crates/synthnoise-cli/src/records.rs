//! JSON Lines record files
//!
//! Each line holds one record as a flat JSON object. Strings are kept as
//! they are, numbers and booleans are stored in their JSON text form, and
//! `null` or an absent key is a missing cell.

use std::io::{BufRead, Write};

use serde_json::{Map, Value};
use synthnoise_core::{Column, DType, DatasetSchema, Table};
use tracing::debug;

use crate::error::{CliError, Result};

fn cell(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        Value::Number(n) => Some(Some(n.to_string())),
        Value::Bool(b) => Some(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Read one shard into a table typed by `dataset`
///
/// Schema columns come first in schema order; any other keys (such as
/// `copy_<column>` household member values) follow in first-seen order.
pub fn read_records<R: BufRead>(reader: R, source: &str, dataset: &DatasetSchema) -> Result<Table> {
    let mut names: Vec<String> = dataset.column_names().map(String::from).collect();
    let mut records: Vec<(usize, Map<String, Value>)> = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line)
            .map_err(|e| CliError::record(source, number + 1, e.to_string()))?;
        let Value::Object(record) = value else {
            return Err(CliError::record(source, number + 1, "expected a JSON object"));
        };
        for key in record.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
        records.push((number + 1, record));
    }

    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let mut values = Vec::with_capacity(records.len());
        for (line, record) in &records {
            let value = match record.get(&name) {
                Some(value) => cell(value).ok_or_else(|| {
                    CliError::record(
                        source,
                        *line,
                        format!("field '{}' must be a string, number, boolean or null", name),
                    )
                })?,
                None => None,
            };
            values.push(value);
        }
        let dtype = dataset.column(&name).map_or(DType::String, |c| c.dtype);
        columns.push(Column::new(name, dtype, values));
    }
    debug!(source, rows = records.len(), "Read shard");
    Ok(Table::new(columns)?)
}

/// Write a table as one JSON object per row
pub fn write_records<W: Write>(table: &Table, mut writer: W) -> Result<()> {
    for pos in 0..table.len() {
        let record: Map<String, Value> = table
            .columns()
            .iter()
            .map(|column| {
                let value = column
                    .values
                    .get(pos)
                    .and_then(|v| v.clone())
                    .map_or(Value::Null, Value::String);
                (column.name.clone(), value)
            })
            .collect();
        serde_json::to_writer(&mut writer, &Value::Object(record))?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
