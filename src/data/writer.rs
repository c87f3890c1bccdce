use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use super::model::{Component, ComponentTable};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
}

pub type Result<T> = std::result::Result<T, WriteError>;

/// Write `table` in the layout [`super::loader::load_file`] reads back.
/// Dispatch by extension, like the loader.
pub fn save_file(table: &ComponentTable, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let create = || {
        File::create(path).map_err(|source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        })
    };

    match ext.as_str() {
        "csv" => write_csv(table, create()?)?,
        "json" => serde_json::to_writer_pretty(create()?, &json_records(table))?,
        "parquet" | "pq" => write_parquet(table, create()?)?,
        other => return Err(WriteError::UnsupportedExtension(other.to_string())),
    }

    log::info!(
        "Wrote {} {} to {}",
        table.len(),
        table.kind.plural(),
        path.display()
    );
    Ok(())
}

/// Header row followed by the eight required columns and `Unit`.
fn headers(table: &ComponentTable) -> Vec<&'static str> {
    let mut headers = table.kind.required_columns().to_vec();
    headers.push("Unit");
    headers
}

fn numbers(c: &Component) -> [f64; 7] {
    [c.start.x, c.start.y, c.start.z, c.end.x, c.end.y, c.end.z, c.value]
}

fn write_csv<W: std::io::Write>(table: &ComponentTable, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(headers(table))?;
    for c in &table.components {
        let mut record = vec![c.name.clone()];
        record.extend(numbers(c).iter().map(|v| v.to_string()));
        record.push(c.unit.clone());
        writer.write_record(&record)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn json_records(table: &ComponentTable) -> JsonValue {
    let headers = headers(table);
    let rows = table
        .components
        .iter()
        .map(|c| {
            let mut record = Map::new();
            record.insert(headers[0].to_string(), JsonValue::from(c.name.clone()));
            for (column, value) in headers[1..8].iter().zip(numbers(c)) {
                record.insert(column.to_string(), JsonValue::from(value));
            }
            record.insert(headers[8].to_string(), JsonValue::from(c.unit.clone()));
            JsonValue::Object(record)
        })
        .collect();
    JsonValue::Array(rows)
}

fn write_parquet(table: &ComponentTable, file: File) -> Result<()> {
    let headers = headers(table);

    let mut fields = vec![Field::new(headers[0], DataType::Utf8, false)];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from_iter_values(
        table.components.iter().map(|c| c.name.as_str()),
    ))];
    for (i, column) in headers[1..8].iter().enumerate() {
        fields.push(Field::new(*column, DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from_iter_values(
            table.components.iter().map(|c| numbers(c)[i]),
        )));
    }
    fields.push(Field::new(headers[8], DataType::Utf8, false));
    columns.push(Arc::new(StringArray::from_iter_values(
        table.components.iter().map(|c| c.unit.as_str()),
    )));

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_file, parse_csv_str};
    use crate::data::sample::SAMPLE_CAPACITOR_CSV;
    use rstest::rstest;

    #[rstest]
    #[case("out.csv")]
    #[case("out.json")]
    #[case("out.parquet")]
    fn written_tables_load_back(#[case] name: &str) {
        let table = parse_csv_str(SAMPLE_CAPACITOR_CSV).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);

        save_file(&table, &path).unwrap();
        let loaded = load_file(&path).unwrap();

        assert_eq!(loaded.kind, table.kind);
        assert_eq!(loaded.unit, "fF");
        assert_eq!(loaded.len(), table.len());
        for (a, b) in loaded.components.iter().zip(&table.components) {
            assert_eq!(a.name, b.name);
            assert!((a.value - b.value).abs() <= 1e-12 * b.value.abs());
            assert!(a.end.distance(&b.end) < 1e-12);
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let table = parse_csv_str(SAMPLE_CAPACITOR_CSV).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = save_file(&table, &dir.path().join("out.xlsx")).unwrap_err();
        assert!(matches!(err, WriteError::UnsupportedExtension(ext) if ext == "xlsx"));
    }
}
