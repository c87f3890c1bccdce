use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Component, ComponentKind, ComponentTable, Point3};

/// Coordinate columns in `[start xyz, end xyz]` order.
const COORD_COLUMNS: [&str; 6] = ["Start_X", "Start_Y", "Start_Z", "End_X", "End_Y", "End_Z"];
const VALUE_COLUMN: &str = "Value";
const UNIT_COLUMN: &str = "Unit";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a component table could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
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

    #[error("missing required columns in the {kind} table: {}", .missing.join(", "))]
    MissingColumns {
        kind: ComponentKind,
        missing: Vec<String>,
    },

    #[error("row {row}, column {column}: '{text}' is not a number")]
    InvalidNumber {
        row: usize,
        column: String,
        text: String,
    },

    #[error("row {row}: value {value} must be finite and non-negative")]
    InvalidValue { row: usize, value: f64 },

    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    #[error("table contains no components")]
    Empty,

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
}

pub type Result<T> = std::result::Result<T, LoadError>;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a component table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the columns of [`ComponentKind::required_columns`]
/// * `.json`    – `[{ "Capacitor_Name": "C1", "Start_X": 0.0, ... }, ...]`
/// * `.parquet` – flat columns with the same names
///
/// The table kind is detected from its name column.
pub fn load_file(path: &Path) -> Result<ComponentTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }?;

    log::info!(
        "Loaded {} {} from {} (unit: {})",
        table.len(),
        table.kind.plural(),
        path.display(),
        table.unit
    );
    Ok(table.with_source(path))
}

/// Where the matching table of the other kind would live: `capacitor` and
/// `resistor` swapped in the file name, so `sample_capacitor_data.csv`
/// pairs with `sample_resistor_data.csv`. `None` when the name mentions
/// neither. The file is not checked for existence.
pub fn partner_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let swapped = if name.contains("capacitor") {
        name.replace("capacitor", "resistor")
    } else if name.contains("resistor") {
        name.replace("resistor", "capacitor")
    } else {
        return None;
    };
    Some(path.with_file_name(swapped))
}

/// Parse CSV text directly, e.g. the built-in example table.
pub fn parse_csv_str(text: &str) -> Result<ComponentTable> {
    read_csv(csv_builder().from_reader(text.as_bytes()))
}

// ---------------------------------------------------------------------------
// Column layout shared by all formats
// ---------------------------------------------------------------------------

/// Positions of the required columns inside a header row.
#[derive(Debug, Clone, PartialEq)]
struct ColumnLayout {
    kind: ComponentKind,
    name: usize,
    coords: [usize; 6],
    value: usize,
    unit: Option<usize>,
}

impl ColumnLayout {
    /// Detect the table kind and locate every required column.
    ///
    /// A header without any name column is reported against the capacitor
    /// layout so the error lists what a capacitor table would need.
    fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.as_ref().trim() == name);

        let kind = ComponentKind::ALL
            .into_iter()
            .find(|k| position(k.name_column()).is_some())
            .unwrap_or(ComponentKind::Capacitor);

        let missing: Vec<String> = kind
            .required_columns()
            .into_iter()
            .filter(|&col| position(col).is_none())
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns { kind, missing });
        }

        // Every lookup below succeeded in the `missing` check above.
        let locate = |name: &str| position(name).unwrap_or_default();
        let mut coords = [0usize; 6];
        for (slot, col) in coords.iter_mut().zip(COORD_COLUMNS) {
            *slot = locate(col);
        }

        Ok(ColumnLayout {
            kind,
            name: locate(kind.name_column()),
            coords,
            value: locate(VALUE_COLUMN),
            unit: position(UNIT_COLUMN),
        })
    }
}

/// One row after format-specific decoding, before validation.
struct RawRow {
    name: String,
    coords: [f64; 6],
    value: f64,
    unit: Option<String>,
}

impl RawRow {
    fn into_component(self, row: usize) -> Result<Component> {
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(LoadError::InvalidValue {
                row,
                value: self.value,
            });
        }
        if let Some((column, v)) = COORD_COLUMNS
            .into_iter()
            .zip(self.coords)
            .find(|(_, v)| !v.is_finite())
        {
            return Err(LoadError::InvalidNumber {
                row,
                column: column.to_string(),
                text: v.to_string(),
            });
        }
        let [sx, sy, sz, ex, ey, ez] = self.coords;
        Ok(Component {
            name: self.name,
            start: Point3::new(sx, sy, sz),
            end: Point3::new(ex, ey, ez),
            value: self.value,
            unit: self.unit.unwrap_or_default(),
        })
    }
}

fn finish(kind: ComponentKind, rows: Vec<RawRow>) -> Result<ComponentTable> {
    if rows.is_empty() {
        return Err(LoadError::Empty);
    }
    let components = rows
        .into_iter()
        .enumerate()
        .map(|(row, raw)| raw.into_component(row))
        .collect::<Result<Vec<_>>>()?;
    Ok(ComponentTable::new(kind, components))
}

fn parse_number(text: &str, row: usize, column: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| LoadError::InvalidNumber {
            row,
            column: column.to_string(),
            text: text.to_string(),
        })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn csv_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All);
    builder
}

fn load_csv(path: &Path) -> Result<ComponentTable> {
    read_csv(csv_builder().from_path(path)?)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<ComponentTable> {
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let layout = ColumnLayout::resolve(&headers)?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let mut coords = [0.0; 6];
        for (slot, (&idx, col)) in coords.iter_mut().zip(layout.coords.iter().zip(COORD_COLUMNS)) {
            *slot = parse_number(cell(idx), row_no, col)?;
        }

        rows.push(RawRow {
            name: cell(layout.name).to_string(),
            coords,
            value: parse_number(cell(layout.value), row_no, VALUE_COLUMN)?,
            unit: layout.unit.map(|idx| cell(idx).to_string()),
        });
    }

    finish(layout.kind, rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, as written by `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Capacitor_Name": "C1", "Start_X": 0.0, "Start_Y": 0.0, "Start_Z": 0.0,
///     "End_X": 0.1, "End_Y": 0.1, "End_Z": 0.01, "Value": 0.005, "Unit": "fF" }
/// ]
/// ```
fn load_json(path: &Path) -> Result<ComponentTable> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json_str(&text)
}

fn parse_json_str(text: &str) -> Result<ComponentTable> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root.as_array().ok_or_else(|| LoadError::InvalidRow {
        row: 0,
        message: "expected a top-level JSON array".to_string(),
    })?;

    // Column names are taken from the first record.
    let headers: Vec<String> = records
        .first()
        .and_then(|r| r.as_object())
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default();
    if headers.is_empty() {
        return Err(LoadError::Empty);
    }
    let layout = ColumnLayout::resolve(&headers)?;
    let name_col = layout.kind.name_column();

    let mut rows = Vec::with_capacity(records.len());
    for (row_no, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| LoadError::InvalidRow {
            row: row_no,
            message: "not a JSON object".to_string(),
        })?;

        let mut coords = [0.0; 6];
        for (slot, col) in coords.iter_mut().zip(COORD_COLUMNS) {
            *slot = json_number(obj.get(col), row_no, col)?;
        }

        rows.push(RawRow {
            name: obj.get(name_col).map(json_text).unwrap_or_default(),
            coords,
            value: json_number(obj.get(VALUE_COLUMN), row_no, VALUE_COLUMN)?,
            unit: obj.get(UNIT_COLUMN).map(json_text),
        });
    }

    finish(layout.kind, rows)
}

fn json_number(val: Option<&JsonValue>, row: usize, column: &str) -> Result<f64> {
    match val {
        Some(JsonValue::Number(n)) => n.as_f64().ok_or_else(|| LoadError::InvalidNumber {
            row,
            column: column.to_string(),
            text: n.to_string(),
        }),
        Some(JsonValue::String(s)) => parse_number(s, row, column),
        other => Err(LoadError::InvalidNumber {
            row,
            column: column.to_string(),
            text: other.map(|v| v.to_string()).unwrap_or_else(|| "<missing>".to_string()),
        }),
    }
}

fn json_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per required field.
///
/// Coordinates and values may be Float64, Float32, Int64 or Int32; name and
/// unit columns are rendered as text whatever their type. Works with files
/// written by both **Pandas** (`df.to_parquet()`) and **Polars**.
fn load_parquet(path: &Path) -> Result<ComponentTable> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let layout = ColumnLayout::resolve(&headers)?;
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let offset = rows.len();

        for row in 0..batch.num_rows() {
            let row_no = offset + row;

            let mut coords = [0.0; 6];
            for (slot, (&idx, col)) in coords.iter_mut().zip(layout.coords.iter().zip(COORD_COLUMNS)) {
                *slot = arrow_number(batch.column(idx), row, row_no, col)?;
            }

            let unit = match layout.unit {
                Some(idx) => Some(arrow_text(batch.column(idx), row)?),
                None => None,
            };

            rows.push(RawRow {
                name: arrow_text(batch.column(layout.name), row)?,
                coords,
                value: arrow_number(batch.column(layout.value), row, row_no, VALUE_COLUMN)?,
                unit,
            });
        }
    }

    finish(layout.kind, rows)
}

// -- Arrow helpers --

/// Read a numeric cell as `f64`.
fn arrow_number(col: &ArrayRef, row: usize, row_no: usize, column: &str) -> Result<f64> {
    let invalid = |text: String| LoadError::InvalidNumber {
        row: row_no,
        column: column.to_string(),
        text,
    };

    if col.is_null(row) {
        return Err(invalid("null".to_string()));
    }

    if let Some(arr) = col.as_primitive_opt::<Float64Type>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_primitive_opt::<Float32Type>() {
        Ok(arr.value(row) as f64)
    } else if let Some(arr) = col.as_primitive_opt::<Int64Type>() {
        Ok(arr.value(row) as f64)
    } else if let Some(arr) = col.as_primitive_opt::<Int32Type>() {
        Ok(arr.value(row) as f64)
    } else {
        // Strings holding numbers are still accepted.
        let text = array_value_to_string(col, row)?;
        parse_number(&text, row_no, column).map_err(|_| invalid(text))
    }
}

fn arrow_text(col: &ArrayRef, row: usize) -> Result<String> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    Ok(array_value_to_string(col, row)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::SAMPLE_CAPACITOR_CSV;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn parses_sample_capacitor_table() {
        let table = parse_csv_str(SAMPLE_CAPACITOR_CSV).unwrap();
        assert_eq!(table.kind, ComponentKind::Capacitor);
        assert_eq!(table.len(), 10);
        assert_eq!(table.unit, "fF");
        assert_eq!(table.components[0].name, "Cap1");
        assert_eq!(table.components[0].end, Point3::new(0.1, 0.1, 0.01));
        assert_eq!(table.value_range(), Some((0.003, 0.025)));
    }

    #[test]
    fn detects_resistor_table_without_unit() {
        let csv = "Resistor_Name,Start_X,Start_Y,Start_Z,End_X,End_Y,End_Z,Value\n\
                   R1,0,0,0,1,0,0,100\n\
                   R2,1,0,0,1,1,0,250\n";
        let table = parse_csv_str(csv).unwrap();
        assert_eq!(table.kind, ComponentKind::Resistor);
        assert_eq!(table.unit, crate::data::model::UNKNOWN_UNIT);
        assert_eq!(table.values(), vec![100.0, 250.0]);
    }

    #[test]
    fn reports_every_missing_column() {
        let csv = "Capacitor_Name,Start_X,Start_Y,End_X,End_Y,End_Z\nC1,0,0,1,1,1\n";
        match parse_csv_str(csv) {
            Err(LoadError::MissingColumns { kind, missing }) => {
                assert_eq!(kind, ComponentKind::Capacitor);
                assert_eq!(missing, vec!["Start_Z".to_string(), "Value".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn header_without_name_column_lists_capacitor_name() {
        let csv = "Start_X,Start_Y,Start_Z,End_X,End_Y,End_Z,Value\n0,0,0,1,1,1,1\n";
        let err = parse_csv_str(csv).unwrap_err();
        assert!(err.to_string().contains("Capacitor_Name"), "{err}");
    }

    #[test]
    fn rejects_non_numeric_cells() {
        let csv = "Capacitor_Name,Start_X,Start_Y,Start_Z,End_X,End_Y,End_Z,Value\n\
                   C1,0,0,0,1,abc,0,1.0\n";
        match parse_csv_str(csv) {
            Err(LoadError::InvalidNumber { row, column, text }) => {
                assert_eq!(row, 0);
                assert_eq!(column, "End_Y");
                assert_eq!(text, "abc");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_values() {
        let csv = "Capacitor_Name,Start_X,Start_Y,Start_Z,End_X,End_Y,End_Z,Value\n\
                   C1,0,0,0,1,1,0,1.0\n\
                   C2,0,0,0,1,1,0,-2.0\n";
        assert!(matches!(
            parse_csv_str(csv),
            Err(LoadError::InvalidValue { row: 1, .. })
        ));
    }

    #[rstest]
    #[case("inf")]
    #[case("NaN")]
    #[case("-inf")]
    fn rejects_non_finite_coordinates(#[case] cell: &str) {
        let csv = format!(
            "Capacitor_Name,Start_X,Start_Y,Start_Z,End_X,End_Y,End_Z,Value\n\
             C1,0,0,0,1,1,0,1.0\n\
             C2,{cell},0,0,1,1,0,2.0\n"
        );
        match parse_csv_str(&csv) {
            Err(LoadError::InvalidNumber { row, column, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "Start_X");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_finite_json_coordinates() {
        let json = r#"[{"Capacitor_Name": "C1", "Start_X": 0, "Start_Y": 0, "Start_Z": 0,
                        "End_X": 1, "End_Y": 0, "End_Z": "NaN", "Value": 1.0}]"#;
        assert!(matches!(
            parse_json_str(json),
            Err(LoadError::InvalidNumber { row: 0, column, .. }) if column == "End_Z"
        ));
    }

    #[test]
    fn rejects_header_only_table() {
        let csv = "Capacitor_Name,Start_X,Start_Y,Start_Z,End_X,End_Y,End_Z,Value\n";
        assert!(matches!(parse_csv_str(csv), Err(LoadError::Empty)));
    }

    #[test]
    fn parses_json_records() {
        let json = r#"[
            {"Resistor_Name": "R1", "Start_X": 0, "Start_Y": 0, "Start_Z": 0,
             "End_X": 1, "End_Y": 0, "End_Z": 0, "Value": 10.5, "Unit": "Ohm"},
            {"Resistor_Name": "R2", "Start_X": "1", "Start_Y": 0, "Start_Z": 0,
             "End_X": 2, "End_Y": 0, "End_Z": 0, "Value": 20, "Unit": "Ohm"}
        ]"#;
        let table = parse_json_str(json).unwrap();
        assert_eq!(table.kind, ComponentKind::Resistor);
        assert_eq!(table.unit, "Ohm");
        assert_eq!(table.components[1].start.x, 1.0);
    }

    #[test]
    fn load_file_dispatches_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caps.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(SAMPLE_CAPACITOR_CSV.as_bytes()).unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.display_name(), "caps.csv");

        let bad = dir.path().join("caps.xlsx");
        assert!(matches!(
            load_file(&bad),
            Err(LoadError::UnsupportedExtension(ext)) if ext == "xlsx"
        ));
    }

    #[rstest]
    #[case("data/sample_capacitor_data.csv", Some("data/sample_resistor_data.csv"))]
    #[case("data/sample_resistor_data.parquet", Some("data/sample_capacitor_data.parquet"))]
    #[case("capacitor_runs/caps.csv", None)]
    #[case("layout.csv", None)]
    fn partner_swaps_kind_in_file_name(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(partner_path(Path::new(path)), expected.map(PathBuf::from));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file(&dir.path().join("absent.csv")).is_err());
        assert!(matches!(
            load_file(&dir.path().join("absent.json")),
            Err(LoadError::Io { .. })
        ));
    }
}
