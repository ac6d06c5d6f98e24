//! CSV ingestion: turns a raw byte stream into validated equipment
//! records.
//!
//! The reader is forced to treat every column as text
//! (`infer_schema_length == 0`), then each required column is resolved to
//! a handle exactly once after header validation and numeric fields are
//! parsed explicitly per row. Invalid values are never coerced to zero or
//! NaN — they fail the whole ingestion. Columns beyond the required five
//! are ignored. Output order is input order; it decides which records the
//! report listing truncates and the index axis of the trend chart.

use crate::error::{EquipError, Result};
use crate::model::EquipmentRecord;
use polars::prelude::*;
use std::io::Cursor;

/// Columns every upload must carry, by exact header name.
pub const REQUIRED_COLUMNS: [&str; 5] =
    ["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"];

const COL_NAME: &str = "Equipment Name";
const COL_TYPE: &str = "Type";
const COL_FLOWRATE: &str = "Flowrate";
const COL_PRESSURE: &str = "Pressure";
const COL_TEMPERATURE: &str = "Temperature";

/// Parse a raw CSV byte stream into ordered equipment records.
///
/// # Errors
///
/// `Schema` if any required column is absent (the message lists the full
/// required set), `Parse` if the stream is not readable as delimited
/// tabular data or a numeric field fails to parse.
pub fn parse_records(data: &[u8]) -> Result<Vec<EquipmentRecord>> {
    let df = read_table(data)?;
    validate_schema(&df)?;

    let names = utf8_column(&df, COL_NAME)?;
    let types = utf8_column(&df, COL_TYPE)?;
    let flowrates = utf8_column(&df, COL_FLOWRATE)?;
    let pressures = utf8_column(&df, COL_PRESSURE)?;
    let temperatures = utf8_column(&df, COL_TEMPERATURE)?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let row = i + 1;
        records.push(EquipmentRecord {
            name: names.get(i).unwrap_or("").to_owned(),
            equipment_type: types.get(i).unwrap_or("").to_owned(),
            flowrate: parse_measurement(flowrates.get(i), COL_FLOWRATE, row)?,
            pressure: parse_measurement(pressures.get(i), COL_PRESSURE, row)?,
            temperature: parse_measurement(temperatures.get(i), COL_TEMPERATURE, row)?,
        });
    }

    Ok(records)
}

fn read_table(data: &[u8]) -> Result<DataFrame> {
    // Schema length 0 keeps every column as a string; numeric parsing is
    // done explicitly below so bad values surface with row context
    // instead of becoming nulls.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(data))
        .finish()?;
    Ok(df)
}

fn validate_schema(df: &DataFrame) -> Result<()> {
    let present: Vec<&str> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str())
        .collect();

    if REQUIRED_COLUMNS.iter().any(|col| !present.contains(col)) {
        return Err(EquipError::Schema(format!(
            "CSV must contain columns: {}",
            REQUIRED_COLUMNS.join(", ")
        )));
    }
    Ok(())
}

fn utf8_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    let series = df.column(name)?.as_materialized_series();
    Ok(series.str()?)
}

fn parse_measurement(raw: Option<&str>, column: &str, row: usize) -> Result<f64> {
    let text = raw
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            EquipError::Parse(format!(
                "row {row}: missing value in numeric column '{column}'"
            ))
        })?;

    let value: f64 = text.parse().map_err(|_| {
        EquipError::Parse(format!(
            "row {row}: invalid numeric value '{text}' in column '{column}'"
        ))
    })?;

    if !value.is_finite() {
        return Err(EquipError::Parse(format!(
            "row {row}: non-finite value '{text}' in column '{column}'"
        )));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
    use super::*;

    const VALID_CSV: &str = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
Pump-1,Pump,10.0,2.0,25.0
Valve-1,Valve,5.0,1.0,20.0
";

    #[test]
    fn test_parse_valid_csv_preserves_order() -> Result<()> {
        let records = parse_records(VALID_CSV.as_bytes())?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Pump-1");
        assert_eq!(records[0].equipment_type, "Pump");
        assert_eq!(records[0].flowrate, 10.0);
        assert_eq!(records[1].name, "Valve-1");
        assert_eq!(records[1].pressure, 1.0);
        Ok(())
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let csv = "Equipment Name,Type,Flowrate,Temperature\nPump-1,Pump,10.0,25.0\n";
        let err = parse_records(csv.as_bytes()).unwrap_err();
        match err {
            EquipError::Schema(msg) => {
                // The message enumerates the full required set, not just
                // the missing column.
                for col in REQUIRED_COLUMNS {
                    assert!(msg.contains(col), "message should list '{col}': {msg}");
                }
            }
            other => panic!("expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_value_is_parse_error() {
        let csv = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
Pump-1,Pump,fast,2.0,25.0
";
        let err = parse_records(csv.as_bytes()).unwrap_err();
        match err {
            EquipError::Parse(msg) => {
                assert!(msg.contains("row 1"), "should name the row: {msg}");
                assert!(msg.contains("Flowrate"), "should name the column: {msg}");
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_numeric_field_is_parse_error() {
        let csv = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
Pump-1,Pump,10.0,,25.0
";
        let err = parse_records(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, EquipError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_nan_token_rejected() {
        let csv = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
Pump-1,Pump,NaN,2.0,25.0
";
        let err = parse_records(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, EquipError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_extension_columns_ignored() -> Result<()> {
        let csv = "\
Equipment Name,Type,Flowrate,Pressure,Temperature,Vendor
Pump-1,Pump,10.0,2.0,25.0,Acme
";
        let records = parse_records(csv.as_bytes())?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Pump-1");
        Ok(())
    }

    #[test]
    fn test_header_only_yields_no_records() -> Result<()> {
        let csv = "Equipment Name,Type,Flowrate,Pressure,Temperature\n";
        let records = parse_records(csv.as_bytes())?;
        assert!(records.is_empty());
        Ok(())
    }

    #[test]
    fn test_unparseable_stream_rejected() {
        let garbage: &[u8] = &[0xff, 0xfe, 0x00, 0x01, 0x02];
        let err = parse_records(garbage).unwrap_err();
        assert!(
            matches!(err, EquipError::Parse(_) | EquipError::Schema(_)),
            "got {err:?}"
        );
    }
}
