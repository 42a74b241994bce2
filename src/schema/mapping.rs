//! Arrow ↔ engine type mapping and written-schema checks

use super::Relation;
use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Schema};

/// DuckDB type name for an Arrow data type
pub fn engine_type(column: &str, data_type: &DataType) -> Result<&'static str> {
    match data_type {
        DataType::Boolean => Ok("BOOLEAN"),
        DataType::Int32 => Ok("INTEGER"),
        DataType::Int64 => Ok("BIGINT"),
        DataType::Float64 => Ok("DOUBLE"),
        DataType::Utf8 | DataType::LargeUtf8 => Ok("VARCHAR"),
        DataType::Timestamp(_, None) => Ok("TIMESTAMP"),
        other => Err(Error::UnsupportedType {
            column: column.to_string(),
            data_type: other.to_string(),
        }),
    }
}

/// Render a schema as the `columns` struct literal accepted by `read_json`
///
/// `{'num_songs': 'INTEGER', 'artist_id': 'VARCHAR', ...}`
pub fn json_columns(schema: &Schema) -> Result<String> {
    let columns = schema
        .fields()
        .iter()
        .map(|f| {
            engine_type(f.name(), f.data_type())
                .map(|t| format!("'{}': '{t}'", f.name().replace('\'', "''")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("{{{}}}", columns.join(", ")))
}

/// Whether a type read back from a part file satisfies the declared type
///
/// Timestamps match on unit only; the time zone annotation depends on how the
/// writer flags `isAdjustedToUTC`.
pub fn is_compatible(declared: &DataType, written: &DataType) -> bool {
    match (declared, written) {
        (DataType::Timestamp(a, _), DataType::Timestamp(b, _)) => a == b,
        (DataType::Utf8, DataType::LargeUtf8 | DataType::Utf8View) => true,
        (a, b) => a == b,
    }
}

/// Check a part file schema against the relation's declared file schema
pub fn check_file_schema(relation: Relation, written: &Schema) -> Result<()> {
    let declared = relation.file_schema();

    if declared.fields().len() != written.fields().len() {
        return Err(Error::schema_mismatch(
            relation.name(),
            format!(
                "expected {} columns, found {}",
                declared.fields().len(),
                written.fields().len()
            ),
        ));
    }

    for (expected, actual) in declared.fields().iter().zip(written.fields().iter()) {
        if expected.name() != actual.name() {
            return Err(Error::schema_mismatch(
                relation.name(),
                format!(
                    "expected column '{}', found '{}'",
                    expected.name(),
                    actual.name()
                ),
            ));
        }
        if !is_compatible(expected.data_type(), actual.data_type()) {
            return Err(Error::schema_mismatch(
                relation.name(),
                format!(
                    "column '{}' expected {}, found {}",
                    expected.name(),
                    expected.data_type(),
                    actual.data_type()
                ),
            ));
        }
    }

    Ok(())
}
