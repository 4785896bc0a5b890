//! Mixed-type schemas and rows.
//!
//! [`mixed_schema`] and [`compatible_schema`] share column names and are
//! positionally type-compatible; [`upgraded_schema`] is their cover. The
//! rows returned by [`mixed_rows`] and [`compatible_rows`] carry exactly the
//! types of their schema.

use crate::row::Row;
use crate::schema::Schema;
use crate::types::ColumnType;
use crate::value::Value;

pub const MIXED_COLUMNS: [&str; 11] = [
    "int",
    "long",
    "float",
    "double",
    "string",
    "int_array",
    "long_array",
    "float_array",
    "double_array",
    "string_array",
    "bytes",
];

fn schema_of(types: [ColumnType; 11]) -> Schema {
    Schema::from_columns(MIXED_COLUMNS.into_iter().zip(types))
}

/// One column of each common scalar and array type.
#[must_use]
pub fn mixed_schema() -> Schema {
    use ColumnType::*;
    schema_of([
        Int,
        Long,
        Float,
        Double,
        String,
        IntArray,
        LongArray,
        FloatArray,
        DoubleArray,
        StringArray,
        Bytes,
    ])
}

/// Same names as [`mixed_schema`], numeric columns shuffled to other numeric
/// types.
#[must_use]
pub fn compatible_schema() -> Schema {
    use ColumnType::*;
    schema_of([
        Long,
        Float,
        Double,
        Int,
        String,
        LongArray,
        FloatArray,
        DoubleArray,
        IntArray,
        StringArray,
        Bytes,
    ])
}

/// `upgrade_to_cover(mixed_schema, compatible_schema)`.
#[must_use]
pub fn upgraded_schema() -> Schema {
    use ColumnType::*;
    schema_of([
        Long,
        Double,
        Double,
        Double,
        String,
        LongArray,
        DoubleArray,
        DoubleArray,
        DoubleArray,
        StringArray,
        Bytes,
    ])
}

/// Two rows under [`mixed_schema`]; the `int` column holds 0 and 10.
#[must_use]
pub fn mixed_rows() -> [Row; 2] {
    [
        Row::new(vec![
            Value::Int(0),
            Value::Long(1),
            Value::Float(2.0),
            Value::Double(3.0),
            Value::from("4"),
            Value::IntArray(vec![5]),
            Value::LongArray(vec![6]),
            Value::FloatArray(vec![7.0]),
            Value::DoubleArray(vec![8.0]),
            Value::from(vec!["9"]),
            Value::Bytes(vec![0x10, 0x20]),
        ]),
        Row::new(vec![
            Value::Int(10),
            Value::Long(11),
            Value::Float(12.0),
            Value::Double(13.0),
            Value::from("14"),
            Value::IntArray(vec![15]),
            Value::LongArray(vec![16]),
            Value::FloatArray(vec![17.0]),
            Value::DoubleArray(vec![18.0]),
            Value::from(vec!["19"]),
            Value::Bytes(vec![0x30, 0x40]),
        ]),
    ]
}

/// Two rows under [`compatible_schema`]; the `int` column holds 1 and 11.
#[must_use]
pub fn compatible_rows() -> [Row; 2] {
    [
        Row::new(vec![
            Value::Long(1),
            Value::Float(2.0),
            Value::Double(3.0),
            Value::Int(4),
            Value::from("5"),
            Value::LongArray(vec![6]),
            Value::FloatArray(vec![7.0]),
            Value::DoubleArray(vec![8.0]),
            Value::IntArray(vec![9]),
            Value::from(vec!["10"]),
            Value::Bytes(vec![0x50, 0x60]),
        ]),
        Row::new(vec![
            Value::Long(11),
            Value::Float(12.0),
            Value::Double(13.0),
            Value::Int(14),
            Value::from("15"),
            Value::LongArray(vec![16]),
            Value::FloatArray(vec![17.0]),
            Value::DoubleArray(vec![18.0]),
            Value::IntArray(vec![19]),
            Value::from(vec!["20"]),
            Value::Bytes(vec![0x70, 0x00]),
        ]),
    ]
}

/// A two-column `(score LONG, name STRING)` schema.
#[must_use]
pub fn scored_schema() -> Schema {
    Schema::from_columns([("score", ColumnType::Long), ("name", ColumnType::String)])
}

/// Rows for [`scored_schema`], one per score, named `r{score}`.
#[must_use]
pub fn scored_rows(scores: &[i64]) -> Vec<Row> {
    scores
        .iter()
        .map(|s| Row::new(vec![Value::Long(*s), Value::String(format!("r{s}"))]))
        .collect()
}
