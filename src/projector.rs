//! Casting accumulated rows into the unified schema.
//!
//! Rows reach the projector carrying whatever concrete types their segment
//! produced. Numbers (and booleans) widen along the lattice, numeric arrays
//! widen element-wise, and everything else must already match. Nulls pass
//! through. Projection of a batch is all-or-nothing.

use crate::error::{MergeError, Result};
use crate::row::Row;
use crate::schema::Schema;
use crate::types::ColumnType;
use crate::value::Value;

/// Casts rows into one schema's declared types.
#[derive(Clone, Copy, Debug)]
pub struct RowProjector<'a> {
    schema: &'a Schema,
}

impl<'a> RowProjector<'a> {
    #[must_use]
    pub const fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Project one row. A row already matching the schema is returned as the
    /// same shared row.
    ///
    /// # Errors
    /// [`MergeError::RowArity`] on a length mismatch,
    /// [`MergeError::UnsupportedCast`] on a value that cannot widen.
    pub fn project_row(&self, row: &Row) -> Result<Row> {
        if row.len() != self.schema.len() {
            return Err(MergeError::RowArity {
                expected: self.schema.len(),
                actual: row.len(),
            });
        }
        let matches = row
            .iter()
            .zip(self.schema.column_types())
            .all(|(v, ty)| v.column_type().is_none_or(|actual| actual == *ty));
        if matches {
            return Ok(row.clone());
        }
        row.iter()
            .zip(self.schema.column_types())
            .map(|(v, ty)| cast_value(v, *ty))
            .collect::<Result<Vec<_>>>()
            .map(Row::new)
    }

    /// Project every row, failing on the first value that cannot be cast.
    ///
    /// # Errors
    /// See [`project_row`](Self::project_row).
    pub fn project(&self, rows: &[Row]) -> Result<Vec<Row>> {
        rows.iter().map(|row| self.project_row(row)).collect()
    }
}

/// Cast a single value to `target`.
///
/// # Errors
/// Returns [`MergeError::UnsupportedCast`] unless the value's type widens to
/// `target`.
pub fn cast_value(value: &Value, target: ColumnType) -> Result<Value> {
    let Some(actual) = value.column_type() else {
        return Ok(Value::Null);
    };
    if actual == target {
        return Ok(value.clone());
    }
    let unsupported = || MergeError::UnsupportedCast {
        from: actual,
        to: target,
    };
    if !actual.can_widen_to(target) {
        return Err(unsupported());
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let cast = match (value, target) {
        (Value::Boolean(b), _) => scalar_from_i64(i64::from(*b), target),
        (Value::Int(x), _) => scalar_from_i64(i64::from(*x), target),
        (Value::Long(x), ColumnType::Float) => Some(Value::Float(*x as f32)),
        (Value::Long(x), ColumnType::Double) => Some(Value::Double(*x as f64)),
        (Value::Float(x), ColumnType::Double) => Some(Value::Double(f64::from(*x))),

        (Value::IntArray(xs), _) => array_from_i64(xs.iter().map(|x| i64::from(*x)), target),
        (Value::LongArray(xs), ColumnType::FloatArray) => {
            Some(Value::FloatArray(xs.iter().map(|x| *x as f32).collect()))
        }
        (Value::LongArray(xs), ColumnType::DoubleArray) => {
            Some(Value::DoubleArray(xs.iter().map(|x| *x as f64).collect()))
        }
        (Value::FloatArray(xs), ColumnType::DoubleArray) => {
            Some(Value::DoubleArray(xs.iter().map(|x| f64::from(*x)).collect()))
        }
        _ => None,
    };
    cast.ok_or_else(unsupported)
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn scalar_from_i64(x: i64, target: ColumnType) -> Option<Value> {
    match target {
        // only reached from BOOLEAN, where x is 0 or 1
        ColumnType::Int => i32::try_from(x).ok().map(Value::Int),
        ColumnType::Long => Some(Value::Long(x)),
        ColumnType::Float => Some(Value::Float(x as f32)),
        ColumnType::Double => Some(Value::Double(x as f64)),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn array_from_i64(xs: impl Iterator<Item = i64>, target: ColumnType) -> Option<Value> {
    match target {
        ColumnType::LongArray => Some(Value::LongArray(xs.collect())),
        ColumnType::FloatArray => Some(Value::FloatArray(xs.map(|x| x as f32).collect())),
        ColumnType::DoubleArray => Some(Value::DoubleArray(xs.map(|x| x as f64).collect())),
        _ => None,
    }
}
