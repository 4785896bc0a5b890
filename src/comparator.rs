//! Type-coercing row ordering.
//!
//! A [`RowComparator`] is a short list of sort keys built once per query and
//! evaluated lexicographically for every comparison. Values are compared by
//! what they mean rather than by their concrete variant, so an `Int(7)` from
//! an old segment and a `Long(7)` from a new one tie.

use crate::error::{MergeError, Result};
use crate::expressions::ExpressionSet;
use crate::query::SelectionQuery;
use crate::row::Row;
use crate::schema::Schema;
use crate::value::Value;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Where nulls sort. Applies regardless of key direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullOrdering {
    NullsFirst,
    #[default]
    NullsLast,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub column: usize,
    pub ascending: bool,
}

/// Output ordering over rows: `Less` means the left row is listed first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowComparator {
    keys: Vec<SortKey>,
    nulls: NullOrdering,
}

impl RowComparator {
    #[must_use]
    pub const fn new(keys: Vec<SortKey>, nulls: NullOrdering) -> Self {
        Self { keys, nulls }
    }

    /// Resolve the query's order-by list against its evaluation order.
    ///
    /// # Errors
    /// Returns [`MergeError::UnknownColumn`] if an order-by expression is not
    /// part of `expressions`.
    pub fn for_query(
        query: &SelectionQuery,
        expressions: &ExpressionSet,
        nulls: NullOrdering,
    ) -> Result<Self> {
        let keys = expressions
            .order_by_positions(query)?
            .into_iter()
            .zip(query.order_by_expressions())
            .map(|(column, ob)| SortKey {
                column,
                ascending: ob.ascending,
            })
            .collect();
        Ok(Self::new(keys, nulls))
    }

    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    #[must_use]
    pub const fn null_ordering(&self) -> NullOrdering {
        self.nulls
    }

    /// Check every key points at an orderable column of `schema`.
    ///
    /// # Errors
    /// [`MergeError::UnknownColumn`] for keys past the end of the schema,
    /// [`MergeError::UnorderableColumn`] for array and object columns.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        for key in &self.keys {
            let (Some(name), Some(ty)) = (schema.column_name(key.column), schema.column_type(key.column))
            else {
                return Err(MergeError::UnknownColumn(format!("#{}", key.column)));
            };
            if ty.is_array() || ty == crate::types::ColumnType::Object {
                return Err(MergeError::UnorderableColumn {
                    column: name.to_string(),
                    column_type: ty,
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        for key in &self.keys {
            let left = a.get(key.column).unwrap_or(&Value::Null);
            let right = b.get(key.column).unwrap_or(&Value::Null);
            let ord = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => self.null_side(),
                (false, true) => self.null_side().reverse(),
                (false, false) => {
                    let ord = compare_values(left, right);
                    if key.ascending { ord } else { ord.reverse() }
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    const fn null_side(&self) -> Ordering {
        match self.nulls {
            NullOrdering::NullsFirst => Ordering::Less,
            NullOrdering::NullsLast => Ordering::Greater,
        }
    }
}

enum Numeric {
    Whole(i64),
    Real(f64),
}

fn numeric(v: &Value) -> Option<Numeric> {
    match v {
        Value::Int(x) => Some(Numeric::Whole(i64::from(*x))),
        Value::Long(x) => Some(Numeric::Whole(*x)),
        Value::Boolean(x) => Some(Numeric::Whole(i64::from(*x))),
        Value::Float(x) => Some(Numeric::Real(f64::from(*x))),
        Value::Double(x) => Some(Numeric::Real(*x)),
        _ => None,
    }
}

/// Compare two non-null values after widening numbers to the wider side.
///
/// Strings compare by code point, bytes lexicographically. Arrays and objects
/// are not orderable and tie; values of unrelated categories order by type
/// ordinal so the result stays total.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (numeric(a), numeric(b)) {
        return match (x, y) {
            (Numeric::Whole(x), Numeric::Whole(y)) => x.cmp(&y),
            (Numeric::Whole(x), Numeric::Real(y)) => OrderedFloat(x as f64).cmp(&OrderedFloat(y)),
            (Numeric::Real(x), Numeric::Whole(y)) => OrderedFloat(x).cmp(&OrderedFloat(y as f64)),
            (Numeric::Real(x), Numeric::Real(y)) => OrderedFloat(x).cmp(&OrderedFloat(y)),
        };
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        _ => match (a.column_type(), b.column_type()) {
            (Some(x), Some(y)) if x != y => x.ordinal().cmp(&y.ordinal()),
            _ => Ordering::Equal,
        },
    }
}
