//! Row assertions with readable failure output.

use crate::row::Row;
use crate::schema::Schema;

/// Assert two row lists are equal in order and content.
///
/// # Panics
/// Panics on the first differing row, or on a length mismatch.
pub fn assert_rows_equal(actual: &[Row], expected: &[Row]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "row count mismatch:\n  expected: {expected:?}\n  actual: {actual:?}"
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(
            a.values(),
            e.values(),
            "row {i} differs:\n  expected: {e:?}\n  actual: {a:?}"
        );
    }
}

/// Assert `actual` holds exactly the shared rows in `expected`, in order.
///
/// Equality is by identity: a row that was copied rather than moved fails.
///
/// # Panics
/// Panics on the first row that is not the expected allocation.
pub fn assert_rows_same(actual: &[Row], expected: &[Row]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "row count mismatch:\n  expected: {expected:?}\n  actual: {actual:?}"
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            a.ptr_eq(e),
            "row {i} is not the expected shared row:\n  expected: {e:?}\n  actual: {a:?}"
        );
    }
}

/// Assert every row has one value per column, each null or exactly of the
/// column's type.
///
/// # Panics
/// Panics on the first offending value.
pub fn assert_rows_match_schema(rows: &[Row], schema: &Schema) {
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(
            row.len(),
            schema.len(),
            "row {i} has {} values for schema {schema}",
            row.len()
        );
        for ((name, ty), value) in schema.columns().zip(row) {
            if let Some(actual) = value.column_type() {
                assert_eq!(
                    actual, ty,
                    "row {i} column {name}: expected {ty}, found {actual} ({value:?})"
                );
            }
        }
    }
}
