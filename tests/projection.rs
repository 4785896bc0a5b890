//! Tests for casting accumulated rows into the unified schema.

use anyhow::Result;
use ironselect::testing::*;
use ironselect::*;
use std::sync::Arc;

#[macro_use]
mod macros;

#[test]
fn mixed_rows_widen_to_upgraded_schema() -> Result<()> {
    let schema = upgraded_schema();
    let projector = RowProjector::new(&schema);
    let [row1, _] = mixed_rows();
    let [compatible1, _] = compatible_rows();

    let projected = projector.project(&[row1, compatible1])?;
    let expected = [
        Row::new(vec![
            Value::Long(0),
            Value::Double(1.0),
            Value::Double(2.0),
            Value::Double(3.0),
            Value::from("4"),
            Value::LongArray(vec![5]),
            Value::DoubleArray(vec![6.0]),
            Value::DoubleArray(vec![7.0]),
            Value::DoubleArray(vec![8.0]),
            Value::from(vec!["9"]),
            Value::Bytes(vec![0x10, 0x20]),
        ]),
        Row::new(vec![
            Value::Long(1),
            Value::Double(2.0),
            Value::Double(3.0),
            Value::Double(4.0),
            Value::from("5"),
            Value::LongArray(vec![6]),
            Value::DoubleArray(vec![7.0]),
            Value::DoubleArray(vec![8.0]),
            Value::DoubleArray(vec![9.0]),
            Value::from(vec!["10"]),
            Value::Bytes(vec![0x50, 0x60]),
        ]),
    ];
    assert_rows_equal(&projected, &expected);
    assert_rows_match_schema(&projected, &schema);
    Ok(())
}

#[test]
fn exactly_typed_rows_are_shared() -> Result<()> {
    let schema = scored_schema();
    let rows = scored_rows(&[1, 2]);
    let projected = RowProjector::new(&schema).project(&rows)?;
    assert_rows_same(&projected, &rows);
    Ok(())
}

#[test]
fn nulls_pass_through() -> Result<()> {
    let schema = Schema::from_columns([("a", ColumnType::Double), ("b", ColumnType::Long)]);
    let row = Row::new(vec![Value::Null, Value::Int(3)]);
    let projected = RowProjector::new(&schema).project_row(&row)?;
    assert_eq!(projected.values(), [Value::Null, Value::Long(3)]);

    let all_null = Row::new(vec![Value::Null, Value::Null]);
    assert!(RowProjector::new(&schema).project_row(&all_null)?.ptr_eq(&all_null));
    Ok(())
}

#[test]
fn row_length_must_match_schema() {
    let schema = scored_schema();
    assert_err!(
        RowProjector::new(&schema).project_row(&row![1i64]),
        MergeError::RowArity {
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn narrowing_and_cross_kind_casts_fail() {
    assert_err!(
        cast_value(&Value::Double(1.0), ColumnType::Long),
        MergeError::UnsupportedCast {
            from: ColumnType::Double,
            to: ColumnType::Long
        }
    );
    assert_err!(
        cast_value(&Value::from("7"), ColumnType::Int),
        MergeError::UnsupportedCast { .. }
    );
    assert_err!(
        cast_value(&Value::IntArray(vec![1]), ColumnType::Long),
        MergeError::UnsupportedCast { .. }
    );

    // one bad value fails the whole batch
    let schema = Schema::from_columns([("a", ColumnType::Int)]);
    let rows = [row![1], row![2.5]];
    match RowProjector::new(&schema).project(&rows) {
        Err(err @ MergeError::UnsupportedCast { .. }) => assert!(err.is_internal()),
        other => panic!("expected an unsupported cast, got {other:?}"),
    }
}

#[test]
fn input_errors_are_not_internal() {
    let err = MergeError::InvalidExpression {
        text: "add(".to_string(),
        reason: "unclosed".to_string(),
    };
    assert!(!err.is_internal());
    assert!(err.into_partial().is_none());
    assert!(
        MergeError::RowArity {
            expected: 2,
            actual: 1
        }
        .is_internal()
    );
}

#[test]
fn scalar_widening() -> Result<()> {
    assert_eq!(cast_value(&Value::Int(7), ColumnType::Long)?, Value::Long(7));
    assert_eq!(cast_value(&Value::Int(7), ColumnType::Float)?, Value::Float(7.0));
    assert_eq!(cast_value(&Value::Long(7), ColumnType::Double)?, Value::Double(7.0));
    assert_eq!(cast_value(&Value::Float(1.5), ColumnType::Double)?, Value::Double(1.5));
    assert_eq!(cast_value(&Value::Boolean(true), ColumnType::Long)?, Value::Long(1));
    assert_eq!(cast_value(&Value::Null, ColumnType::Bytes)?, Value::Null);
    assert_eq!(
        cast_value(&Value::from("same"), ColumnType::String)?,
        Value::from("same")
    );
    Ok(())
}

#[test]
fn array_widening_is_elementwise() -> Result<()> {
    assert_eq!(
        cast_value(&Value::IntArray(vec![1, 2]), ColumnType::DoubleArray)?,
        Value::DoubleArray(vec![1.0, 2.0])
    );
    assert_eq!(
        cast_value(&Value::LongArray(vec![3]), ColumnType::FloatArray)?,
        Value::FloatArray(vec![3.0])
    );
    assert_eq!(
        cast_value(&Value::FloatArray(vec![0.5]), ColumnType::DoubleArray)?,
        Value::DoubleArray(vec![0.5])
    );
    Ok(())
}

#[test]
fn merged_rows_project_uniformly() -> Result<()> {
    let query = SelectionQuery::parse(&MIXED_COLUMNS)?.order_by(&["int"])?;
    let expressions = ExpressionSet::extract(&query, &MIXED_COLUMNS);
    let comparator = Arc::new(RowComparator::for_query(
        &query,
        &expressions,
        NullOrdering::NullsLast,
    )?);

    let mut target = ResultBlock::ordered(mixed_schema(), comparator, 4);
    merge_with_ordering(&mut target, block(&mixed_schema(), mixed_rows().to_vec()), 4)?;
    merge_with_ordering(
        &mut target,
        block(&compatible_schema(), compatible_rows().to_vec()),
        4,
    )?;
    let (schema, rows) = target.into_parts();
    assert_eq!(schema, upgraded_schema());

    let projected = RowProjector::new(&schema).project(&rows)?;
    assert_rows_match_schema(&projected, &schema);
    assert_eq!(int_column!(projected, 0), [0, 1, 10, 11]);
    Ok(())
}
