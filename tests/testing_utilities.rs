//! Integration tests for the testing utilities.

use anyhow::Result;
use ironselect::testing::*;
use ironselect::*;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_fixture_rows_match_their_schemas() {
    assert_rows_match_schema(&mixed_rows(), &mixed_schema());
    assert_rows_match_schema(&compatible_rows(), &compatible_schema());
    assert_rows_match_schema(&scored_rows(&[1, 2, 3]), &scored_schema());
}

#[test]
fn test_upgraded_fixture_is_the_cover() -> Result<()> {
    let cover = Schema::upgrade_to_cover(&mixed_schema(), &compatible_schema())?;
    assert_eq!(cover, upgraded_schema());
    assert_eq!(cover.column_names(), MIXED_COLUMNS);
    Ok(())
}

#[test]
fn test_schema_builder_retyped() {
    let schema = SchemaBuilder::new()
        .columns([("a", ColumnType::Int), ("b", ColumnType::Float)])
        .retyped(&[ColumnType::Long, ColumnType::Double])
        .build();
    assert_eq!(schema.to_string(), "[a(LONG),b(DOUBLE)]");
}

#[test]
#[should_panic(expected = "one type per column")]
fn test_schema_builder_retyped_length_mismatch() {
    let _ = SchemaBuilder::new()
        .column("a", ColumnType::Int)
        .retyped(&[]);
}

#[test]
fn test_ordered_block_trims_to_bound() {
    let comparator = Arc::new(RowComparator::new(
        vec![SortKey {
            column: 0,
            ascending: false,
        }],
        NullOrdering::NullsLast,
    ));
    let block = ordered_block(&scored_schema(), scored_rows(&[1, 5, 3]), &comparator, 2);
    assert!(block.is_ordered());
    assert_rows_equal(&block.into_rows(), &scored_rows(&[5, 3]));
}

#[test]
fn test_segment_returns_its_block() -> Result<()> {
    let produce = segment(block(&scored_schema(), scored_rows(&[4])), Duration::from_millis(1));
    let produced = produce()?;
    assert_rows_equal(&produced.into_rows(), &scored_rows(&[4]));
    Ok(())
}

#[test]
#[should_panic(expected = "row 1 differs")]
fn test_assert_rows_equal_reports_row() {
    assert_rows_equal(&scored_rows(&[1, 2]), &scored_rows(&[1, 3]));
}

#[test]
#[should_panic(expected = "not the expected shared row")]
fn test_assert_rows_same_rejects_copies() {
    let rows = scored_rows(&[1]);
    let copies: Vec<Row> = rows.iter().map(|r| Row::new(r.values().to_vec())).collect();
    assert_rows_same(&copies, &rows);
}

#[test]
#[should_panic(expected = "column score")]
fn test_assert_rows_match_schema_reports_column() {
    assert_rows_match_schema(&[row![1, "a"]], &scored_schema());
}
