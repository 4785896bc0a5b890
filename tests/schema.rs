//! Tests for schemas: compatibility, upgrade, wire encoding.

use anyhow::Result;
use ironselect::testing::*;
use ironselect::{ColumnType, DecodeError, MergeError, Schema};
use proptest::prelude::*;

#[macro_use]
mod macros;

#[test]
fn display_lists_name_and_type() {
    assert_eq!(
        mixed_schema().to_string(),
        "[int(INT),long(LONG),float(FLOAT),double(DOUBLE),string(STRING),int_array(INT_ARRAY),\
         long_array(LONG_ARRAY),float_array(FLOAT_ARRAY),double_array(DOUBLE_ARRAY),\
         string_array(STRING_ARRAY),bytes(BYTES)]"
    );
}

#[test]
fn compatible_schemas_upgrade_to_cover() -> Result<()> {
    let mixed = mixed_schema();
    let compatible = compatible_schema();
    assert!(mixed.is_type_compatible_with(&compatible));
    assert!(compatible.is_type_compatible_with(&mixed));

    let upgraded = Schema::upgrade_to_cover(&mixed, &compatible)?;
    assert_eq!(upgraded, upgraded_schema());
    assert_eq!(Schema::upgrade_to_cover(&compatible, &mixed)?, upgraded_schema());
    Ok(())
}

#[test]
fn names_are_not_compared() -> Result<()> {
    let a = SchemaBuilder::new().column("x", ColumnType::Int).build();
    let b = SchemaBuilder::new().column("y", ColumnType::Long).build();
    assert!(a.is_type_compatible_with(&b));
    let upgraded = Schema::upgrade_to_cover(&a, &b)?;
    assert_eq!(upgraded.column_names(), ["x"]);
    assert_eq!(upgraded.column_types(), [ColumnType::Long]);
    Ok(())
}

#[test]
fn incompatible_schemas_are_rejected() {
    let base = mixed_schema();
    let retyped = SchemaBuilder::new()
        .columns(base.columns())
        .retyped(&[
            ColumnType::Int,
            ColumnType::Long,
            ColumnType::Float,
            ColumnType::Double,
            ColumnType::Int, // string column
            ColumnType::IntArray,
            ColumnType::LongArray,
            ColumnType::FloatArray,
            ColumnType::DoubleArray,
            ColumnType::StringArray,
            ColumnType::Bytes,
        ])
        .build();
    assert!(!base.is_type_compatible_with(&retyped));
    assert_err!(
        Schema::upgrade_to_cover(&base, &retyped),
        MergeError::SchemaMismatch { .. }
    );

    let shorter = SchemaBuilder::new().column("int", ColumnType::Int).build();
    assert!(!base.is_type_compatible_with(&shorter));
    assert_err!(
        Schema::upgrade_to_cover(&base, &shorter),
        MergeError::SchemaMismatch { .. }
    );
}

#[test]
fn boolean_column_does_not_join_numbers() {
    let ints = SchemaBuilder::new().column("flag", ColumnType::Int).build();
    let booleans = SchemaBuilder::new().column("flag", ColumnType::Boolean).build();
    assert!(!ints.is_type_compatible_with(&booleans));
    assert_err!(
        Schema::upgrade_to_cover(&ints, &booleans),
        MergeError::SchemaMismatch { .. }
    );
    assert_err!(
        Schema::upgrade_to_cover(&booleans, &ints),
        MergeError::SchemaMismatch { .. }
    );
}

#[test]
fn upgrade_of_identical_schemas_is_identity() -> Result<()> {
    let schema = mixed_schema();
    assert_eq!(Schema::upgrade_to_cover(&schema, &schema)?, schema);
    Ok(())
}

#[test]
fn lookups() {
    let schema = mixed_schema();
    assert_eq!(schema.len(), 11);
    assert_eq!(schema.column_index("double"), Some(3));
    assert_eq!(schema.column_index("missing"), None);
    assert_eq!(schema.column_name(4), Some("string"));
    assert_eq!(schema.column_type(10), Some(ColumnType::Bytes));
    assert_eq!(schema.column_type(11), None);
}

#[test]
fn new_rejects_mismatched_lengths() {
    assert_err!(
        Schema::new(vec!["a".into()], vec![]),
        MergeError::RowArity { expected: 1, actual: 0 }
    );
}

#[test]
fn placeholder_schema() {
    let placeholder = Schema::placeholder();
    assert!(placeholder.is_placeholder());
    assert_eq!(placeholder.to_string(), "[*(STRING)]");
    assert!(!mixed_schema().is_placeholder());
}

#[test]
fn encodes_big_endian_layout() -> Result<()> {
    let schema = SchemaBuilder::new().column("ab", ColumnType::Long).build();
    assert_eq!(
        schema.to_bytes()?,
        [0, 0, 0, 1, 0, 0, 0, 2, b'a', b'b', 0, 0, 0, 1]
    );
    Ok(())
}

#[test]
fn empty_schema_round_trips() -> Result<()> {
    let empty = SchemaBuilder::new().build();
    assert_eq!(empty.to_bytes()?, [0, 0, 0, 0]);
    assert_eq!(Schema::from_bytes(&empty.to_bytes()?)?, empty);
    Ok(())
}

#[test]
fn decode_rejects_malformed_input() -> Result<()> {
    let bytes = mixed_schema().to_bytes()?;

    assert_err!(
        Schema::from_bytes(&bytes[..bytes.len() - 2]),
        DecodeError::Truncated { .. }
    );

    let mut trailing = bytes.clone();
    trailing.push(7);
    assert_eq!(Schema::from_bytes(&trailing), Err(DecodeError::TrailingBytes(1)));

    let mut unknown = SchemaBuilder::new()
        .column("a", ColumnType::Int)
        .build()
        .to_bytes()?;
    let n = unknown.len();
    unknown[n - 4..].copy_from_slice(&99i32.to_be_bytes());
    assert_eq!(
        Schema::from_bytes(&unknown),
        Err(DecodeError::UnknownTypeOrdinal(99))
    );

    let mut bad_name = SchemaBuilder::new()
        .column("a", ColumnType::Int)
        .build()
        .to_bytes()?;
    bad_name[8] = 0xFF;
    assert_err!(Schema::from_bytes(&bad_name), DecodeError::InvalidUtf8(_));

    assert_eq!(
        Schema::from_bytes(&(-3i32).to_be_bytes()),
        Err(DecodeError::NegativeLength(-3))
    );
    Ok(())
}

fn arb_type() -> impl Strategy<Value = ColumnType> {
    prop::sample::select(ColumnType::ALL.to_vec())
}

fn arb_number() -> impl Strategy<Value = ColumnType> {
    prop::sample::select(vec![
        ColumnType::Int,
        ColumnType::Long,
        ColumnType::Float,
        ColumnType::Double,
    ])
}

fn arb_schema() -> impl Strategy<Value = Schema> {
    prop::collection::vec(("[a-z_]{1,8}", arb_type()), 0..12).prop_map(Schema::from_columns)
}

fn numeric_schema(types: &[ColumnType]) -> Schema {
    Schema::from_columns(types.iter().enumerate().map(|(i, ty)| (format!("c{i}"), *ty)))
}

proptest! {
    #[test]
    fn encode_decode_round_trip(schema in arb_schema()) {
        let bytes = schema.to_bytes().map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(Schema::from_bytes(&bytes), Ok(schema));
    }

    #[test]
    fn upgrade_is_commutative_in_types(
        pairs in prop::collection::vec((arb_number(), arb_number()), 1..6)
    ) {
        let (left, right): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        let a = numeric_schema(&left);
        let b = numeric_schema(&right);
        let ab = Schema::upgrade_to_cover(&a, &b).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let ba = Schema::upgrade_to_cover(&b, &a).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(ab.column_types(), ba.column_types());
    }

    #[test]
    fn upgrade_is_associative(
        triples in prop::collection::vec((arb_number(), arb_number(), arb_number()), 1..6)
    ) {
        let a = numeric_schema(&triples.iter().map(|t| t.0).collect::<Vec<_>>());
        let b = numeric_schema(&triples.iter().map(|t| t.1).collect::<Vec<_>>());
        let c = numeric_schema(&triples.iter().map(|t| t.2).collect::<Vec<_>>());
        let fail = |e: MergeError| TestCaseError::fail(e.to_string());
        let left = Schema::upgrade_to_cover(&Schema::upgrade_to_cover(&a, &b).map_err(fail)?, &c)
            .map_err(fail)?;
        let right = Schema::upgrade_to_cover(&a, &Schema::upgrade_to_cover(&b, &c).map_err(fail)?)
            .map_err(fail)?;
        prop_assert_eq!(left, right);
    }

    #[test]
    fn upgraded_types_cover_both_sides(
        pairs in prop::collection::vec((arb_number(), arb_number()), 1..6)
    ) {
        let (left, right): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        let a = numeric_schema(&left);
        let b = numeric_schema(&right);
        let up = Schema::upgrade_to_cover(&a, &b).map_err(|e| TestCaseError::fail(e.to_string()))?;
        for ((x, y), z) in left.iter().zip(&right).zip(up.column_types()) {
            prop_assert!(z.is_super_type_of(*x) && z.is_super_type_of(*y));
        }
    }
}
