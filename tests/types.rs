//! Tests for the column type lattice.

use ironselect::{ColumnType, StorageKind};

use ColumnType::*;

#[test]
fn super_type_follows_numeric_rank() {
    let numbers = [Int, Long, Float, Double];
    for (i, wide) in numbers.iter().enumerate() {
        for (j, narrow) in numbers.iter().enumerate() {
            assert_eq!(wide.is_super_type_of(*narrow), j <= i, "{wide} vs {narrow}");
        }
        assert!(wide.is_super_type_of(Boolean));
        assert!(!Boolean.is_super_type_of(*wide));
    }
}

#[test]
fn super_type_is_reflexive_only_outside_numbers() {
    for ty in ColumnType::ALL {
        assert!(ty.is_super_type_of(ty));
    }
    assert!(!String.is_super_type_of(Int));
    assert!(!Timestamp.is_super_type_of(Long));
    assert!(!LongArray.is_super_type_of(IntArray));
    assert!(!Bytes.is_super_type_of(String));
}

#[test]
fn predicates() {
    assert!(Int.is_whole_number() && Long.is_whole_number());
    assert!(!Float.is_whole_number() && Float.is_number());
    assert!(!Boolean.is_number());
    assert!(IntArray.is_whole_number_array() && IntArray.is_number_array());
    assert!(DoubleArray.is_number_array() && !DoubleArray.is_whole_number_array());
    assert!(!BooleanArray.is_number_array());
    assert!(StringArray.is_array() && !String.is_array());
    assert_eq!(IntArray.element_type(), Some(Int));
    assert_eq!(Int.array_of(), Some(IntArray));
    assert_eq!(Int.element_type(), None);
}

#[test]
fn common_super_type_of_numbers() {
    assert_eq!(Int.common_super_type(Int), Some(Int));
    assert_eq!(Int.common_super_type(Long), Some(Long));
    assert_eq!(Long.common_super_type(Int), Some(Long));
    assert_eq!(Int.common_super_type(Float), Some(Double));
    assert_eq!(Long.common_super_type(Float), Some(Double));
    assert_eq!(Float.common_super_type(Double), Some(Double));
    assert_eq!(Boolean.common_super_type(Int), None);
    assert_eq!(Float.common_super_type(Boolean), None);
    assert!(!Boolean.is_compatible(Long));
}

#[test]
fn common_super_type_of_arrays() {
    assert_eq!(IntArray.common_super_type(LongArray), Some(LongArray));
    assert_eq!(IntArray.common_super_type(FloatArray), Some(DoubleArray));
    assert_eq!(LongArray.common_super_type(DoubleArray), Some(DoubleArray));
    assert_eq!(BooleanArray.common_super_type(IntArray), None);
    assert_eq!(StringArray.common_super_type(StringArray), Some(StringArray));
    assert_eq!(TimestampArray.common_super_type(LongArray), None);
}

#[test]
fn incompatible_types_have_no_join() {
    for (a, b) in [
        (Int, String),
        (String, Bytes),
        (Timestamp, Long),
        (Int, IntArray),
        (Object, String),
        (BytesArray, StringArray),
    ] {
        assert!(!a.is_compatible(b), "{a} vs {b}");
        assert!(!b.is_compatible(a), "{b} vs {a}");
    }
}

#[test]
fn common_super_type_is_commutative_and_covers_both() {
    for a in ColumnType::ALL {
        for b in ColumnType::ALL {
            let ab = a.common_super_type(b);
            assert_eq!(ab, b.common_super_type(a), "{a} vs {b}");
            if let Some(join) = ab {
                assert!(a.can_widen_to(join), "{a} -> {join}");
                assert!(b.can_widen_to(join), "{b} -> {join}");
            }
        }
    }
}

#[test]
fn widening_extends_element_wise_to_arrays() {
    assert!(IntArray.can_widen_to(LongArray));
    assert!(FloatArray.can_widen_to(DoubleArray));
    assert!(!DoubleArray.can_widen_to(LongArray));
    assert!(!Int.can_widen_to(IntArray));
    assert!(Boolean.can_widen_to(Double));
}

#[test]
fn ordinals_round_trip_and_reject_unknown() {
    for (i, ty) in ColumnType::ALL.into_iter().enumerate() {
        assert_eq!(ty.ordinal(), i32::try_from(i).unwrap());
        assert_eq!(ColumnType::from_ordinal(ty.ordinal()), Some(ty));
    }
    assert_eq!(ColumnType::from_ordinal(-1), None);
    assert_eq!(ColumnType::from_ordinal(18), None);
}

#[test]
fn display_and_serde_use_upper_snake_case() -> anyhow::Result<()> {
    assert_eq!(IntArray.to_string(), "INT_ARRAY");
    assert_eq!(serde_json::to_string(&TimestampArray)?, "\"TIMESTAMP_ARRAY\"");
    let parsed: ColumnType = serde_json::from_str("\"DOUBLE\"")?;
    assert_eq!(parsed, Double);
    Ok(())
}

#[test]
fn storage_kinds_map_to_column_types() {
    assert_eq!(ColumnType::from_storage_kind(StorageKind::Int, true), Int);
    assert_eq!(ColumnType::from_storage_kind(StorageKind::Long, false), LongArray);
    assert_eq!(ColumnType::from_storage_kind(StorageKind::Json, true), String);
    assert_eq!(ColumnType::from_storage_kind(StorageKind::Json, false), StringArray);
    assert_eq!(ColumnType::from_storage_kind(StorageKind::Timestamp, true), Timestamp);
    assert_eq!(ColumnType::from_storage_kind(StorageKind::Boolean, false), BooleanArray);
    assert_eq!(ColumnType::from_storage_kind(StorageKind::Bytes, true), Bytes);
}
