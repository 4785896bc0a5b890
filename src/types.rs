//! Column type lattice.
//!
//! [`ColumnType`] is the closed set of column types a segment can report. The
//! per-variant predicates are served from a single table indexed by ordinal,
//! so the relations below are table lookups plus a handful of comparisons.
//!
//! Two relations matter to the merge core:
//!
//! - [`ColumnType::is_super_type_of`]: castability of a scalar by numeric
//!   rank (`INT < LONG < FLOAT < DOUBLE`, with `BOOLEAN` below every number).
//! - [`ColumnType::common_super_type`]: the join used when two segment
//!   schemas disagree. It follows *lossless* widening: two whole numbers meet
//!   at `LONG`, any other pair of distinct numbers meets at `DOUBLE`. Numeric
//!   arrays follow the same rule per element. `BOOLEAN` joins only itself,
//!   so a boolean column never merges with a numeric one.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    Int,
    Long,
    Float,
    Double,
    Boolean,
    String,
    Bytes,
    Timestamp,
    Object,
    IntArray,
    LongArray,
    FloatArray,
    DoubleArray,
    BooleanArray,
    StringArray,
    BytesArray,
    TimestampArray,
    ObjectArray,
}

/// Per-variant facts. `rank` orders numbers (and `BOOLEAN`) for widening.
struct TypeTraits {
    name: &'static str,
    number: bool,
    whole: bool,
    array: bool,
    rank: u8,
    counterpart: ColumnType,
}

const NO_RANK: u8 = u8::MAX;

const fn traits(
    name: &'static str,
    number: bool,
    whole: bool,
    array: bool,
    rank: u8,
    counterpart: ColumnType,
) -> TypeTraits {
    TypeTraits {
        name,
        number,
        whole,
        array,
        rank,
        counterpart,
    }
}

/// Indexed by ordinal. For scalars `counterpart` is the array type, for arrays
/// it is the element type.
static TABLE: [TypeTraits; ColumnType::COUNT] = [
    traits("INT", true, true, false, 1, ColumnType::IntArray),
    traits("LONG", true, true, false, 2, ColumnType::LongArray),
    traits("FLOAT", true, false, false, 3, ColumnType::FloatArray),
    traits("DOUBLE", true, false, false, 4, ColumnType::DoubleArray),
    traits("BOOLEAN", false, false, false, 0, ColumnType::BooleanArray),
    traits("STRING", false, false, false, NO_RANK, ColumnType::StringArray),
    traits("BYTES", false, false, false, NO_RANK, ColumnType::BytesArray),
    traits("TIMESTAMP", false, false, false, NO_RANK, ColumnType::TimestampArray),
    traits("OBJECT", false, false, false, NO_RANK, ColumnType::ObjectArray),
    traits("INT_ARRAY", false, false, true, NO_RANK, ColumnType::Int),
    traits("LONG_ARRAY", false, false, true, NO_RANK, ColumnType::Long),
    traits("FLOAT_ARRAY", false, false, true, NO_RANK, ColumnType::Float),
    traits("DOUBLE_ARRAY", false, false, true, NO_RANK, ColumnType::Double),
    traits("BOOLEAN_ARRAY", false, false, true, NO_RANK, ColumnType::Boolean),
    traits("STRING_ARRAY", false, false, true, NO_RANK, ColumnType::String),
    traits("BYTES_ARRAY", false, false, true, NO_RANK, ColumnType::Bytes),
    traits("TIMESTAMP_ARRAY", false, false, true, NO_RANK, ColumnType::Timestamp),
    traits("OBJECT_ARRAY", false, false, true, NO_RANK, ColumnType::Object),
];

impl ColumnType {
    /// Number of variants.
    pub const COUNT: usize = 18;

    /// Every variant in ordinal order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::Boolean,
        Self::String,
        Self::Bytes,
        Self::Timestamp,
        Self::Object,
        Self::IntArray,
        Self::LongArray,
        Self::FloatArray,
        Self::DoubleArray,
        Self::BooleanArray,
        Self::StringArray,
        Self::BytesArray,
        Self::TimestampArray,
        Self::ObjectArray,
    ];

    const fn traits(self) -> &'static TypeTraits {
        &TABLE[self as usize]
    }

    /// Stable wire ordinal.
    #[must_use]
    pub const fn ordinal(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.traits().name
    }

    #[must_use]
    pub const fn is_number(self) -> bool {
        self.traits().number
    }

    #[must_use]
    pub const fn is_whole_number(self) -> bool {
        self.traits().whole
    }

    #[must_use]
    pub const fn is_array(self) -> bool {
        self.traits().array
    }

    #[must_use]
    pub const fn is_number_array(self) -> bool {
        self.is_array() && self.traits().counterpart.is_number()
    }

    #[must_use]
    pub const fn is_whole_number_array(self) -> bool {
        self.is_array() && self.traits().counterpart.is_whole_number()
    }

    /// Element type of an array type, `None` for scalars.
    #[must_use]
    pub const fn element_type(self) -> Option<Self> {
        if self.is_array() {
            Some(self.traits().counterpart)
        } else {
            None
        }
    }

    /// Array type holding this scalar, `None` for arrays.
    #[must_use]
    pub const fn array_of(self) -> Option<Self> {
        if self.is_array() {
            None
        } else {
            Some(self.traits().counterpart)
        }
    }

    /// Whether a value of `other` can be widened to `self`.
    ///
    /// Reflexive. Among numbers this is exactly rank order, and `BOOLEAN`
    /// sits below every number without being a super type of any. Nothing
    /// else is a super type of another type.
    #[must_use]
    pub const fn is_super_type_of(self, other: Self) -> bool {
        if self as usize == other as usize {
            return true;
        }
        self.is_number()
            && other.traits().rank != NO_RANK
            && other.traits().rank <= self.traits().rank
    }

    /// Like [`is_super_type_of`](Self::is_super_type_of), extended element-wise
    /// to numeric arrays. This is the relation the row projector casts along.
    #[must_use]
    pub const fn can_widen_to(self, target: Self) -> bool {
        match (self.element_type(), target.element_type()) {
            (Some(from), Some(to)) => {
                self as usize == target as usize
                    || (from.is_number() && to.is_super_type_of(from))
            }
            (None, None) => target.is_super_type_of(self),
            _ => false,
        }
    }

    /// Whether a common super type exists. Symmetric.
    #[must_use]
    pub fn is_compatible(self, other: Self) -> bool {
        self.common_super_type(other).is_some()
    }

    /// The least type both sides widen to without precision-relevant loss,
    /// or `None` when the types are incompatible.
    #[must_use]
    pub fn common_super_type(self, other: Self) -> Option<Self> {
        if self == other {
            return Some(self);
        }
        match (self, other) {
            (a, b) if a.is_whole_number() && b.is_whole_number() => Some(Self::Long),
            (a, b) if a.is_number() && b.is_number() => Some(Self::Double),
            (a, b) if a.is_whole_number_array() && b.is_whole_number_array() => {
                Some(Self::LongArray)
            }
            (a, b) if a.is_number_array() && b.is_number_array() => Some(Self::DoubleArray),
            _ => None,
        }
    }

    /// Maps a storage descriptor to the column type a segment reports for it.
    #[must_use]
    pub const fn from_storage_kind(kind: StorageKind, single_value: bool) -> Self {
        let scalar = match kind {
            StorageKind::Int => Self::Int,
            StorageKind::Long => Self::Long,
            StorageKind::Float => Self::Float,
            StorageKind::Double => Self::Double,
            StorageKind::Boolean => Self::Boolean,
            StorageKind::Timestamp => Self::Timestamp,
            StorageKind::String | StorageKind::Json => Self::String,
            StorageKind::Bytes => Self::Bytes,
        };
        if single_value {
            scalar
        } else {
            scalar.traits().counterpart
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primitive kind of a physical column as described by storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageKind {
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Timestamp,
    String,
    Json,
    Bytes,
}
