//! Ordered `(name, type)` schemas and their wire encoding.
//!
//! A [`Schema`] is immutable once built. Reconciling two segment schemas
//! produces a new one via [`Schema::upgrade_to_cover`].
//!
//! # Wire format
//!
//! All integers are 4-byte big-endian:
//!
//! ```text
//! column_count
//! repeat column_count times:
//!     name_len, name (UTF-8), type_ordinal
//! ```

use crate::codec::{ByteReader, put_blob, put_len};
use crate::error::{DecodeError, MergeError, Result};
use crate::types::ColumnType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column name of the single-column schema that marks an empty result.
pub const PLACEHOLDER_COLUMN: &str = "*";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    column_names: Vec<String>,
    column_types: Vec<ColumnType>,
}

impl Schema {
    /// Build a schema from `(name, type)` pairs.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        let (column_names, column_types) = columns
            .into_iter()
            .map(|(name, ty)| (name.into(), ty))
            .unzip();
        Self {
            column_names,
            column_types,
        }
    }

    /// Build a schema from parallel name and type lists.
    ///
    /// # Errors
    /// Returns [`MergeError::RowArity`] when the lists differ in length.
    pub fn new(column_names: Vec<String>, column_types: Vec<ColumnType>) -> Result<Self> {
        if column_names.len() != column_types.len() {
            return Err(MergeError::RowArity {
                expected: column_names.len(),
                actual: column_types.len(),
            });
        }
        Ok(Self {
            column_names,
            column_types,
        })
    }

    /// The `["*"]` schema used for results with no rows.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::from_columns([(PLACEHOLDER_COLUMN, ColumnType::String)])
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.column_names.len() == 1 && self.column_names[0] == PLACEHOLDER_COLUMN
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.column_names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.column_names.is_empty()
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    #[must_use]
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.column_names.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn column_type(&self, index: usize) -> Option<ColumnType> {
        self.column_types.get(index).copied()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|n| n == name)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnType)> + '_ {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.column_types.iter().copied())
    }

    /// Positional type compatibility. Names are not compared: the caller
    /// guarantees both schemas list the same logical columns in order.
    #[must_use]
    pub fn is_type_compatible_with(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .column_types
                .iter()
                .zip(&other.column_types)
                .all(|(a, b)| a.is_compatible(*b))
    }

    /// A schema with `a`'s names and, per column, the common super type of
    /// both sides.
    ///
    /// Commutative in its types and associative when folded, so blocks can
    /// be merged in any arrival order.
    ///
    /// # Errors
    /// Returns [`MergeError::SchemaMismatch`] when the schemas are not
    /// type-compatible.
    pub fn upgrade_to_cover(a: &Self, b: &Self) -> Result<Self> {
        let mismatch = || MergeError::SchemaMismatch {
            left: a.to_string(),
            right: b.to_string(),
        };
        if a.len() != b.len() {
            return Err(mismatch());
        }
        let column_types = a
            .column_types
            .iter()
            .zip(&b.column_types)
            .map(|(x, y)| x.common_super_type(*y).ok_or_else(mismatch))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            column_names: a.column_names.clone(),
            column_types,
        })
    }

    /// Encode to the wire format.
    ///
    /// # Errors
    /// Returns [`MergeError::LengthOverflow`] when the column count or a
    /// name length does not fit the i32 length prefix.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(4 + self.len() * 16);
        put_len(&mut out, self.len())?;
        for (name, ty) in self.columns() {
            put_blob(&mut out, name.as_bytes())?;
            out.extend_from_slice(&ty.ordinal().to_be_bytes());
        }
        Ok(out)
    }

    /// Decode a buffer holding exactly one schema.
    ///
    /// # Errors
    /// Returns a [`DecodeError`] on truncation, unknown type ordinals, invalid
    /// UTF-8 names or trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(bytes);
        let schema = Self::decode_from(&mut reader)?;
        match reader.remaining() {
            0 => Ok(schema),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }

    pub(crate) fn decode_from(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        // each column needs at least a name length and a type ordinal
        let count = reader.read_len(8)?;
        let mut column_names = Vec::with_capacity(count);
        let mut column_types = Vec::with_capacity(count);
        for _ in 0..count {
            column_names.push(reader.read_string("column name")?);
            let ordinal = reader.read_i32()?;
            column_types.push(
                ColumnType::from_ordinal(ordinal).ok_or(DecodeError::UnknownTypeOrdinal(ordinal))?,
            );
        }
        Ok(Self {
            column_names,
            column_types,
        })
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (name, ty)) in self.columns().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{name}({ty})")?;
        }
        f.write_str("]")
    }
}
