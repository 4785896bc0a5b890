//! Untyped column values as they cross the storage boundary.
//!
//! A [`Value`] carries its own concrete type. Rows produced by different
//! segments may hold an `Int` and a `Long` in the same logical column; the
//! merge core never rewrites them in place and only the projector casts.

use crate::types::ColumnType;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    Bytes(Vec<u8>),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Object(serde_json::Value),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    BooleanArray(Vec<bool>),
    StringArray(Vec<String>),
    BytesArray(Vec<Vec<u8>>),
    TimestampArray(Vec<i64>),
    ObjectArray(Vec<serde_json::Value>),
}

impl Value {
    /// The type this value was created under, `None` for `Null`.
    #[must_use]
    pub const fn column_type(&self) -> Option<ColumnType> {
        Some(match self {
            Self::Null => return None,
            Self::Int(_) => ColumnType::Int,
            Self::Long(_) => ColumnType::Long,
            Self::Float(_) => ColumnType::Float,
            Self::Double(_) => ColumnType::Double,
            Self::Boolean(_) => ColumnType::Boolean,
            Self::String(_) => ColumnType::String,
            Self::Bytes(_) => ColumnType::Bytes,
            Self::Timestamp(_) => ColumnType::Timestamp,
            Self::Object(_) => ColumnType::Object,
            Self::IntArray(_) => ColumnType::IntArray,
            Self::LongArray(_) => ColumnType::LongArray,
            Self::FloatArray(_) => ColumnType::FloatArray,
            Self::DoubleArray(_) => ColumnType::DoubleArray,
            Self::BooleanArray(_) => ColumnType::BooleanArray,
            Self::StringArray(_) => ColumnType::StringArray,
            Self::BytesArray(_) => ColumnType::BytesArray,
            Self::TimestampArray(_) => ColumnType::TimestampArray,
            Self::ObjectArray(_) => ColumnType::ObjectArray,
        })
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    bool => Boolean,
    String => String,
    Vec<u8> => Bytes,
    serde_json::Value => Object,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
    Vec<f32> => FloatArray,
    Vec<f64> => DoubleArray,
    Vec<bool> => BooleanArray,
    Vec<String> => StringArray,
    Vec<Vec<u8>> => BytesArray,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Self::StringArray(v.into_iter().map(String::from).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
