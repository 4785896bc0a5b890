//! Error kinds surfaced by the merge core.
//!
//! Nothing in this crate retries. Every error is returned to the caller, which
//! decides whether to fail the query or surface a degraded result.

use crate::block::ResultBlock;
use crate::types::ColumnType;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = MergeError> = std::result::Result<T, E>;

/// Malformed bytes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated buffer: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("unknown column type ordinal {0}")]
    UnknownTypeOrdinal(i32),

    #[error("negative length {0}")]
    NegativeLength(i32),

    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("invalid object payload: {0}")]
    InvalidObject(String),

    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    #[error("offset {offset} out of range for buffer of {len} bytes")]
    OffsetOutOfRange { offset: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum MergeError {
    /// Two schemas are not positionally type-compatible.
    #[error("schema mismatch: {left} is not type-compatible with {right}")]
    SchemaMismatch { left: String, right: String },

    /// A value could not be widened to the unified column type.
    #[error("unsupported cast from {from} to {to}")]
    UnsupportedCast { from: ColumnType, to: ColumnType },

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The reduction deadline expired. `partial` holds the accumulated block
    /// at the abort point, which is internally consistent but incomplete.
    #[error("merge timed out after {blocks_merged} blocks")]
    Timeout {
        blocks_merged: usize,
        partial: Option<Box<ResultBlock>>,
    },

    #[error("row has {actual} values but schema has {expected} columns")]
    RowArity { expected: usize, actual: usize },

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("column {column} of type {column_type} cannot be used for ordering")]
    UnorderableColumn {
        column: String,
        column_type: ColumnType,
    },

    #[error("strategy mismatch: {0}")]
    StrategyMismatch(String),

    #[error("invalid expression '{text}': {reason}")]
    InvalidExpression { text: String, reason: String },

    #[error("segment failed: {0}")]
    Segment(String),

    /// A length prefix does not fit the signed 32-bit wire field.
    #[error("length {0} exceeds the wire limit of {max}", max = i32::MAX)]
    LengthOverflow(usize),
}

impl MergeError {
    /// Errors that indicate a broken upstream invariant rather than bad input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::UnsupportedCast { .. } | Self::RowArity { .. })
    }

    /// Takes the partial result out of a timeout, if one was captured.
    #[must_use]
    pub fn into_partial(self) -> Option<ResultBlock> {
        match self {
            Self::Timeout { partial, .. } => partial.map(|b| *b),
            _ => None,
        }
    }
}
