//! # Ironselect
//!
//! The **reconciliation layer** for row-selection queries over a segmented
//! table. Each segment answers a `SELECT ... [ORDER BY ...] LIMIT` on its own
//! and reports a partial block; Ironselect merges those blocks into one
//! bounded, correctly ordered, uniformly typed result.
//!
//! ## Key Features
//!
//! - **Schema reconciliation** - segments built at different times may report
//!   `INT` where others report `LONG`; blocks merge under the least common
//!   super type of their schemas
//! - **Bounded merges** - unordered queries keep the first sufficient rows,
//!   ordered queries keep a top-K heap of `offset + limit` rows
//! - **Type-coercing comparator** - an `Int(7)` and a `Long(7)` tie
//! - **Output projection** - rows are cast to the unified schema only once,
//!   at the end
//! - **Sequential and parallel reduction** - segment producers can run on a
//!   rayon pool while one coordinator merges, under a deadline
//! - **Wire formats** - compact encodings for schemas and tabular payloads
//!
//! ## Quick Start
//!
//! ```
//! use ironselect::*;
//! # fn main() -> anyhow::Result<()> {
//! let query = SelectionQuery::parse(&["name", "score"])?
//!     .order_by(&["score DESC"])?
//!     .with_limit(2);
//! let expressions = ExpressionSet::extract(&query, &["name", "score"]);
//!
//! // Evaluation order puts order-by expressions first.
//! let old = expressions.evaluation_schema(&[ColumnType::Int, ColumnType::String])?;
//! let new = expressions.evaluation_schema(&[ColumnType::Long, ColumnType::String])?;
//!
//! let reducer = SelectionReducer::for_query(&query, &expressions, MergeConfig::sequential())?;
//! let reduced = reducer.reduce([
//!     ResultBlock::new(old, vec![row![20, "a"], row![10, "b"]]),
//!     ResultBlock::new(new, vec![row![15i64, "c"], row![5i64, "d"]]),
//! ])?;
//!
//! let table = reduced.into_result_table(&query)?;
//! assert_eq!(table.columns, ["name", "score"]);
//! assert_eq!(table.rows, [
//!     vec![Value::from("a"), Value::Long(20)],
//!     vec![Value::from("c"), Value::Long(15)],
//! ]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Types and schemas
//!
//! [`ColumnType`] is a small lattice: numbers widen by rank and
//! [`ColumnType::common_super_type`] joins two types losslessly. A [`Schema`]
//! is an ordered list of `(name, type)` columns;
//! [`Schema::upgrade_to_cover`] joins two schemas column by column.
//!
//! ### Blocks and merging
//!
//! A [`ResultBlock`] pairs a schema with rows. [`merge_without_ordering`] and
//! [`merge_with_ordering`] fold one block into another; the
//! [`BlockCombiner`] implementations wrap them behind a
//! create / merge / finish interface.
//!
//! ### Reduction
//!
//! [`SelectionReducer`] picks the combiner for a query, folds every block (or
//! runs every segment producer), and yields a [`ReducedSelection`]. From
//! there, [`ReducedSelection::into_result_table`] applies the offset, casts
//! rows, and keeps the query's output columns.
//!
//! ## Feature Flags
//!
//! - `metrics` (default) - merge counters and timings via
//!   [`metrics::MetricsCollector`]
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`]; install any subscriber to see
//! them. Nothing here installs one.

pub mod block;
mod codec;
pub mod combine;
pub mod comparator;
pub mod config;
pub mod datatable;
pub mod error;
pub mod expressions;
pub mod merge;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod projector;
pub mod query;
pub mod reduce;
pub mod row;
pub mod schema;
pub mod testing;
pub mod topk;
pub mod types;
pub mod value;

// Re-exports
pub use block::ResultBlock;
pub use combine::{BlockCombiner, OrderedCombiner, UnorderedCombiner};
pub use comparator::{NullOrdering, RowComparator, SortKey, compare_values};
pub use config::{ExecMode, MergeConfig};
pub use datatable::DataTable;
pub use error::{DecodeError, MergeError, Result};
pub use expressions::{ExpressionSet, selection_columns};
pub use merge::{MergeStats, merge_with_ordering, merge_without_ordering};
pub use projector::{RowProjector, cast_value};
pub use query::{Expression, OrderByExpression, SelectionQuery};
pub use reduce::{ReducedSelection, ResultTable, SelectionReducer};
pub use row::Row;
pub use schema::{PLACEHOLDER_COLUMN, Schema};
pub use topk::{Offer, OrderFn, TopKHeap};
pub use types::{ColumnType, StorageKind};
pub use value::Value;
