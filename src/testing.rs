//! Helpers for testing code that reduces selection results.
//!
//! - **Fixtures**: a mixed-type schema, a positionally compatible variant,
//!   the schema covering both, and sample rows for each.
//! - **Builders**: [`SchemaBuilder`] and helpers that wrap rows into blocks
//!   or segment producers.
//! - **Assertions**: row comparisons with readable failure output.
//!
//! # Quick Start
//!
//! ```
//! use ironselect::testing::*;
//! use ironselect::{ColumnType, row};
//!
//! let schema = SchemaBuilder::new()
//!     .column("id", ColumnType::Long)
//!     .column("name", ColumnType::String)
//!     .build();
//! let rows = vec![row![1i64, "a"], row![2i64, "b"]];
//!
//! assert_rows_match_schema(&rows, &schema);
//! assert_rows_equal(&rows, &[row![1i64, "a"], row![2i64, "b"]]);
//! ```

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
