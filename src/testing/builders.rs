//! Builders for schemas, blocks and segment producers.

use crate::block::ResultBlock;
use crate::comparator::RowComparator;
use crate::error::Result;
use crate::row::Row;
use crate::schema::Schema;
use crate::types::ColumnType;
use std::sync::Arc;
use std::time::Duration;

/// Fluent [`Schema`] construction.
///
/// ```
/// use ironselect::testing::SchemaBuilder;
/// use ironselect::ColumnType;
///
/// let schema = SchemaBuilder::new()
///     .column("a", ColumnType::Int)
///     .columns([("b", ColumnType::Double), ("c", ColumnType::String)])
///     .build();
/// assert_eq!(schema.to_string(), "[a(INT),b(DOUBLE),c(STRING)]");
/// ```
#[derive(Clone, Debug, Default)]
pub struct SchemaBuilder {
    columns: Vec<(String, ColumnType)>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push((name.into(), column_type));
        self
    }

    #[must_use]
    pub fn columns<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = (S, ColumnType)>,
    ) -> Self {
        self.columns
            .extend(columns.into_iter().map(|(name, ty)| (name.into(), ty)));
        self
    }

    /// Replace every column type, keeping names.
    ///
    /// # Panics
    /// Panics if `types` has a different length than the columns so far.
    #[must_use]
    pub fn retyped(mut self, types: &[ColumnType]) -> Self {
        assert_eq!(
            types.len(),
            self.columns.len(),
            "retyped needs one type per column"
        );
        for ((_, ty), new) in self.columns.iter_mut().zip(types) {
            *ty = *new;
        }
        self
    }

    #[must_use]
    pub fn build(self) -> Schema {
        Schema::from_columns(self.columns)
    }
}

/// An unordered block over `rows`.
#[must_use]
pub fn block(schema: &Schema, rows: Vec<Row>) -> ResultBlock {
    ResultBlock::new(schema.clone(), rows)
}

/// An ordered block holding the best `max_num_rows` of `rows`.
#[must_use]
pub fn ordered_block(
    schema: &Schema,
    rows: Vec<Row>,
    comparator: &Arc<RowComparator>,
    max_num_rows: usize,
) -> ResultBlock {
    ResultBlock::ordered_from_rows(schema.clone(), rows, Arc::clone(comparator), max_num_rows)
}

/// A segment producer that returns `block` after `delay`.
pub fn segment(
    block: ResultBlock,
    delay: Duration,
) -> impl FnOnce() -> Result<ResultBlock> + Send + 'static {
    move || {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(block)
    }
}
