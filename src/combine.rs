//! Combiners that fold segment blocks into one accumulator.
//!
//! A [`BlockCombiner`] follows the create / merge / finish shape: the
//! reducer creates an accumulator from the first block's schema, merges every
//! further block into it, and finishes it into output rows.
//!
//! - [`UnorderedCombiner`]: first sufficient rows win.
//! - [`OrderedCombiner`]: bounded top-K under the query's comparator.

use crate::block::ResultBlock;
use crate::comparator::RowComparator;
use crate::error::Result;
use crate::merge::{MergeStats, merge_with_ordering, merge_without_ordering};
use crate::row::Row;
use crate::schema::Schema;
use std::sync::Arc;

pub trait BlockCombiner: Send + Sync {
    /// An empty accumulator for blocks shaped like `schema`.
    ///
    /// # Errors
    /// Combiners may reject schemas they cannot accumulate.
    fn create(&self, schema: Schema) -> Result<ResultBlock>;

    /// Fold `block` into `acc`.
    ///
    /// # Errors
    /// Propagates merge failures; `acc` is left consistent.
    fn merge(&self, acc: &mut ResultBlock, block: ResultBlock) -> Result<MergeStats>;

    /// Rows in output order.
    fn finish(&self, acc: ResultBlock) -> (Schema, Vec<Row>) {
        acc.into_parts()
    }

    /// Row bound every merge step keeps.
    fn max_num_rows(&self) -> usize;
}

#[derive(Clone, Copy, Debug)]
pub struct UnorderedCombiner {
    pub max_num_rows: usize,
}

impl UnorderedCombiner {
    #[must_use]
    pub const fn new(max_num_rows: usize) -> Self {
        Self { max_num_rows }
    }
}

impl BlockCombiner for UnorderedCombiner {
    fn create(&self, schema: Schema) -> Result<ResultBlock> {
        Ok(ResultBlock::new(schema, Vec::new()))
    }

    fn merge(&self, acc: &mut ResultBlock, block: ResultBlock) -> Result<MergeStats> {
        merge_without_ordering(acc, block, self.max_num_rows)
    }

    fn max_num_rows(&self) -> usize {
        self.max_num_rows
    }
}

#[derive(Clone, Debug)]
pub struct OrderedCombiner {
    comparator: Arc<RowComparator>,
    max_num_rows: usize,
}

impl OrderedCombiner {
    #[must_use]
    pub fn new(comparator: RowComparator, max_num_rows: usize) -> Self {
        Self {
            comparator: Arc::new(comparator),
            max_num_rows,
        }
    }

    #[must_use]
    pub const fn comparator(&self) -> &Arc<RowComparator> {
        &self.comparator
    }
}

impl BlockCombiner for OrderedCombiner {
    fn create(&self, schema: Schema) -> Result<ResultBlock> {
        self.comparator.validate(&schema)?;
        Ok(ResultBlock::ordered(
            schema,
            Arc::clone(&self.comparator),
            self.max_num_rows,
        ))
    }

    fn merge(&self, acc: &mut ResultBlock, block: ResultBlock) -> Result<MergeStats> {
        merge_with_ordering(acc, block, self.max_num_rows)
    }

    fn max_num_rows(&self) -> usize {
        self.max_num_rows
    }
}
