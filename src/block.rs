//! Partial and accumulating result blocks.

use crate::comparator::RowComparator;
use crate::row::Row;
use crate::schema::Schema;
use crate::topk::TopKHeap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub(crate) enum RowSet {
    Unordered(Vec<Row>),
    /// Bounded top-K, still accepting rows.
    Ordered {
        heap: TopKHeap<Row>,
        comparator: Arc<RowComparator>,
    },
    /// Drained into output order.
    Sorted {
        rows: Vec<Row>,
        comparator: Arc<RowComparator>,
    },
}

/// A top-K heap of rows ordered by `comparator`.
pub(crate) fn row_heap(comparator: &Arc<RowComparator>, max_num_rows: usize) -> TopKHeap<Row> {
    let comparator = Arc::clone(comparator);
    TopKHeap::new(max_num_rows, move |a: &Row, b: &Row| comparator.compare(a, b))
}

/// A schema plus the rows produced (or accumulated) under it.
///
/// Blocks without ordering keep rows in arrival order. Ordered blocks keep a
/// bounded top-K until [`finalize`](Self::finalize) drains it into output
/// order.
#[derive(Clone, Debug)]
pub struct ResultBlock {
    schema: Schema,
    pub(crate) rows: RowSet,
}

impl ResultBlock {
    /// An unordered block.
    #[must_use]
    pub const fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self {
            schema,
            rows: RowSet::Unordered(rows),
        }
    }

    /// An empty ordered block retaining at most `max_num_rows` rows.
    #[must_use]
    pub fn ordered(schema: Schema, comparator: Arc<RowComparator>, max_num_rows: usize) -> Self {
        Self {
            schema,
            rows: RowSet::Ordered {
                heap: row_heap(&comparator, max_num_rows),
                comparator,
            },
        }
    }

    /// An ordered block holding the best `max_num_rows` of `rows`, the way a
    /// segment trims its own output before handing it over.
    #[must_use]
    pub fn ordered_from_rows(
        schema: Schema,
        rows: Vec<Row>,
        comparator: Arc<RowComparator>,
        max_num_rows: usize,
    ) -> Self {
        let mut heap = row_heap(&comparator, max_num_rows);
        for row in rows {
            heap.offer(row);
        }
        Self {
            schema,
            rows: RowSet::Ordered { heap, comparator },
        }
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn set_schema(&mut self, schema: Schema) {
        self.schema = schema;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.rows {
            RowSet::Unordered(rows) | RowSet::Sorted { rows, .. } => rows.len(),
            RowSet::Ordered { heap, .. } => heap.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        !matches!(self.rows, RowSet::Unordered(_))
    }

    #[must_use]
    pub const fn comparator(&self) -> Option<&Arc<RowComparator>> {
        match &self.rows {
            RowSet::Unordered(_) => None,
            RowSet::Ordered { comparator, .. } | RowSet::Sorted { comparator, .. } => {
                Some(comparator)
            }
        }
    }

    /// Rows in output order.
    ///
    /// For an ordered block the first call drains the top-K heap; later calls
    /// return the same slice.
    pub fn finalize(&mut self) -> &[Row] {
        let rows = std::mem::replace(&mut self.rows, RowSet::Unordered(Vec::new()));
        self.rows = match rows {
            RowSet::Ordered {
                mut heap,
                comparator,
            } => {
                let rows = heap.drain_sorted();
                RowSet::Sorted { rows, comparator }
            }
            other => other,
        };
        match &self.rows {
            RowSet::Unordered(rows) | RowSet::Sorted { rows, .. } => rows,
            RowSet::Ordered { .. } => &[],
        }
    }

    /// Consume the block, yielding rows in output order.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.into_parts().1
    }

    /// Consume the block, yielding the schema and rows in output order.
    #[must_use]
    pub fn into_parts(mut self) -> (Schema, Vec<Row>) {
        self.finalize();
        let rows = match self.rows {
            RowSet::Unordered(rows) | RowSet::Sorted { rows, .. } => rows,
            RowSet::Ordered { .. } => Vec::new(),
        };
        (self.schema, rows)
    }
}
