//! Driving a selection reduction end to end.
//!
//! [`SelectionReducer`] owns the per-query combiner and folds partial blocks
//! into one accumulator:
//!
//! - [`reduce`](SelectionReducer::reduce) folds blocks that are already in
//!   hand, on the calling thread.
//! - [`reduce_segments`](SelectionReducer::reduce_segments) spawns segment
//!   producers on a dedicated rayon pool. Producers only produce; the calling
//!   thread receives their blocks over a channel and merges them in arrival
//!   order, so the accumulator is never shared.
//!
//! Both honor the configured deadline. On expiry the reduction stops, no
//! further producers start, and the partial accumulator travels inside
//! [`MergeError::Timeout`].

use crate::block::ResultBlock;
use crate::combine::{BlockCombiner, OrderedCombiner, UnorderedCombiner};
use crate::comparator::RowComparator;
use crate::config::{ExecMode, MergeConfig};
use crate::datatable::DataTable;
use crate::error::{MergeError, Result};
use crate::expressions::{ExpressionSet, selection_columns};
use crate::merge::MergeStats;
#[cfg(feature = "metrics")]
use crate::metrics::{
    BLOCKS_MERGED, MetricsCollector, ROWS_DISCARDED, ROWS_MERGED, SCHEMA_UPGRADES,
    SEGMENTS_FAILED,
};
use crate::projector::RowProjector;
use crate::query::SelectionQuery;
use crate::row::Row;
use crate::schema::Schema;
use crate::types::ColumnType;
use crate::value::Value;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Instant;

pub struct SelectionReducer {
    combiner: Box<dyn BlockCombiner>,
    config: MergeConfig,
    #[cfg(feature = "metrics")]
    metrics: Option<MetricsCollector>,
}

impl SelectionReducer {
    /// Pick the combiner for `query`: ordered top-K when it has `ORDER BY`,
    /// first-rows-win otherwise. Both keep `offset + limit` rows.
    ///
    /// # Errors
    /// Returns [`MergeError::UnknownColumn`] when an order-by expression is
    /// missing from `expressions`.
    pub fn for_query(
        query: &SelectionQuery,
        expressions: &ExpressionSet,
        config: MergeConfig,
    ) -> Result<Self> {
        let max_num_rows = query.max_num_rows();
        let combiner: Box<dyn BlockCombiner> = if query.has_ordering() {
            let comparator = RowComparator::for_query(query, expressions, config.null_ordering)?;
            Box::new(OrderedCombiner::new(comparator, max_num_rows))
        } else {
            Box::new(UnorderedCombiner::new(max_num_rows))
        };
        Ok(Self::with_combiner(combiner, config))
    }

    #[must_use]
    pub fn with_combiner(combiner: Box<dyn BlockCombiner>, config: MergeConfig) -> Self {
        Self {
            #[cfg(feature = "metrics")]
            metrics: config.collect_metrics.then(MetricsCollector::new),
            combiner,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &MergeConfig {
        &self.config
    }

    #[cfg(feature = "metrics")]
    #[must_use]
    pub const fn metrics(&self) -> Option<&MetricsCollector> {
        self.metrics.as_ref()
    }

    fn accumulator(&self) -> Accumulator<'_> {
        // counters describe the latest reduction only
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.reset();
            metrics.record_start();
        }
        Accumulator {
            combiner: self.combiner.as_ref(),
            acc: None,
            fallback_schema: None,
            blocks_merged: 0,
            deadline: self.config.timeout().map(|t| Instant::now() + t),
            #[cfg(feature = "metrics")]
            metrics: self.metrics.as_ref(),
        }
    }

    /// Fold `blocks` in iteration order.
    ///
    /// # Errors
    /// Merge failures as raised by the combiner, or [`MergeError::Timeout`]
    /// once the deadline has passed before a block could be merged.
    pub fn reduce<I>(&self, blocks: I) -> Result<ReducedSelection>
    where
        I: IntoIterator<Item = ResultBlock>,
    {
        let mut acc = self.accumulator();
        for block in blocks {
            acc.check_deadline()?;
            acc.offer(block)?;
        }
        Ok(acc.finish())
    }

    /// Decode and fold encoded tables.
    ///
    /// # Errors
    /// [`MergeError::Decode`] for a malformed table, otherwise as
    /// [`reduce`](Self::reduce).
    pub fn reduce_tables(&self, tables: &[DataTable]) -> Result<ReducedSelection> {
        let mut acc = self.accumulator();
        for table in tables {
            acc.check_deadline()?;
            acc.offer(table.to_block()?)?;
        }
        Ok(acc.finish())
    }

    /// Run every producer and fold the blocks they return.
    ///
    /// With [`ExecMode::Parallel`] producers run detached on a pool of the
    /// configured size and blocks are merged as they arrive. An abort returns
    /// at once: producers still running are not waited for, their blocks are
    /// dropped, and producers that have not started yet never run.
    ///
    /// # Errors
    /// The first producer error, the first merge failure, or
    /// [`MergeError::Timeout`] when the deadline expires first.
    pub fn reduce_segments<F>(&self, segments: Vec<F>) -> Result<ReducedSelection>
    where
        F: FnOnce() -> Result<ResultBlock> + Send + 'static,
    {
        let threads = match self.config.exec_mode {
            ExecMode::Sequential => return self.reduce_segments_seq(segments),
            mode @ ExecMode::Parallel { .. } => mode.threads(),
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("ironselect-segment-{i}"))
            .panic_handler(|_| tracing::error!("segment producer panicked"))
            .build()
            .map_err(|e| MergeError::Segment(format!("building segment pool: {e}")))?;

        let expected = segments.len();
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel::<Result<ResultBlock>>();
        tracing::debug!(segments = expected, threads, "reducing segments in parallel");

        for produce in segments {
            let tx = tx.clone();
            let cancel = Arc::clone(&cancel);
            pool.spawn(move || {
                if cancel.load(Ordering::Acquire) {
                    return;
                }
                // after an abort nobody reads; the block is dropped with the channel
                let _ = tx.send(produce());
            });
        }
        drop(tx);

        // Returning drops `rx` and `pool`; neither waits for running producers.
        let abort = |err: MergeError| {
            cancel.store(true, Ordering::Release);
            err
        };
        let mut acc = self.accumulator();
        for _ in 0..expected {
            let received = match acc.deadline {
                Some(deadline) => {
                    rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(Ok(block)) => acc.offer(block).map_err(abort)?,
                Ok(Err(err)) => return Err(abort(acc.segment_failed(err))),
                Err(RecvTimeoutError::Timeout) => return Err(abort(acc.timeout())),
                Err(RecvTimeoutError::Disconnected) => {
                    let lost =
                        MergeError::Segment("segment producer exited without a block".into());
                    return Err(abort(acc.segment_failed(lost)));
                }
            }
        }
        Ok(acc.finish())
    }

    fn reduce_segments_seq<F>(&self, segments: Vec<F>) -> Result<ReducedSelection>
    where
        F: FnOnce() -> Result<ResultBlock>,
    {
        let mut acc = self.accumulator();
        for produce in segments {
            acc.check_deadline()?;
            match produce() {
                Ok(block) => acc.offer(block)?,
                Err(err) => return Err(acc.segment_failed(err)),
            }
        }
        Ok(acc.finish())
    }
}

impl std::fmt::Debug for SelectionReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionReducer")
            .field("max_num_rows", &self.combiner.max_num_rows())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/* ===== Accumulation state for one reduction ===== */

struct Accumulator<'a> {
    combiner: &'a dyn BlockCombiner,
    acc: Option<ResultBlock>,
    /// Schema of the first empty block, reported when nothing else arrives.
    fallback_schema: Option<Schema>,
    blocks_merged: usize,
    deadline: Option<Instant>,
    #[cfg(feature = "metrics")]
    metrics: Option<&'a MetricsCollector>,
}

impl Accumulator<'_> {
    #[cfg(feature = "metrics")]
    fn record(&self, name: &str, by: usize) {
        if let Some(metrics) = self.metrics {
            metrics.increment_counter(name, by as u64);
        }
    }

    fn record_stats(&self, stats: &MergeStats) {
        #[cfg(feature = "metrics")]
        {
            self.record(BLOCKS_MERGED, 1);
            self.record(ROWS_MERGED, stats.rows_in);
            self.record(ROWS_DISCARDED, stats.rows_discarded);
            self.record(SCHEMA_UPGRADES, usize::from(stats.schema_upgraded));
        }
        tracing::trace!(
            rows_in = stats.rows_in,
            rows_kept = stats.rows_kept,
            rows_discarded = stats.rows_discarded,
            schema_upgraded = stats.schema_upgraded,
            "merged block"
        );
    }

    /// Empty blocks carry no rows to reconcile, so their schema is never
    /// checked against the accumulator.
    fn offer(&mut self, block: ResultBlock) -> Result<()> {
        if block.is_empty() {
            tracing::trace!(schema = %block.schema(), "skipping empty block");
            if self.fallback_schema.is_none() && !block.schema().is_placeholder() {
                self.fallback_schema = Some(block.schema().clone());
            }
            return Ok(());
        }
        let acc = match &mut self.acc {
            Some(acc) => acc,
            slot @ None => slot.insert(self.combiner.create(block.schema().clone())?),
        };
        let stats = self.combiner.merge(acc, block)?;
        self.blocks_merged += 1;
        self.record_stats(&stats);
        Ok(())
    }

    fn check_deadline(&mut self) -> Result<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(self.timeout()),
            _ => Ok(()),
        }
    }

    fn timeout(&mut self) -> MergeError {
        tracing::warn!(blocks_merged = self.blocks_merged, "selection reduction timed out");
        self.end_timing();
        MergeError::Timeout {
            blocks_merged: self.blocks_merged,
            partial: self.acc.take().map(Box::new),
        }
    }

    fn segment_failed(&self, err: MergeError) -> MergeError {
        tracing::warn!(error = %err, blocks_merged = self.blocks_merged, "segment failed");
        #[cfg(feature = "metrics")]
        self.record(SEGMENTS_FAILED, 1);
        self.end_timing();
        err
    }

    fn end_timing(&self) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = self.metrics {
            metrics.record_end();
        }
    }

    fn finish(self) -> ReducedSelection {
        self.end_timing();
        #[cfg(feature = "metrics")]
        if let Some(metrics) = self.metrics {
            metrics.log();
        }
        let blocks_merged = self.blocks_merged;
        let (schema, rows) = match self.acc {
            Some(acc) => self.combiner.finish(acc),
            None => (self.fallback_schema.unwrap_or_else(Schema::placeholder), Vec::new()),
        };
        tracing::debug!(blocks_merged, rows = rows.len(), schema = %schema, "selection reduced");
        ReducedSelection {
            schema,
            rows,
            blocks_merged,
        }
    }
}

/* ===== Reduced output ===== */

/// Finalized rows under the unified schema, before offset and projection.
#[derive(Clone, Debug)]
pub struct ReducedSelection {
    schema: Schema,
    rows: Vec<Row>,
    blocks_merged: usize,
}

impl ReducedSelection {
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Rows in output order, not yet cast to the schema.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Non-empty blocks that were merged.
    #[must_use]
    pub const fn blocks_merged(&self) -> usize {
        self.blocks_merged
    }

    /// Every row cast to the unified schema.
    ///
    /// # Errors
    /// See [`RowProjector::project_row`].
    pub fn project(&self) -> Result<Vec<Row>> {
        RowProjector::new(&self.schema).project(&self.rows)
    }

    /// Encode the reduced rows as a table.
    ///
    /// # Errors
    /// See [`DataTable::from_rows`].
    pub fn to_data_table(&self) -> Result<DataTable> {
        DataTable::from_rows(&self.schema, &self.rows)
    }

    /// Apply `offset` and `limit`, cast, and keep only the query's output
    /// columns.
    ///
    /// # Errors
    /// [`MergeError::UnknownColumn`] when an output column is not in the
    /// schema, or a projection failure.
    pub fn into_result_table(self, query: &SelectionQuery) -> Result<ResultTable> {
        if self.schema.is_placeholder() {
            return Ok(ResultTable {
                columns: self.schema.column_names().to_vec(),
                column_types: self.schema.column_types().to_vec(),
                rows: Vec::new(),
            });
        }

        let columns = selection_columns(query, &self.schema);
        let indices = columns
            .iter()
            .map(|name| {
                self.schema
                    .column_index(name)
                    .ok_or_else(|| MergeError::UnknownColumn(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        let column_types = indices
            .iter()
            .filter_map(|i| self.schema.column_type(*i))
            .collect();

        let projector = RowProjector::new(&self.schema);
        let rows = self
            .rows
            .iter()
            .skip(query.offset())
            .take(query.limit())
            .map(|row| {
                let row = projector.project_row(row)?;
                Ok(indices.iter().map(|i| row[*i].clone()).collect())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ResultTable {
            columns,
            column_types,
            rows,
        })
    }
}

/// The final, client-facing selection result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as JSON.
    ///
    /// # Errors
    /// Fails only if a value cannot be represented in JSON.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
