//! Folding one partial block into an accumulating target.
//!
//! Both strategies first reconcile schemas: the source must be positionally
//! type-compatible with the target, and the target's schema becomes
//! [`Schema::upgrade_to_cover`] of the two. Rows already in the target are not
//! recast; the projector casts everything once at output time.
//!
//! - [`merge_without_ordering`] appends source rows in source order until the
//!   target holds `max_num_rows`. Any such subset is a valid answer to a query
//!   without `ORDER BY`.
//! - [`merge_with_ordering`] offers each source row to the target's bounded
//!   top-K, O(n log k) for `n` source rows.

use crate::block::{ResultBlock, RowSet, row_heap};
use crate::error::{MergeError, Result};
use crate::schema::Schema;
use crate::topk::Offer;

/// What one merge call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Rows offered by the source.
    pub rows_in: usize,
    /// Source rows admitted to the target. In an ordered merge a later row of
    /// the same source may evict an admitted one again.
    pub rows_kept: usize,
    /// Rows dropped by this call, from the source or evicted from the target.
    pub rows_discarded: usize,
    /// Whether the target schema changed.
    pub schema_upgraded: bool,
}

fn reconcile(target: &mut ResultBlock, source: &Schema) -> Result<bool> {
    if !target.schema().is_type_compatible_with(source) {
        return Err(MergeError::SchemaMismatch {
            left: target.schema().to_string(),
            right: source.to_string(),
        });
    }
    let upgraded = Schema::upgrade_to_cover(target.schema(), source)?;
    if &upgraded == target.schema() {
        return Ok(false);
    }
    tracing::debug!(from = %target.schema(), to = %upgraded, "upgraded merge target schema");
    target.set_schema(upgraded);
    Ok(true)
}

/// Append `source` rows onto an unordered `target`, stopping at
/// `max_num_rows`.
///
/// # Errors
/// [`MergeError::SchemaMismatch`] when the schemas are not type-compatible,
/// [`MergeError::StrategyMismatch`] when `target` is ordered.
pub fn merge_without_ordering(
    target: &mut ResultBlock,
    source: ResultBlock,
    max_num_rows: usize,
) -> Result<MergeStats> {
    if target.is_ordered() {
        return Err(MergeError::StrategyMismatch(
            "unordered merge into an ordered block".to_string(),
        ));
    }
    let (source_schema, source_rows) = source.into_parts();
    let schema_upgraded = reconcile(target, &source_schema)?;

    let RowSet::Unordered(rows) = &mut target.rows else {
        return Err(MergeError::StrategyMismatch(
            "unordered merge into an ordered block".to_string(),
        ));
    };
    let rows_in = source_rows.len();
    let room = max_num_rows.saturating_sub(rows.len());
    let rows_kept = room.min(rows_in);
    rows.extend(source_rows.into_iter().take(rows_kept));

    Ok(MergeStats {
        rows_in,
        rows_kept,
        rows_discarded: rows_in - rows_kept,
        schema_upgraded,
    })
}

/// Offer every `source` row to the bounded top-K held by `target`.
///
/// A row enters only if the target has room or it ranks strictly ahead of the
/// current worst row, which it then evicts. Source rows are offered in the
/// source's own output order, so exact ties resolve first-seen-wins.
///
/// A target that was already finalized goes back to accepting rows; its
/// retained rows keep their relative order.
///
/// # Errors
/// [`MergeError::SchemaMismatch`] when the schemas are not type-compatible,
/// [`MergeError::StrategyMismatch`] when `target` has no ordering.
pub fn merge_with_ordering(
    target: &mut ResultBlock,
    source: ResultBlock,
    max_num_rows: usize,
) -> Result<MergeStats> {
    let Some(comparator) = target.comparator().cloned() else {
        return Err(MergeError::StrategyMismatch(
            "ordered merge into a block without ordering".to_string(),
        ));
    };
    let (source_schema, source_rows) = source.into_parts();
    let schema_upgraded = reconcile(target, &source_schema)?;

    let mut rows_discarded = 0;

    if let RowSet::Sorted { rows, .. } = &mut target.rows {
        let mut heap = row_heap(&comparator, max_num_rows);
        for row in std::mem::take(rows) {
            if !matches!(heap.offer(row), Offer::Inserted) {
                rows_discarded += 1;
            }
        }
        target.rows = RowSet::Ordered { heap, comparator };
    }
    let RowSet::Ordered { heap, .. } = &mut target.rows else {
        return Err(MergeError::StrategyMismatch(
            "ordered merge into a block without ordering".to_string(),
        ));
    };
    if heap.capacity() != max_num_rows {
        rows_discarded += heap.set_capacity(max_num_rows).len();
    }

    let rows_in = source_rows.len();
    let mut rows_rejected = 0;
    for row in source_rows {
        match heap.offer(row) {
            Offer::Inserted => {}
            Offer::Replaced(_) => rows_discarded += 1,
            Offer::Rejected(_) => rows_rejected += 1,
        }
    }
    rows_discarded += rows_rejected;

    Ok(MergeStats {
        rows_in,
        rows_kept: rows_in - rows_rejected,
        rows_discarded,
        schema_upgraded,
    })
}
