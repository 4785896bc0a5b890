//! Canonical evaluation order for a selection query.
//!
//! Segments evaluate, and the coordinator merges, one column per entry of the
//! [`ExpressionSet`]: order-by expressions first, then the select list (or, for
//! `SELECT *`, every physical column in lexicographic order). Entries are
//! deduplicated by canonical string; a repeat keeps the first position.

use crate::error::{MergeError, Result};
use crate::query::{Expression, SelectionQuery};
use crate::schema::{PLACEHOLDER_COLUMN, Schema};
use crate::types::ColumnType;
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpressionSet {
    expressions: Vec<Expression>,
}

impl ExpressionSet {
    /// Extract the deduplicated evaluation order.
    ///
    /// `physical_columns` is only consulted for wildcard queries and may be
    /// given in any order.
    pub fn extract<S: AsRef<str>>(query: &SelectionQuery, physical_columns: &[S]) -> Self {
        let mut seen = HashSet::new();
        let mut expressions = Vec::new();
        let mut push = |expr: Expression| {
            if seen.insert(expr.to_string()) {
                expressions.push(expr);
            }
        };

        for order_by in query.order_by_expressions() {
            push(order_by.expression.clone());
        }
        if query.is_wildcard() {
            let mut columns: Vec<&str> = physical_columns.iter().map(AsRef::as_ref).collect();
            columns.sort_unstable();
            for column in columns {
                push(Expression::identifier(column));
            }
        } else {
            for expr in query.select_expressions() {
                push(expr.clone());
            }
        }

        Self { expressions }
    }

    #[must_use]
    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Canonical strings in evaluation order. These are the column names of
    /// every block produced for this query.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.expressions.iter().map(ToString::to_string).collect()
    }

    /// Position of `expr` in evaluation order.
    #[must_use]
    pub fn position(&self, expr: &Expression) -> Option<usize> {
        self.expressions.iter().position(|e| e == expr)
    }

    /// Index of each order-by expression of `query` in evaluation order.
    ///
    /// # Errors
    /// Returns [`MergeError::UnknownColumn`] for an order-by expression this
    /// set was not extracted with.
    pub fn order_by_positions(&self, query: &SelectionQuery) -> Result<Vec<usize>> {
        query
            .order_by_expressions()
            .iter()
            .map(|ob| {
                self.position(&ob.expression)
                    .ok_or_else(|| MergeError::UnknownColumn(ob.expression.to_string()))
            })
            .collect()
    }

    /// The evaluation schema given one type per expression.
    ///
    /// # Errors
    /// Returns [`MergeError::RowArity`] when `types` does not have one
    /// entry per expression.
    pub fn evaluation_schema(&self, types: &[ColumnType]) -> Result<Schema> {
        Schema::new(self.column_names(), types.to_vec())
    }
}

/// Output column names for a reduced result.
///
/// Non-wildcard queries show their select list verbatim. `SELECT *` shows the
/// schema's plain columns (transform expressions pulled in by `ORDER BY` are
/// hidden) in lexicographic order. The placeholder schema yields `["*"]`.
#[must_use]
pub fn selection_columns(query: &SelectionQuery, schema: &Schema) -> Vec<String> {
    if schema.is_placeholder() {
        return vec![PLACEHOLDER_COLUMN.to_string()];
    }
    if query.is_wildcard() {
        let mut columns: Vec<String> = schema
            .column_names()
            .iter()
            .filter(|name| !is_transform_column(name))
            .cloned()
            .collect();
        columns.sort_unstable();
        columns
    } else {
        query
            .select_expressions()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

// canonical function calls always end in ')'
fn is_transform_column(name: &str) -> bool {
    name.ends_with(')')
}
