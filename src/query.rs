//! Selection query context: expressions, ordering, limit and offset.
//!
//! Planning lives outside this crate. What arrives here is the select list,
//! the order-by list and the row window; [`Expression::parse`] accepts the
//! call syntax planners render (`add(foo, 1)`) so callers and tests can build
//! queries from text.

use crate::error::{MergeError, Result};
use sqlparser::ast::{
    Expr as SqlExpr, FunctionArg, FunctionArgExpr, FunctionArguments, UnaryOperator,
    Value as SqlValue,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::Token;
use std::fmt;

/// Row window applied when the caller does not set one.
pub const DEFAULT_LIMIT: usize = 10;

const WILDCARD: &str = "*";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expression {
    Identifier(String),
    Literal(String),
    Function { name: String, args: Vec<Expression> },
}

impl Expression {
    #[must_use]
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Function names are case-insensitive and canonicalized to lower case.
    #[must_use]
    pub fn function(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Function {
            name: name.into().to_ascii_lowercase(),
            args,
        }
    }

    #[must_use]
    pub fn wildcard() -> Self {
        Self::Identifier(WILDCARD.to_string())
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Identifier(name) if name == WILDCARD)
    }

    /// True for anything other than a plain column reference.
    #[must_use]
    pub const fn is_transform(&self) -> bool {
        !matches!(self, Self::Identifier(_))
    }

    /// Parse the textual call syntax.
    ///
    /// # Errors
    /// Returns [`MergeError::InvalidExpression`] on malformed input.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim() == WILDCARD {
            return Ok(Self::wildcard());
        }
        with_parser(text, |parser| Self::from_sql(&parser.parse_expr()?))
    }

    fn from_sql(expr: &SqlExpr) -> Result<Self, ParserError> {
        match expr {
            SqlExpr::Identifier(ident) => Ok(Self::Identifier(ident.value.clone())),
            SqlExpr::CompoundIdentifier(parts) => Ok(Self::Identifier(
                parts
                    .iter()
                    .map(|ident| ident.value.as_str())
                    .collect::<Vec<_>>()
                    .join("."),
            )),
            SqlExpr::Wildcard(_) => Ok(Self::wildcard()),
            SqlExpr::Nested(inner) => Self::from_sql(inner),
            SqlExpr::Value(value) => match &value.value {
                SqlValue::Number(number, _) => Ok(Self::Literal(number.clone())),
                SqlValue::SingleQuotedString(text) => Ok(Self::Literal(text.clone())),
                SqlValue::Boolean(flag) => Ok(Self::Literal(flag.to_string())),
                // `$docId` style virtual columns tokenize as placeholders
                SqlValue::Placeholder(name) => Ok(Self::Identifier(name.clone())),
                other => Err(unsupported(format!("literal {other}"))),
            },
            SqlExpr::UnaryOp {
                op: op @ (UnaryOperator::Minus | UnaryOperator::Plus),
                expr: operand,
            } => match Self::from_sql(operand)? {
                Self::Literal(number) if matches!(op, UnaryOperator::Minus) => {
                    Ok(Self::Literal(format!("-{number}")))
                }
                literal @ Self::Literal(_) => Ok(literal),
                _ => Err(unsupported(format!("unary {op} on a non-literal"))),
            },
            SqlExpr::Function(func) => {
                let args = match &func.args {
                    FunctionArguments::None => Vec::new(),
                    FunctionArguments::List(list) => list
                        .args
                        .iter()
                        .map(|arg| match arg {
                            FunctionArg::Unnamed(FunctionArgExpr::Expr(arg)) => Self::from_sql(arg),
                            FunctionArg::Unnamed(FunctionArgExpr::Wildcard) => Ok(Self::wildcard()),
                            other => Err(unsupported(format!("argument {other}"))),
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    FunctionArguments::Subquery(_) => {
                        return Err(unsupported("subquery arguments".to_string()));
                    }
                };
                Ok(Self::function(func.name.to_string(), args))
            }
            other => Err(unsupported(format!("expression {other}"))),
        }
    }
}

fn unsupported(what: String) -> ParserError {
    ParserError::ParserError(format!("unsupported {what}"))
}

/// Run `parse` over `text` and require it to consume the whole input.
fn with_parser<T>(
    text: &str,
    parse: impl FnOnce(&mut Parser<'_>) -> Result<T, ParserError>,
) -> Result<T> {
    let invalid = |err: ParserError| MergeError::InvalidExpression {
        text: text.to_string(),
        reason: err.to_string(),
    };
    let dialect = GenericDialect {};
    let mut parser = Parser::new(&dialect).try_with_sql(text).map_err(invalid)?;
    let value = parse(&mut parser).map_err(invalid)?;
    parser.expect_token(&Token::EOF).map_err(invalid)?;
    Ok(value)
}

/// Canonical rendering: no whitespace, literals single-quoted.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(name) => f.write_str(name),
            Self::Literal(value) => write!(f, "'{}'", value.replace('\'', "''")),
            Self::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// An order-by key. Direction does not take part in the canonical form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OrderByExpression {
    pub expression: Expression,
    pub ascending: bool,
}

impl OrderByExpression {
    #[must_use]
    pub const fn asc(expression: Expression) -> Self {
        Self {
            expression,
            ascending: true,
        }
    }

    #[must_use]
    pub const fn desc(expression: Expression) -> Self {
        Self {
            expression,
            ascending: false,
        }
    }

    /// Parse `expr [ASC|DESC]`.
    ///
    /// # Errors
    /// Returns [`MergeError::InvalidExpression`] on malformed input.
    pub fn parse(text: &str) -> Result<Self> {
        with_parser(text, |parser| {
            let expression = Expression::from_sql(&parser.parse_expr()?)?;
            let ascending = parser.parse_one_of_keywords(&[Keyword::ASC, Keyword::DESC])
                != Some(Keyword::DESC);
            Ok(Self {
                expression,
                ascending,
            })
        })
    }
}

impl fmt::Display for OrderByExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.ascending { "ASC" } else { "DESC" };
        write!(f, "{} {dir}", self.expression)
    }
}

/// Everything the merge core needs to know about a selection query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionQuery {
    select: Vec<Expression>,
    order_by: Vec<OrderByExpression>,
    limit: usize,
    offset: usize,
}

impl SelectionQuery {
    #[must_use]
    pub const fn new(select: Vec<Expression>) -> Self {
        Self {
            select,
            order_by: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    /// Build from textual select expressions.
    ///
    /// # Errors
    /// Returns [`MergeError::InvalidExpression`] if any expression is malformed.
    pub fn parse(select: &[&str]) -> Result<Self> {
        let select = select
            .iter()
            .map(|s| Expression::parse(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(select))
    }

    /// Append textual order-by keys (`expr [ASC|DESC]`).
    ///
    /// # Errors
    /// Returns [`MergeError::InvalidExpression`] if any key is malformed.
    pub fn order_by(mut self, keys: &[&str]) -> Result<Self> {
        for key in keys {
            self.order_by.push(OrderByExpression::parse(key)?);
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_order_by(mut self, order_by: Vec<OrderByExpression>) -> Self {
        self.order_by = order_by;
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub const fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn select_expressions(&self) -> &[Expression] {
        &self.select
    }

    #[must_use]
    pub fn order_by_expressions(&self) -> &[OrderByExpression] {
        &self.order_by
    }

    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Rows each merge step must retain: `offset + limit`.
    #[must_use]
    pub const fn max_num_rows(&self) -> usize {
        self.offset.saturating_add(self.limit)
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.select.len() == 1 && self.select[0].is_wildcard()
    }

    #[must_use]
    pub fn has_ordering(&self) -> bool {
        !self.order_by.is_empty()
    }
}
