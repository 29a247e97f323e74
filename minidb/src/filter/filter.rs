use crate::common::Value;
use crate::errors::MiniDbResult;
use crate::filter::ast::{Expr, Literal, Operand};
use crate::filter::eval::evaluate;
use crate::filter::parser::parse;
use crate::filter::DEFAULT_MAX_FILTER_DEPTH;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// A compiled filter predicate.
///
/// A `Filter` is parsed once from its text and can then be evaluated against
/// any number of records. It is an immutable, cheaply clonable handle; clones
/// share the same expression tree.
///
/// The match-all filter (see [all]) has no expression and accepts every
/// record.
///
/// # Examples
///
/// ```rust
/// use minidb::doc;
/// use minidb::common::Value;
/// use minidb::filter::Filter;
///
/// let filter = Filter::parse("$.age > 30 && # < 10").unwrap();
/// let record = Value::from(doc! { name: "Jim", age: 35 });
///
/// assert!(filter.matches(&record, 0));
/// assert!(!filter.matches(&record, 10));
/// ```
#[derive(Clone)]
pub struct Filter {
    inner: Arc<FilterInner>,
}

struct FilterInner {
    expr: Option<Expr>,
}

impl Filter {
    fn from_expr(expr: Option<Expr>) -> Self {
        Filter {
            inner: Arc::new(FilterInner { expr }),
        }
    }

    /// Parses filter text into a compiled filter.
    ///
    /// Empty or whitespace-only text produces the match-all filter.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::ParseError](crate::errors::ErrorKind::ParseError)
    /// when the text does not follow the filter grammar. The message includes
    /// the byte offset of the offending token.
    pub fn parse(text: &str) -> MiniDbResult<Filter> {
        Filter::parse_with_depth(text, DEFAULT_MAX_FILTER_DEPTH)
    }

    /// Parses filter text, failing when `!` or parentheses nest deeper than
    /// `max_depth`.
    pub fn parse_with_depth(text: &str, max_depth: usize) -> MiniDbResult<Filter> {
        let expr = parse(text, max_depth)?;
        Ok(Filter::from_expr(expr))
    }

    /// Tests a record at position `index` of its collection.
    ///
    /// Evaluation never fails: missing paths resolve to `undefined` and
    /// comparisons between incompatible values are simply false.
    pub fn matches(&self, record: &Value, index: usize) -> bool {
        match &self.inner.expr {
            Some(expr) => evaluate(expr, record, index),
            None => true,
        }
    }

    /// Returns `true` if this filter accepts every record.
    pub fn is_match_all(&self) -> bool {
        self.inner.expr.is_none()
    }

    /// Combines this filter with another using logical AND.
    pub fn and(&self, other: &Filter) -> Filter {
        match (&self.inner.expr, &other.inner.expr) {
            (None, _) => other.clone(),
            (_, None) => self.clone(),
            (Some(left), Some(right)) => {
                let mut terms = Vec::new();
                for expr in [left, right] {
                    match expr {
                        Expr::And(inner) => terms.extend(inner.iter().cloned()),
                        single => terms.push(single.clone()),
                    }
                }
                Filter::from_expr(Some(Expr::And(terms)))
            }
        }
    }

    /// Combines this filter with another using logical OR.
    pub fn or(&self, other: &Filter) -> Filter {
        match (&self.inner.expr, &other.inner.expr) {
            (None, _) | (_, None) => all(),
            (Some(left), Some(right)) => {
                let mut terms = Vec::new();
                for expr in [left, right] {
                    match expr {
                        Expr::Or(inner) => terms.extend(inner.iter().cloned()),
                        single => terms.push(single.clone()),
                    }
                }
                Filter::from_expr(Some(Expr::Or(terms)))
            }
        }
    }

    /// Negates this filter. The negation of the match-all filter matches
    /// nothing.
    pub fn not(&self) -> Filter {
        let inner = match &self.inner.expr {
            Some(expr) => expr.clone(),
            None => Expr::Truthy(Operand::Literal(Literal::Value(Value::Bool(true)))),
        };
        Filter::from_expr(Some(Expr::Not(Box::new(inner))))
    }

    #[cfg(test)]
    pub(crate) fn same_as(&self, other: &Filter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Display for Filter {
    /// Writes the filter in canonical filter syntax; the output parses back
    /// to an equivalent filter. The match-all filter is written as an empty
    /// string.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.inner.expr {
            Some(expr) => write!(f, "{}", expr),
            None => Ok(()),
        }
    }
}

impl Debug for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Filter({})", self)
    }
}

/// Creates a filter that matches all records.
///
/// # Examples
///
/// ```rust
/// use minidb::common::Value;
/// use minidb::filter;
///
/// assert!(filter::all().matches(&Value::Null, 42));
/// ```
pub fn all() -> Filter {
    Filter::from_expr(None)
}

/// Compiles filter text. Same as [Filter::parse].
pub fn compile(text: &str) -> MiniDbResult<Filter> {
    Filter::parse(text)
}
