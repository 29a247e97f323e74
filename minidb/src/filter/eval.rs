use crate::common::{compare_numbers, Value};
use crate::filter::ast::{Accessor, CmpOp, Expr, Literal, Operand, Path, PathRoot};
use std::borrow::Cow;
use std::cmp::Ordering;

/// The result of evaluating an operand: a value, or `Undefined` when a path
/// does not exist.
#[derive(Debug, PartialEq)]
enum Resolved<'a> {
    Undefined,
    Value(Cow<'a, Value>),
}

impl Resolved<'_> {
    fn value(&self) -> Option<&Value> {
        match self {
            Resolved::Undefined => None,
            Resolved::Value(v) => Some(v.as_ref()),
        }
    }

    fn is_truthy(&self) -> bool {
        self.value().map(Value::is_truthy).unwrap_or(false)
    }
}

/// Evaluates an expression against one record and its position.
pub(crate) fn evaluate(expr: &Expr, record: &Value, index: usize) -> bool {
    match expr {
        Expr::And(terms) => terms.iter().all(|t| evaluate(t, record, index)),
        Expr::Or(terms) => terms.iter().any(|t| evaluate(t, record, index)),
        Expr::Not(inner) => !evaluate(inner, record, index),
        Expr::Compare { op, left, right } => {
            let left = resolve(left, record, index);
            let right = resolve(right, record, index);
            compare(*op, &left, &right)
        }
        Expr::Truthy(operand) => resolve(operand, record, index).is_truthy(),
    }
}

fn resolve<'a>(operand: &'a Operand, record: &'a Value, index: usize) -> Resolved<'a> {
    match operand {
        Operand::Path(path) => resolve_path(path, record, index),
        Operand::Literal(Literal::Undefined) => Resolved::Undefined,
        Operand::Literal(Literal::Value(v)) => Resolved::Value(Cow::Borrowed(v)),
        Operand::Group(expr) => {
            Resolved::Value(Cow::Owned(Value::Bool(evaluate(expr, record, index))))
        }
    }
}

fn resolve_path<'a>(path: &'a Path, record: &'a Value, index: usize) -> Resolved<'a> {
    let mut current: Cow<'a, Value> = match path.root {
        PathRoot::Record => Cow::Borrowed(record),
        PathRoot::Index => Cow::Owned(Value::from(index)),
    };

    for accessor in &path.accessors {
        let next = match current {
            Cow::Borrowed(value) => step(value, accessor),
            // only `#` is owned and numbers have no members
            Cow::Owned(_) => None,
        };
        match next {
            Some(value) => current = Cow::Borrowed(value),
            None => return Resolved::Undefined,
        }
    }
    Resolved::Value(current)
}

fn step<'a>(value: &'a Value, accessor: &Accessor) -> Option<&'a Value> {
    match (value, accessor) {
        (Value::Document(doc), Accessor::Field(name)) => doc.get(name),
        (Value::Document(doc), Accessor::Position(n)) => doc.get(&n.to_string()),
        (Value::Array(items), Accessor::Position(n)) => items.get(*n),
        _ => None,
    }
}

fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => compare_numbers(left, right),
    }
}

fn compare(op: CmpOp, left: &Resolved, right: &Resolved) -> bool {
    match op {
        CmpOp::Eq => equals(left, right),
        CmpOp::Ne => !equals(left, right),
        _ => {
            let order = match (left.value(), right.value()) {
                (Some(l), Some(r)) => ordering(l, r),
                _ => None,
            };
            match (op, order) {
                (_, None) => false,
                (CmpOp::Lt, Some(o)) => o == Ordering::Less,
                (CmpOp::Le, Some(o)) => o != Ordering::Greater,
                (CmpOp::Gt, Some(o)) => o == Ordering::Greater,
                (CmpOp::Ge, Some(o)) => o != Ordering::Less,
                _ => false,
            }
        }
    }
}

fn equals(left: &Resolved, right: &Resolved) -> bool {
    match (left.value(), right.value()) {
        (None, None) => true,
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}
