use crate::common::Value;
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

/// Comparison operators. `===` and `!==` parse to `Eq` and `Ne`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Display for CmpOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        };
        write!(f, "{}", op)
    }
}

/// Where a path starts: the record (`$`) or its position (`#`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRoot {
    Record,
    Index,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    /// `.name` or `["name"]`
    Field(String),
    /// `[n]`
    Position(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub root: PathRoot,
    pub accessors: SmallVec<[Accessor; 4]>,
}

/// A literal operand. `Undefined` is only reachable through the
/// `undefined` keyword; it is what a missing path resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Value(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Path(Path),
    Literal(Literal),
    /// A parenthesized expression, evaluates to a boolean.
    Group(Box<Expr>),
}

/// Filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Compare {
        op: CmpOp,
        left: Operand,
        right: Operand,
    },
    /// A bare operand, tested for truthiness.
    Truthy(Operand),
}

fn write_string(f: &mut Formatter<'_>, s: &str) -> std::fmt::Result {
    match serde_json::to_string(s) {
        Ok(quoted) => write!(f, "{}", quoted),
        Err(_) => Err(std::fmt::Error),
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.root {
            PathRoot::Record => write!(f, "$")?,
            PathRoot::Index => write!(f, "#")?,
        }
        for accessor in &self.accessors {
            match accessor {
                Accessor::Field(name) if is_ident(name) => write!(f, ".{}", name)?,
                Accessor::Field(name) => {
                    write!(f, "[")?;
                    write_string(f, name)?;
                    write!(f, "]")?;
                }
                Accessor::Position(n) => write!(f, "[{}]", n)?,
            }
        }
        Ok(())
    }
}

fn is_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Undefined => write!(f, "undefined"),
            Literal::Value(Value::String(s)) => write_string(f, s),
            Literal::Value(Value::F64(n)) if n.fract() == 0.0 => write!(f, "{:.1}", n),
            Literal::Value(value) => write!(f, "{}", value),
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Path(path) => write!(f, "{}", path),
            Operand::Literal(literal) => write!(f, "{}", literal),
            Operand::Group(expr) => write!(f, "({})", expr),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::And(terms) => {
                let joined = terms.iter().map(|t| parenthesize(t, Expr::is_or)).join(" && ");
                write!(f, "{}", joined)
            }
            Expr::Or(terms) => write!(f, "{}", terms.iter().join(" || ")),
            Expr::Not(inner) => write!(
                f,
                "!{}",
                parenthesize(inner, |e| matches!(e, Expr::And(_) | Expr::Or(_) | Expr::Compare { .. }))
            ),
            Expr::Compare { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Expr::Truthy(operand) => write!(f, "{}", operand),
        }
    }
}

impl Expr {
    fn is_or(&self) -> bool {
        matches!(self, Expr::Or(_))
    }
}

fn parenthesize(expr: &Expr, needs_parens: fn(&Expr) -> bool) -> String {
    if needs_parens(expr) {
        format!("({})", expr)
    } else {
        expr.to_string()
    }
}
