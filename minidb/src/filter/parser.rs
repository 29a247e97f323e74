use crate::common::Value;
use crate::errors::MiniDbResult;
use crate::filter::ast::{Accessor, CmpOp, Expr, Literal, Operand, Path, PathRoot};
use crate::filter::lexer::{tokenize, Token, TokenKind};
use crate::filter::parse_error;
use smallvec::SmallVec;

/// Parses filter text into an expression tree.
///
/// Returns `None` for empty or whitespace-only text, which matches every
/// record. `max_depth` bounds the nesting of `!` and parentheses.
pub(crate) fn parse(source: &str, max_depth: usize) -> MiniDbResult<Option<Expr>> {
    if source.trim().is_empty() {
        return Ok(None);
    }

    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };

    let expr = parser.parse_or()?;
    let next = parser.peek();
    if next.kind != TokenKind::Eof {
        return Err(parse_error(
            &format!("Unexpected {}", next.kind),
            next.offset,
        ));
    }
    Ok(Some(expr))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // tokenize always ends with Eof and Eof is never consumed
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> MiniDbResult<()> {
        let token = self.advance();
        if token.kind == kind {
            Ok(())
        } else {
            Err(parse_error(
                &format!("Expected {} but found {}", kind, token.kind),
                token.offset,
            ))
        }
    }

    fn descend(&mut self, offset: usize) -> MiniDbResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(parse_error(
                &format!("Filter nesting exceeds the limit of {}", self.max_depth),
                offset,
            ));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn parse_or(&mut self) -> MiniDbResult<Expr> {
        let mut terms = vec![self.parse_and()?];
        while self.eat(&TokenKind::Or) {
            terms.push(self.parse_and()?);
        }

        if terms.len() == 1 {
            Ok(terms.remove(0))
        } else {
            Ok(Expr::Or(terms))
        }
    }

    fn parse_and(&mut self) -> MiniDbResult<Expr> {
        let mut terms = vec![self.parse_unary()?];
        while self.eat(&TokenKind::And) {
            terms.push(self.parse_unary()?);
        }

        if terms.len() == 1 {
            Ok(terms.remove(0))
        } else {
            Ok(Expr::And(terms))
        }
    }

    fn parse_unary(&mut self) -> MiniDbResult<Expr> {
        let offset = self.peek().offset;
        if self.eat(&TokenKind::Not) {
            self.descend(offset)?;
            let inner = self.parse_unary()?;
            self.ascend();
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> MiniDbResult<Expr> {
        let left = self.parse_operand()?;
        let op = match self.compare_op() {
            Some(op) => op,
            None => return Ok(Expr::Truthy(left)),
        };
        self.advance();
        let right = self.parse_operand()?;

        if self.compare_op().is_some() {
            let next = self.peek();
            return Err(parse_error(
                "Comparison operators cannot be chained, use parentheses",
                next.offset,
            ));
        }

        Ok(Expr::Compare { op, left, right })
    }

    fn compare_op(&self) -> Option<CmpOp> {
        match self.peek().kind {
            TokenKind::Eq => Some(CmpOp::Eq),
            TokenKind::Ne => Some(CmpOp::Ne),
            TokenKind::Lt => Some(CmpOp::Lt),
            TokenKind::Le => Some(CmpOp::Le),
            TokenKind::Gt => Some(CmpOp::Gt),
            TokenKind::Ge => Some(CmpOp::Ge),
            _ => None,
        }
    }

    fn parse_operand(&mut self) -> MiniDbResult<Operand> {
        let token = self.advance();
        match token.kind {
            TokenKind::Dollar => Ok(Operand::Path(self.parse_path(PathRoot::Record)?)),
            TokenKind::Hash => Ok(Operand::Path(self.parse_path(PathRoot::Index)?)),
            TokenKind::LParen => {
                self.descend(token.offset)?;
                let inner = self.parse_or()?;
                self.expect(TokenKind::RParen)?;
                self.ascend();
                Ok(Operand::Group(Box::new(inner)))
            }
            TokenKind::Minus => {
                let number = self.advance();
                match number.kind {
                    TokenKind::Number(value) => Ok(Operand::Literal(Literal::Value(negate(value)))),
                    other => Err(parse_error(
                        &format!("Expected a number after '-' but found {}", other),
                        number.offset,
                    )),
                }
            }
            TokenKind::Number(value) => Ok(Operand::Literal(Literal::Value(value))),
            TokenKind::Str(s) => Ok(Operand::Literal(Literal::Value(Value::String(s)))),
            TokenKind::Ident(name) => match name.as_str() {
                "true" => Ok(Operand::Literal(Literal::Value(Value::Bool(true)))),
                "false" => Ok(Operand::Literal(Literal::Value(Value::Bool(false)))),
                "null" => Ok(Operand::Literal(Literal::Value(Value::Null))),
                "undefined" => Ok(Operand::Literal(Literal::Undefined)),
                _ => Err(parse_error(
                    &format!("Unknown identifier '{}', paths start with '$' or '#'", name),
                    token.offset,
                )),
            },
            other => Err(parse_error(
                &format!("Expected an operand but found {}", other),
                token.offset,
            )),
        }
    }

    fn parse_path(&mut self, root: PathRoot) -> MiniDbResult<Path> {
        let mut accessors = SmallVec::new();
        loop {
            if self.eat(&TokenKind::Dot) {
                let token = self.advance();
                match token.kind {
                    TokenKind::Ident(name) => accessors.push(Accessor::Field(name)),
                    other => {
                        return Err(parse_error(
                            &format!("Expected a field name after '.' but found {}", other),
                            token.offset,
                        ))
                    }
                }
            } else if self.eat(&TokenKind::LBracket) {
                let token = self.advance();
                let accessor = match token.kind {
                    TokenKind::Str(name) => Accessor::Field(name),
                    TokenKind::Number(Value::I64(n)) => Accessor::Position(n as usize),
                    TokenKind::Number(Value::U64(n)) => {
                        Accessor::Position(usize::try_from(n).unwrap_or(usize::MAX))
                    }
                    other => {
                        return Err(parse_error(
                            &format!(
                                "Expected a non-negative integer or a string inside '[]' but found {}",
                                other
                            ),
                            token.offset,
                        ))
                    }
                };
                accessors.push(accessor);
                self.expect(TokenKind::RBracket)?;
            } else {
                return Ok(Path { root, accessors });
            }
        }
    }
}

fn negate(value: Value) -> Value {
    match value {
        Value::I64(i) => Value::I64(-i),
        Value::U64(u) if u == 1 << 63 => Value::I64(i64::MIN),
        Value::U64(u) => Value::F64(-(u as f64)),
        Value::F64(f) => Value::F64(-f),
        other => other,
    }
}
