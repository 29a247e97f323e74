use crate::common::Value;
use crate::errors::MiniDbResult;
use crate::filter::parse_error;
use std::fmt::{Display, Formatter};
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Dollar,
    Hash,
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Minus,
    Not,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Ident(String),
    Number(Value),
    Str(String),
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Dollar => write!(f, "'$'"),
            TokenKind::Hash => write!(f, "'#'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Not => write!(f, "'!'"),
            TokenKind::And => write!(f, "'&&'"),
            TokenKind::Or => write!(f, "'||'"),
            TokenKind::Eq => write!(f, "'=='"),
            TokenKind::Ne => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Le => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Ge => write!(f, "'>='"),
            TokenKind::Ident(name) => write!(f, "identifier '{}'", name),
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Str(s) => write!(f, "string {:?}", s),
            TokenKind::Eof => write!(f, "end of filter"),
        }
    }
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Splits filter text into tokens. The last token is always [TokenKind::Eof].
pub(crate) fn tokenize(source: &str) -> MiniDbResult<Vec<Token>> {
    let mut lexer = Lexer {
        source,
        chars: source.char_indices().peekable(),
    };

    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl Lexer<'_> {
    fn next_token(&mut self) -> MiniDbResult<Token> {
        self.skip_whitespace();

        let (offset, c) = match self.chars.next() {
            Some(next) => next,
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    offset: self.source.len(),
                })
            }
        };

        let kind = match c {
            '$' => TokenKind::Dollar,
            '#' => TokenKind::Hash,
            '.' => TokenKind::Dot,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '-' => TokenKind::Minus,
            '&' => {
                self.expect_char('&', offset, "'&&'")?;
                TokenKind::And
            }
            '|' => {
                self.expect_char('|', offset, "'||'")?;
                TokenKind::Or
            }
            '=' => {
                self.expect_char('=', offset, "'=='")?;
                // `===` is the same operator
                self.eat_char('=');
                TokenKind::Eq
            }
            '!' => {
                if self.eat_char('=') {
                    self.eat_char('=');
                    TokenKind::Ne
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.eat_char('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat_char('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '"' | '\'' => TokenKind::Str(self.read_string(c, offset)?),
            '0'..='9' => TokenKind::Number(self.read_number(offset)?),
            c if c.is_ascii_alphabetic() || c == '_' => TokenKind::Ident(self.read_ident(offset)),
            other => {
                return Err(parse_error(
                    &format!("Unexpected character '{}'", other),
                    offset,
                ))
            }
        };

        Ok(Token { kind, offset })
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn eat_char(&mut self, expected: char) -> bool {
        self.chars.next_if(|(_, c)| *c == expected).is_some()
    }

    fn expect_char(&mut self, expected: char, offset: usize, what: &str) -> MiniDbResult<()> {
        if self.eat_char(expected) {
            Ok(())
        } else {
            Err(parse_error(&format!("Expected {}", what), offset))
        }
    }

    fn end_of(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(i, _)| *i)
            .unwrap_or(self.source.len())
    }

    fn read_ident(&mut self, start: usize) -> String {
        while self
            .chars
            .next_if(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
            .is_some()
        {}
        let end = self.end_of();
        self.source[start..end].to_string()
    }

    fn read_digits(&mut self) -> usize {
        let mut count = 0;
        while self.chars.next_if(|(_, c)| c.is_ascii_digit()).is_some() {
            count += 1;
        }
        count
    }

    fn read_number(&mut self, start: usize) -> MiniDbResult<Value> {
        self.read_digits();
        let mut is_float = false;

        // a '.' not followed by a digit ends the number
        let mut lookahead = self.chars.clone();
        if let (Some((_, '.')), Some((_, d))) = (lookahead.next(), lookahead.next()) {
            if d.is_ascii_digit() {
                self.chars.next();
                self.read_digits();
                is_float = true;
            }
        }

        if self.eat_char('e') || self.eat_char('E') {
            if !self.eat_char('+') {
                self.eat_char('-');
            }
            if self.read_digits() == 0 {
                return Err(parse_error("Malformed number exponent", start));
            }
            is_float = true;
        }

        let end = self.end_of();
        let text = &self.source[start..end];
        if !is_float {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Value::I64(i));
            }
            if let Ok(u) = text.parse::<u64>() {
                return Ok(Value::U64(u));
            }
        }

        match text.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Value::F64(f)),
            _ => Err(parse_error(&format!("Number {} is out of range", text), start)),
        }
    }

    fn read_string(&mut self, quote: char, start: usize) -> MiniDbResult<String> {
        let mut result = String::new();
        loop {
            let (offset, c) = match self.chars.next() {
                Some(next) => next,
                None => return Err(parse_error("Unterminated string", start)),
            };

            if c == quote {
                return Ok(result);
            }
            if c != '\\' {
                result.push(c);
                continue;
            }

            let escaped = match self.chars.next() {
                Some((_, e)) => e,
                None => return Err(parse_error("Unterminated string", start)),
            };
            match escaped {
                '"' => result.push('"'),
                '\'' => result.push('\''),
                '\\' => result.push('\\'),
                '/' => result.push('/'),
                'n' => result.push('\n'),
                'r' => result.push('\r'),
                't' => result.push('\t'),
                'b' => result.push('\u{0008}'),
                'f' => result.push('\u{000C}'),
                'u' => result.push(self.read_unicode_escape(offset)?),
                other => {
                    return Err(parse_error(
                        &format!("Invalid escape sequence '\\{}'", other),
                        offset,
                    ))
                }
            }
        }
    }

    fn read_hex4(&mut self, offset: usize) -> MiniDbResult<u32> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .chars
                .next()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or_else(|| parse_error("Invalid unicode escape", offset))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn read_unicode_escape(&mut self, offset: usize) -> MiniDbResult<char> {
        let high = self.read_hex4(offset)?;
        let code = if (0xD800..0xDC00).contains(&high) {
            // surrogate pair, the low half must follow as another \uXXXX
            if !(self.eat_char('\\') && self.eat_char('u')) {
                return Err(parse_error("Unpaired surrogate in unicode escape", offset));
            }
            let low = self.read_hex4(offset)?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(parse_error("Unpaired surrogate in unicode escape", offset));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };

        char::from_u32(code).ok_or_else(|| parse_error("Invalid unicode escape", offset))
    }
}
