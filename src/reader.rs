//! Reader for the textual config form
//!
//! Turns text such as
//!
//! ```text
//! (provider "sensor" "/lib/sensor.so" :type "accel"
//!   (ns "data" (prop "x" 0 :access rw)))
//! ```
//!
//! into resolved expressions: symbols are looked up as constants, list heads
//! naming a record are handed to the record builder together with their
//! positional and `:keyword value` arguments.

use crate::builder::Env;
use crate::error::ParseError;
use crate::expr::{Expr, RecordArgs, RestArg};

/// Deepest list nesting accepted in one source
pub const MAX_DEPTH: usize = 64;

/// Unresolved datum as it appears in the text
enum Raw {
    Symbol(String),
    Keyword(String),
    Value(Expr),
}

/// Streaming reader over one text source
pub struct Reader<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
    env: Env,
    failed: bool,
}

impl<'a> Reader<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::with_env(src, Env::standard())
    }

    pub fn with_env(src: &'a str, env: Env) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
            env,
            failed: false,
        }
    }

    /// Current read position in bytes
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_blank(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Read the next top-level expression, `None` at end of input
    pub fn next_expr(&mut self) -> Result<Option<Expr>, ParseError> {
        self.skip_blank();
        if self.peek().is_none() {
            return Ok(None);
        }
        let raw = self.read_raw()?;
        self.resolve(raw).map(Some)
    }

    fn read_raw(&mut self) -> Result<Raw, ParseError> {
        self.skip_blank();
        let offset = self.pos;
        match self.peek() {
            None => Err(ParseError::UnexpectedEof { offset }),
            Some('(') => {
                if self.depth >= MAX_DEPTH {
                    return Err(ParseError::TooDeep { offset });
                }
                self.bump();
                self.depth += 1;
                let list = self.read_list();
                self.depth -= 1;
                list.map(Raw::Value)
            }
            Some(')') => Err(ParseError::Unexpected { found: ')', offset }),
            Some('"') => {
                self.bump();
                self.read_string(offset).map(|s| Raw::Value(Expr::Str(s)))
            }
            Some(_) => self.read_atom(),
        }
    }

    fn read_string(&mut self, start: usize) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedString { offset: start }),
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    None => return Err(ParseError::UnterminatedString { offset: start }),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn read_atom(&mut self) -> Result<Raw, ParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | '"' | ';') {
                break;
            }
            self.bump();
        }
        let token = &self.src[start..self.pos];

        if let Some(key) = token.strip_prefix(':') {
            if key.is_empty() {
                return Err(ParseError::Unexpected {
                    found: ':',
                    offset: start,
                });
            }
            return Ok(Raw::Keyword(key.to_string()));
        }
        if looks_numeric(token) {
            return parse_number(token)
                .map(Raw::Value)
                .ok_or_else(|| ParseError::InvalidNumber {
                    text: token.to_string(),
                    offset: start,
                });
        }
        Ok(Raw::Symbol(token.to_string()))
    }

    fn read_list(&mut self) -> Result<Expr, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_blank();
            match self.peek() {
                None => return Err(ParseError::UnexpectedEof { offset: self.pos }),
                Some(')') => {
                    self.bump();
                    break;
                }
                Some(_) => items.push(self.read_raw()?),
            }
        }

        let mut items = items.into_iter();
        match items.next() {
            None => Ok(Expr::List(Vec::new())),
            Some(Raw::Symbol(head)) => match self.env.record(&head) {
                Some(build) => {
                    let args = self.record_args(&head, items)?;
                    let entity = build(RecordArgs::new(head, args))?;
                    Ok(Expr::Entity(Box::new(entity)))
                }
                None => {
                    let first = self
                        .env
                        .constant(&head)
                        .ok_or(ParseError::UnknownRecord(head))?;
                    let mut list = vec![first];
                    for raw in items {
                        list.push(self.resolve(raw)?);
                    }
                    Ok(Expr::List(list))
                }
            },
            Some(first) => {
                let mut list = vec![self.resolve(first)?];
                for raw in items {
                    list.push(self.resolve(raw)?);
                }
                Ok(Expr::List(list))
            }
        }
    }

    fn record_args(
        &self,
        record: &str,
        mut items: impl Iterator<Item = Raw>,
    ) -> Result<Vec<RestArg>, ParseError> {
        let mut args = Vec::new();
        while let Some(raw) = items.next() {
            match raw {
                Raw::Keyword(key) => {
                    let value = match items.next() {
                        Some(Raw::Keyword(next)) => {
                            return Err(ParseError::Arity {
                                record: record.to_string(),
                                message: format!("option :{key} has no value, got :{next}"),
                            })
                        }
                        Some(raw) => self.resolve(raw)?,
                        None => {
                            return Err(ParseError::Arity {
                                record: record.to_string(),
                                message: format!("option :{key} has no value"),
                            })
                        }
                    };
                    args.push(RestArg::Option { key, value });
                }
                other => args.push(RestArg::Item(self.resolve(other)?)),
            }
        }
        Ok(args)
    }

    fn resolve(&self, raw: Raw) -> Result<Expr, ParseError> {
        match raw {
            Raw::Value(expr) => Ok(expr),
            Raw::Symbol(name) => self
                .env
                .constant(&name)
                .ok_or(ParseError::Unbound(name)),
            Raw::Keyword(key) => Err(ParseError::Unbound(format!(":{key}"))),
        }
    }
}

impl Iterator for Reader<'_> {
    type Item = Result<Expr, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_expr() {
            Ok(expr) => expr.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

fn looks_numeric(token: &str) -> bool {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    digits
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || (c == '.' && digits.len() > 1))
}

fn parse_number(token: &str) -> Option<Expr> {
    if let Ok(v) = token.parse::<i64>() {
        return Some(Expr::Int(v));
    }
    if let Ok(v) = token.parse::<u64>() {
        return Some(Expr::UInt(v));
    }
    token.parse::<f64>().ok().map(Expr::Real)
}

/// Read every top-level expression of `src`
pub fn read_all(src: &str) -> Result<Vec<Expr>, ParseError> {
    Reader::new(src).collect()
}
