//! Resolved expression tree handed from the reader to the record builders.

use crate::error::ParseError;
use crate::model::Entity;
use crate::value::quote;
use std::collections::VecDeque;

/// A resolved expression
///
/// Symbols never survive resolution: they are either bound to a constant or
/// name a record, in which case the record's result is an `Entity`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Int(i64),
    /// Integer literal above `i64::MAX`
    UInt(u64),
    Real(f64),
    List(Vec<Expr>),
    Entity(Box<Entity>),
}

impl Expr {
    /// Textual value used in diagnostics
    pub fn text(&self) -> String {
        match self {
            Expr::Str(v) => v.clone(),
            Expr::Int(v) => v.to_string(),
            Expr::UInt(v) => v.to_string(),
            Expr::Real(v) => v.to_string(),
            Expr::List(items) => {
                let inner: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Expr::Str(v) => quote(v),
                        other => other.text(),
                    })
                    .collect();
                format!("({})", inner.join(" "))
            }
            Expr::Entity(e) => format!("<{} {}>", e.record(), e.name()),
        }
    }
}

/// One element of a record's open-ended rest list
#[derive(Debug, Clone, PartialEq)]
pub enum RestArg {
    Item(Expr),
    Option { key: String, value: Expr },
}

/// Arguments of one record invocation, positional and keyword mixed
#[derive(Debug, Clone)]
pub struct RecordArgs {
    record: String,
    items: VecDeque<RestArg>,
}

impl RecordArgs {
    pub fn new(record: impl Into<String>, items: Vec<RestArg>) -> Self {
        Self {
            record: record.into(),
            items: items.into(),
        }
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    fn arity(&self, message: String) -> ParseError {
        ParseError::Arity {
            record: self.record.clone(),
            message,
        }
    }

    /// Take the next required positional argument
    pub fn required(&mut self, what: &str) -> Result<Expr, ParseError> {
        match self.items.pop_front() {
            Some(RestArg::Item(expr)) => Ok(expr),
            Some(RestArg::Option { key, .. }) => {
                Err(self.arity(format!("expected {what}, got option :{key}")))
            }
            None => Err(self.arity(format!("missing {what}"))),
        }
    }

    /// Take the next required positional argument as a string
    pub fn required_string(&mut self, what: &str) -> Result<String, ParseError> {
        match self.required(what)? {
            Expr::Str(v) => Ok(v),
            other => Err(ParseError::mismatch("a string", other.text())),
        }
    }

    /// Fail if anything is left after the required arguments
    pub fn finish(self) -> Result<(), ParseError> {
        match self.items.front() {
            None => Ok(()),
            Some(RestArg::Item(expr)) => {
                Err(self.arity(format!("unexpected argument {}", expr.text())))
            }
            Some(RestArg::Option { key, .. }) => {
                Err(self.arity(format!("unexpected option :{key}")))
            }
        }
    }

    /// Remaining arguments in declaration order
    pub fn rest(self) -> impl Iterator<Item = RestArg> {
        self.items.into_iter()
    }
}
