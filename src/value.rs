//! Property values and coercion between expressions and values.
//!
//! A declared property default is one of integer, unsigned integer, boolean,
//! real or string. Values coming back from a config file are whatever the
//! reader produced (usually strings, since defaults are written quoted), so
//! equality is defined on the value's meaning: numeric tags compare
//! numerically and anything else falls back to the textual form.

use crate::error::ParseError;
use crate::expr::Expr;
use serde::Serialize;
use std::fmt;

/// Declared property value
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i64),
    UInt(u64),
    Bool(bool),
    Real(f64),
    Str(String),
}

impl PropertyValue {
    /// Integer view of integer-like tags (boolean is stored as 0/1)
    fn integral(&self) -> Option<i128> {
        match self {
            PropertyValue::Int(v) => Some(i128::from(*v)),
            PropertyValue::UInt(v) => Some(i128::from(*v)),
            PropertyValue::Bool(v) => Some(i128::from(*v)),
            PropertyValue::Real(_) | PropertyValue::Str(_) => None,
        }
    }

    /// Textual form used for display and for quoted defaults
    pub fn to_display_string(&self) -> String {
        match self {
            PropertyValue::Int(v) => v.to_string(),
            PropertyValue::UInt(v) => v.to_string(),
            PropertyValue::Bool(v) => i64::from(*v).to_string(),
            PropertyValue::Real(v) => v.to_string(),
            PropertyValue::Str(v) => v.clone(),
        }
    }

    /// Textual form safe to embed back into a config file
    ///
    /// Reals keep a fractional part so they read back as reals. `inf` and
    /// `NaN` have no literal form and are written as strings.
    pub fn to_serialized_string(&self) -> String {
        match self {
            PropertyValue::Str(v) => quote(v),
            PropertyValue::Real(v) if !v.is_finite() => quote(&v.to_string()),
            PropertyValue::Real(v) => {
                let text = v.to_string();
                if text.contains(['.', 'e']) {
                    text
                } else {
                    format!("{text}.0")
                }
            }
            other => other.to_display_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Str(a), PropertyValue::Str(b)) => a == b,
            (PropertyValue::Real(a), PropertyValue::Real(b)) => a == b,
            (a, b) => match (a.integral(), b.integral()) {
                (Some(a), Some(b)) => a == b,
                _ => a.to_display_string() == b.to_display_string(),
            },
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Str(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Str(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

/// Convert a resolved expression into a property value
///
/// Only string, integer and real expressions carry a value; anything else
/// (lists, records) is a type mismatch reported with the expression text.
pub fn to_property(expr: &Expr) -> Result<PropertyValue, ParseError> {
    match expr {
        Expr::Str(v) => Ok(PropertyValue::Str(v.clone())),
        Expr::Int(v) => Ok(PropertyValue::Int(*v)),
        Expr::UInt(v) => Ok(PropertyValue::UInt(*v)),
        Expr::Real(v) => Ok(PropertyValue::Real(*v)),
        other => Err(ParseError::mismatch("a property value", other.text())),
    }
}

/// Read an integer out of a value, accepting the boolean tag as 0/1
pub fn to_integer(value: &PropertyValue) -> Result<i64, ParseError> {
    value
        .integral()
        .and_then(|v| i64::try_from(v).ok())
        .ok_or_else(|| ParseError::mismatch("an integer", value.to_display_string()))
}

/// Wrap a string in double quotes, escaping quotes and backslashes
pub fn quote(src: &str) -> String {
    let mut out = String::with_capacity(src.len() + 2);
    out.push('"');
    for c in src.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
