//! Error types for the provider/loader registry.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort consumption of one textual source
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("Unexpected '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },

    #[error("Unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("Lists nested too deeply at offset {offset}")]
    TooDeep { offset: usize },

    #[error("Invalid number '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("Unbound symbol '{0}'")]
    Unbound(String),

    #[error("Unknown record '{0}'")]
    UnknownRecord(String),

    #[error("Record '{record}': {message}")]
    Arity { record: String, message: String },

    #[error("Duplicate {what} '{name}'")]
    Duplicate { what: &'static str, name: String },

    #[error("{found} is not compatible with {expected}")]
    TypeMismatch { expected: &'static str, found: String },
}

impl ParseError {
    pub(crate) fn mismatch(expected: &'static str, found: impl Into<String>) -> Self {
        ParseError::TypeMismatch {
            expected,
            found: found.into(),
        }
    }
}

/// Registry and config store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unknown configuration source {0}")]
    InvalidSource(PathBuf),

    #[error("File {0} is not a config file")]
    NotConfigFile(PathBuf),

    #[error("Error parsing {path}:{offset}: {source}")]
    Malformed {
        path: PathBuf,
        offset: usize,
        #[source]
        source: ParseError,
    },

    #[error("Library {0} doesn't exist")]
    StaleEntry(PathBuf),

    #[error("Can't find {0} loader")]
    LookupMiss(String),

    #[error("Can't retrieve information from {0}")]
    Unrecognized(PathBuf),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl From<config::ConfigError> for StoreError {
    fn from(err: config::ConfigError) -> Self {
        StoreError::Settings(err.to_string())
    }
}
