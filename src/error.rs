//! Unified error types for lzn.
//!
//! Library code uses `Error` and `Result<T>`. The binary (`main.rs`) uses
//! `anyhow` on top and maps error classes to exit codes: usage, parse and
//! type errors exit 1; internal logic errors (duplicate rule ids, malformed
//! search specifications) exit 2.

use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Failed to lex or parse MiniZinc source.
    #[error("{file}:{line}.{col}: parse error: {message}")]
    Parse {
        file: String,
        line: u32,
        col: u32,
        message: String,
    },

    /// Name resolution or type checking failure.
    #[error("{file}:{line}.{col}: type error: {message}")]
    Type {
        file: String,
        line: u32,
        col: u32,
        message: String,
    },

    /// An `include` could not be resolved.
    #[error("cannot find include \"{0}\"")]
    UnresolvedInclude(String),

    /// A search pattern was built incorrectly (e.g. `filter` or `capture`
    /// with no preceding matcher). This is a programming error in a rule.
    #[error("invalid search specification: {0}")]
    SearchSpec(String),

    /// Two rules registered the same id.
    #[error("rule id {0} registered twice")]
    DuplicateRuleId(u32),

    /// Unknown rule id or name in an ignore list.
    #[error("unknown rule: {0}")]
    UnknownRule(String),

    /// Unknown category name in an ignore list.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// Configuration file error.
    #[error("configuration error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn parse(
        file: impl Into<String>,
        line: u32,
        col: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            col,
            message: message.into(),
        }
    }

    pub fn type_error(
        file: impl Into<String>,
        line: u32,
        col: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::Type {
            file: file.into(),
            line,
            col,
            message: message.into(),
        }
    }

    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for errors that indicate a bug in the linter itself rather than
    /// bad input; these exit with code 2.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::SearchSpec(_) | Error::DuplicateRuleId(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_position() {
        let err = Error::parse("m.mzn", 3, 7, "unexpected token");
        assert_eq!(err.to_string(), "m.mzn:3.7: parse error: unexpected token");
    }

    #[test]
    fn internal_classification() {
        assert!(Error::DuplicateRuleId(4).is_internal());
        assert!(Error::SearchSpec("x".into()).is_internal());
        assert!(!Error::UnknownRule("nope".into()).is_internal());
    }
}
