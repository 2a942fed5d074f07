use std::result::Result as StdResult;
use thiserror::Error as ThisError;

/// Error raised while parsing a specification or transforming a document.
///
/// Display output follows the `<Kind> - <message>` convention so CLI
/// diagnostics and log lines stay grep-able by kind.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// Malformed JSON input, a value of the wrong JSON kind, or an
    /// argument string a converter could not make sense of.
    #[error("ParseError - {0}")]
    Parse(String),
    /// An operation spec is structurally invalid: missing fields, wrong
    /// shapes, or an unknown operation name.
    #[error("SpecError - {0}")]
    Spec(String),
    /// A path marked `require` did not resolve.
    #[error("RequireError - {0}")]
    Require(String),
}

/// Structured tag for [`Error`], for callers that dispatch on kind
/// rather than message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Spec,
    Require,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(_) => ErrorKind::Parse,
            Error::Spec(_) => ErrorKind::Spec,
            Error::Require(_) => ErrorKind::Require,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Parse(msg) | Error::Spec(msg) | Error::Require(msg) => msg,
        }
    }

    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    pub(crate) fn spec(msg: impl Into<String>) -> Self {
        Error::Spec(msg.into())
    }

    pub(crate) fn require(msg: impl Into<String>) -> Self {
        Error::Require(msg.into())
    }
}

pub type Result<T> = StdResult<T, Error>;
