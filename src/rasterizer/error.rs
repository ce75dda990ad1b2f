//! Error taxonomy and the sticky "last error" state
//!
//! Every public operation returns a [`Result`]; the [`Context`](super::Context)
//! additionally records failures in an [`ErrorState`] so callers can poll the
//! last error or register a handler, the way C-style render APIs report.

use std::fmt;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    #[error("null reference: {0}")]
    NullReference(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("argument mismatch: {0}")]
    ArgumentMismatch(String),
    #[error("missing plugin: {0}")]
    MissingPlugin(String),
    #[error("unexpected end of data: {0}")]
    UnexpectedEndOfData(String),
    #[error("fatal: {0}")]
    Fatal(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NullReference(_) => ErrorKind::NullReference,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::InvalidId(_) => ErrorKind::InvalidId,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::IndexOutOfBounds { .. } => ErrorKind::IndexOutOfBounds,
            Error::ArgumentMismatch(_) => ErrorKind::ArgumentMismatch,
            Error::MissingPlugin(_) => ErrorKind::MissingPlugin,
            Error::UnexpectedEndOfData(_) => ErrorKind::UnexpectedEndOfData,
            Error::Fatal(_) => ErrorKind::Fatal,
        }
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }

    pub(crate) fn null_reference(msg: impl Into<String>) -> Self {
        Error::NullReference(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::UnexpectedEndOfData(e.to_string()),
            _ => Error::InvalidArgument(e.to_string()),
        }
    }
}

/// Plain error code, stable across releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NullReference,
    InvalidArgument,
    InvalidId,
    InvalidState,
    IndexOutOfBounds,
    ArgumentMismatch,
    MissingPlugin,
    UnexpectedEndOfData,
    Fatal,
}

impl ErrorKind {
    pub fn code(self) -> u32 {
        match self {
            ErrorKind::NullReference => 1,
            ErrorKind::InvalidArgument => 2,
            ErrorKind::InvalidId => 3,
            ErrorKind::InvalidState => 4,
            ErrorKind::IndexOutOfBounds => 5,
            ErrorKind::ArgumentMismatch => 6,
            ErrorKind::MissingPlugin => 7,
            ErrorKind::UnexpectedEndOfData => 8,
            ErrorKind::Fatal => 0xff,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NullReference => "null reference",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::InvalidId => "invalid id",
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::IndexOutOfBounds => "index out of bounds",
            ErrorKind::ArgumentMismatch => "argument mismatch",
            ErrorKind::MissingPlugin => "missing plugin",
            ErrorKind::UnexpectedEndOfData => "unexpected end of data",
            ErrorKind::Fatal => "fatal",
        };
        write!(f, "{}", name)
    }
}

pub type ErrorHandler = Box<dyn FnMut(ErrorKind, &str)>;

/// Last recorded error plus an optional handler invoked on every record
#[derive(Default)]
pub struct ErrorState {
    last: Option<ErrorKind>,
    handler: Option<ErrorHandler>,
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the previous error and notifies the handler
    pub fn record(&mut self, err: &Error) {
        let kind = err.kind();
        match kind {
            ErrorKind::Fatal => log::error!("{}", err),
            _ => log::warn!("{}", err),
        }

        self.last = Some(kind);
        if let Some(handler) = self.handler.as_mut() {
            handler(kind, &err.to_string());
        }
    }

    pub fn last(&self) -> Option<ErrorKind> {
        self.last
    }

    /// Returns the last error and resets it
    pub fn take(&mut self) -> Option<ErrorKind> {
        self.last.take()
    }

    pub fn set_handler(&mut self, handler: Option<ErrorHandler>) {
        self.handler = handler;
    }
}

impl fmt::Debug for ErrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorState")
            .field("last", &self.last)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}
