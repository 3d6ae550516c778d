//! Error types shared by the library, the CLI and the HTTP layer.
//!
//! Internally everything is an `anyhow::Error` built up with `.context(..)`. When an error crosses
//! a public boundary (a command handler or an HTTP handler) it is tagged with an [`ErrorType`] so
//! that callers can decide how to report it, e.g. which HTTP status code to send.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The home directory or config file is missing or invalid.
    Config,
    /// A SQLite operation failed.
    Database,
    /// User supplied input was rejected.
    Validation,
    /// A requested record does not exist.
    NotFound,
    /// The caller is not logged in or the credentials are wrong.
    Unauthorized,
    /// The caller is logged in but may not perform the operation.
    Forbidden,
    /// The operation collides with existing data, e.g. a duplicate username.
    Conflict,
    /// A filesystem operation failed.
    Io,
    /// The HTTP service could not be started or crashed.
    Service,
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorType::Config => "Configuration error",
            ErrorType::Database => "Database error",
            ErrorType::Validation => "Validation error",
            ErrorType::NotFound => "Not found",
            ErrorType::Unauthorized => "Unauthorized",
            ErrorType::Forbidden => "Forbidden",
            ErrorType::Conflict => "Conflict",
            ErrorType::Io => "I/O error",
            ErrorType::Service => "Service error",
        };
        f.write_str(s)
    }
}

/// Wraps an error together with its [`ErrorType`]. It displays exactly like the wrapped error so
/// the tag never shows up in messages.
#[derive(Debug)]
struct Tagged {
    error_type: ErrorType,
    inner: Error,
}

impl Display for Tagged {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for Tagged {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Tags the error side of a result with an [`ErrorType`].
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| {
            let inner: Error = e.into();
            // The innermost tag wins, so re-tagging at an outer boundary is a no-op.
            if inner.downcast_ref::<Tagged>().is_some() {
                inner
            } else {
                Error::new(Tagged { error_type, inner })
            }
        })
    }
}

/// Returns the [`ErrorType`] an error was tagged with, if any.
pub fn error_type(e: &Error) -> Option<ErrorType> {
    e.downcast_ref::<Tagged>().map(|t| t.error_type)
}

/// Renders the error for a user: every message in the chain, outermost first.
pub fn user_message(e: &Error) -> String {
    format!("{e:#}")
}

/// Creates an error that is already tagged with `error_type`.
pub(crate) fn tagged(error_type: ErrorType, message: impl Display) -> Error {
    Error::new(Tagged {
        error_type,
        inner: anyhow::anyhow!("{message}"),
    })
}

/// Creates a validation error with the given message.
pub(crate) fn validation(message: impl Display) -> Error {
    tagged(ErrorType::Validation, message)
}

/// Creates a not-found error with the given message.
pub(crate) fn not_found(message: impl Display) -> Error {
    tagged(ErrorType::NotFound, message)
}
