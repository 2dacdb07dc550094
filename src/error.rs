//! Error handling for mpdcover.
//!
//! Every fallible operation returns [`Result`], whose error couples an
//! [`ErrorKind`] with the underlying error. The kinds follow the failure
//! points of a protocol exchange:
//!
//! * Transport failures while dialing, reading or writing ([`ErrorKind::Connection`])
//! * A greeting that does not identify an MPD server ([`ErrorKind::Handshake`])
//! * Server-side rejections reported through `ACK` ([`ErrorKind::Protocol`])
//! * Integer fields that fail to parse ([`ErrorKind::Format`])
//! * Calls that outlive their deadline ([`ErrorKind::DeadlineExceeded`])
//!
//! # Example
//!
//! ```rust
//! use mpdcover::error::{Error, ErrorKind, Result};
//!
//! fn check(greeting: &str) -> Result<()> {
//!     if !greeting.starts_with("OK") {
//!         return Err(Error::handshake(greeting.to_owned()));
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt;
use thiserror::Error;

use crate::protocol::Ack;

/// Main error type combining error kind and details.
#[derive(Debug)]
pub struct Error {
    /// Classification of the error
    pub kind: ErrorKind,

    /// Details of the underlying error
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

impl Error {
    /// Attempts to downcast the underlying error to a concrete type.
    ///
    /// # Example
    /// ```
    /// use std::io;
    ///
    /// let error = Error::from(io::Error::from(io::ErrorKind::UnexpectedEof));
    /// assert!(error.downcast::<io::Error>().is_some());
    /// ```
    #[must_use]
    pub fn downcast<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    /// Returns the server's `ACK` when this error is a command rejection.
    #[must_use]
    pub fn ack(&self) -> Option<&Ack> {
        self.downcast::<Ack>()
    }
}

/// Standard result type for mpdcover operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories of a protocol exchange.
#[expect(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, Eq, Error, Hash, Ord, PartialEq, PartialOrd)]
pub enum ErrorKind {
    /// Dialing, reading from or writing to the server failed.
    #[error("connection error")]
    Connection,

    /// The greeting line did not start with `OK`.
    #[error("handshake failed")]
    Handshake,

    /// The server answered with `ACK`, or the exchange went off the rails.
    #[error("protocol error")]
    Protocol,

    /// A declared integer field could not be parsed.
    #[error("malformed response")]
    Format,

    /// The call did not complete before its deadline.
    #[error("operation timed out")]
    DeadlineExceeded,

    /// Writing to the destination sink failed.
    #[error("sink error")]
    Sink,

    /// The caller supplied invalid input, such as a broken configuration.
    #[error("invalid argument specified")]
    InvalidArgument,
}

impl Error {
    /// Creates a new error with specified kind and details.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let err = Error::new(ErrorKind::Protocol, "no progress");
    /// assert_eq!(err.kind, ErrorKind::Protocol);
    /// ```
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            kind,
            error: error.into(),
        }
    }

    /// Creates an error for transport failures.
    pub fn connection<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Connection, error)
    }

    /// Creates an error for a rejected greeting.
    ///
    /// The raw greeting line is kept as the error text so that operators
    /// can see what actually answered on the other end.
    pub fn handshake<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Handshake, error)
    }

    /// Creates an error for server-side rejections and broken exchanges.
    pub fn protocol<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Protocol, error)
    }

    /// Creates an error for integer fields that do not parse.
    pub fn format<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Format, error)
    }

    pub fn deadline_exceeded<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::DeadlineExceeded, error)
    }

    /// Creates an error for failures of the local destination.
    ///
    /// Kept apart from [`ErrorKind::Connection`] because a full disk says
    /// nothing about the health of the server.
    pub fn sink<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Sink, error)
    }

    pub fn invalid_argument<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::InvalidArgument, error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}: ", self.kind)?;
        self.error.fmt(fmt)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => Self::deadline_exceeded(err),
            _ => Self::connection(err),
        }
    }
}

impl From<Ack> for Error {
    fn from(ack: Ack) -> Self {
        Self::protocol(ack)
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(e: std::num::ParseIntError) -> Self {
        Self::format(e)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(e: tokio::time::error::Elapsed) -> Self {
        Self::deadline_exceeded(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::invalid_argument(e.to_string())
    }
}
