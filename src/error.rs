//! Crate-level error types.
use bson;
use bulk::error::BulkWriteException;
use std::{error, fmt, io, sync};

/// A type for results generated by this crate, where the `Err` type is
/// the crate-level `Error`.
pub type Result<T> = ::std::result::Result<T, Error>;

/// The error type for bulk-write operations.
#[derive(Debug)]
pub enum Error {
    /// A malformed write model was rejected before any command was sent.
    ArgumentError(String),
    /// A single operation exceeds the server size limits even in an
    /// otherwise-empty batch; nothing was dispatched.
    DocumentTooLarge(String),
    /// One or more operations failed; carries the partial result and every
    /// collected write error.
    BulkWriteError(BulkWriteException),
    /// The server rejected a whole command (`ok != 1`).
    OperationError(String),
    /// A reply document did not have the expected shape.
    ResponseError(String),
    /// A reply did not contain a well-formed results cursor.
    CursorNotFoundError,
    /// The call-wide deadline expired; no further commands were issued.
    Timeout(String),
    IoError(io::Error),
    EncoderError(bson::EncoderError),
    OidError(bson::oid::Error),
    /// An event-listener hook failed while reporting a command, possibly
    /// masking the boxed original failure.
    EventListenerError(Option<Box<Error>>),
    LockError,
    DefaultError(String),
}

impl<'a> From<&'a str> for Error {
    fn from(s: &str) -> Error {
        Error::DefaultError(s.to_owned())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::DefaultError(s)
    }
}

impl From<BulkWriteException> for Error {
    fn from(err: BulkWriteException) -> Error {
        Error::BulkWriteError(err)
    }
}

impl From<bson::EncoderError> for Error {
    fn from(err: bson::EncoderError) -> Error {
        Error::EncoderError(err)
    }
}

impl From<bson::oid::Error> for Error {
    fn from(err: bson::oid::Error) -> Error {
        Error::OidError(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl<T> From<sync::PoisonError<T>> for Error {
    fn from(_: sync::PoisonError<T>) -> Error {
        Error::LockError
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::ArgumentError(ref inner) => inner.fmt(fmt),
            Error::DocumentTooLarge(ref inner) => inner.fmt(fmt),
            Error::BulkWriteError(ref inner) => inner.fmt(fmt),
            Error::OperationError(ref inner) => inner.fmt(fmt),
            Error::ResponseError(ref inner) => inner.fmt(fmt),
            Error::CursorNotFoundError => fmt.write_str("No results cursor found in reply."),
            Error::Timeout(ref inner) => inner.fmt(fmt),
            Error::IoError(ref inner) => inner.fmt(fmt),
            Error::EncoderError(ref inner) => inner.fmt(fmt),
            Error::OidError(ref inner) => inner.fmt(fmt),
            Error::EventListenerError(ref inner) => match *inner {
                Some(ref err) => write!(fmt, "Event listener failed: {}", err),
                None => fmt.write_str("Event listener failed."),
            },
            Error::LockError => fmt.write_str("Listener lock poisoned."),
            Error::DefaultError(ref inner) => inner.fmt(fmt),
        }
    }
}

impl error::Error for Error {
    fn description(&self) -> &str {
        match *self {
            Error::ArgumentError(ref inner) |
            Error::DocumentTooLarge(ref inner) |
            Error::OperationError(ref inner) |
            Error::ResponseError(ref inner) |
            Error::Timeout(ref inner) |
            Error::DefaultError(ref inner) => inner,
            Error::BulkWriteError(ref inner) => &inner.message,
            Error::CursorNotFoundError => "No results cursor found in reply.",
            Error::IoError(ref inner) => inner.description(),
            Error::EncoderError(ref inner) => inner.description(),
            Error::OidError(ref inner) => inner.description(),
            Error::EventListenerError(_) => "Event listener failed.",
            Error::LockError => "Listener lock poisoned.",
        }
    }

    fn cause(&self) -> Option<&error::Error> {
        match *self {
            Error::IoError(ref inner) => Some(inner),
            Error::EncoderError(ref inner) => Some(inner),
            Error::OidError(ref inner) => Some(inner),
            Error::EventListenerError(Some(ref inner)) => Some(&**inner),
            _ => None,
        }
    }
}
