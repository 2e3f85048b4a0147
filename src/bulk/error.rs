//! Write errors surfaced by bulk-write operations.
use bson::{self, Bson};
use error::{Error, Result};
use super::results::BulkWriteResult;
use std::{error, fmt};

/// A per-operation failure inside an otherwise-successful command reply.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteError {
    /// Index of the failed operation in the original model list.
    pub index: i64,
    pub code: i32,
    pub message: String,
    /// The server's `errInfo` document for this operation, copied verbatim.
    pub details: Option<bson::Document>,
}

/// A write-concern failure attached to a command reply. Collected without
/// halting dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteConcernError {
    pub code: i32,
    pub message: String,
    /// The server's `errInfo` document, copied verbatim.
    pub details: Option<bson::Document>,
}

/// The aggregate failure of one logical bulk-write call: the partial result
/// accumulated before the failure, every per-operation error in original
/// order, and, when the call died outright, the fatal cause.
#[derive(Debug)]
pub struct BulkWriteException {
    pub partial_result: BulkWriteResult,
    pub write_errors: Vec<WriteError>,
    pub write_concern_errors: Vec<WriteConcernError>,
    /// Set when the call was aborted by a command-level or cursor failure
    /// rather than per-operation errors.
    pub cause: Option<Box<Error>>,
    pub message: String,
}

impl WriteError {
    /// Returns a new WriteError containing the provided error information.
    pub fn new<T: ToString>(index: i64, code: i32, message: T,
                            details: Option<bson::Document>) -> WriteError {
        WriteError {
            index: index,
            code: code,
            message: message.to_string(),
            details: details,
        }
    }

    /// Parses an individual-result document with `ok: 0` into a WriteError,
    /// remapping its batch-local `idx` by `start_index`.
    pub fn parse(start_index: i64, doc: &bson::Document) -> Result<WriteError> {
        let local_index = match doc.get("idx") {
            Some(&Bson::I32(idx)) => idx as i64,
            Some(&Bson::I64(idx)) => idx,
            _ => return Err(Error::ResponseError(format!(
                "WriteError document is invalid: {:?}", doc))),
        };

        match (doc.get("code"), doc.get("errmsg")) {
            (Some(&Bson::I32(code)), Some(&Bson::String(ref message))) => {
                let details = match doc.get("errInfo") {
                    Some(&Bson::Document(ref info)) => Some(info.clone()),
                    _ => None,
                };
                Ok(WriteError::new(start_index + local_index, code, message, details))
            }
            _ => Err(Error::ResponseError(format!(
                "WriteError document is invalid: {:?}", doc))),
        }
    }
}

impl WriteConcernError {
    pub fn new<T: ToString>(code: i32, message: T,
                            details: Option<bson::Document>) -> WriteConcernError {
        WriteConcernError {
            code: code,
            message: message.to_string(),
            details: details,
        }
    }

    /// Parses a reply's `writeConcernError` document.
    pub fn parse(error: &bson::Document) -> Result<WriteConcernError> {
        match (error.get("code"), error.get("errmsg")) {
            (Some(&Bson::I32(code)), Some(&Bson::String(ref message))) => {
                let details = match error.get("errInfo") {
                    Some(&Bson::Document(ref info)) => Some(info.clone()),
                    _ => None,
                };
                Ok(WriteConcernError::new(code, message, details))
            }
            _ => Err(Error::ResponseError(format!(
                "WriteConcernError document is invalid: {:?}", error))),
        }
    }
}

impl BulkWriteException {
    /// Returns a new BulkWriteException bundling the partial result with the
    /// collected errors.
    pub fn new(partial_result: BulkWriteResult, write_errors: Vec<WriteError>,
               write_concern_errors: Vec<WriteConcernError>,
               cause: Option<Error>) -> BulkWriteException {
        use std::fmt::Write;

        let mut message = match cause {
            Some(ref error) => format!("{}", error),
            None => String::new(),
        };

        for error in &write_errors {
            write!(message, "{}\n", error).expect("can't format error");
        }

        for error in &write_concern_errors {
            write!(message, "{}\n", error).expect("can't format error");
        }

        BulkWriteException {
            partial_result: partial_result,
            write_errors: write_errors,
            write_concern_errors: write_concern_errors,
            cause: cause.map(Box::new),
            message: message,
        }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "WriteError at index {} (code {}): {}",
               self.index, self.code, self.message)
    }
}

impl fmt::Display for WriteConcernError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "WriteConcernError (code {}): {}", self.code, self.message)
    }
}

impl fmt::Display for BulkWriteException {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str("BulkWriteException:\n")?;

        if let Some(ref cause) = self.cause {
            write!(fmt, "Cause: {}\n", cause)?;
        }

        for error in &self.write_errors {
            write!(fmt, "{}\n", error)?;
        }

        for error in &self.write_concern_errors {
            write!(fmt, "{}\n", error)?;
        }

        Ok(())
    }
}

impl error::Error for BulkWriteException {
    fn description(&self) -> &str {
        &self.message
    }

    fn cause(&self) -> Option<&error::Error> {
        match self.cause {
            Some(ref cause) => Some(&**cause),
            None => None,
        }
    }
}
