use std::fmt::{Display, Error, Formatter};

use bson::Document;
use error::Error as BulkError;

/// Reported immediately before a command is written to the transport.
pub struct CommandStarted {
    /// The complete command, including its `ops` and `nsInfo` arrays.
    pub command: Document,
    pub command_name: String,
    /// Unique per physical command.
    pub request_id: i64,
    /// Shared by every command issued for one logical bulk-write call.
    pub operation_id: i64,
}

impl Display for CommandStarted {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), Error> {
        fmt.write_fmt(format_args!("COMMAND.{} op {} STARTED: {:?}", self.command_name,
                                   self.operation_id, self.command))
    }
}

/// Reported once a command round-trip completes or fails.
pub enum CommandResult<'a> {
    Success {
        duration: u64,
        reply: Document,
        command_name: String,
        request_id: i64,
        operation_id: i64,
    },
    Failure {
        duration: u64,
        command_name: String,
        failure: &'a BulkError,
        request_id: i64,
        operation_id: i64,
    },
}

impl<'a> Display for CommandResult<'a> {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), Error> {
        match *self {
            CommandResult::Success { duration, ref reply, ref command_name, request_id: _,
                                     operation_id } => {
                fmt.write_fmt(format_args!("COMMAND.{} op {} COMPLETED: {:?} ({} ns)",
                                           command_name, operation_id, reply, duration))
            }
            CommandResult::Failure { duration, ref command_name, ref failure, request_id: _,
                                     operation_id } => {
                fmt.write_fmt(format_args!("COMMAND.{} op {} FAILURE: {} ({} ns)",
                                           command_name, operation_id, failure, duration))
            }
        }
    }
}
