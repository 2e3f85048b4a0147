//! Interface for bulk-write operations.
//!
//! One logical call runs as a single sequential pipeline: the planner packs
//! the models into batches, the dispatcher sends them strictly in order under
//! one shared operation id, each reply's results cursor is drained before the
//! next batch goes out, and the aggregator folds every outcome back onto the
//! original operation indices.
pub mod batch;
pub mod cursor;
pub mod error;
pub mod options;
pub mod results;

use apm::{CommandResult, CommandStarted, Listener};
use bson::{self, bson, doc, Bson};
use error::{Error, Result};
use time;
use transport::Transport;

use self::batch::{plan_batches, Batch};
use self::cursor::ResultCursor;
use self::error::{BulkWriteException, WriteConcernError, WriteError};
use self::options::{BulkWriteOptions, WriteModel};
use self::results::{BulkWriteResult, UpdateResult};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::time::{Duration, Instant};

static NEXT_ID: AtomicIsize = AtomicIsize::new(1);

/// Returns a unique operational request id.
fn next_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::SeqCst) as i64
}

fn deadline_expired(deadline: Option<Instant>) -> bool {
    match deadline {
        Some(deadline) => Instant::now() >= deadline,
        None => false,
    }
}

fn reborrow<'b, S>(session: &'b mut Option<&mut S>) -> Option<&'b mut S> {
    match *session {
        Some(ref mut handle) => Some(&mut **handle),
        None => None,
    }
}

fn reply_ok(reply: &bson::Document) -> bool {
    match reply.get("ok") {
        Some(&Bson::I32(code)) => code == 1,
        Some(&Bson::I64(code)) => code == 1,
        Some(&Bson::FloatingPoint(code)) => code == 1.0,
        _ => false,
    }
}

fn count_field(doc: &bson::Document, key: &str) -> i64 {
    match doc.get(key) {
        Some(&Bson::I32(n)) => n as i64,
        Some(&Bson::I64(n)) => n,
        Some(&Bson::FloatingPoint(n)) => n as i64,
        _ => 0,
    }
}

fn build_command(ops: Vec<bson::Document>, namespaces: Vec<String>,
                 options: &BulkWriteOptions) -> bson::Document {
    let ops: Vec<_> = ops.into_iter().map(Bson::Document).collect();
    let ns_info: Vec<_> = namespaces.into_iter()
        .map(|ns| Bson::Document(doc! { "ns": ns }))
        .collect();

    doc! {
        "bulkWrite": 1,
        "errorsOnly": (!options.verbose_results),
        "ordered": (options.ordered),
        "ops": ops,
        "nsInfo": ns_info
    }
}

/// A single logical bulk-write call against one transport.
///
/// The call-wide timeout, when set, is checked before every batch dispatch
/// and every cursor fetch; once expired, no further commands are issued.
pub struct BulkWrite<'a, T: Transport + 'a> {
    transport: &'a mut T,
    listener: Option<&'a Listener>,
    timeout: Option<Duration>,
}

impl<'a, T: Transport> BulkWrite<'a, T> {
    pub fn new(transport: &'a mut T) -> BulkWrite<'a, T> {
        BulkWrite {
            transport: transport,
            listener: None,
            timeout: None,
        }
    }

    /// Registers command-monitoring hooks for this call.
    pub fn with_listener(mut self, listener: &'a Listener) -> BulkWrite<'a, T> {
        self.listener = Some(listener);
        self
    }

    /// Bounds the whole call, covering every batch and fetch it issues.
    pub fn with_timeout(mut self, timeout: Duration) -> BulkWrite<'a, T> {
        self.timeout = Some(timeout);
        self
    }

    /// Executes `models` in order as one logical bulk write.
    ///
    /// Returns the aggregate result on full success. Any per-operation error,
    /// write-concern error or call-fatal failure is returned as
    /// `Error::BulkWriteError` carrying the partial result accumulated so
    /// far. Validation and oversized-document failures abort before anything
    /// is sent.
    pub fn execute(mut self,
                   models: &[WriteModel],
                   options: &BulkWriteOptions,
                   mut session: Option<&mut T::Session>)
                   -> Result<BulkWriteResult> {
        if models.is_empty() {
            return Ok(BulkWriteResult::new());
        }

        for model in models {
            model.validate()?;
        }

        let limits = self.transport.limits();
        let plan = plan_batches(models, &limits)?;
        let batches = plan.batches;
        let inserted_ids = plan.inserted_ids;

        let operation_id = next_id();
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);

        let mut result = BulkWriteResult::new();
        let mut write_errors = Vec::new();
        let mut write_concern_errors = Vec::new();

        for batch in batches {
            if deadline_expired(deadline) {
                let cause = Error::Timeout(String::from(
                    "Deadline expired before the next batch could be dispatched."));
                return Err(Error::BulkWriteError(BulkWriteException::new(
                    result, write_errors, write_concern_errors, Some(cause))));
            }

            let errors_before = write_errors.len();
            let outcome = self.dispatch_batch(batch, options, operation_id, deadline,
                                              models, &inserted_ids, &mut session,
                                              &mut result, &mut write_errors,
                                              &mut write_concern_errors);

            if let Err(cause) = outcome {
                return Err(Error::BulkWriteError(BulkWriteException::new(
                    result, write_errors, write_concern_errors, Some(cause))));
            }

            // Ordered mode never dispatches past a batch with write errors.
            if options.ordered && write_errors.len() > errors_before {
                break;
            }
        }

        if write_errors.is_empty() && write_concern_errors.is_empty() {
            Ok(result)
        } else {
            Err(Error::BulkWriteError(BulkWriteException::new(
                result, write_errors, write_concern_errors, None)))
        }
    }

    fn dispatch_batch(&mut self,
                      batch: Batch,
                      options: &BulkWriteOptions,
                      operation_id: i64,
                      deadline: Option<Instant>,
                      models: &[WriteModel],
                      inserted_ids: &BTreeMap<i64, Bson>,
                      session: &mut Option<&mut T::Session>,
                      result: &mut BulkWriteResult,
                      write_errors: &mut Vec<WriteError>,
                      write_concern_errors: &mut Vec<WriteConcernError>)
                      -> Result<()> {
        let start_index = batch.start_index as i64;
        let command = build_command(batch.ops, batch.namespaces, options);
        let request_id = next_id();

        self.run_start_hooks(&CommandStarted {
            command: command.clone(),
            command_name: String::from("bulkWrite"),
            request_id: request_id,
            operation_id: operation_id,
        })?;

        let init_time = time::precise_time_ns();

        let reply = match self.transport.send(command, reborrow(session)) {
            Ok(reply) => reply,
            Err(err) => {
                return Err(self.emit_failure("bulkWrite", request_id, operation_id,
                                             init_time, err))
            }
        };

        if !reply_ok(&reply) {
            let message = match reply.get("errmsg") {
                Some(&Bson::String(ref msg)) => msg.to_owned(),
                _ => format!("Server rejected bulkWrite command: {:?}", reply),
            };
            return Err(self.emit_failure("bulkWrite", request_id, operation_id,
                                         init_time, Error::OperationError(message)));
        }

        let duration = time::precise_time_ns() - init_time;
        let _ = self.run_completion_hooks(&CommandResult::Success {
            duration: duration,
            reply: reply.clone(),
            command_name: String::from("bulkWrite"),
            request_id: request_id,
            operation_id: operation_id,
        });

        if let Some(&Bson::Document(ref wc_error)) = reply.get("writeConcernError") {
            write_concern_errors.push(WriteConcernError::parse(wc_error)?);
        }

        result.merge_summary(&reply);

        let mut cursor = ResultCursor::from_reply(&reply)?;
        loop {
            if let Some(doc) = cursor.pop() {
                process_result_document(start_index, models, inserted_ids, options,
                                        &doc, result, write_errors)?;
                continue;
            }

            if cursor.is_exhausted() {
                break;
            }

            if deadline_expired(deadline) {
                return Err(Error::Timeout(String::from(
                    "Deadline expired while draining the results cursor.")));
            }

            self.fetch_more(&mut cursor, operation_id, session)?;
        }

        Ok(())
    }

    fn fetch_more(&mut self,
                  cursor: &mut ResultCursor,
                  operation_id: i64,
                  session: &mut Option<&mut T::Session>)
                  -> Result<()> {
        let request_id = next_id();

        self.run_start_hooks(&CommandStarted {
            command: cursor.get_more_command(),
            command_name: String::from("getMore"),
            request_id: request_id,
            operation_id: operation_id,
        })?;

        let init_time = time::precise_time_ns();

        match cursor.fetch(self.transport, reborrow(session)) {
            Ok(()) => {
                let duration = time::precise_time_ns() - init_time;
                let _ = self.run_completion_hooks(&CommandResult::Success {
                    duration: duration,
                    reply: doc! {},
                    command_name: String::from("getMore"),
                    request_id: request_id,
                    operation_id: operation_id,
                });
                Ok(())
            }
            Err(err) => Err(self.emit_failure("getMore", request_id, operation_id,
                                              init_time, err)),
        }
    }

    fn run_start_hooks(&self, started: &CommandStarted) -> Result<()> {
        match self.listener {
            Some(listener) => match listener.run_start_hooks(started) {
                Ok(()) => Ok(()),
                Err(_) => Err(Error::EventListenerError(None)),
            },
            None => Ok(()),
        }
    }

    fn run_completion_hooks(&self, result: &CommandResult) -> Result<()> {
        match self.listener {
            Some(listener) => listener.run_completion_hooks(result),
            None => Ok(()),
        }
    }

    fn emit_failure(&self, command_name: &str, request_id: i64, operation_id: i64,
                    init_time: u64, err: Error) -> Error {
        let duration = time::precise_time_ns() - init_time;
        let hook_result = self.run_completion_hooks(&CommandResult::Failure {
            duration: duration,
            command_name: command_name.to_owned(),
            failure: &err,
            request_id: request_id,
            operation_id: operation_id,
        });

        match hook_result {
            Ok(_) => err,
            Err(_) => Error::EventListenerError(Some(Box::new(err))),
        }
    }
}

/// Remaps one individual-result document onto its original operation index
/// and folds it into the aggregate.
fn process_result_document(start_index: i64,
                           models: &[WriteModel],
                           inserted_ids: &BTreeMap<i64, Bson>,
                           options: &BulkWriteOptions,
                           doc: &bson::Document,
                           result: &mut BulkWriteResult,
                           write_errors: &mut Vec<WriteError>)
                           -> Result<()> {
    if count_field(doc, "ok") != 1 {
        write_errors.push(WriteError::parse(start_index, doc)?);
        return Ok(());
    }

    if !options.verbose_results {
        return Ok(());
    }

    let index = match doc.get("idx") {
        Some(&Bson::I32(idx)) => start_index + idx as i64,
        Some(&Bson::I64(idx)) => start_index + idx,
        _ => return Err(Error::ResponseError(format!(
            "Individual result is missing its idx: {:?}", doc))),
    };

    let model = models.get(index as usize).ok_or_else(|| Error::ResponseError(format!(
        "Individual result index {} is out of range.", index)))?;

    match *model {
        WriteModel::InsertOne { .. } => {
            let id = inserted_ids.get(&index).cloned().ok_or_else(|| {
                Error::ResponseError(format!("No recorded id for insert at index {}.", index))
            })?;
            result.record_insert(index, id);
        }
        WriteModel::UpdateOne { .. } |
        WriteModel::UpdateMany { .. } |
        WriteModel::ReplaceOne { .. } => {
            result.record_update(index, UpdateResult::parse(doc)?);
        }
        WriteModel::DeleteOne { .. } |
        WriteModel::DeleteMany { .. } => {
            result.record_delete(index, count_field(doc, "n"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_shape_is_stable() {
        let ops = vec![doc! { "insert": 0, "document": { "x": 1 } }];
        let namespaces = vec![String::from("db.coll")];
        let command = build_command(ops, namespaces, &BulkWriteOptions::new());

        let keys: Vec<_> = command.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["bulkWrite", "errorsOnly", "ordered", "ops", "nsInfo"]);
        assert_eq!(command.get("errorsOnly"), Some(&Bson::Boolean(true)));
        assert_eq!(command.get("ordered"), Some(&Bson::Boolean(true)));

        let ns_info = match command.get("nsInfo") {
            Some(&Bson::Array(ref entries)) => entries.clone(),
            other => panic!("Unexpected nsInfo: {:?}", other),
        };
        assert_eq!(ns_info, vec![Bson::Document(doc! { "ns": "db.coll" })]);
    }

    #[test]
    fn request_ids_are_unique() {
        let first = next_id();
        let second = next_id();
        assert!(second > first);
    }
}
