//! Pull-based draining of a batch's results cursor.
use bson::{self, bson, doc, Bson};
use error::{Error, Result};
use transport::Transport;
use std::collections::VecDeque;

/// The results cursor of one `bulkWrite` reply.
///
/// Individual operation results that did not fit the initial reply are
/// retrieved with repeated `getMore` fetches against the same cursor id. The
/// sequence is finite and non-restartable: each fetch blocks until the server
/// answers, and a cursor id of zero is the terminal signal.
pub struct ResultCursor {
    cursor_id: i64,
    namespace: String,
    buffer: VecDeque<bson::Document>,
}

impl ResultCursor {
    /// Extracts the cursor from a `bulkWrite` reply's `cursor` document.
    pub fn from_reply(reply: &bson::Document) -> Result<ResultCursor> {
        if let Some(&Bson::Document(ref cursor)) = reply.get("cursor") {
            if let Some(&Bson::I64(id)) = cursor.get("id") {
                if let Some(&Bson::String(ref ns)) = cursor.get("ns") {
                    if let Some(&Bson::Array(ref batch)) = cursor.get("firstBatch") {
                        let buffer = batch.iter()
                            .filter_map(|entry| {
                                if let Bson::Document(ref doc) = *entry {
                                    Some(doc.clone())
                                } else {
                                    None
                                }
                            })
                            .collect();

                        return Ok(ResultCursor {
                            cursor_id: id,
                            namespace: ns.to_owned(),
                            buffer: buffer,
                        });
                    }
                }
            }
        }

        Err(Error::CursorNotFoundError)
    }

    /// Takes the next buffered result document, if any.
    pub fn pop(&mut self) -> Option<bson::Document> {
        self.buffer.pop_front()
    }

    /// Whether the terminal empty-cursor signal has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.buffer.is_empty() && self.cursor_id == 0
    }

    /// Whether the next document has to come from a server fetch.
    pub fn fetch_pending(&self) -> bool {
        self.buffer.is_empty() && self.cursor_id != 0
    }

    /// The `getMore` command that continues this cursor.
    pub fn get_more_command(&self) -> bson::Document {
        let collection = match self.namespace.find('.') {
            Some(idx) => &self.namespace[idx + 1..],
            None => &self.namespace[..],
        };

        doc! {
            "getMore": (self.cursor_id),
            "collection": collection
        }
    }

    /// Runs one blocking `getMore` round-trip, appending the returned
    /// documents in arrival order.
    pub fn fetch<T: Transport>(&mut self, transport: &mut T,
                               session: Option<&mut T::Session>) -> Result<()> {
        let reply = transport.send(self.get_more_command(), session)?;

        let ok = match reply.get("ok") {
            Some(&Bson::I32(code)) => code == 1,
            Some(&Bson::I64(code)) => code == 1,
            Some(&Bson::FloatingPoint(code)) => code == 1.0,
            _ => false,
        };

        if !ok {
            let message = match reply.get("errmsg") {
                Some(&Bson::String(ref msg)) => msg.to_owned(),
                _ => format!("getMore failed: {:?}", reply),
            };
            return Err(Error::OperationError(message));
        }

        if let Some(&Bson::Document(ref cursor)) = reply.get("cursor") {
            if let Some(&Bson::I64(id)) = cursor.get("id") {
                if let Some(&Bson::Array(ref batch)) = cursor.get("nextBatch") {
                    self.cursor_id = id;
                    for entry in batch {
                        if let Bson::Document(ref doc) = *entry {
                            self.buffer.push_back(doc.clone());
                        }
                    }
                    return Ok(());
                }
            }
        }

        Err(Error::CursorNotFoundError)
    }

    /// Pulls the next result document, fetching whenever the buffer runs dry.
    pub fn next<T: Transport>(&mut self, transport: &mut T,
                              mut session: Option<&mut T::Session>)
                              -> Option<Result<bson::Document>> {
        loop {
            if let Some(doc) = self.buffer.pop_front() {
                return Some(Ok(doc));
            }

            if self.cursor_id == 0 {
                return None;
            }

            let reborrowed = match session {
                Some(ref mut handle) => Some(&mut **handle),
                None => None,
            };

            if let Err(err) = self.fetch(transport, reborrowed) {
                return Some(Err(err));
            }
        }
    }
}
