//! The executor boundary between this engine and an actual connection.
use bson::Document;
use common::Limits;
use error::Result;

/// A command executor supplied by the surrounding driver.
///
/// The engine issues every physical command (`bulkWrite` and `getMore` alike)
/// through [`send`](Transport::send), threading the caller's session handle
/// through unmodified. Implementations own connection checkout, wire encoding
/// and authentication; the engine never sees any of that.
pub trait Transport {
    /// Opaque session/transaction handle. The engine neither starts nor ends
    /// sessions; it only passes the handle along with each command.
    type Session;

    /// The write limits recorded from this connection's handshake.
    fn limits(&self) -> Limits;

    /// Runs one command round-trip, returning the server reply document.
    fn send(
        &mut self,
        command: Document,
        session: Option<&mut Self::Session>,
    ) -> Result<Document>;
}
