//! Server-advertised write limits.
use bson::{self, Bson};
use error::Result;

/// Default `maxWriteBatchSize` advertised by modern servers.
pub const DEFAULT_MAX_WRITE_BATCH_SIZE: i32 = 100_000;
/// Default `maxMessageSizeBytes` advertised by modern servers.
pub const DEFAULT_MAX_MESSAGE_SIZE_BYTES: i32 = 48_000_000;
/// Default `maxBsonObjectSize` advertised by modern servers.
pub const DEFAULT_MAX_BSON_OBJECT_SIZE: i32 = 16 * 1024 * 1024;

/// Fixed allowance for the command fields surrounding the `ops` and `nsInfo`
/// payload of one `bulkWrite` message.
pub const MESSAGE_OVERHEAD_BYTES: i32 = 1_000;

/// Write limits recorded from the server handshake. Immutable for the
/// duration of one bulk-write call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Limits {
    /// Upper bound on the number of operations in one command.
    pub max_write_batch_size: i32,
    /// Upper bound on the total encoded size of one command message.
    pub max_message_size_bytes: i32,
    /// Upper bound on the encoded size of a single document.
    pub max_bson_object_size: i32,
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            max_write_batch_size: DEFAULT_MAX_WRITE_BATCH_SIZE,
            max_message_size_bytes: DEFAULT_MAX_MESSAGE_SIZE_BYTES,
            max_bson_object_size: DEFAULT_MAX_BSON_OBJECT_SIZE,
        }
    }
}

impl Limits {
    /// Extracts the advertised limits from a `hello` handshake reply,
    /// falling back to the server defaults for absent fields.
    pub fn from_handshake(reply: &bson::Document) -> Result<Limits> {
        let limits = bson::from_bson(Bson::Document(reply.clone()))
            .map_err(|e| ::error::Error::ResponseError(format!(
                "Malformed handshake reply: {}", e)))?;
        Ok(limits)
    }

    /// The byte budget available to `ops` and `nsInfo` entries per batch.
    pub fn payload_budget(&self) -> usize {
        let budget = self.max_message_size_bytes - MESSAGE_OVERHEAD_BYTES;
        if budget < 0 { 0 } else { budget as usize }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{bson, doc};

    #[test]
    fn handshake_fields_override_defaults() {
        let reply = doc! {
            "ok": 1,
            "maxWriteBatchSize": 500,
            "maxMessageSizeBytes": 100_000,
            "maxBsonObjectSize": 20_000
        };

        let limits = Limits::from_handshake(&reply).unwrap();
        assert_eq!(limits.max_write_batch_size, 500);
        assert_eq!(limits.max_message_size_bytes, 100_000);
        assert_eq!(limits.max_bson_object_size, 20_000);
    }

    #[test]
    fn absent_fields_fall_back_to_defaults() {
        let limits = Limits::from_handshake(&doc! { "ok": 1 }).unwrap();
        assert_eq!(limits, Limits::default());
    }

    #[test]
    fn payload_budget_subtracts_overhead() {
        let mut limits = Limits::default();
        limits.max_message_size_bytes = 10_000;
        assert_eq!(limits.payload_budget(), 9_000);
    }
}
