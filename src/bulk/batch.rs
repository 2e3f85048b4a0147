//! Greedy partitioning of write models into size- and count-bounded batches.
use bson::{self, bson, doc, Bson};
use common::Limits;
use error::Error::DocumentTooLarge;
use error::Result;
use super::options::WriteModel;
use std::collections::BTreeMap;
use std::mem;

/// Encoded BSON size of a document, in bytes.
pub fn encoded_len(doc: &bson::Document) -> Result<usize> {
    let mut buf = Vec::new();
    bson::encode_document(&mut buf, doc)?;
    Ok(buf.len())
}

/// Deduplicates the namespaces referenced by one batch, assigning stable
/// first-seen indices. Reset when a new batch starts; no state survives a
/// batch boundary.
pub struct NamespaceRegistry {
    entries: Vec<String>,
}

impl NamespaceRegistry {
    pub fn new() -> NamespaceRegistry {
        NamespaceRegistry { entries: Vec::new() }
    }

    fn index_of(&self, namespace: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry == namespace)
    }

    /// The marginal byte cost of referencing `namespace` from the current
    /// batch: zero when already registered, otherwise the encoded size of its
    /// `nsInfo` entry.
    pub fn cost(&self, namespace: &str) -> Result<usize> {
        match self.index_of(namespace) {
            Some(_) => Ok(0),
            None => encoded_len(&doc! { "ns": namespace }),
        }
    }

    /// Returns the index of `namespace`, appending a new entry on first use.
    pub fn get_or_assign(&mut self, namespace: &str) -> usize {
        match self.index_of(namespace) {
            Some(index) => index,
            None => {
                self.entries.push(namespace.to_owned());
                self.entries.len() - 1
            }
        }
    }

    /// Drains the registered namespaces in first-seen order, resetting the
    /// registry for the next batch.
    pub fn take_entries(&mut self) -> Vec<String> {
        mem::replace(&mut self.entries, Vec::new())
    }
}

/// A contiguous, order-preserving slice of the original operation list,
/// encoded and sized for one `bulkWrite` command.
pub struct Batch {
    /// Original index of this batch's first operation.
    pub start_index: usize,
    /// Encoded `ops` entries, namespace indices already assigned.
    pub ops: Vec<bson::Document>,
    /// Distinct namespaces in first-seen order; becomes the `nsInfo` array.
    pub namespaces: Vec<String>,
    /// Running encoded size of `ops` plus `nsInfo` entries.
    pub size_bytes: usize,
}

impl Batch {
    pub fn count(&self) -> usize {
        self.ops.len()
    }
}

/// The full dispatch plan for one logical call.
pub struct Plan {
    pub batches: Vec<Batch>,
    /// Ids (client-generated where absent) of inserted documents, keyed by
    /// original operation index.
    pub inserted_ids: BTreeMap<i64, Bson>,
}

/// Packs `models` into batches with a greedy, single-pass, order-preserving
/// scan. Each batch is filled maximally before overflowing into the next; the
/// planner never looks ahead or reorders.
///
/// Fails with `DocumentTooLarge` before anything is dispatched when a single
/// operation exceeds the per-document cap or cannot fit an otherwise-empty
/// batch.
pub fn plan_batches(models: &[WriteModel], limits: &Limits) -> Result<Plan> {
    let budget = limits.payload_budget();
    let max_count = if limits.max_write_batch_size < 1 {
        1
    } else {
        limits.max_write_batch_size as usize
    };

    let mut batches = Vec::new();
    let mut inserted_ids = BTreeMap::new();

    let mut registry = NamespaceRegistry::new();
    let mut ops: Vec<bson::Document> = Vec::new();
    let mut start_index = 0;
    let mut size_bytes = 0;

    for (index, model) in models.iter().enumerate() {
        let (mut op, inserted_id) = model.to_op_document(0)?;
        let op_len = encoded_len(&op)?;

        if op_len > limits.max_bson_object_size as usize {
            return Err(DocumentTooLarge(format!(
                "Operation at index {} is {} bytes, exceeding the {}-byte document limit.",
                index, op_len, limits.max_bson_object_size)));
        }

        let namespace = model.namespace();
        let ns_cost = registry.cost(namespace)?;

        if !ops.is_empty() &&
           (ops.len() + 1 > max_count || size_bytes + op_len + ns_cost > budget) {
            batches.push(Batch {
                start_index: start_index,
                ops: mem::replace(&mut ops, Vec::new()),
                namespaces: registry.take_entries(),
                size_bytes: size_bytes,
            });
            start_index = index;
            size_bytes = 0;
        }

        let ns_cost = registry.cost(namespace)?;
        if op_len + ns_cost > budget {
            return Err(DocumentTooLarge(format!(
                "Operation at index {} is {} bytes and cannot fit an empty batch \
                 (budget {} bytes).",
                index, op_len + ns_cost, budget)));
        }

        let ns_index = registry.get_or_assign(namespace);
        op.insert(model.op_name(), ns_index as i32);
        size_bytes += op_len + ns_cost;
        ops.push(op);

        if let Some(id) = inserted_id {
            inserted_ids.insert(index as i64, id);
        }
    }

    if !ops.is_empty() {
        batches.push(Batch {
            start_index: start_index,
            ops: ops,
            namespaces: registry.take_entries(),
            size_bytes: size_bytes,
        });
    }

    Ok(Plan {
        batches: batches,
        inserted_ids: inserted_ids,
    })
}
