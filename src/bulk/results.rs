//! Results for bulk-write operations.
use bson::{self, Bson};
use error::{Error, Result};
use std::collections::BTreeMap;

/// The aggregate outcome of one logical bulk-write call.
///
/// Counters sum arithmetically across every batch dispatched; the per-index
/// result maps are populated only in verbose mode, keyed by each operation's
/// position in the original model list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkWriteResult {
    pub inserted_count: i64,
    pub matched_count: i64,
    pub modified_count: i64,
    pub deleted_count: i64,
    pub upserted_count: i64,
    pub insert_results: BTreeMap<i64, InsertOneResult>,
    pub update_results: BTreeMap<i64, UpdateResult>,
    pub delete_results: BTreeMap<i64, DeleteResult>,
}

/// Verbose result for a single insert operation.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    pub inserted_id: Bson,
}

/// Verbose result for a single update or replace operation.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    pub matched_count: i64,
    pub modified_count: i64,
    pub upserted_id: Option<Bson>,
}

/// Verbose result for a single delete operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteResult {
    pub deleted_count: i64,
}

fn get_count(doc: &bson::Document, key: &str) -> i64 {
    match doc.get(key) {
        Some(&Bson::I32(n)) => n as i64,
        Some(&Bson::I64(n)) => n,
        Some(&Bson::FloatingPoint(n)) => n as i64,
        _ => 0,
    }
}

impl BulkWriteResult {
    pub fn new() -> BulkWriteResult {
        Default::default()
    }

    /// Folds one batch reply's summary counters into this result.
    pub fn merge_summary(&mut self, reply: &bson::Document) {
        self.inserted_count += get_count(reply, "nInserted");
        self.matched_count += get_count(reply, "nMatched");
        self.modified_count += get_count(reply, "nModified");
        self.deleted_count += get_count(reply, "nDeleted");
        self.upserted_count += get_count(reply, "nUpserted");
    }

    pub fn record_insert(&mut self, index: i64, inserted_id: Bson) {
        self.insert_results.insert(index, InsertOneResult { inserted_id: inserted_id });
    }

    pub fn record_update(&mut self, index: i64, result: UpdateResult) {
        self.update_results.insert(index, result);
    }

    pub fn record_delete(&mut self, index: i64, deleted_count: i64) {
        self.delete_results.insert(index, DeleteResult { deleted_count: deleted_count });
    }
}

impl UpdateResult {
    /// Extracts an individual update result from a results-cursor document.
    /// An upserting update matches nothing, so `n` counts toward `matched`
    /// only when no `upserted` id is present.
    pub fn parse(doc: &bson::Document) -> Result<UpdateResult> {
        let n = get_count(doc, "n");
        let n_modified = get_count(doc, "nModified");

        let upserted_id = match doc.get("upserted") {
            Some(&Bson::Document(ref upserted)) => match upserted.get("_id") {
                Some(id) => Some(id.clone()),
                None => return Err(Error::ResponseError(format!(
                    "Upserted entry is missing its _id: {:?}", doc))),
            },
            Some(other) => return Err(Error::ResponseError(format!(
                "Unexpected upserted entry: {:?}", other))),
            None => None,
        };

        let matched = if upserted_id.is_some() { n - 1 } else { n };

        Ok(UpdateResult {
            matched_count: matched,
            modified_count: n_modified,
            upserted_id: upserted_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{bson, doc};

    #[test]
    fn summary_counters_sum_across_batches() {
        let mut result = BulkWriteResult::new();
        result.merge_summary(&doc! {
            "ok": 1, "nInserted": 3, "nMatched": 2, "nModified": 1,
            "nUpserted": 1, "nDeleted": 0
        });
        result.merge_summary(&doc! {
            "ok": 1, "nInserted": 1, "nMatched": 0, "nModified": 0,
            "nUpserted": 2, "nDeleted": 4
        });

        assert_eq!(result.inserted_count, 4);
        assert_eq!(result.matched_count, 2);
        assert_eq!(result.modified_count, 1);
        assert_eq!(result.upserted_count, 3);
        assert_eq!(result.deleted_count, 4);
    }

    #[test]
    fn missing_counters_default_to_zero() {
        let mut result = BulkWriteResult::new();
        result.merge_summary(&doc! { "ok": 1 });
        assert_eq!(result, BulkWriteResult::new());
    }

    #[test]
    fn update_result_counts_upsert_as_unmatched() {
        let parsed = UpdateResult::parse(&doc! {
            "ok": 1, "idx": 0, "n": 1, "nModified": 0,
            "upserted": { "_id": "abc" }
        }).unwrap();

        assert_eq!(parsed.matched_count, 0);
        assert_eq!(parsed.modified_count, 0);
        assert_eq!(parsed.upserted_id, Some(Bson::String(String::from("abc"))));
    }

    #[test]
    fn update_result_without_upsert() {
        let parsed = UpdateResult::parse(&doc! {
            "ok": 1, "idx": 2, "n": 1, "nModified": 1
        }).unwrap();

        assert_eq!(parsed.matched_count, 1);
        assert_eq!(parsed.modified_count, 1);
        assert_eq!(parsed.upserted_id, None);
    }
}
