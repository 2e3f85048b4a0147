//! Write models and options for bulk-write operations.
use bson::{self, bson, doc, oid, Bson};
use error::Error::ArgumentError;
use error::Result;

/// A single write operation, bound to its target namespace.
///
/// Models are validated up front and are read-only to the engine once
/// submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteModel {
    InsertOne {
        namespace: String,
        document: bson::Document,
    },
    UpdateOne {
        namespace: String,
        filter: bson::Document,
        update: bson::Document,
        upsert: Option<bool>,
    },
    UpdateMany {
        namespace: String,
        filter: bson::Document,
        update: bson::Document,
        upsert: Option<bool>,
    },
    ReplaceOne {
        namespace: String,
        filter: bson::Document,
        replacement: bson::Document,
        upsert: Option<bool>,
    },
    DeleteOne {
        namespace: String,
        filter: bson::Document,
    },
    DeleteMany {
        namespace: String,
        filter: bson::Document,
    },
}

impl WriteModel {
    /// The `db.coll` namespace this model targets.
    pub fn namespace(&self) -> &str {
        match *self {
            WriteModel::InsertOne { ref namespace, .. } |
            WriteModel::UpdateOne { ref namespace, .. } |
            WriteModel::UpdateMany { ref namespace, .. } |
            WriteModel::ReplaceOne { ref namespace, .. } |
            WriteModel::DeleteOne { ref namespace, .. } |
            WriteModel::DeleteMany { ref namespace, .. } => namespace,
        }
    }

    /// The leading key of this model's entry in the command's `ops` array.
    pub fn op_name(&self) -> &'static str {
        match *self {
            WriteModel::InsertOne { .. } => "insert",
            WriteModel::UpdateOne { .. } |
            WriteModel::UpdateMany { .. } |
            WriteModel::ReplaceOne { .. } => "update",
            WriteModel::DeleteOne { .. } |
            WriteModel::DeleteMany { .. } => "delete",
        }
    }

    /// Rejects malformed models before anything is sent.
    pub fn validate(&self) -> Result<()> {
        WriteModel::validate_namespace(self.namespace())?;

        match *self {
            WriteModel::UpdateOne { ref update, .. } |
            WriteModel::UpdateMany { ref update, .. } => WriteModel::validate_update(update),
            WriteModel::ReplaceOne { ref replacement, .. } => {
                WriteModel::validate_replace(replacement)
            }
            _ => Ok(()),
        }
    }

    /// Builds this model's `ops` array entry, referencing its namespace by
    /// index. Inserts that lack an `_id` get a generated ObjectId; the id that
    /// will identify the inserted document is returned alongside.
    pub fn to_op_document(&self, ns_index: i32) -> Result<(bson::Document, Option<Bson>)> {
        match *self {
            WriteModel::InsertOne { ref document, .. } => {
                let mut with_id = document.clone();
                let id = match with_id.get("_id") {
                    Some(id) => id.clone(),
                    None => {
                        let id = Bson::ObjectId(oid::ObjectId::new()?);
                        with_id.insert("_id", id.clone());
                        id
                    }
                };

                let op = doc! {
                    "insert": ns_index,
                    "document": with_id
                };
                Ok((op, Some(id)))
            }
            WriteModel::UpdateOne { ref filter, ref update, upsert, .. } => {
                Ok((WriteModel::update_op(ns_index, filter, update, false, upsert), None))
            }
            WriteModel::UpdateMany { ref filter, ref update, upsert, .. } => {
                Ok((WriteModel::update_op(ns_index, filter, update, true, upsert), None))
            }
            WriteModel::ReplaceOne { ref filter, ref replacement, upsert, .. } => {
                Ok((WriteModel::update_op(ns_index, filter, replacement, false, upsert), None))
            }
            WriteModel::DeleteOne { ref filter, .. } => {
                Ok((WriteModel::delete_op(ns_index, filter, false), None))
            }
            WriteModel::DeleteMany { ref filter, .. } => {
                Ok((WriteModel::delete_op(ns_index, filter, true), None))
            }
        }
    }

    fn update_op(ns_index: i32, filter: &bson::Document, mods: &bson::Document,
                 multi: bool, upsert: Option<bool>) -> bson::Document {
        let mut op = doc! {
            "update": ns_index,
            "filter": (filter.clone()),
            "updateMods": (mods.clone()),
            "multi": multi
        };

        if let Some(upsert) = upsert {
            op.insert("upsert", upsert);
        }

        op
    }

    fn delete_op(ns_index: i32, filter: &bson::Document, multi: bool) -> bson::Document {
        doc! {
            "delete": ns_index,
            "filter": (filter.clone()),
            "multi": multi
        }
    }

    fn validate_namespace(namespace: &str) -> Result<()> {
        match namespace.find('.') {
            Some(idx) if idx > 0 && idx + 1 < namespace.len() => Ok(()),
            _ => Err(ArgumentError(format!(
                "Invalid namespace specified: '{}'.", namespace))),
        }
    }

    fn validate_update(update: &bson::Document) -> Result<()> {
        if update.is_empty() {
            return Err(ArgumentError(String::from("Update document cannot be empty.")));
        }

        for key in update.keys() {
            if !key.starts_with('$') {
                return Err(ArgumentError(String::from("Update only works with $ operators.")));
            }
        }
        Ok(())
    }

    fn validate_replace(replacement: &bson::Document) -> Result<()> {
        for key in replacement.keys() {
            if key.starts_with('$') {
                return Err(ArgumentError(String::from("Replacement cannot include $ operators.")));
            }
        }
        Ok(())
    }
}

/// Options for a bulk-write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkWriteOptions {
    /// Whether a per-operation error halts dispatch of subsequent batches.
    pub ordered: bool,
    /// Whether full per-operation results are retained rather than only
    /// aggregate counters.
    pub verbose_results: bool,
}

impl Default for BulkWriteOptions {
    fn default() -> BulkWriteOptions {
        BulkWriteOptions {
            ordered: true,
            verbose_results: false,
        }
    }
}

impl BulkWriteOptions {
    pub fn new() -> BulkWriteOptions {
        Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{bson, doc, Bson};

    #[test]
    fn namespace_requires_db_and_collection() {
        let bad = WriteModel::DeleteOne {
            namespace: String::from(".coll"),
            filter: doc! {},
        };
        assert!(bad.validate().is_err());

        let dotless = WriteModel::DeleteOne {
            namespace: String::from("coll"),
            filter: doc! {},
        };
        assert!(dotless.validate().is_err());

        let trailing = WriteModel::DeleteOne {
            namespace: String::from("db."),
            filter: doc! {},
        };
        assert!(trailing.validate().is_err());

        let ok = WriteModel::DeleteOne {
            namespace: String::from("db.coll"),
            filter: doc! {},
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn update_requires_dollar_operators() {
        let model = WriteModel::UpdateOne {
            namespace: String::from("db.coll"),
            filter: doc! { "x": 1 },
            update: doc! { "x": 2 },
            upsert: None,
        };
        assert!(model.validate().is_err());

        let empty = WriteModel::UpdateMany {
            namespace: String::from("db.coll"),
            filter: doc! {},
            update: doc! {},
            upsert: None,
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn replacement_rejects_dollar_operators() {
        let model = WriteModel::ReplaceOne {
            namespace: String::from("db.coll"),
            filter: doc! { "x": 1 },
            replacement: doc! { "$set": { "x": 2 } },
            upsert: None,
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn insert_op_generates_missing_id() {
        let model = WriteModel::InsertOne {
            namespace: String::from("db.coll"),
            document: doc! { "x": 1 },
        };

        let (op, id) = model.to_op_document(3).unwrap();
        assert_eq!(op.get("insert"), Some(&Bson::I32(3)));

        let document = match op.get("document") {
            Some(&Bson::Document(ref doc)) => doc,
            other => panic!("Unexpected document entry: {:?}", other),
        };
        assert_eq!(document.get("_id"), id.as_ref());
    }

    #[test]
    fn update_op_shape() {
        let model = WriteModel::UpdateMany {
            namespace: String::from("db.coll"),
            filter: doc! { "x": 1 },
            update: doc! { "$set": { "y": 2 } },
            upsert: Some(true),
        };

        let (op, id) = model.to_op_document(0).unwrap();
        assert!(id.is_none());
        assert_eq!(op.get("update"), Some(&Bson::I32(0)));
        assert_eq!(op.get("multi"), Some(&Bson::Boolean(true)));
        assert_eq!(op.get("upsert"), Some(&Bson::Boolean(true)));
        assert!(op.get("updateMods").is_some());
    }

    #[test]
    fn delete_op_shape() {
        let model = WriteModel::DeleteOne {
            namespace: String::from("db.coll"),
            filter: doc! { "x": 1 },
        };

        let (op, _) = model.to_op_document(1).unwrap();
        assert_eq!(op.get("delete"), Some(&Bson::I32(1)));
        assert_eq!(op.get("multi"), Some(&Bson::Boolean(false)));
    }
}
