//! Client-side `bulkWrite` command batching for MongoDB drivers.
//!
//! This crate turns an ordered list of heterogeneous write operations into the
//! minimal sequence of `bulkWrite` commands that respects the server-advertised
//! count and message-size limits, then reconciles the per-batch replies back
//! into one logical result indexed by original operation position.
//!
//! ```no_run
//! # extern crate bson;
//! # extern crate mongodb_bulkwrite;
//! # use mongodb_bulkwrite::{BulkWrite, BulkWriteOptions, WriteModel};
//! # use mongodb_bulkwrite::transport::Transport;
//! # fn demo<T: Transport>(transport: &mut T) -> mongodb_bulkwrite::Result<()> {
//! use bson::{bson, doc};
//!
//! let models = vec![
//!     WriteModel::InsertOne {
//!         namespace: String::from("db.coll"),
//!         document: doc! { "x": 1 },
//!     },
//!     WriteModel::DeleteMany {
//!         namespace: String::from("db.other"),
//!         filter: doc! { "retired": true },
//!     },
//! ];
//!
//! let result = BulkWrite::new(transport)
//!     .execute(&models, &BulkWriteOptions::new(), None)?;
//! assert_eq!(result.inserted_count, 1);
//! # Ok(())
//! # }
//! ```
//!
//! Connection management, authentication and wire-level encoding live behind
//! the [`transport::Transport`] trait and are not provided here.

extern crate bson;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate time;

pub mod apm;
pub mod bulk;
pub mod common;
pub mod error;
pub mod transport;

pub use bulk::BulkWrite;
pub use bulk::options::{BulkWriteOptions, WriteModel};
pub use bulk::results::BulkWriteResult;
pub use common::Limits;
pub use error::{Error, Result};
