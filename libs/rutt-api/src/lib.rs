//! Correlation record data model and the partial-update protocol.
//!
//! A record is a schema-less JSON object per correlation id. It is built
//! incrementally by merge-upserts, each of which sets exactly one leaf
//! addressed by a [`path::FieldPath`].

pub mod error;
pub mod operation;
pub mod path;
pub mod record;
pub mod store;

pub use error::{ErrorKind, StoreError};
pub use operation::Operation;
pub use path::{FieldPath, Segment};
pub use record::{CorrelationRecord, Document, Update, merge_at};
pub use store::{CorrelationStore, StoreFuture};
