//! Storage boundary traits
//!
//! The engine only talks to storage through these traits, so services can
//! run against the in-memory store in tests and SQLite in production.

use crate::domain::{Node, NodeId, NodeUpdate};
use crate::infrastructure::error::StoreResult;

/// Read access to node records.
///
/// Implemented both by stores (committed state) and by open transactions
/// (committed state plus the transaction's own writes).
pub trait NodeReader {
    /// Fetch a single node.
    fn fetch_by_id(&self, id: &NodeId) -> StoreResult<Option<Node>>;

    /// Direct children of `parent` (`None` = roots), sorted by `(order, id)`.
    fn fetch_children_of(&self, parent: Option<&NodeId>) -> StoreResult<Vec<Node>>;

    /// Every stored node, in no particular order.
    fn fetch_all(&self) -> StoreResult<Vec<Node>>;
}

/// An open write transaction.
///
/// Writers are serialized for the lifetime of the transaction. Dropping it
/// without calling [`NodeTransaction::commit`] discards every write.
pub trait NodeTransaction: NodeReader {
    /// Insert a new record; fails if the id already exists.
    fn insert(&mut self, node: &Node) -> StoreResult<()>;

    /// Apply a partial update; fails if the record is missing.
    fn update_fields(&mut self, id: &NodeId, update: &NodeUpdate) -> StoreResult<()>;

    /// Remove a single record; fails if the record is missing.
    fn delete_by_id(&mut self, id: &NodeId) -> StoreResult<()>;

    /// Publish all writes atomically.
    fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Durable mapping from node id to node record.
pub trait NodeStore: NodeReader + Send + Sync {
    /// Open a write transaction, waiting for (or failing on) other writers.
    fn begin(&self) -> StoreResult<Box<dyn NodeTransaction + '_>>;

    /// Short backend name for diagnostics.
    fn backend(&self) -> &'static str;
}
