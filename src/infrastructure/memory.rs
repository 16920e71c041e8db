//! In-memory node store

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard};

use itertools::Itertools;
use tracing::{instrument, trace};

use crate::domain::{Node, NodeId, NodeUpdate};
use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::traits::{NodeReader, NodeStore, NodeTransaction};

/// Process-local store.
///
/// Writers take an exclusive writer lock for the whole transaction and stage
/// their changes in an overlay; readers only ever see committed state.
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    nodes: RwLock<HashMap<NodeId, Node>>,
    writer: Mutex<()>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw records, bypassing every tree rule.
    pub fn with_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let nodes = nodes.into_iter().map(|node| (node.id, node)).collect();
        Self {
            nodes: RwLock::new(nodes),
            writer: Mutex::new(()),
        }
    }

    fn committed(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<NodeId, Node>>> {
        self.nodes.read().map_err(|_| StoreError::Poisoned)
    }
}

fn sorted_children(nodes: impl Iterator<Item = Node>, parent: Option<&NodeId>) -> Vec<Node> {
    nodes
        .filter(|node| node.parent_id.as_ref() == parent)
        .sorted_by(|a, b| (a.order, a.id).cmp(&(b.order, b.id)))
        .collect()
}

impl NodeReader for MemoryNodeStore {
    fn fetch_by_id(&self, id: &NodeId) -> StoreResult<Option<Node>> {
        Ok(self.committed()?.get(id).cloned())
    }

    fn fetch_children_of(&self, parent: Option<&NodeId>) -> StoreResult<Vec<Node>> {
        let nodes = self.committed()?;
        Ok(sorted_children(nodes.values().cloned(), parent))
    }

    fn fetch_all(&self) -> StoreResult<Vec<Node>> {
        Ok(self.committed()?.values().cloned().collect())
    }
}

impl NodeStore for MemoryNodeStore {
    #[instrument(level = "trace", skip(self))]
    fn begin(&self) -> StoreResult<Box<dyn NodeTransaction + '_>> {
        let writer = self.writer.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(Box::new(MemoryTransaction {
            store: self,
            _writer: writer,
            staged: HashMap::new(),
        }))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Staged writes over the committed map; `None` marks a deletion.
pub struct MemoryTransaction<'a> {
    store: &'a MemoryNodeStore,
    _writer: MutexGuard<'a, ()>,
    staged: HashMap<NodeId, Option<Node>>,
}

impl MemoryTransaction<'_> {
    fn snapshot(&self) -> StoreResult<HashMap<NodeId, Node>> {
        let mut nodes = self.store.committed()?.clone();
        for (id, entry) in &self.staged {
            match entry {
                Some(node) => {
                    nodes.insert(*id, node.clone());
                }
                None => {
                    nodes.remove(id);
                }
            }
        }
        Ok(nodes)
    }
}

impl NodeReader for MemoryTransaction<'_> {
    fn fetch_by_id(&self, id: &NodeId) -> StoreResult<Option<Node>> {
        match self.staged.get(id) {
            Some(entry) => Ok(entry.clone()),
            None => self.store.fetch_by_id(id),
        }
    }

    fn fetch_children_of(&self, parent: Option<&NodeId>) -> StoreResult<Vec<Node>> {
        Ok(sorted_children(self.snapshot()?.into_values(), parent))
    }

    fn fetch_all(&self) -> StoreResult<Vec<Node>> {
        Ok(self.snapshot()?.into_values().collect())
    }
}

impl NodeTransaction for MemoryTransaction<'_> {
    fn insert(&mut self, node: &Node) -> StoreResult<()> {
        if self.fetch_by_id(&node.id)?.is_some() {
            return Err(StoreError::DuplicateRecord(node.id));
        }
        self.staged.insert(node.id, Some(node.clone()));
        Ok(())
    }

    fn update_fields(&mut self, id: &NodeId, update: &NodeUpdate) -> StoreResult<()> {
        let mut node = self
            .fetch_by_id(id)?
            .ok_or(StoreError::MissingRecord(*id))?;
        update.apply(&mut node);
        self.staged.insert(*id, Some(node));
        Ok(())
    }

    fn delete_by_id(&mut self, id: &NodeId) -> StoreResult<()> {
        if self.fetch_by_id(id)?.is_none() {
            return Err(StoreError::MissingRecord(*id));
        }
        self.staged.insert(*id, None);
        Ok(())
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let store = self.store;
        let mut nodes = store.nodes.write().map_err(|_| StoreError::Poisoned)?;
        trace!("committing {} staged writes", self.staged.len());
        for (id, entry) in self.staged {
            match entry {
                Some(node) => {
                    nodes.insert(id, node);
                }
                None => {
                    nodes.remove(&id);
                }
            }
        }
        Ok(())
    }
}
