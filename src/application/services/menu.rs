//! Menu tree service
//!
//! The single writer of node state. Every mutation runs inside one store
//! transaction: existence checks, cycle checks, field updates and sibling
//! renumbering either all commit or none do.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    validate_name, AncestryIndex, DomainError, Forest, Node, NodeDetail, NodeId, NodeUpdate,
    OrderChange, SiblingGroup,
};
use crate::infrastructure::traits::{NodeReader, NodeStore, NodeTransaction};
use crate::infrastructure::StoreError;

/// Retries after a store write conflict before giving up.
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

/// Pause before retry `n` is `n` times this.
const CONFLICT_BACKOFF: Duration = Duration::from_millis(25);

/// Combined rename and move.
///
/// `parent_id`: `None` leaves the parent alone, `Some(None)` makes the node a root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuUpdate {
    pub name: Option<String>,
    pub parent_id: Option<Option<NodeId>>,
}

/// Ids removed by a delete: the target first, then its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub removed: Vec<NodeId>,
}

/// Position a node ended up at after a reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReorderOutcome {
    pub order: u32,
}

/// Service owning every read and write of the menu tree.
pub struct MenuService {
    store: Arc<dyn NodeStore>,
    max_conflict_retries: u32,
}

impl MenuService {
    /// Create a new menu service.
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self {
            store,
            max_conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    // ============================================================
    // WRITES
    // ============================================================

    /// Create a node appended at the tail of its sibling group.
    #[instrument(level = "debug", skip(self))]
    pub fn create(&self, name: &str, parent_id: Option<NodeId>) -> ApplicationResult<Node> {
        let name = validate_name(name)?;
        let node = self.write("create", |tx| {
            if let Some(parent) = parent_id {
                if tx.fetch_by_id(&parent)?.is_none() {
                    return Err(DomainError::ParentNotFound(parent).into());
                }
            }
            let group = normalize_group(tx, parent_id.as_ref(), None)?;
            let node = Node::new(name.clone(), parent_id, group.next_order());
            tx.insert(&node)?;
            Ok(node)
        })?;
        info!("created {} at order {}", node, node.order);
        Ok(node)
    }

    /// Change the display name only.
    #[instrument(level = "debug", skip(self))]
    pub fn rename(&self, id: &NodeId, name: &str) -> ApplicationResult<Node> {
        let name = validate_name(name)?;
        self.write("rename", |tx| {
            let node = require(&*tx, id)?;
            rename_in(tx, node, &name)
        })
    }

    /// Reparent `id` under `new_parent` (`None` = root), appending it at the
    /// tail of the new sibling group.
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(&self, id: &NodeId, new_parent: Option<NodeId>) -> ApplicationResult<Node> {
        self.write("move", |tx| {
            let node = require(&*tx, id)?;
            move_in(tx, node, new_parent)
        })
    }

    /// Rename and/or move in one transaction.
    #[instrument(level = "debug", skip(self))]
    pub fn update(&self, id: &NodeId, changes: &MenuUpdate) -> ApplicationResult<Node> {
        let name = changes.name.as_deref().map(validate_name).transpose()?;
        self.write("update", |tx| {
            let mut node = require(&*tx, id)?;
            if let Some(name) = &name {
                node = rename_in(tx, node, name)?;
            }
            if let Some(parent) = changes.parent_id {
                node = move_in(tx, node, parent)?;
            }
            Ok(node)
        })
    }

    /// Delete `id` and its entire subtree; former siblings are renumbered.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, id: &NodeId) -> ApplicationResult<DeleteOutcome> {
        let outcome = self.write("delete", |tx| {
            let node = require(&*tx, id)?;
            let index = AncestryIndex::build(&tx.fetch_all()?);
            let descendants = index.descendants_of(id);

            // breadth-first list reversed: children go before their parents
            for descendant in descendants.iter().rev() {
                tx.delete_by_id(descendant)?;
            }
            tx.delete_by_id(id)?;
            normalize_group(tx, node.parent_id.as_ref(), None)?;

            let mut removed = Vec::with_capacity(descendants.len() + 1);
            removed.push(*id);
            removed.extend(descendants);
            Ok(removed)
        })?;
        info!("deleted {} ({} nodes)", id, outcome.len());
        Ok(DeleteOutcome { removed: outcome })
    }

    /// Move `id` to position `target` inside its current sibling group.
    ///
    /// The target is clamped into `[0, number of other siblings]`, then every
    /// member of the group is renumbered from its new position.
    #[instrument(level = "debug", skip(self))]
    pub fn reorder(&self, id: &NodeId, target: i64) -> ApplicationResult<ReorderOutcome> {
        self.write("reorder", |tx| {
            let node = require(&*tx, id)?;
            let siblings = tx.fetch_children_of(node.parent_id.as_ref())?;
            let mut group = SiblingGroup::new(siblings, None);
            let order = group.reposition(node, target);
            apply_changes(tx, group.renumber())?;
            debug!("reordered {} to {} (requested {})", id, order, target);
            Ok(ReorderOutcome { order })
        })
    }

    // ============================================================
    // READS
    // ============================================================

    /// A node with its parent and ordered children.
    #[instrument(level = "debug", skip(self))]
    pub fn get(&self, id: &NodeId) -> ApplicationResult<NodeDetail> {
        let store = self.store.as_ref();
        let node = require(store, id)?;
        let parent = match node.parent_id {
            Some(parent_id) => store.fetch_by_id(&parent_id)?,
            None => None,
        };
        let children = SiblingGroup::new(store.fetch_children_of(Some(id))?, None)
            .members()
            .to_vec();
        Ok(NodeDetail {
            node,
            parent,
            children,
        })
    }

    /// Path from the root down to `id`, inclusive.
    #[instrument(level = "debug", skip(self))]
    pub fn path(&self, id: &NodeId) -> ApplicationResult<Vec<Node>> {
        let nodes = self.store.fetch_all()?;
        let index = AncestryIndex::build(&nodes);
        if !index.contains(id) {
            return Err(DomainError::NodeNotFound(*id).into());
        }

        let mut chain = index.ancestors_of(id);
        chain.reverse();
        chain.push(*id);

        let by_id: std::collections::HashMap<_, _> =
            nodes.into_iter().map(|node| (node.id, node)).collect();
        Ok(chain
            .iter()
            .filter_map(|step| by_id.get(step).cloned())
            .collect())
    }

    /// The whole tree as an ordered forest.
    #[instrument(level = "debug", skip(self))]
    pub fn forest(&self) -> ApplicationResult<Forest> {
        Ok(Forest::build(self.store.fetch_all()?))
    }

    /// The forest filtered by a case-insensitive name search.
    #[instrument(level = "debug", skip(self))]
    pub fn search(&self, term: &str) -> ApplicationResult<Forest> {
        Ok(self.forest()?.search(term))
    }

    // ============================================================
    // TRANSACTIONS
    // ============================================================

    /// Run `op` in a transaction, restarting it from scratch on write conflicts.
    fn write<T>(
        &self,
        operation: &'static str,
        mut op: impl FnMut(&mut dyn NodeTransaction) -> ApplicationResult<T>,
    ) -> ApplicationResult<T> {
        let mut attempt = 0;
        loop {
            match self.attempt(&mut op) {
                Err(ApplicationError::Store(StoreError::Conflict(reason)))
                    if attempt < self.max_conflict_retries =>
                {
                    attempt += 1;
                    warn!(
                        "{}: write conflict ({}), retry {}/{}",
                        operation, reason, attempt, self.max_conflict_retries
                    );
                    thread::sleep(CONFLICT_BACKOFF * attempt);
                }
                result => return result,
            }
        }
    }

    fn attempt<T>(
        &self,
        op: &mut impl FnMut(&mut dyn NodeTransaction) -> ApplicationResult<T>,
    ) -> ApplicationResult<T> {
        let mut tx = self.store.begin()?;
        let value = op(tx.as_mut())?;
        tx.commit()?;
        Ok(value)
    }
}

fn require<R: NodeReader + ?Sized>(reader: &R, id: &NodeId) -> ApplicationResult<Node> {
    reader
        .fetch_by_id(id)?
        .ok_or_else(|| DomainError::NodeNotFound(*id).into())
}

/// Re-sort and renumber one sibling group, writing back only changed members.
fn normalize_group(
    tx: &mut dyn NodeTransaction,
    parent: Option<&NodeId>,
    exclude: Option<&NodeId>,
) -> ApplicationResult<SiblingGroup> {
    let mut group = SiblingGroup::new(tx.fetch_children_of(parent)?, exclude);
    apply_changes(tx, group.renumber())?;
    Ok(group)
}

fn apply_changes(tx: &mut dyn NodeTransaction, changes: Vec<OrderChange>) -> ApplicationResult<()> {
    for change in changes {
        tx.update_fields(&change.id, &NodeUpdate::order(change.order))?;
    }
    Ok(())
}

fn rename_in(tx: &mut dyn NodeTransaction, mut node: Node, name: &str) -> ApplicationResult<Node> {
    let update = NodeUpdate::name(name);
    tx.update_fields(&node.id, &update)?;
    update.apply(&mut node);
    Ok(node)
}

fn move_in(
    tx: &mut dyn NodeTransaction,
    mut node: Node,
    new_parent: Option<NodeId>,
) -> ApplicationResult<Node> {
    let id = node.id;
    if let Some(target) = new_parent {
        if target == id {
            return Err(DomainError::SelfParent(id).into());
        }
        if tx.fetch_by_id(&target)?.is_none() {
            return Err(DomainError::ParentNotFound(target).into());
        }
        let index = AncestryIndex::build(&tx.fetch_all()?);
        if index.is_descendant(&target, &id) {
            return Err(DomainError::CycleDetected { node: id, target }.into());
        }
    }

    if node.parent_id == new_parent {
        debug!("{} already under {:?}", id, new_parent);
        return Ok(node);
    }

    normalize_group(tx, node.parent_id.as_ref(), Some(&id))?;
    let group = normalize_group(tx, new_parent.as_ref(), Some(&id))?;
    let update = NodeUpdate::reparent(new_parent, group.next_order());
    tx.update_fields(&id, &update)?;
    update.apply(&mut node);
    Ok(node)
}
