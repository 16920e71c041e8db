//! Ancestry index: adjacency view of a node snapshot for cycle checks and cascades.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{instrument, warn};

use crate::domain::node::{Node, NodeId};

/// Parent and child adjacency built from a flat node snapshot.
///
/// Child lists are kept sorted by `(order, id)`. All walks are iterative and
/// bounded by the number of indexed nodes, so corrupt (cyclic) input
/// terminates instead of looping.
#[derive(Debug, Clone, Default)]
pub struct AncestryIndex {
    parents: HashMap<NodeId, Option<NodeId>>,
    children: HashMap<Option<NodeId>, Vec<NodeId>>,
}

impl AncestryIndex {
    #[instrument(level = "trace", skip(nodes), fields(nodes = nodes.len()))]
    pub fn build(nodes: &[Node]) -> Self {
        let mut parents = HashMap::with_capacity(nodes.len());
        let mut grouped: HashMap<Option<NodeId>, Vec<(u32, NodeId)>> = HashMap::new();

        for node in nodes {
            parents.insert(node.id, node.parent_id);
            grouped
                .entry(node.parent_id)
                .or_default()
                .push((node.order, node.id));
        }

        let children = grouped
            .into_iter()
            .map(|(parent, mut members)| {
                members.sort();
                (parent, members.into_iter().map(|(_, id)| id).collect())
            })
            .collect();

        Self { parents, children }
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.parents.contains_key(id)
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<NodeId> {
        self.parents.get(id).copied().flatten()
    }

    /// Direct children of `parent` (`None` = root group), ordered.
    pub fn children_of(&self, parent: Option<&NodeId>) -> &[NodeId] {
        self.children
            .get(&parent.copied())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn roots(&self) -> &[NodeId] {
        self.children_of(None)
    }

    /// True if `of` is reached by following parent links from `candidate`.
    ///
    /// A node is never its own descendant.
    pub fn is_descendant(&self, candidate: &NodeId, of: &NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.parent_of(candidate);

        while let Some(id) = current {
            if &id == of {
                return true;
            }
            if !visited.insert(id) {
                warn!("cycle in parent links at {}", id);
                return false;
            }
            current = self.parent_of(&id);
        }
        false
    }

    /// Parent chain of `id`, nearest ancestor first.
    pub fn ancestors_of(&self, id: &NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut visited = HashSet::from([*id]);
        let mut current = self.parent_of(id);

        while let Some(ancestor) = current {
            if !visited.insert(ancestor) {
                warn!("cycle in parent links at {}", ancestor);
                break;
            }
            ancestors.push(ancestor);
            current = self.parent_of(&ancestor);
        }
        ancestors
    }

    /// Every transitive descendant of `id` in breadth-first order,
    /// excluding `id` itself.
    pub fn descendants_of(&self, id: &NodeId) -> Vec<NodeId> {
        let mut descendants = Vec::new();
        let mut visited = HashSet::from([*id]);
        let mut queue = VecDeque::from([*id]);

        while let Some(current) = queue.pop_front() {
            for child in self.children_of(Some(&current)) {
                if visited.insert(*child) {
                    descendants.push(*child);
                    queue.push_back(*child);
                }
            }
        }
        descendants
    }

    /// Depth of `id` below its root (roots have depth 0).
    pub fn depth_of(&self, id: &NodeId) -> usize {
        self.ancestors_of(id).len()
    }
}
