//! Sibling ordering: keeps every sibling group numbered `0..n-1`.

use itertools::Itertools;

use crate::domain::node::{Node, NodeId};

/// A single `order` write produced by renumbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderChange {
    pub id: NodeId,
    pub order: u32,
}

/// Members of one sibling group (children of one parent, or all roots),
/// sorted by current `order` with ties broken by id.
///
/// Stored order values are never trusted: construction re-sorts and
/// [`SiblingGroup::renumber`] rewrites positions from scratch, reporting
/// only the members whose value actually changed.
#[derive(Debug, Clone, Default)]
pub struct SiblingGroup {
    members: Vec<Node>,
}

impl SiblingGroup {
    pub fn new(members: impl IntoIterator<Item = Node>, exclude: Option<&NodeId>) -> Self {
        let members = members
            .into_iter()
            .filter(|node| Some(&node.id) != exclude)
            .sorted_by(|a, b| (a.order, a.id).cmp(&(b.order, b.id)))
            .collect();
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Node] {
        &self.members
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.members.iter().map(|node| node.id).collect()
    }

    pub fn position_of(&self, id: &NodeId) -> Option<usize> {
        self.members.iter().position(|node| &node.id == id)
    }

    /// Order value for a node appended at the tail.
    pub fn next_order(&self) -> u32 {
        self.members.len() as u32
    }

    /// Remove `node` from the group (if present) and insert it at `target`,
    /// clamped into `[0, number of other members]`. Returns the position used.
    pub fn reposition(&mut self, node: Node, target: i64) -> u32 {
        self.members.retain(|member| member.id != node.id);
        let position = target.clamp(0, self.members.len() as i64) as usize;
        self.members.insert(position, node);
        position as u32
    }

    /// Assign `order = index` to every member; return only the changes.
    pub fn renumber(&mut self) -> Vec<OrderChange> {
        let mut changes = Vec::new();
        for (index, member) in self.members.iter_mut().enumerate() {
            let order = index as u32;
            if member.order != order {
                member.order = order;
                changes.push(OrderChange { id: member.id, order });
            }
        }
        changes
    }
}

/// True if `orders` is exactly `{0, 1, ..., n-1}`.
pub fn is_contiguous(orders: impl IntoIterator<Item = u32>) -> bool {
    orders
        .into_iter()
        .sorted()
        .enumerate()
        .all(|(index, order)| order == index as u32)
}
