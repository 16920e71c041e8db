//! Tree assembly: turns the flat node list into an ordered, nested forest.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use termtree::Tree;
use tracing::{instrument, warn};

use crate::domain::node::{Node, NodeId};

/// A node with its ordered children attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForestNode {
    pub id: NodeId,
    pub name: String,
    pub parent_id: Option<NodeId>,
    pub order: u32,
    pub children: Vec<ForestNode>,
}

impl ForestNode {
    fn from_node(node: Node, children: Vec<ForestNode>) -> Self {
        Self {
            id: node.id,
            name: node.name,
            parent_id: node.parent_id,
            order: node.order,
            children,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
    }

    /// Copy of this node's own fields, attached to `children`.
    fn with_children(&self, children: Vec<ForestNode>) -> ForestNode {
        ForestNode {
            id: self.id,
            name: self.name.clone(),
            parent_id: self.parent_id,
            order: self.order,
            children,
        }
    }

    fn label(&self) -> String {
        format!("{} [{}] {}", self.name, self.order, self.id)
    }
}

// Nesting depth is unbounded, so subtrees are unlinked onto a heap stack
// instead of being dropped one stack frame per level.
impl Drop for ForestNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Post-order fold over every tree in `roots` with an explicit stack.
///
/// `combine` receives a node and the results already folded for its
/// children, in child order. Returns one result per root.
fn fold<'a, T>(
    roots: &'a [ForestNode],
    mut combine: impl FnMut(&'a ForestNode, Vec<T>) -> T,
) -> Vec<T> {
    let mut stack: Vec<(&'a ForestNode, usize)> =
        roots.iter().rev().map(|root| (root, 0)).collect();
    let mut folded: Vec<T> = Vec::new();
    while let Some((node, next)) = stack.pop() {
        match node.children.get(next) {
            Some(child) => {
                stack.push((node, next + 1));
                stack.push((child, 0));
            }
            None => {
                let children = folded.split_off(folded.len() - node.children.len());
                folded.push(combine(node, children));
            }
        }
    }
    folded
}

/// Ordered sequence of root nodes, each with nested ordered children.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Forest {
    roots: Vec<ForestNode>,
}

impl Forest {
    /// Assemble a forest from a flat snapshot.
    ///
    /// Siblings are sorted by `order`, ties by id. Read-tolerant: a node
    /// whose parent is missing is shown as a root, and nodes unreachable
    /// from any root (parent cycles) are skipped. Input values are never
    /// rewritten.
    #[instrument(level = "debug", skip(nodes), fields(nodes = nodes.len()))]
    pub fn build(nodes: Vec<Node>) -> Self {
        let known: HashSet<NodeId> = nodes.iter().map(|node| node.id).collect();
        let mut roots: Vec<(u32, NodeId)> = Vec::new();
        let mut children: HashMap<NodeId, Vec<(u32, NodeId)>> = HashMap::new();
        let mut by_id: HashMap<NodeId, Node> = HashMap::with_capacity(nodes.len());

        for node in nodes {
            match node.parent_id {
                Some(parent) if parent != node.id && known.contains(&parent) => {
                    children.entry(parent).or_default().push((node.order, node.id));
                }
                Some(parent) => {
                    warn!("node {} references missing parent {}, shown as root", node.id, parent);
                    roots.push((node.order, node.id));
                }
                None => roots.push((node.order, node.id)),
            }
            by_id.insert(node.id, node);
        }
        roots.sort();
        for siblings in children.values_mut() {
            siblings.sort();
        }

        // Preorder walk from the roots; parents precede their descendants.
        let mut preorder = Vec::with_capacity(by_id.len());
        let mut visited = HashSet::with_capacity(by_id.len());
        let mut stack: Vec<NodeId> = roots.iter().rev().map(|(_, id)| *id).collect();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            preorder.push(id);
            if let Some(kids) = children.get(&id) {
                stack.extend(kids.iter().rev().map(|(_, kid)| *kid));
            }
        }
        if visited.len() < by_id.len() {
            warn!(
                "skipped {} nodes unreachable from any root",
                by_id.len() - visited.len()
            );
        }

        // Build bottom-up so every child is finished before its parent.
        let mut built: HashMap<NodeId, ForestNode> = HashMap::with_capacity(preorder.len());
        for id in preorder.iter().rev() {
            let Some(node) = by_id.remove(id) else {
                continue;
            };
            let kids = children
                .get(id)
                .map(|kids| kids.iter().filter_map(|(_, kid)| built.remove(kid)).collect())
                .unwrap_or_default();
            built.insert(*id, ForestNode::from_node(node, kids));
        }

        let roots = roots
            .iter()
            .filter_map(|(_, id)| built.remove(id))
            .collect();
        Self { roots }
    }

    pub fn roots(&self) -> &[ForestNode] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<ForestNode> {
        self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes in the forest.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Number of levels; an empty forest has depth 0.
    pub fn depth(&self) -> usize {
        self.iter().map(|(depth, _)| depth + 1).max().unwrap_or(0)
    }

    /// Preorder traversal yielding `(depth, node)`.
    pub fn iter(&self) -> ForestIter<'_> {
        ForestIter::new(self)
    }

    /// All ids in preorder (roots first, children in order).
    pub fn ids(&self) -> Vec<NodeId> {
        self.iter().map(|(_, node)| node.id).collect()
    }

    /// Case-insensitive name filter. A matching node keeps its whole
    /// subtree; a non-matching node survives only as the path to a match.
    /// A blank term returns the forest unchanged.
    pub fn search(&self, term: &str) -> Forest {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }
        // ids of matches and of everything below a match
        let mut inside: Vec<bool> = Vec::new();
        let mut covered: HashSet<NodeId> = HashSet::new();
        for (depth, node) in self.iter() {
            inside.truncate(depth);
            let hit = inside.last().copied().unwrap_or(false) || node.matches(&needle);
            if hit {
                covered.insert(node.id);
            }
            inside.push(hit);
        }
        self.rebuild(|node, kept_below| kept_below || covered.contains(&node.id))
    }

    /// Terminal rendering, one termtree per root.
    pub fn render(&self) -> String {
        let mut trees = fold(&self.roots, |node, leaves: Vec<Tree<String>>| {
            Tree::new(node.label()).with_leaves(leaves)
        });
        let text: String = trees.iter().map(ToString::to_string).collect();
        // termtree drops recursively; take the leaves apart here instead
        while let Some(mut tree) = trees.pop() {
            trees.append(&mut tree.leaves);
        }
        text
    }

    /// Copy of the forest keeping the nodes for which `keep(node, any child
    /// kept)` holds. A dropped node takes its whole subtree with it.
    fn rebuild(&self, mut keep: impl FnMut(&ForestNode, bool) -> bool) -> Forest {
        let roots = fold(&self.roots, |node, children: Vec<Option<ForestNode>>| {
            let children: Vec<ForestNode> = children.into_iter().flatten().collect();
            keep(node, !children.is_empty()).then(|| node.with_children(children))
        });
        Forest {
            roots: roots.into_iter().flatten().collect(),
        }
    }
}

impl Clone for Forest {
    fn clone(&self) -> Self {
        self.rebuild(|_, _| true)
    }
}

/// Two forests are equal when their preorder walks agree on depth and on
/// every node field.
impl PartialEq for Forest {
    fn eq(&self, other: &Self) -> bool {
        let same = |(da, a): (usize, &ForestNode), (db, b): (usize, &ForestNode)| {
            da == db
                && a.id == b.id
                && a.name == b.name
                && a.parent_id == b.parent_id
                && a.order == b.order
        };
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| same(a, b))
    }
}

impl Eq for Forest {}

pub struct ForestIter<'a> {
    stack: Vec<(usize, &'a ForestNode)>,
}

impl<'a> ForestIter<'a> {
    fn new(forest: &'a Forest) -> Self {
        let stack = forest.roots.iter().rev().map(|root| (0, root)).collect();
        Self { stack }
    }
}

impl<'a> Iterator for ForestIter<'a> {
    type Item = (usize, &'a ForestNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for child in node.children.iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, node))
    }
}
