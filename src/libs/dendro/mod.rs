pub mod build;
pub mod node;
#[cfg(test)]
mod tests;
pub mod traversal;
pub mod writer;

pub use build::{agglomerate, agglomerate_cancellable, build, build_cancellable};
pub use node::{DendroNode, NodeId};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::libs::error::ClusterError;

/// A binary merge tree produced by agglomerative clustering.
///
/// Nodes live in an arena; `n` leaves occupy ids `0..n` and the `n - 1`
/// merges occupy `n..2n-1` in the order they happened, so the root is the
/// last node.
#[derive(Debug, Default, Clone)]
pub struct Dendrogram {
    pub(super) nodes: Vec<DendroNode>,
    pub(super) root: Option<NodeId>,
}

/// How children are ordered left to right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafOrder {
    /// By the smallest original index below each child.
    #[default]
    #[serde(alias = "min_index")]
    MinIndex,
    /// Larger subtrees first; ties keep the min-index order.
    Ladderize,
}

impl FromStr for LeafOrder {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minindex" | "min_index" | "min-index" | "index" => Ok(LeafOrder::MinIndex),
            "ladderize" | "nd" => Ok(LeafOrder::Ladderize),
            _ => Err(ClusterError::unknown("leaf order", s)),
        }
    }
}

impl fmt::Display for LeafOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafOrder::MinIndex => write!(f, "min_index"),
            LeafOrder::Ladderize => write!(f, "ladderize"),
        }
    }
}

/// One agglomeration step, in the style of a linkage matrix row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: NodeId,
    pub right: NodeId,
    pub height: f64,
    pub size: usize,
}

impl Dendrogram {
    /// Create a new empty dendrogram
    pub fn new() -> Self {
        Self::default()
    }

    /// A dendrogram holding `n` unmerged leaves
    pub fn with_leaves(n: usize) -> Self {
        let nodes: Vec<DendroNode> = (0..n).map(DendroNode::leaf).collect();
        let root = if n == 1 { Some(0) } else { None };
        Self { nodes, root }
    }

    /// Get number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub fn get_root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get_node(&self, id: NodeId) -> Option<&DendroNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[DendroNode] {
        &self.nodes
    }

    /// Join two parentless nodes under a new one.
    ///
    /// The child covering the smaller original index goes left. The new node
    /// becomes the root.
    pub fn merge(&mut self, a: NodeId, b: NodeId, height: f64) -> Result<NodeId, String> {
        for id in [a, b] {
            match self.nodes.get(id) {
                None => return Err(format!("Node {} not found", id)),
                Some(node) if node.parent.is_some() => {
                    return Err(format!("Node {} already has a parent", id));
                }
                _ => {}
            }
        }
        if a == b {
            return Err(format!("Cannot merge node {} with itself", a));
        }

        let (left, right) = if self.nodes[a].min_index() <= self.nodes[b].min_index() {
            (a, b)
        } else {
            (b, a)
        };

        let id = self.nodes.len();
        let mut indices = Vec::with_capacity(self.nodes[left].size() + self.nodes[right].size());
        indices.extend_from_slice(&self.nodes[left].indices);
        indices.extend_from_slice(&self.nodes[right].indices);

        self.nodes.push(DendroNode {
            id,
            parent: None,
            children: vec![left, right],
            height,
            indices,
        });
        self.nodes[left].parent = Some(id);
        self.nodes[right].parent = Some(id);
        self.root = Some(id);

        Ok(id)
    }

    pub fn preorder(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::preorder(self, start_node)
    }

    pub fn postorder(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::postorder(self, start_node)
    }

    /// Original indices in left-to-right leaf order. Empty for an empty tree.
    pub fn leaf_order(&self) -> Vec<usize> {
        match self.root {
            Some(root) => traversal::leaf_order(self, root),
            None => Vec::new(),
        }
    }

    /// Agglomeration steps in creation order
    pub fn merges(&self) -> Vec<Merge> {
        self.nodes
            .iter()
            .filter(|n| !n.is_leaf())
            .map(|n| Merge {
                left: n.children[0],
                right: n.children[1],
                height: n.height,
                size: n.size(),
            })
            .collect()
    }

    /// Sort children by descending number of leaves.
    ///
    /// Sorting is stable, so equal-sized siblings keep their current order.
    /// `indices` are rebuilt to follow the new child order.
    pub fn ladderize(&mut self) {
        let Some(root) = self.root else {
            return;
        };

        for id in self.postorder(root) {
            if self.nodes[id].is_leaf() {
                continue;
            }
            let mut children = self.nodes[id].children.clone();
            children.sort_by_key(|&c| std::cmp::Reverse(self.nodes[c].size()));

            let indices: Vec<usize> = children
                .iter()
                .flat_map(|&c| self.nodes[c].indices.iter().copied())
                .collect();

            let node = &mut self.nodes[id];
            node.children = children;
            node.indices = indices;
        }
    }

    pub fn apply_leaf_order(&mut self, order: LeafOrder) {
        if order == LeafOrder::Ladderize {
            self.ladderize();
        }
    }

    /// Serialize to Newick; see [`writer::write_newick`].
    pub fn to_newick(&self, labels: Option<&[String]>) -> String {
        writer::write_newick(self, labels)
    }
}
