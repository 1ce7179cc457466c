/// NodeId is an index into the Dendrogram's node vector.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct DendroNode {
    /// Index in the arena. Leaves take `0..n`, merges follow in creation order.
    pub id: NodeId,

    /// Parent node ID (None for root)
    pub parent: Option<NodeId>,

    /// Either empty (leaf) or exactly two children
    pub children: Vec<NodeId>,

    /// Merge distance; 0 for leaves
    pub height: f64,

    /// Original leaf indices covered, in left-to-right child order
    pub indices: Vec<usize>,
}

impl DendroNode {
    pub fn leaf(index: usize) -> Self {
        Self {
            id: index,
            parent: None,
            children: Vec::new(),
            height: 0.0,
            indices: vec![index],
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of leaves below this node
    pub fn size(&self) -> usize {
        self.indices.len()
    }

    /// Smallest original index below this node
    pub fn min_index(&self) -> usize {
        self.indices.iter().copied().min().unwrap_or(usize::MAX)
    }
}
