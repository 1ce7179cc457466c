use super::node::NodeId;
use super::Dendrogram;

/// Get node IDs in preorder traversal (Root -> Children)
pub fn preorder(tree: &Dendrogram, start_node: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack = vec![start_node];

    while let Some(id) = stack.pop() {
        if let Some(node) = tree.get_node(id) {
            result.push(id);
            // Push children in reverse order so they are processed in order
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
    }

    result
}

/// Get node IDs in postorder traversal (Children -> Root)
pub fn postorder(tree: &Dendrogram, start_node: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack = vec![(start_node, false)];

    while let Some((id, expanded)) = stack.pop() {
        let Some(node) = tree.get_node(id) else {
            continue;
        };
        if expanded || node.is_leaf() {
            result.push(id);
        } else {
            stack.push((id, true));
            for &child in node.children.iter().rev() {
                stack.push((child, false));
            }
        }
    }

    result
}

/// Original leaf indices, left to right, below `start_node`
pub fn leaf_order(tree: &Dendrogram, start_node: NodeId) -> Vec<usize> {
    preorder(tree, start_node)
        .into_iter()
        .filter_map(|id| tree.get_node(id))
        .filter(|node| node.is_leaf())
        .flat_map(|node| node.indices.iter().copied())
        .collect()
}
