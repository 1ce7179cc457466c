use super::node::NodeId;
use super::Dendrogram;

/// Serialize the dendrogram to a Newick string.
///
/// Leaves are named by `labels[index]`, or by their original index when no
/// labels are given. Branch lengths are height differences to the parent.
///
/// # Example
/// ```
/// use heatclust::libs::dendro::Dendrogram;
/// let mut tree = Dendrogram::with_leaves(2);
/// tree.merge(0, 1, 2.0).unwrap();
/// let labels = vec!["A".to_string(), "B".to_string()];
/// assert_eq!(tree.to_newick(Some(labels.as_slice())), "(A:2,B:2);");
/// assert_eq!(tree.to_newick(None), "(0:2,1:2);");
/// ```
pub fn write_newick(tree: &Dendrogram, labels: Option<&[String]>) -> String {
    match tree.get_root() {
        Some(root) => {
            let mut s = to_newick_recursive(tree, root, labels);
            s.push(';');
            s
        }
        None => ";".to_string(),
    }
}

fn to_newick_recursive(tree: &Dendrogram, node_id: NodeId, labels: Option<&[String]>) -> String {
    let Some(node) = tree.get_node(node_id) else {
        return String::new();
    };

    let mut s = if node.is_leaf() {
        let index = node.indices[0];
        match labels.and_then(|l| l.get(index)) {
            Some(label) => quote_label(label),
            None => index.to_string(),
        }
    } else {
        let children: Vec<String> = node
            .children
            .iter()
            .map(|&c| to_newick_recursive(tree, c, labels))
            .collect();
        format!("({})", children.join(","))
    };

    if let Some(parent) = node.parent.and_then(|p| tree.get_node(p)) {
        s.push_str(&format!(":{}", parent.height - node.height));
    }

    s
}

fn quote_label(label: &str) -> String {
    let needs_quote = label
        .chars()
        .any(|c| matches!(c, ' ' | '(' | ')' | '[' | ']' | ':' | ';' | ',' | '\''));
    if needs_quote {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}
