use super::*;
use crate::libs::distance::{Distance, DistanceMetric, PairwiseDistances};
use crate::libs::linkage::{Linkage, LinkageRule};
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_vectors(rng: &mut StdRng, n: usize, dim: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gen_range(0.0..10.0)).collect())
        .collect()
}

fn is_permutation(order: &[usize], n: usize) -> bool {
    let mut seen = vec![false; n];
    order.len() == n
        && order.iter().all(|&i| {
            if i >= n || seen[i] {
                false
            } else {
                seen[i] = true;
                true
            }
        })
}

#[test]
fn test_degenerate_sizes() {
    let metric = DistanceMetric::Euclidean;

    let tree = build(&[], &metric, &Linkage::Average).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.get_root(), None);
    assert!(tree.leaf_order().is_empty());

    let tree = build(&[vec![3.0, 4.0]], &metric, &Linkage::Ward).unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get_root(), Some(0));
    assert_eq!(tree.leaf_order(), vec![0]);
    assert!(tree.merges().is_empty());
}

#[test]
fn test_merge_tree_shape() {
    let mut rng = StdRng::seed_from_u64(7);
    let vectors = random_vectors(&mut rng, 12, 4);
    let tree = build(&vectors, &DistanceMetric::Euclidean, &Linkage::Average).unwrap();

    // n leaves and n - 1 merges, root last
    assert_eq!(tree.len(), 23);
    assert_eq!(tree.leaf_count(), 12);
    assert_eq!(tree.get_root(), Some(22));
    assert_eq!(tree.merges().len(), 11);

    for node in tree.nodes() {
        if node.is_leaf() {
            assert_eq!(node.indices, vec![node.id]);
            assert_eq!(node.height, 0.0);
        } else {
            assert_eq!(node.children.len(), 2);
            let left = tree.get_node(node.children[0]).unwrap();
            let right = tree.get_node(node.children[1]).unwrap();
            assert!(left.min_index() < right.min_index());
            assert_eq!(left.parent, Some(node.id));
            assert_eq!(right.parent, Some(node.id));

            let mut joined = left.indices.clone();
            joined.extend(&right.indices);
            assert_eq!(node.indices, joined);
        }
    }

    let order = tree.leaf_order();
    assert!(is_permutation(&order, 12));
    let root = tree.get_node(22).unwrap();
    assert_eq!(order, root.indices);
}

#[test]
fn test_heights_match_direct_linkage() {
    let mut rng = StdRng::seed_from_u64(42);
    let vectors = random_vectors(&mut rng, 9, 3);
    let metric = DistanceMetric::Euclidean;
    let lookup = |a: usize, b: usize| metric.compute(&vectors[a], &vectors[b]);

    for linkage in [
        Linkage::Average,
        Linkage::Ward,
        Linkage::Single,
        Linkage::Complete,
    ] {
        let tree = build(&vectors, &metric, &linkage).unwrap();
        for merge in tree.merges() {
            let left = &tree.get_node(merge.left).unwrap().indices;
            let right = &tree.get_node(merge.right).unwrap().indices;
            let direct = linkage.between(left, right, &lookup);
            assert_relative_eq!(merge.height, direct, epsilon = 1e-9, max_relative = 1e-9);
        }
    }
}

#[test]
fn test_monotone_heights() {
    // reducible linkages never produce inversions
    let mut rng = StdRng::seed_from_u64(3);
    let vectors = random_vectors(&mut rng, 15, 5);
    for linkage in [Linkage::Average, Linkage::Ward, Linkage::Complete] {
        let tree = build(&vectors, &DistanceMetric::Chebyshev, &linkage).unwrap();
        let heights: Vec<f64> = tree.merges().iter().map(|m| m.height).collect();
        assert!(heights.windows(2).all(|w| w[0] <= w[1] + 1e-12));
    }
}

#[test]
fn test_tie_break_smallest_pair() {
    // all points equidistant: merges are (0,1), then ({0,1},2), ...
    let dist = PairwiseDistances::from_square(
        3,
        vec![
            0.0, 1.0, 1.0, //
            1.0, 0.0, 1.0, //
            1.0, 1.0, 0.0,
        ],
    )
    .unwrap();
    let tree = agglomerate(dist, &Linkage::Average).unwrap();
    let merges = tree.merges();
    assert_eq!((merges[0].left, merges[0].right), (0, 1));
    assert_eq!((merges[1].left, merges[1].right), (3, 2));
    assert_eq!(tree.leaf_order(), vec![0, 1, 2]);
}

#[test]
fn test_deterministic() {
    let mut rng = StdRng::seed_from_u64(11);
    let vectors = random_vectors(&mut rng, 20, 6);
    let a = build(&vectors, &DistanceMetric::Euclidean, &Linkage::Ward).unwrap();
    let b = build(&vectors, &DistanceMetric::Euclidean, &Linkage::Ward).unwrap();
    assert_eq!(a.leaf_order(), b.leaf_order());
    assert_eq!(a.merges(), b.merges());
}

#[test]
fn test_nan_vector_merges_last() {
    let vectors = vec![
        vec![1.0, 2.0],
        vec![f64::NAN, 2.0],
        vec![1.5, 2.5],
        vec![9.0, 9.0],
    ];
    let tree = build(&vectors, &DistanceMetric::Euclidean, &Linkage::Average).unwrap();
    let order = tree.leaf_order();
    assert!(is_permutation(&order, 4));

    let merges = tree.merges();
    assert!(merges[0].height.is_finite());
    assert!(merges[1].height.is_finite());
    assert!(merges[2].height.is_nan());
    // the poisoned row is alone on one side of the root
    let root = tree.get_node(tree.get_root().unwrap()).unwrap();
    assert_eq!(tree.get_node(root.children[1]).unwrap().indices, vec![1]);
}

#[test]
fn test_ladderize() {
    // 0 and 1 merge first, then 2 and 3, then 4 joins {2,3}
    let vectors = vec![
        vec![0.0],
        vec![0.1],
        vec![10.0],
        vec![10.2],
        vec![11.0],
    ];
    let mut tree = build(&vectors, &DistanceMetric::Euclidean, &Linkage::Single).unwrap();
    assert_eq!(tree.leaf_order(), vec![0, 1, 2, 3, 4]);

    tree.apply_leaf_order(LeafOrder::Ladderize);
    assert_eq!(tree.leaf_order(), vec![2, 3, 4, 0, 1]);
    let root = tree.get_node(tree.get_root().unwrap()).unwrap();
    assert_eq!(root.indices, vec![2, 3, 4, 0, 1]);

    // idempotent
    tree.ladderize();
    assert_eq!(tree.leaf_order(), vec![2, 3, 4, 0, 1]);
}

#[test]
fn test_traversals() {
    let mut tree = Dendrogram::with_leaves(3);
    let n3 = tree.merge(2, 1, 1.0).unwrap();
    let n4 = tree.merge(0, n3, 3.0).unwrap();

    // children are placed by smallest original index
    assert_eq!(tree.get_node(n3).unwrap().children, vec![1, 2]);
    assert_eq!(tree.preorder(n4), vec![4, 0, 3, 1, 2]);
    assert_eq!(tree.postorder(n4), vec![0, 1, 2, 3, 4]);
    assert_eq!(tree.leaf_order(), vec![0, 1, 2]);

    assert!(tree.merge(0, 1, 1.0).is_err());
    assert!(tree.merge(4, 4, 1.0).is_err());
    assert!(tree.merge(4, 9, 1.0).is_err());

    assert_eq!(tree.to_newick(None), "(0:3,(1:1,2:1):2);");
}

#[test]
fn test_newick_labels() {
    let mut tree = Dendrogram::with_leaves(3);
    let n3 = tree.merge(0, 1, 0.5).unwrap();
    tree.merge(n3, 2, 2.0).unwrap();

    let labels = vec![
        "gene A".to_string(),
        "geneB".to_string(),
        "geneC".to_string(),
    ];
    assert_eq!(
        tree.to_newick(Some(labels.as_slice())),
        "(('gene A':0.5,geneB:0.5):1.5,geneC:2);"
    );
    assert_eq!(Dendrogram::new().to_newick(None), ";");
}

#[test]
fn test_parse_leaf_order() {
    assert_eq!("ladderize".parse::<LeafOrder>().unwrap(), LeafOrder::Ladderize);
    assert_eq!("min_index".parse::<LeafOrder>().unwrap(), LeafOrder::MinIndex);
    assert!("random".parse::<LeafOrder>().is_err());
}
