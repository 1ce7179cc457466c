use super::{Dendrogram, NodeId};
use crate::libs::distance::{Distance, PairwiseDistances};
use crate::libs::error::ClusterError;
use crate::libs::linkage::LinkageRule;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cluster `vectors` with `metric` and `linkage`.
///
/// ```
/// use heatclust::libs::dendro;
/// use heatclust::libs::distance::DistanceMetric;
/// use heatclust::libs::linkage::Linkage;
///
/// let vectors = vec![vec![0.0], vec![10.0], vec![1.0]];
/// let tree = dendro::build(&vectors, &DistanceMetric::Euclidean, &Linkage::Average).unwrap();
/// assert_eq!(tree.leaf_order(), vec![0, 2, 1]);
/// ```
pub fn build<D, L>(
    vectors: &[Vec<f64>],
    metric: &D,
    linkage: &L,
) -> Result<Dendrogram, ClusterError>
where
    D: Distance + Sync,
    L: LinkageRule,
{
    build_cancellable(vectors, metric, linkage, &AtomicBool::new(false))
}

/// [`build`], giving up with [`ClusterError::Cancelled`] once `cancel` is set.
pub fn build_cancellable<D, L>(
    vectors: &[Vec<f64>],
    metric: &D,
    linkage: &L,
    cancel: &AtomicBool,
) -> Result<Dendrogram, ClusterError>
where
    D: Distance + Sync,
    L: LinkageRule,
{
    let dist = PairwiseDistances::from_vectors(vectors, metric)?;
    if dist.count_nan() > 0 {
        log::warn!(
            "{} of {} pairwise distances are NaN; poisoned clusters merge last",
            dist.count_nan() / 2,
            vectors.len() * vectors.len().saturating_sub(1) / 2
        );
    }
    agglomerate_cancellable(dist, linkage, cancel)
}

/// Naive agglomerative clustering over a precomputed distance matrix.
///
/// Cluster slot `i` always holds original leaf `i` as its smallest member, so
/// scanning slot pairs in `(i, j)` order breaks ties by the smallest pair.
/// After merging `i < j` the union takes slot `i` and slot `j` is retired;
/// distances to the union come from the Lance-Williams update of `linkage`.
/// `NaN` distances sort after every number.
///
/// `O(n^3)` time, `O(n^2)` space.
pub fn agglomerate<L>(dist: PairwiseDistances, linkage: &L) -> Result<Dendrogram, ClusterError>
where
    L: LinkageRule,
{
    agglomerate_cancellable(dist, linkage, &AtomicBool::new(false))
}

/// [`agglomerate`], checking `cancel` before every merge step.
pub fn agglomerate_cancellable<L>(
    mut dist: PairwiseDistances,
    linkage: &L,
    cancel: &AtomicBool,
) -> Result<Dendrogram, ClusterError>
where
    L: LinkageRule,
{
    let n = dist.size();
    let mut tree = Dendrogram::with_leaves(n);
    if n < 2 {
        return Ok(tree);
    }

    let mut active = vec![true; n];
    let mut slot_node: Vec<NodeId> = (0..n).collect();
    let mut sizes = vec![1usize; n];

    for step in 0..n - 1 {
        if cancel.load(Ordering::Relaxed) {
            log::debug!("agglomeration cancelled after {} of {} merges", step, n - 1);
            return Err(ClusterError::Cancelled);
        }

        // 1. Closest pair of active clusters
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in (i + 1)..n {
                if !active[j] {
                    continue;
                }
                let d = dist.get(i, j);
                match best {
                    Some((_, _, best_d)) if !closer(d, best_d) => {}
                    _ => best = Some((i, j, d)),
                }
            }
        }
        let (i, j, height) = best.ok_or_else(|| {
            ClusterError::Tree(format!("no active pair left at step {}", step))
        })?;

        // 2. Merge
        let node = tree
            .merge(slot_node[i], slot_node[j], height)
            .map_err(ClusterError::Tree)?;
        log::trace!(
            "merge {} + {} -> node {} at {}",
            slot_node[i],
            slot_node[j],
            node,
            height
        );

        // 3. Distances from every other cluster to the union
        for k in 0..n {
            if !active[k] || k == i || k == j {
                continue;
            }
            let d_new = linkage.update(
                dist.get(k, i),
                dist.get(k, j),
                height,
                sizes[i],
                sizes[j],
                sizes[k],
            );
            dist.set(k, i, d_new);
        }

        active[j] = false;
        slot_node[i] = node;
        sizes[i] += sizes[j];
    }

    log::debug!("built dendrogram over {} leaves", n);
    Ok(tree)
}

// Strictly closer; NaN never beats a number.
fn closer(candidate: f64, current: f64) -> bool {
    match (candidate.is_nan(), current.is_nan()) {
        (false, true) => true,
        (true, _) => false,
        (false, false) => candidate < current,
    }
}
