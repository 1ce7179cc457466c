//! Per-request orchestration: which axes get clustered, and the full
//! scale-then-cluster pipeline.

use crate::libs::dendro::{self, Dendrogram, LeafOrder};
use crate::libs::distance::DistanceMetric;
use crate::libs::error::ClusterError;
use crate::libs::linkage::Linkage;
use crate::libs::matrix::Matrix;
use crate::libs::remap::Remapper;
use crate::libs::scale::{self, Scaling};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    #[default]
    #[serde(alias = "row")]
    Row,
    #[serde(alias = "column", alias = "col", alias = "Col")]
    Column,
    #[serde(alias = "both")]
    Both,
    #[serde(alias = "none")]
    None,
}

impl Axis {
    pub fn clusters_rows(&self) -> bool {
        matches!(self, Axis::Row | Axis::Both)
    }

    pub fn clusters_columns(&self) -> bool {
        matches!(self, Axis::Column | Axis::Both)
    }
}

impl FromStr for Axis {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "row" | "rows" => Ok(Axis::Row),
            "col" | "cols" | "column" | "columns" => Ok(Axis::Column),
            "both" => Ok(Axis::Both),
            "none" => Ok(Axis::None),
            _ => Err(ClusterError::unknown("axis", s)),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Axis::Row => "row",
            Axis::Column => "column",
            Axis::Both => "both",
            Axis::None => "none",
        };
        write!(f, "{}", s)
    }
}

/// Everything a clustering request can choose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterConfig {
    pub axis: Axis,
    pub linkage: Linkage,
    pub distance: DistanceMetric,
    pub scaling: Scaling,
    pub leaf_order: LeafOrder,
}

/// Row and column dendrograms; `None` for an axis left unclustered.
#[derive(Debug, Default, Clone)]
pub struct AxisTrees {
    pub rows: Option<Dendrogram>,
    pub cols: Option<Dendrogram>,
}

impl AxisTrees {
    pub fn row_order(&self, nrows: usize) -> Vec<usize> {
        order_or_identity(self.rows.as_ref(), nrows)
    }

    pub fn col_order(&self, ncols: usize) -> Vec<usize> {
        order_or_identity(self.cols.as_ref(), ncols)
    }
}

fn order_or_identity(tree: Option<&Dendrogram>, n: usize) -> Vec<usize> {
    match tree {
        Some(tree) => tree.leaf_order(),
        None => identity(n),
    }
}

pub fn identity(n: usize) -> Vec<usize> {
    (0..n).collect()
}

/// Leaf orderings for both axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisOrders {
    pub row_order: Vec<usize>,
    pub col_order: Vec<usize>,
}

/// Build the dendrograms requested by `config.axis`.
///
/// Rows and columns are clustered independently of each other; with
/// `Axis::Both` the two run in parallel.
pub fn build_trees(data: &Matrix, config: &ClusterConfig) -> Result<AxisTrees, ClusterError> {
    build_trees_cancellable(data, config, &AtomicBool::new(false))
}

/// [`build_trees`], stopping early once `cancel` is set.
pub fn build_trees_cancellable(
    data: &Matrix,
    config: &ClusterConfig,
    cancel: &AtomicBool,
) -> Result<AxisTrees, ClusterError> {
    let build_rows = || -> Result<Option<Dendrogram>, ClusterError> {
        if !config.axis.clusters_rows() {
            return Ok(None);
        }
        let mut tree = dendro::build_cancellable(
            &data.row_vectors(),
            &config.distance,
            &config.linkage,
            cancel,
        )?;
        tree.apply_leaf_order(config.leaf_order);
        Ok(Some(tree))
    };
    let build_cols = || -> Result<Option<Dendrogram>, ClusterError> {
        if !config.axis.clusters_columns() {
            return Ok(None);
        }
        let mut tree = dendro::build_cancellable(
            &data.column_vectors(),
            &config.distance,
            &config.linkage,
            cancel,
        )?;
        tree.apply_leaf_order(config.leaf_order);
        Ok(Some(tree))
    };

    let (rows, cols) = match config.axis {
        Axis::Both => rayon::join(build_rows, build_cols),
        _ => (build_rows(), build_cols()),
    };

    Ok(AxisTrees {
        rows: rows?,
        cols: cols?,
    })
}

/// Leaf orderings for `data`; identity on any axis not clustered.
pub fn cluster(data: &Matrix, config: &ClusterConfig) -> Result<AxisOrders, ClusterError> {
    let trees = build_trees(data, config)?;
    Ok(AxisOrders {
        row_order: trees.row_order(data.nrows()),
        col_order: trees.col_order(data.ncols()),
    })
}

/// Orderings plus scaled values, freshly allocated for the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringResult {
    pub nrows: usize,
    pub ncols: usize,
    pub row_order: Vec<usize>,
    pub col_order: Vec<usize>,
    pub values: Vec<f64>,
}

impl ClusteringResult {
    /// Identity orders over unscaled values; what a caller shows when clustering failed.
    pub fn unclustered(data: &Matrix) -> Self {
        Self {
            nrows: data.nrows(),
            ncols: data.ncols(),
            row_order: identity(data.nrows()),
            col_order: identity(data.ncols()),
            values: data.values().to_vec(),
        }
    }

    pub fn remapper(&self) -> Remapper {
        Remapper::new(&self.row_order, &self.col_order)
    }
}

/// Scale, then cluster. Returns the trees alongside the result.
pub fn run_with_trees(
    data: &Matrix,
    config: &ClusterConfig,
) -> Result<(ClusteringResult, AxisTrees), ClusterError> {
    run_cancellable(data, config, &AtomicBool::new(false))
}

/// [`run_with_trees`] for a worker thread; `cancel` is polled between merges.
pub fn run_cancellable(
    data: &Matrix,
    config: &ClusterConfig,
    cancel: &AtomicBool,
) -> Result<(ClusteringResult, AxisTrees), ClusterError> {
    log::info!(
        "clustering {}x{} matrix: axis={} linkage={} distance={} scaling={}",
        data.nrows(),
        data.ncols(),
        config.axis,
        config.linkage,
        config.distance,
        config.scaling
    );

    let scaled = scale::scale(data, config.scaling);
    let poisoned = scaled.count_non_finite();
    if poisoned > 0 {
        log::warn!(
            "{} of {} scaled cells are NaN or infinite",
            poisoned,
            scaled.values().len()
        );
    }

    let trees = build_trees_cancellable(&scaled, config, cancel)?;
    let result = ClusteringResult {
        nrows: scaled.nrows(),
        ncols: scaled.ncols(),
        row_order: trees.row_order(scaled.nrows()),
        col_order: trees.col_order(scaled.ncols()),
        values: scaled.into_values(),
    };
    Ok((result, trees))
}

/// Scale, then cluster.
pub fn run(data: &Matrix, config: &ClusterConfig) -> Result<ClusteringResult, ClusterError> {
    run_with_trees(data, config).map(|(result, _)| result)
}
