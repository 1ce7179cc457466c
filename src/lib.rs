//! Matrix clustering and reordering engine for expression heatmaps.
//!
//! A gene-by-sample matrix is rescaled ([`libs::scale`]), its rows and/or
//! columns are clustered agglomeratively ([`libs::dendro`]), and the leaf
//! orders are handed to a renderer through O(1) index lookups
//! ([`libs::remap`]). [`libs::worker`] runs the pipeline off-thread with one
//! request in flight.

pub mod libs;

pub use libs::axis::{Axis, ClusterConfig, ClusteringResult};
pub use libs::dendro::{Dendrogram, LeafOrder};
pub use libs::distance::DistanceMetric;
pub use libs::error::ClusterError;
pub use libs::linkage::Linkage;
pub use libs::matrix::{LabelledMatrix, Matrix};
pub use libs::remap::Remapper;
pub use libs::scale::Scaling;
