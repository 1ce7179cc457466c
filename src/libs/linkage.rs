use crate::libs::error::ClusterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rule for the distance between two clusters.
///
/// `between` works from member-to-member distances directly; `update` is the
/// Lance-Williams form used while agglomerating, giving the distance from a
/// third cluster `k` to the union of `i` and `j`.
pub trait LinkageRule {
    fn between(
        &self,
        first: &[usize],
        second: &[usize],
        lookup: &dyn Fn(usize, usize) -> f64,
    ) -> f64;

    fn update(&self, d_ki: f64, d_kj: f64, d_ij: f64, n_i: usize, n_j: usize, n_k: usize) -> f64;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    /// Mean of all member pairs (UPGMA).
    #[default]
    #[serde(alias = "average")]
    Average,
    /// Increase in within-cluster sum of squares.
    #[serde(alias = "ward")]
    Ward,
    /// Closest member pair.
    #[serde(alias = "single")]
    Single,
    /// Farthest member pair.
    #[serde(alias = "complete")]
    Complete,
}

impl FromStr for Linkage {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "average" | "upgma" => Ok(Linkage::Average),
            "ward" => Ok(Linkage::Ward),
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            _ => Err(ClusterError::unknown("linkage", s)),
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Linkage::Average => "average",
            Linkage::Ward => "ward",
            Linkage::Single => "single",
            Linkage::Complete => "complete",
        };
        write!(f, "{}", s)
    }
}

impl LinkageRule for Linkage {
    fn between(
        &self,
        first: &[usize],
        second: &[usize],
        lookup: &dyn Fn(usize, usize) -> f64,
    ) -> f64 {
        let cross = || {
            first
                .iter()
                .flat_map(move |&a| second.iter().map(move |&b| lookup(a, b)))
        };

        match self {
            Linkage::Average => {
                cross().sum::<f64>() / (first.len() as f64) / (second.len() as f64)
            }
            Linkage::Single => cross().fold(f64::INFINITY, nan_min),
            Linkage::Complete => cross().fold(f64::NEG_INFINITY, nan_max),
            Linkage::Ward => {
                // Squared centroid distance from the member distances:
                // |ca - cb|^2 = mean(d_ab^2) - sum(d_aa'^2) / 2na^2 - sum(d_bb'^2) / 2nb^2
                let na = first.len() as f64;
                let nb = second.len() as f64;
                let within = |set: &[usize]| -> f64 {
                    let mut sum = 0.0;
                    for &x in set {
                        for &y in set {
                            if x != y {
                                sum += lookup(x, y).powi(2);
                            }
                        }
                    }
                    sum
                };
                let cross_sq = cross().map(|d| d * d).sum::<f64>() / (na * nb);
                let centroid_sq = cross_sq
                    - within(first) / (2.0 * na * na)
                    - within(second) / (2.0 * nb * nb);
                non_negative(2.0 * na * nb / (na + nb) * centroid_sq).sqrt()
            }
        }
    }

    fn update(&self, d_ki: f64, d_kj: f64, d_ij: f64, n_i: usize, n_j: usize, n_k: usize) -> f64 {
        let (n_i, n_j, n_k) = (n_i as f64, n_j as f64, n_k as f64);
        match self {
            Linkage::Average => (n_i * d_ki + n_j * d_kj) / (n_i + n_j),
            Linkage::Single => nan_min(d_ki, d_kj),
            Linkage::Complete => nan_max(d_ki, d_kj),
            Linkage::Ward => {
                let sq = ((n_i + n_k) * d_ki * d_ki + (n_j + n_k) * d_kj * d_kj
                    - n_k * d_ij * d_ij)
                    / (n_i + n_j + n_k);
                non_negative(sq).sqrt()
            }
        }
    }
}

// Rounding can push a sum of squares slightly below zero. NaN passes through.
fn non_negative(x: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else {
        x
    }
}

fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}
