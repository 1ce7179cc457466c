use crate::libs::error::ClusterError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distance between two equal-length vectors.
///
/// A `NaN` at any compared position poisons the result to `NaN`.
pub trait Distance {
    fn distance(&self, left: &[f64], right: &[f64]) -> Result<f64, ClusterError> {
        if left.len() != right.len() {
            Err(ClusterError::LengthMismatch {
                left: left.len(),
                right: right.len(),
            })
        } else {
            Ok(self.compute(left, right))
        }
    }

    /// Lengths are assumed equal.
    fn compute(&self, left: &[f64], right: &[f64]) -> f64;
}

pub struct Euclidean;

impl Distance for Euclidean {
    fn compute(&self, left: &[f64], right: &[f64]) -> f64 {
        left.iter()
            .zip(right.iter())
            .fold(0.0, |sum, (x, y)| sum + (x - y).powi(2))
            .sqrt()
    }
}

pub struct Chebyshev;

impl Distance for Chebyshev {
    fn compute(&self, left: &[f64], right: &[f64]) -> f64 {
        // f64::max would drop a NaN operand
        left.iter().zip(right.iter()).fold(0.0, |max_diff, (x, y)| {
            let diff = (x - y).abs();
            if max_diff.is_nan() || diff.is_nan() {
                f64::NAN
            } else if diff > max_diff {
                diff
            } else {
                max_diff
            }
        })
    }
}

pub struct Manhattan;

impl Distance for Manhattan {
    fn compute(&self, left: &[f64], right: &[f64]) -> f64 {
        left.iter()
            .zip(right.iter())
            .fold(0.0, |sum, (x, y)| sum + (x - y).abs())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    #[serde(alias = "euclidean")]
    Euclidean,
    #[serde(alias = "chebyshev")]
    Chebyshev,
    #[serde(alias = "manhattan")]
    Manhattan,
}

impl Distance for DistanceMetric {
    fn compute(&self, left: &[f64], right: &[f64]) -> f64 {
        match self {
            DistanceMetric::Euclidean => Euclidean.compute(left, right),
            DistanceMetric::Chebyshev => Chebyshev.compute(left, right),
            DistanceMetric::Manhattan => Manhattan.compute(left, right),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "euclid" => Ok(DistanceMetric::Euclidean),
            "chebyshev" | "max" => Ok(DistanceMetric::Chebyshev),
            "manhattan" | "cityblock" => Ok(DistanceMetric::Manhattan),
            _ => Err(ClusterError::unknown("distance metric", s)),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Chebyshev => "chebyshev",
            DistanceMetric::Manhattan => "manhattan",
        };
        write!(f, "{}", s)
    }
}

/// A square, symmetric distance matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseDistances {
    size: usize,
    data: Vec<f64>,
}

impl PairwiseDistances {
    /// Distances between every pair of `vectors`.
    ///
    /// Rows of the matrix are filled in parallel; each cell only depends on
    /// its own pair, so the result does not depend on the thread count.
    pub fn from_vectors<D>(vectors: &[Vec<f64>], metric: &D) -> Result<Self, ClusterError>
    where
        D: Distance + Sync,
    {
        if let Some(first) = vectors.first() {
            if let Some(bad) = vectors.iter().find(|v| v.len() != first.len()) {
                return Err(ClusterError::LengthMismatch {
                    left: first.len(),
                    right: bad.len(),
                });
            }
        }

        let size = vectors.len();
        let mut data = vec![0.0; size * size];
        data.par_chunks_mut(size.max(1))
            .take(size)
            .enumerate()
            .for_each(|(i, row)| {
                for (j, cell) in row.iter_mut().enumerate() {
                    if i != j {
                        *cell = metric.compute(&vectors[i], &vectors[j]);
                    }
                }
            });

        Ok(Self { size, data })
    }

    /// Wrap an existing square matrix.
    pub fn from_square(size: usize, data: Vec<f64>) -> Result<Self, ClusterError> {
        if size * size != data.len() {
            return Err(ClusterError::Shape {
                nrows: size as i64,
                ncols: size as i64,
                len: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.size + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.size + j] = value;
        self.data[j * self.size + i] = value;
    }

    pub fn count_nan(&self) -> usize {
        self.data.iter().filter(|d| d.is_nan()).count()
    }
}
