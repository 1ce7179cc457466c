//! Value rescaling applied before clustering and rendering.
//!
//! Statistics (min, max, mean, deviation) are taken over the finite cells of a
//! row or column only, so one missing value never leaks into its neighbours.
//! Non-finite cells come out as `NaN`.

use crate::libs::error::ClusterError;
use crate::libs::matrix::Matrix;
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scaling {
    #[default]
    None,
    /// Min-max to `[0, 1]` within each row.
    Row,
    /// Min-max to `[0, 1]` within each column.
    #[serde(alias = "column")]
    Col,
    /// Row-wise standard score with population deviation.
    #[serde(alias = "z-score")]
    ZScore,
    /// Column-wise standard score.
    #[serde(rename = "zscore_col")]
    ZScoreCol,
    /// `log2(v + 1)`.
    Log2,
}

impl FromStr for Scaling {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Scaling::None),
            "row" => Ok(Scaling::Row),
            "col" | "column" => Ok(Scaling::Col),
            "zscore" | "z-score" => Ok(Scaling::ZScore),
            "zscore_col" | "zscore-col" => Ok(Scaling::ZScoreCol),
            "log2" => Ok(Scaling::Log2),
            _ => Err(ClusterError::unknown("scaling", s)),
        }
    }
}

impl fmt::Display for Scaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Scaling::None => "none",
            Scaling::Row => "row",
            Scaling::Col => "col",
            Scaling::ZScore => "zscore",
            Scaling::ZScoreCol => "zscore_col",
            Scaling::Log2 => "log2",
        };
        write!(f, "{}", s)
    }
}

/// Rescale a matrix, returning a fresh one of the same shape.
pub fn scale(matrix: &Matrix, method: Scaling) -> Matrix {
    let nrows = matrix.nrows();
    let ncols = matrix.ncols();
    let mut out = matrix.values().to_vec();

    match method {
        Scaling::None => {}
        Scaling::Log2 => out.iter_mut().for_each(|v| *v = log2p1(*v)),
        Scaling::Row | Scaling::ZScore => {
            for r in 0..nrows {
                let cells: Vec<usize> = (0..ncols).map(|c| r * ncols + c).collect();
                rescale_cells(&mut out, &cells, method);
            }
        }
        Scaling::Col | Scaling::ZScoreCol => {
            for c in 0..ncols {
                let cells: Vec<usize> = (0..nrows).map(|r| r * ncols + c).collect();
                rescale_cells(&mut out, &cells, method);
            }
        }
    }

    matrix.with_values(out)
}

fn log2p1(v: f64) -> f64 {
    if v < 0.0 || v.is_nan() {
        f64::NAN
    } else {
        (v + 1.0).log2()
    }
}

fn rescale_cells(values: &mut [f64], cells: &[usize], method: Scaling) {
    let finite: Vec<f64> = cells
        .iter()
        .map(|&i| values[i])
        .filter(|v| v.is_finite())
        .collect();

    let transform: Box<dyn Fn(f64) -> f64> = match method {
        Scaling::Row | Scaling::Col => match finite.iter().copied().minmax() {
            MinMaxResult::NoElements => Box::new(|_| f64::NAN),
            MinMaxResult::OneElement(_) => Box::new(|_| 0.0),
            MinMaxResult::MinMax(min, max) => {
                if max == min {
                    Box::new(|_| 0.0)
                } else {
                    Box::new(move |v| (v - min) / (max - min))
                }
            }
        },
        _ => {
            if finite.is_empty() {
                Box::new(|_| f64::NAN)
            } else {
                let n = finite.len() as f64;
                let mean = finite.iter().sum::<f64>() / n;
                let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let sd = var.sqrt();
                if sd == 0.0 {
                    Box::new(|_| 0.0)
                } else {
                    Box::new(move |v| (v - mean) / sd)
                }
            }
        }
    };

    for &i in cells {
        let v = values[i];
        values[i] = if v.is_finite() { transform(v) } else { f64::NAN };
    }
}
