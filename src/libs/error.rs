use thiserror::Error;

/// Errors raised by the clustering engine.
///
/// Empty axes and `NaN`/`Inf` cells are not errors: the former yield empty
/// orderings, the latter flow through to the result as missing values.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// `values.len() != nrows * ncols`, or a negative dimension.
    #[error("matrix shape {nrows}x{ncols} does not match {len} values")]
    Shape { nrows: i64, ncols: i64, len: usize },

    /// Two vectors of different lengths were compared.
    #[error("length mismatch: left = {left}, right = {right}")]
    LengthMismatch { left: usize, right: usize },

    /// An axis, linkage, metric or scaling name that is not recognized.
    #[error("unknown {kind}: {value}")]
    UnknownOption { kind: &'static str, value: String },

    /// Malformed matrix text.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// An inconsistent merge tree.
    #[error("dendrogram logic error: {0}")]
    Tree(String),

    /// The request was replaced or cancelled before it finished.
    #[error("clustering request cancelled")]
    Cancelled,

    /// The worker channel closed, a message was malformed, or the worker panicked.
    #[error("worker transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClusterError {
    pub fn unknown(kind: &'static str, value: &str) -> Self {
        ClusterError::UnknownOption {
            kind,
            value: value.to_string(),
        }
    }
}
