use crate::libs::error::ClusterError;
use std::io::BufRead;

/// A dense `nrows x ncols` matrix stored row-major.
///
/// The element at `(r, c)` lives at `r * ncols + c`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    nrows: usize,
    ncols: usize,
    values: Vec<f64>,
}

impl Matrix {
    /// Create a matrix, rejecting a mismatched value count.
    ///
    /// ```
    /// use heatclust::libs::matrix::Matrix;
    /// let m = Matrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(m.get(1, 0), 3.0);
    /// assert!(Matrix::new(2, 2, vec![1.0]).is_err());
    /// ```
    pub fn new(nrows: usize, ncols: usize, values: Vec<f64>) -> Result<Self, ClusterError> {
        if nrows.checked_mul(ncols) != Some(values.len()) {
            return Err(ClusterError::Shape {
                nrows: nrows as i64,
                ncols: ncols as i64,
                len: values.len(),
            });
        }
        Ok(Self {
            nrows,
            ncols,
            values,
        })
    }

    /// Validate dimensions as they arrive over the wire, where they may be negative.
    pub fn from_signed(nrows: i64, ncols: i64, values: Vec<f64>) -> Result<Self, ClusterError> {
        if nrows < 0 || ncols < 0 {
            return Err(ClusterError::Shape {
                nrows,
                ncols,
                len: values.len(),
            });
        }
        Self::new(nrows as usize, ncols as usize, values)
    }

    /// A matrix of the same shape holding `values`.
    pub(crate) fn with_values(&self, values: Vec<f64>) -> Matrix {
        debug_assert_eq!(values.len(), self.values.len());
        Matrix {
            nrows: self.nrows,
            ncols: self.ncols,
            values,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.ncols + col]
    }

    /// Borrow one row.
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.ncols;
        &self.values[start..start + self.ncols]
    }

    /// Copy one column out of the row-major storage.
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.nrows).map(|r| self.get(r, col)).collect()
    }

    /// Row vectors, indexed `0..nrows`, each of length `ncols`.
    pub fn row_vectors(&self) -> Vec<Vec<f64>> {
        (0..self.nrows).map(|r| self.row(r).to_vec()).collect()
    }

    /// Column vectors, indexed `0..ncols`, each of length `nrows`.
    pub fn column_vectors(&self) -> Vec<Vec<f64>> {
        (0..self.ncols).map(|c| self.column(c)).collect()
    }

    pub fn transpose(&self) -> Matrix {
        let mut transposed = vec![0.0; self.values.len()];
        for r in 0..self.nrows {
            for c in 0..self.ncols {
                transposed[c * self.nrows + r] = self.get(r, c);
            }
        }
        Matrix {
            nrows: self.ncols,
            ncols: self.nrows,
            values: transposed,
        }
    }

    /// Number of `NaN` or infinite cells.
    pub fn count_non_finite(&self) -> usize {
        self.values.iter().filter(|v| !v.is_finite()).count()
    }
}

/// An expression matrix together with its gene (row) and sample (column) names.
#[derive(Debug, Clone)]
pub struct LabelledMatrix {
    pub row_names: Vec<String>,
    pub col_names: Vec<String>,
    pub matrix: Matrix,
}

impl LabelledMatrix {
    /// Read a tab-separated matrix.
    ///
    /// The first line holds the sample names after a leading corner cell;
    /// every following line is a gene id followed by its values.
    /// `NA`, `nan` and empty cells are read as `NaN`.
    pub fn from_tsv(infile: &str) -> Result<Self, ClusterError> {
        let reader = intspan::reader(infile);
        Self::from_reader(reader)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ClusterError> {
        let mut col_names: Option<Vec<String>> = None;
        let mut row_names = vec![];
        let mut values = vec![];

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();

            let width = match &col_names {
                Some(header) => header.len(),
                None => {
                    col_names = Some(fields.iter().skip(1).map(|s| s.to_string()).collect());
                    continue;
                }
            };

            if fields.len() != width + 1 {
                return Err(ClusterError::Parse {
                    line: idx + 1,
                    message: format!("expected {} values, found {}", width, fields.len() - 1),
                });
            }
            row_names.push(fields[0].to_string());
            for field in &fields[1..] {
                values.push(parse_cell(field).ok_or_else(|| ClusterError::Parse {
                    line: idx + 1,
                    message: format!("invalid number: {}", field),
                })?);
            }
        }

        let col_names = col_names.unwrap_or_default();
        let matrix = Matrix::new(row_names.len(), col_names.len(), values)?;
        Ok(Self {
            row_names,
            col_names,
            matrix,
        })
    }
}

fn parse_cell(field: &str) -> Option<f64> {
    let field = field.trim();
    match field {
        "" | "NA" | "na" | "NaN" | "nan" | "-" => Some(f64::NAN),
        _ => field.parse::<f64>().ok(),
    }
}
