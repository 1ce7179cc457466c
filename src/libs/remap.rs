//! Index bookkeeping for drawing a reordered matrix without copying it.
//!
//! Two layouts share the same `R x C` shape:
//!
//! * the *original* row-major layout of the value array, and
//! * the *display* layout, where display row `p` shows original row
//!   `row_order[p]` and display column `q` shows original column `col_order[q]`.
//!
//! A renderer walks display cells and reads `values[reordered_flat_index(p)]`.

/// O(1) lookups between original and display positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remapper {
    row_order: Vec<usize>,
    col_order: Vec<usize>,
    row_rank: Vec<usize>,
    col_rank: Vec<usize>,
}

impl Remapper {
    /// `row_order` and `col_order` must be permutations of `0..R` and `0..C`.
    pub fn new(row_order: &[usize], col_order: &[usize]) -> Self {
        Self {
            row_order: row_order.to_vec(),
            col_order: col_order.to_vec(),
            row_rank: invert(row_order),
            col_rank: invert(col_order),
        }
    }

    pub fn nrows(&self) -> usize {
        self.row_order.len()
    }

    pub fn ncols(&self) -> usize {
        self.col_order.len()
    }

    pub fn len(&self) -> usize {
        self.nrows() * self.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display row of the original cell at `flat_index`.
    pub fn row_of(&self, flat_index: usize) -> usize {
        self.row_rank[flat_index / self.ncols()]
    }

    /// Display column of the original cell at `flat_index`.
    pub fn col_of(&self, flat_index: usize) -> usize {
        self.col_rank[flat_index % self.ncols()]
    }

    /// Original row shown at the display cell `flat_index`.
    pub fn source_row(&self, flat_index: usize) -> usize {
        self.row_order[flat_index / self.ncols()]
    }

    /// Original column shown at the display cell `flat_index`.
    pub fn source_col(&self, flat_index: usize) -> usize {
        self.col_order[flat_index % self.ncols()]
    }

    /// Index into the original value array for the display cell `flat_index`.
    ///
    /// ```
    /// use heatclust::libs::remap::Remapper;
    /// // rows swapped, columns kept
    /// let remap = Remapper::new(&[1, 0], &[0, 1]);
    /// let values = [1.0, 2.0, 3.0, 4.0];
    /// assert_eq!(values[remap.reordered_flat_index(0)], 3.0);
    /// assert_eq!(values[remap.reordered_flat_index(3)], 2.0);
    /// ```
    pub fn reordered_flat_index(&self, flat_index: usize) -> usize {
        let ncols = self.ncols();
        self.source_row(flat_index) * ncols + self.source_col(flat_index)
    }

    /// Display cell showing the original cell `flat_index`; inverse of
    /// [`Remapper::reordered_flat_index`].
    pub fn display_flat_index(&self, flat_index: usize) -> usize {
        self.row_of(flat_index) * self.ncols() + self.col_of(flat_index)
    }

    /// Value drawn at display cell `flat_index`.
    pub fn value_at(&self, values: &[f64], flat_index: usize) -> f64 {
        values[self.reordered_flat_index(flat_index)]
    }

    /// An explicit reordered copy, for writing out; renderers should index instead.
    pub fn materialize(&self, values: &[f64]) -> Vec<f64> {
        (0..self.len()).map(|p| self.value_at(values, p)).collect()
    }
}

fn invert(order: &[usize]) -> Vec<usize> {
    let mut rank = vec![0; order.len()];
    for (position, &index) in order.iter().enumerate() {
        rank[index] = position;
    }
    rank
}
