//! Compressed Sparse Row (CSR) matrix.
//!
//! Used to store the canonical graph adjacency. Circuit graphs are sparse
//! (each component touches a handful of nodes), so the dense N×N form is
//! only materialized when an encoder writes it into a padded tensor.

use std::collections::BTreeMap;

/// Sparse matrix in Compressed Sparse Row format.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    pub nrows: usize,
    pub ncols: usize,
    /// Non-zero values, stored row by row.
    pub values: Vec<T>,
    /// Column index for each non-zero value.
    pub col_indices: Vec<usize>,
    /// `row_pointers[i]` is the index into values/col_indices where row i starts.
    /// `row_pointers[nrows]` = total number of non-zeros.
    pub row_pointers: Vec<usize>,
}

impl<T: Copy + Default> CsrMatrix<T> {
    /// Create an empty matrix with no non-zero entries.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_pointers: vec![0; nrows + 1],
        }
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Build from entries keyed by `(row, col)`. The map's ordering is the
    /// CSR storage order, so no sort is needed.
    pub fn from_entries(nrows: usize, ncols: usize, entries: &BTreeMap<(usize, usize), T>) -> Self {
        let mut values = Vec::with_capacity(entries.len());
        let mut col_indices = Vec::with_capacity(entries.len());
        let mut row_pointers = vec![0usize; nrows + 1];

        for (&(row, col), &value) in entries {
            values.push(value);
            col_indices.push(col);
            row_pointers[row + 1] += 1;
        }
        for i in 1..=nrows {
            row_pointers[i] += row_pointers[i - 1];
        }

        Self {
            nrows,
            ncols,
            values,
            col_indices,
            row_pointers,
        }
    }

    /// Column indices of the non-zeros in `row`, ascending.
    pub fn row_indices(&self, row: usize) -> &[usize] {
        &self.col_indices[self.row_pointers[row]..self.row_pointers[row + 1]]
    }

    /// Value at (row, col), or the default when the entry is structurally zero.
    pub fn get(&self, row: usize, col: usize) -> T {
        let start = self.row_pointers[row];
        match self.row_indices(row).binary_search(&col) {
            Ok(offset) => self.values[start + offset],
            Err(_) => T::default(),
        }
    }
}

impl<T: Copy + Default + PartialEq> CsrMatrix<T> {
    /// True if the matrix equals its transpose.
    pub fn is_symmetric(&self) -> bool {
        self.nrows == self.ncols
            && (0..self.nrows).all(|row| {
                self.row_indices(row)
                    .iter()
                    .all(|&col| self.get(col, row) == self.get(row, col))
            })
    }
}

/// Build a binary, symmetric adjacency matrix from undirected edges.
/// Repeated edges (a component with two pins on the same node) collapse to
/// a single entry; self loops are dropped.
pub fn symmetric_adjacency(n: usize, edges: &[(usize, usize)]) -> CsrMatrix<f32> {
    let entries: BTreeMap<(usize, usize), f32> = edges
        .iter()
        .filter(|(a, b)| a != b)
        .flat_map(|&(a, b)| [((a, b), 1.0), ((b, a), 1.0)])
        .collect();
    CsrMatrix::from_entries(n, n, &entries)
}
