//! Bit matrices over GF(2).
//!
//! Row-major storage, one packed [`BitVec`] per row. Rank and inversion
//! run Gauss-Jordan elimination; inversion works on the augmented
//! matrix `[M | I]` and extracts the right half by shifting each row.
//! Invertible matrices are rejection-sampled: at the sizes used here a
//! uniform matrix is singular with probability below 0.29.

use rand::{CryptoRng, RngCore};
use tracing::debug;

use super::vector::BitVec;

/// Matrix over GF(2) with `rows x cols` bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitMatrix {
    rows: usize,
    cols: usize,
    data: Vec<BitVec>,
}

impl BitMatrix {
    /// All-zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: (0..rows).map(|_| BitVec::zeros(cols)).collect(),
        }
    }

    /// The `n x n` identity.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i].set_bit(i, true);
        }
        m
    }

    /// Uniformly random matrix: every row is filled from the RNG and
    /// shrink-masked to `cols` bits.
    pub fn random<R: RngCore>(rows: usize, cols: usize, rng: &mut R) -> Self {
        Self {
            rows,
            cols,
            data: (0..rows).map(|_| BitVec::random(cols, rng)).collect(),
        }
    }

    /// Uniformly random invertible `n x n` matrix, redrawing until the
    /// rank is full.
    pub fn random_invertible<R: RngCore + CryptoRng>(n: usize, rng: &mut R) -> Self {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let candidate = Self::random(n, n, rng);
            if candidate.rank() == n {
                debug!(n, attempts, "sampled invertible matrix");
                return candidate;
            }
        }
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrow of row `i`.
    pub fn row(&self, i: usize) -> &BitVec {
        &self.data[i]
    }

    /// Reads the bit at `(r, c)`.
    pub fn get_bit(&self, r: usize, c: usize) -> bool {
        self.data[r].get_bit(c)
    }

    /// Writes the bit at `(r, c)`.
    pub fn set_bit(&mut self, r: usize, c: usize, value: bool) {
        self.data[r].set_bit(c, value);
    }

    /// Swaps two rows; equal or out-of-range indices are a no-op.
    pub fn swap_rows(&mut self, i: usize, j: usize) {
        if i == j || i >= self.rows || j >= self.rows {
            return;
        }
        self.data.swap(i, j);
    }

    /// Matrix product `self * rhs` (`rows x cols` times `cols x k`):
    /// each output row is the XOR of the `rhs` rows selected by the set
    /// bits of the corresponding `self` row.
    pub fn mul(&self, rhs: &BitMatrix) -> BitMatrix {
        assert_eq!(self.cols, rhs.rows, "inner dimensions must agree");
        let mut out = BitMatrix::zeros(self.rows, rhs.cols);
        for (row, acc) in self.data.iter().zip(out.data.iter_mut()) {
            for j in 0..self.cols {
                if row.get_bit(j) {
                    acc.xor_add(&rhs.data[j]);
                }
            }
        }
        out
    }

    /// Matrix-vector product, treating `v` as a column vector.
    pub fn mul_vec(&self, v: &BitVec) -> BitVec {
        assert_eq!(self.cols, v.len(), "vector length must match columns");
        let mut out = BitVec::zeros(self.rows);
        for (i, row) in self.data.iter().enumerate() {
            if row.dot(v) {
                out.set_bit(i, true);
            }
        }
        out
    }

    /// Bit-level copy of the `nrows x ncols` rectangle at `(r0, c0)`.
    /// Callers request in-bounds rectangles only.
    pub fn submatrix(&self, r0: usize, c0: usize, nrows: usize, ncols: usize) -> BitMatrix {
        let mut out = BitMatrix::zeros(nrows, ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                if self.get_bit(r0 + i, c0 + j) {
                    out.set_bit(i, j, true);
                }
            }
        }
        out
    }

    /// First `(row, col)` at or after `(start_row, start_col)` with a
    /// set bit, scanning the rows of a column before advancing to the
    /// next column. `None` when the remaining columns are all zero.
    fn find_pivot(&self, start_row: usize, start_col: usize) -> Option<(usize, usize)> {
        for col in start_col..self.cols {
            for row in start_row..self.rows {
                if self.get_bit(row, col) {
                    return Some((row, col));
                }
            }
        }
        None
    }

    /// XORs the pivot row into every other row with a set bit in `col`,
    /// clearing the column above and below the pivot.
    fn eliminate_column(&mut self, pivot_row: usize, col: usize) {
        let pivot = self.data[pivot_row].clone();
        for (i, row) in self.data.iter_mut().enumerate() {
            if i != pivot_row && row.get_bit(col) {
                row.xor_add(&pivot);
            }
        }
    }

    /// Gauss-Jordan rank, computed on a working copy.
    pub fn rank(&self) -> usize {
        let mut work = self.clone();
        let mut row = 0;
        let mut col = 0;
        while row < work.rows {
            let Some((pr, pc)) = work.find_pivot(row, col) else {
                return row;
            };
            work.swap_rows(row, pr);
            work.eliminate_column(row, pc);
            row += 1;
            col = pc + 1;
        }
        row
    }

    /// True for square matrices of full rank.
    pub fn is_invertible(&self) -> bool {
        self.rows == self.cols && self.rank() == self.rows
    }

    /// Inverse via Gauss-Jordan on the augmented matrix `[M | I]`.
    /// `None` when the matrix is not square or not of full rank.
    pub fn inverse(&self) -> Option<BitMatrix> {
        if self.rows != self.cols {
            return None;
        }
        let n = self.rows;
        let mut aug = BitMatrix::zeros(n, 2 * n);
        for i in 0..n {
            for j in 0..n {
                if self.get_bit(i, j) {
                    aug.set_bit(i, j, true);
                }
            }
            aug.set_bit(i, n + i, true);
        }

        let mut row = 0;
        let mut col = 0;
        for _ in 0..n {
            let (pr, pc) = aug.find_pivot(row, col)?;
            if pc >= n {
                // The left half ran out of pivots: singular.
                return None;
            }
            aug.swap_rows(row, pr);
            aug.eliminate_column(row, pc);
            row += 1;
            col = pc + 1;
        }

        let mut inv = BitMatrix::zeros(n, n);
        for (aug_row, inv_row) in aug.data.iter().zip(inv.data.iter_mut()) {
            let mut r = aug_row.clone();
            r.shr(n);
            *inv_row = r.low_bits(n);
        }
        Some(inv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn identity_is_multiplicative_unit() {
        let mut rng = ChaCha20Rng::from_seed([11u8; 32]);
        let m = BitMatrix::random(16, 16, &mut rng);
        let i = BitMatrix::identity(16);
        assert_eq!(m.mul(&i), m);
        assert_eq!(i.mul(&m), m);
    }

    #[test]
    fn inverse_round_trip_at_cipher_sizes() {
        let mut rng = ChaCha20Rng::from_seed([12u8; 32]);
        for n in [128, 144] {
            let m = BitMatrix::random_invertible(n, &mut rng);
            let inv = m.inverse().unwrap();
            assert_eq!(m.mul(&inv), BitMatrix::identity(n));
            assert_eq!(inv.mul(&m), BitMatrix::identity(n));
        }
    }

    #[test]
    fn inverse_undoes_mul_vec() {
        let mut rng = ChaCha20Rng::from_seed([13u8; 32]);
        let m = BitMatrix::random_invertible(64, &mut rng);
        let inv = m.inverse().unwrap();
        let v = BitVec::random(64, &mut rng);
        assert_eq!(inv.mul_vec(&m.mul_vec(&v)), v);
    }

    #[test]
    fn rank_deficient_matrix_is_rejected() {
        let mut rng = ChaCha20Rng::from_seed([14u8; 32]);
        let mut m = BitMatrix::random(128, 128, &mut rng);
        let dup = m.row(0).clone();
        m.data[1] = dup;
        assert!(m.rank() < 128);
        assert!(!m.is_invertible());
        assert!(m.inverse().is_none());
    }

    #[test]
    fn rank_of_zero_and_identity() {
        assert_eq!(BitMatrix::zeros(8, 8).rank(), 0);
        assert_eq!(BitMatrix::identity(144).rank(), 144);
    }

    #[test]
    fn submatrix_copies_bits() {
        let mut rng = ChaCha20Rng::from_seed([15u8; 32]);
        let m = BitMatrix::random(32, 32, &mut rng);
        let sub = m.submatrix(12, 20, 8, 8);
        for i in 0..8 {
            for j in 0..8 {
                assert_eq!(sub.get_bit(i, j), m.get_bit(12 + i, 20 + j));
            }
        }
    }

    #[test]
    fn swap_rows_ignores_bad_indices() {
        let mut m = BitMatrix::identity(4);
        let before = m.clone();
        m.swap_rows(1, 1);
        m.swap_rows(0, 9);
        m.swap_rows(9, 0);
        assert_eq!(m, before);
        m.swap_rows(0, 3);
        assert!(m.get_bit(0, 3));
        assert!(m.get_bit(3, 0));
    }

    #[test]
    fn mul_vec_matches_bitwise_dot() {
        let mut rng = ChaCha20Rng::from_seed([16u8; 32]);
        let m = BitMatrix::random(24, 40, &mut rng);
        let v = BitVec::random(40, &mut rng);
        let out = m.mul_vec(&v);
        for i in 0..24 {
            let mut parity = false;
            for j in 0..40 {
                parity ^= m.get_bit(i, j) && v.get_bit(j);
            }
            assert_eq!(out.get_bit(i), parity);
        }
    }
}
