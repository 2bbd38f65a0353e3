//! GF(2) bit algebra.
//!
//! Addition is XOR, multiplication is AND. [`BitVec`] packs bits into
//! 64-bit words with an explicit length; [`BitMatrix`] stacks rows of
//! them and provides the Gauss-Jordan machinery (rank, inversion,
//! submatrix extraction) that table compilation is built on.

mod matrix;
mod vector;

pub use matrix::BitMatrix;
pub use vector::BitVec;
