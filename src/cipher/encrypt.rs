//! Encryption key compilation.
//!
//! Generation draws 32 nibble S-boxes from the chaotic sampler and two
//! invertible mixing matrices from the RNG, bakes the first mixer and
//! the S-boxes into per-nibble T-boxes, then pairs those into the
//! byte-indexed combined tables, appends the two mix bytes, and remixes
//! every record through the second mixer. Only the combined tables are
//! ever exported.

use rand::{CryptoRng, RngCore};
use tracing::debug;

use crate::bits::{BitMatrix, BitVec};
use crate::chaos::ChaoticSampler;

use super::{
    ClearRecord, MixTable, NibbleSbox, PublicKey, BLOCK_SIZE, CIPHERTEXT_SIZE, COMBINED_COUNT,
    COMBINED_SIZE, MIXER1_BITS, MIXER2_BITS, NIBBLE_BITS, SBOX_COUNT, SBOX_SIZE,
};

/// The full encryption artifact: both mixers, the nibble S-boxes, and
/// the exported combined tables.
pub struct EncryptionKey {
    mixer1: BitMatrix,
    mixer2: BitMatrix,
    sboxes: [NibbleSbox; SBOX_COUNT],
    public: PublicKey,
}

impl EncryptionKey {
    /// Compiles a fresh key. Randomness is consumed in a fixed order -
    /// the 32 S-boxes, mixer1, mixer2, then the mix permutations during
    /// combination - and reordering would change the tables bit for
    /// bit.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, chaos: &mut ChaoticSampler) -> Self {
        let mut sboxes = [[0u8; SBOX_SIZE]; SBOX_COUNT];
        for sbox in sboxes.iter_mut() {
            chaos.draw_permutation(sbox);
        }
        let mixer1 = BitMatrix::random_invertible(MIXER1_BITS, rng);
        let mixer2 = BitMatrix::random_invertible(MIXER2_BITS, rng);

        let tboxes = compile_nibble_tboxes(&mixer1, &sboxes);
        let tables = combine_tboxes(chaos, &mixer2, &tboxes);
        debug!(tables = tables.len(), "compiled combined tables");

        Self {
            mixer1,
            mixer2,
            sboxes,
            public: PublicKey::from_tables(tables),
        }
    }

    /// The first (128-bit) mixing matrix.
    pub fn mixer1(&self) -> &BitMatrix {
        &self.mixer1
    }

    /// The second (144-bit) mixing matrix.
    pub fn mixer2(&self) -> &BitMatrix {
        &self.mixer2
    }

    /// The nibble S-boxes.
    pub fn sboxes(&self) -> &[NibbleSbox; SBOX_COUNT] {
        &self.sboxes
    }

    /// The exported table half of the key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Encrypts one block with the exported tables.
    pub fn encrypt(&self, block: &[u8; BLOCK_SIZE]) -> [u8; CIPHERTEXT_SIZE] {
        self.public.encrypt(block)
    }
}

/// Applies a nibble-wide mixer block to a nibble value.
fn apply_nibble(block: &BitMatrix, value: u8) -> u8 {
    let v = BitVec::from_le_bytes(NIBBLE_BITS, &[value]);
    (block.mul_vec(&v).low_u64() & 0xF) as u8
}

/// Per-S-box nibble T-boxes. Entry `(i, v)` packs, nibble by nibble,
/// the products of the 32 stacked 4x4 mixer1 blocks in column band `i`
/// with `S[i][v]`: row group `r` lands in the low nibble of byte `r/2`
/// when `r` is even, the high nibble otherwise.
fn compile_nibble_tboxes(
    mixer1: &BitMatrix,
    sboxes: &[NibbleSbox; SBOX_COUNT],
) -> Vec<[ClearRecord; SBOX_SIZE]> {
    let mut tboxes = vec![[[0u8; BLOCK_SIZE]; SBOX_SIZE]; SBOX_COUNT];
    for (i, (tbox, sbox)) in tboxes.iter_mut().zip(sboxes.iter()).enumerate() {
        for group in 0..2 * BLOCK_SIZE {
            let block = mixer1.submatrix(
                group * NIBBLE_BITS,
                i * NIBBLE_BITS,
                NIBBLE_BITS,
                NIBBLE_BITS,
            );
            for (v, record) in tbox.iter_mut().enumerate() {
                let y = apply_nibble(&block, sbox[v]);
                if group % 2 == 0 {
                    record[group / 2] |= y;
                } else {
                    record[group / 2] |= y << NIBBLE_BITS;
                }
            }
        }
    }
    tboxes
}

/// Pairs the nibble T-boxes into byte-indexed tables, writes the two
/// mix bytes, and remixes every 18-byte record through mixer2 as a
/// 144-bit little-endian column vector. The shared high-mix permutation
/// is drawn once, then one low-mix permutation per pair in loop order.
fn combine_tboxes(
    chaos: &mut ChaoticSampler,
    mixer2: &BitMatrix,
    tboxes: &[[ClearRecord; SBOX_SIZE]],
) -> Vec<MixTable> {
    let mut high_mixes = [0u8; COMBINED_SIZE];
    chaos.draw_permutation(&mut high_mixes);

    let mut tables = vec![[[0u8; CIPHERTEXT_SIZE]; COMBINED_SIZE]; COMBINED_COUNT];
    for (k, table) in tables.iter_mut().enumerate() {
        let low = &tboxes[2 * k];
        let high = &tboxes[2 * k + 1];
        let mut mixes = [0u8; COMBINED_SIZE];
        chaos.draw_permutation(&mut mixes);

        for v in 0..SBOX_SIZE {
            for u in 0..SBOX_SIZE {
                let idx = u | (v << NIBBLE_BITS);
                let record = &mut table[idx];
                for (b, slot) in record.iter_mut().take(BLOCK_SIZE).enumerate() {
                    *slot = low[u][b] ^ high[v][b];
                }
                record[CIPHERTEXT_SIZE - 2] = mixes[idx];
                record[CIPHERTEXT_SIZE - 1] = high_mixes[k];

                let mixed = mixer2.mul_vec(&BitVec::from_le_bytes(MIXER2_BITS, record));
                record.copy_from_slice(&mixed.to_le_bytes());
            }
        }
    }
    tables
}
