//! Decryption key compilation.
//!
//! Derivation inverts both mixers, folds each even/odd S-box pair into
//! a single inverse byte permutation, and compiles three table stacks
//! whose chained XOR folds undo the encryption: one stack per mixer and
//! a final stack that applies the inverse substitutions in place.

use crate::bits::{BitMatrix, BitVec};

use super::{
    ByteSbox, ClearTable, EncryptionKey, NibbleSbox, PrivateKey, BLOCK_SIZE, BYTE_BITS,
    CIPHERTEXT_SIZE, COMBINED_COUNT, COMBINED_SIZE, NIBBLE_BITS, SBOX_COUNT, SBOX_SIZE,
};

/// The full decryption artifact: inverse mixers, combined inverse
/// S-boxes, and the exported inverse table stacks.
pub struct DecryptionKey {
    inv_mixer1: BitMatrix,
    inv_mixer2: BitMatrix,
    inv_sboxes: [ByteSbox; COMBINED_COUNT],
    private: PrivateKey,
}

impl DecryptionKey {
    /// Derives the private tables matching an encryption key. Returns
    /// `None` only for an inconsistent key whose mixers fail to invert;
    /// keys from [`EncryptionKey::generate`] always succeed.
    pub fn derive(key: &EncryptionKey) -> Option<Self> {
        let inv_mixer1 = key.mixer1().inverse()?;
        let inv_mixer2 = key.mixer2().inverse()?;
        let inv_sboxes = invert_sbox_pairs(key.sboxes());

        let mix_stage = compile_unmix_stage::<CIPHERTEXT_SIZE>(&inv_mixer2);
        let clear_stage = compile_unmix_stage::<BLOCK_SIZE>(&inv_mixer1);
        let final_stage = compile_final_stage(&inv_sboxes);

        Some(Self {
            inv_mixer1,
            inv_mixer2,
            inv_sboxes,
            private: PrivateKey::from_stages(mix_stage, clear_stage, final_stage),
        })
    }

    /// The inverse of the first mixer.
    pub fn inv_mixer1(&self) -> &BitMatrix {
        &self.inv_mixer1
    }

    /// The inverse of the second mixer.
    pub fn inv_mixer2(&self) -> &BitMatrix {
        &self.inv_mixer2
    }

    /// The combined inverse S-boxes, one per byte position.
    pub fn inv_sboxes(&self) -> &[ByteSbox; COMBINED_COUNT] {
        &self.inv_sboxes
    }

    /// The exported table half of the key.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// Decrypts one block with the exported tables.
    pub fn decrypt(&self, cipher: &[u8; CIPHERTEXT_SIZE]) -> [u8; BLOCK_SIZE] {
        self.private.decrypt(cipher)
    }
}

/// Folds each even/odd S-box pair into one inverse byte permutation:
/// the entry at the substituted byte holds the clear nibble pair.
fn invert_sbox_pairs(sboxes: &[NibbleSbox; SBOX_COUNT]) -> [ByteSbox; COMBINED_COUNT] {
    let mut inverses = [[0u8; COMBINED_SIZE]; COMBINED_COUNT];
    for (k, inverse) in inverses.iter_mut().enumerate() {
        let low = &sboxes[2 * k];
        let high = &sboxes[2 * k + 1];
        for u in 0..SBOX_SIZE {
            for v in 0..SBOX_SIZE {
                let substituted = low[u] | (high[v] << NIBBLE_BITS);
                inverse[usize::from(substituted)] = (u | (v << NIBBLE_BITS)) as u8;
            }
        }
    }
    inverses
}

/// Compiles an inverse mixer into per-byte-position lookup tables:
/// record `(i, e)` is the product of the inverse with a vector carrying
/// byte value `e` at byte position `i`, so XOR-folding one record per
/// input byte applies the full matrix.
fn compile_unmix_stage<const LEN: usize>(inverse: &BitMatrix) -> Vec<[[u8; LEN]; COMBINED_SIZE]> {
    let mut stage = vec![[[0u8; LEN]; COMBINED_SIZE]; LEN];
    for (i, table) in stage.iter_mut().enumerate() {
        for group in 0..LEN {
            let block = inverse.submatrix(group * BYTE_BITS, i * BYTE_BITS, BYTE_BITS, BYTE_BITS);
            for (e, record) in table.iter_mut().enumerate() {
                record[group] = apply_byte(&block, e as u8);
            }
        }
    }
    stage
}

/// Applies a byte-wide mixer block to a byte value.
fn apply_byte(block: &BitMatrix, value: u8) -> u8 {
    let v = BitVec::from_le_bytes(BYTE_BITS, &[value]);
    block.mul_vec(&v).low_u64() as u8
}

/// The last stack places each inverse-substituted byte back at its own
/// position; every other byte of a record stays zero.
fn compile_final_stage(inv_sboxes: &[ByteSbox; COMBINED_COUNT]) -> Vec<ClearTable> {
    let mut stage = vec![[[0u8; BLOCK_SIZE]; COMBINED_SIZE]; COMBINED_COUNT];
    for (i, (table, inverse)) in stage.iter_mut().zip(inv_sboxes.iter()).enumerate() {
        for (j, record) in table.iter_mut().enumerate() {
            record[i] = inverse[j];
        }
    }
    stage
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use crate::chaos::ChaoticSampler;

    fn key_pair(tag: u8) -> (EncryptionKey, DecryptionKey) {
        let seed: [u8; 32] = std::array::from_fn(|i| (i as u8).wrapping_add(tag));
        let mut chaos = ChaoticSampler::from_seed_bytes(&seed);
        let mut rng = ChaCha20Rng::from_seed([tag; 32]);
        let encryption = EncryptionKey::generate(&mut rng, &mut chaos);
        let decryption = DecryptionKey::derive(&encryption).unwrap();
        (encryption, decryption)
    }

    #[test]
    fn inverse_mixers_cancel() {
        let (encryption, decryption) = key_pair(1);
        assert_eq!(
            encryption.mixer1().mul(decryption.inv_mixer1()),
            BitMatrix::identity(encryption.mixer1().rows())
        );
        assert_eq!(
            encryption.mixer2().mul(decryption.inv_mixer2()),
            BitMatrix::identity(encryption.mixer2().rows())
        );
    }

    #[test]
    fn combined_inverse_sboxes_are_permutations() {
        let (_, decryption) = key_pair(2);
        let expected: Vec<u8> = (0..=255).collect();
        for inverse in decryption.inv_sboxes() {
            let mut sorted = inverse.to_vec();
            sorted.sort_unstable();
            assert_eq!(sorted, expected);
        }
    }

    #[test]
    fn inverse_sboxes_undo_paired_substitution() {
        let (encryption, decryption) = key_pair(3);
        let sboxes = encryption.sboxes();
        let inverses = decryption.inv_sboxes();
        for k in 0..COMBINED_COUNT {
            for u in 0..SBOX_SIZE {
                for v in 0..SBOX_SIZE {
                    let substituted = sboxes[2 * k][u] | (sboxes[2 * k + 1][v] << NIBBLE_BITS);
                    assert_eq!(
                        inverses[k][usize::from(substituted)],
                        (u | (v << NIBBLE_BITS)) as u8
                    );
                }
            }
        }
    }

    #[test]
    fn round_trip_on_the_sample_block() {
        let (encryption, decryption) = key_pair(4);
        let message = b"This is fast white-box cipher!!";
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(&message[..BLOCK_SIZE]);
        assert_eq!(
            block,
            [
                0x54, 0x68, 0x69, 0x73, 0x20, 0x69, 0x73, 0x20, 0x66, 0x61, 0x73, 0x74, 0x20,
                0x77, 0x68, 0x69
            ]
        );
        let cipher = encryption.encrypt(&block);
        assert_eq!(decryption.decrypt(&cipher), block);
    }

    #[test]
    fn round_trip_on_random_blocks() {
        let (encryption, decryption) = key_pair(5);
        let mut rng = ChaCha20Rng::from_seed([55u8; 32]);
        for _ in 0..64 {
            let mut block = [0u8; BLOCK_SIZE];
            rng.fill_bytes(&mut block);
            let cipher = encryption.encrypt(&block);
            assert_eq!(decryption.decrypt(&cipher), block);
        }
    }

    #[test]
    fn round_trip_on_edge_blocks() {
        let (encryption, decryption) = key_pair(6);
        for block in [[0u8; BLOCK_SIZE], [0xFFu8; BLOCK_SIZE]] {
            let cipher = encryption.encrypt(&block);
            assert_eq!(decryption.decrypt(&cipher), block);
        }
    }

    #[test]
    fn one_byte_difference_avalanches() {
        // A one-byte plaintext change swaps a single table record, and
        // the record delta went through the full second mixer; expect a
        // wide ciphertext difference. The threshold is probabilistic,
        // so allow a few fresh keys before declaring failure.
        for tag in 7u8..12 {
            let (encryption, _) = key_pair(tag);
            let mut a = [0x41u8; BLOCK_SIZE];
            let b = a;
            a[5] ^= 0x01;
            let ca = encryption.encrypt(&a);
            let cb = encryption.encrypt(&b);
            let distance: u32 = ca
                .iter()
                .zip(cb.iter())
                .map(|(x, y)| (x ^ y).count_ones())
                .sum();
            if distance >= 40 {
                return;
            }
        }
        panic!("ciphertext difference stayed below 40 bits across keys");
    }
}
