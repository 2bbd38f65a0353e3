//! The fixed sum-of-lookups evaluator shared by both directions.
//!
//! No randomness and no arithmetic beyond XOR: every output byte is the
//! fold of one table record per input byte.

use super::{ClearTable, MixTable, BLOCK_SIZE, CIPHERTEXT_SIZE};

/// XOR-folds one combined-table record per plaintext byte.
pub fn encrypt_block(tables: &[MixTable], block: &[u8; BLOCK_SIZE]) -> [u8; CIPHERTEXT_SIZE] {
    debug_assert_eq!(tables.len(), BLOCK_SIZE);
    let mut cipher = [0u8; CIPHERTEXT_SIZE];
    for (table, &byte) in tables.iter().zip(block.iter()) {
        xor_record(&mut cipher, &table[usize::from(byte)]);
    }
    cipher
}

/// Undoes an encryption by folding the three inverse stacks in order:
/// mixer undo over all 18 ciphertext bytes, clear undo over the first
/// 16 intermediate bytes, then the substitution undo.
pub fn decrypt_block(
    mix_stage: &[MixTable],
    clear_stage: &[ClearTable],
    final_stage: &[ClearTable],
    cipher: &[u8; CIPHERTEXT_SIZE],
) -> [u8; BLOCK_SIZE] {
    debug_assert_eq!(mix_stage.len(), CIPHERTEXT_SIZE);
    debug_assert_eq!(clear_stage.len(), BLOCK_SIZE);
    debug_assert_eq!(final_stage.len(), BLOCK_SIZE);

    let mut unmixed = [0u8; CIPHERTEXT_SIZE];
    for (table, &byte) in mix_stage.iter().zip(cipher.iter()) {
        xor_record(&mut unmixed, &table[usize::from(byte)]);
    }

    // The two trailing mix bytes of `unmixed` carry no plaintext and
    // are dropped here.
    let mut substituted = [0u8; BLOCK_SIZE];
    for (table, &byte) in clear_stage.iter().zip(unmixed.iter()) {
        xor_record(&mut substituted, &table[usize::from(byte)]);
    }

    let mut plain = [0u8; BLOCK_SIZE];
    for (table, &byte) in final_stage.iter().zip(substituted.iter()) {
        xor_record(&mut plain, &table[usize::from(byte)]);
    }
    plain
}

fn xor_record<const LEN: usize>(acc: &mut [u8; LEN], record: &[u8; LEN]) {
    for (a, r) in acc.iter_mut().zip(record.iter()) {
        *a ^= r;
    }
}
