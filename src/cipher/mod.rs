//! White-box table cipher.
//!
//! A key pair is nothing but lookup tables. The public half maps a
//! 16-byte block to an 18-byte block by XOR-summing one table record
//! per input byte; the private half undoes it with three chained table
//! stacks. Compilation bakes two invertible GF(2) mixing matrices and a
//! layer of nibble substitutions into the records, so evaluating the
//! tables never touches the matrices or the S-boxes again.

mod decrypt;
mod encrypt;
mod evaluate;

pub use decrypt::DecryptionKey;
pub use encrypt::EncryptionKey;
pub use evaluate::{decrypt_block, encrypt_block};

/// Plaintext block length in bytes; also the clear record length.
pub const BLOCK_SIZE: usize = 16;
/// Ciphertext block length: a block plus the two mix bytes.
pub const CIPHERTEXT_SIZE: usize = 18;
/// Width of the first mixing matrix in bits.
pub const MIXER1_BITS: usize = 128;
/// Width of the second mixing matrix in bits.
pub const MIXER2_BITS: usize = 144;
/// Bits per nibble substitution element.
pub const NIBBLE_BITS: usize = 4;
/// Bits per combined substitution element.
pub const BYTE_BITS: usize = 8;
/// Number of nibble S-boxes.
pub const SBOX_COUNT: usize = 32;
/// Entries per nibble S-box.
pub const SBOX_SIZE: usize = 16;
/// Number of combined byte-indexed tables.
pub const COMBINED_COUNT: usize = 16;
/// Entries per combined table.
pub const COMBINED_SIZE: usize = 256;

/// A nibble permutation.
pub type NibbleSbox = [u8; SBOX_SIZE];
/// A byte permutation.
pub type ByteSbox = [u8; COMBINED_SIZE];
/// Table record without mix bytes.
pub type ClearRecord = [u8; BLOCK_SIZE];
/// Table record carrying the two trailing mix bytes.
pub type MixRecord = [u8; CIPHERTEXT_SIZE];
/// Byte-indexed table of mix records.
pub type MixTable = [MixRecord; COMBINED_SIZE];
/// Byte-indexed table of clear records.
pub type ClearTable = [ClearRecord; COMBINED_SIZE];

/// The exported encryption tables: one combined table per plaintext
/// byte position. This is the whole public key; evaluating it reveals
/// nothing about the matrices or S-boxes it was compiled from.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    tables: Vec<MixTable>,
}

impl PublicKey {
    pub(crate) fn from_tables(tables: Vec<MixTable>) -> Self {
        debug_assert_eq!(tables.len(), COMBINED_COUNT);
        Self { tables }
    }

    /// The combined tables, one per plaintext byte position.
    pub fn tables(&self) -> &[MixTable] {
        &self.tables
    }

    /// Encrypts one block.
    pub fn encrypt(&self, block: &[u8; BLOCK_SIZE]) -> [u8; CIPHERTEXT_SIZE] {
        evaluate::encrypt_block(&self.tables, block)
    }
}

/// The exported decryption tables: the three chained inverse stacks.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    /// Undoes the second mixer; 18 tables of 18-byte records.
    mix_stage: Vec<MixTable>,
    /// Undoes the first mixer; 16 tables of 16-byte records.
    clear_stage: Vec<ClearTable>,
    /// Undoes the combined substitutions; 16 tables of 16-byte records.
    final_stage: Vec<ClearTable>,
}

impl PrivateKey {
    pub(crate) fn from_stages(
        mix_stage: Vec<MixTable>,
        clear_stage: Vec<ClearTable>,
        final_stage: Vec<ClearTable>,
    ) -> Self {
        debug_assert_eq!(mix_stage.len(), CIPHERTEXT_SIZE);
        debug_assert_eq!(clear_stage.len(), COMBINED_COUNT);
        debug_assert_eq!(final_stage.len(), COMBINED_COUNT);
        Self {
            mix_stage,
            clear_stage,
            final_stage,
        }
    }

    /// The mixer-undo stack.
    pub fn mix_stage(&self) -> &[MixTable] {
        &self.mix_stage
    }

    /// The clear-undo stack.
    pub fn clear_stage(&self) -> &[ClearTable] {
        &self.clear_stage
    }

    /// The substitution-undo stack.
    pub fn final_stage(&self) -> &[ClearTable] {
        &self.final_stage
    }

    /// Decrypts one block.
    pub fn decrypt(&self, cipher: &[u8; CIPHERTEXT_SIZE]) -> [u8; BLOCK_SIZE] {
        evaluate::decrypt_block(&self.mix_stage, &self.clear_stage, &self.final_stage, cipher)
    }
}
