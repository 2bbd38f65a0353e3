//! Key persistence: raw table dumps.
//!
//! No header, no version byte, no checksum. The public file is the 16
//! combined tables in natural order; the private file is the mix-undo
//! stack, the clear-undo stack, and the final stack concatenated in
//! evaluation order. Loading validates nothing but the exact length -
//! the format is opaque by design.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::cipher::{
    ClearTable, MixTable, PrivateKey, PublicKey, BLOCK_SIZE, CIPHERTEXT_SIZE, COMBINED_COUNT,
    COMBINED_SIZE,
};

/// Exact public key file length: 16 x 256 x 18 bytes.
pub const PUBLIC_KEY_LEN: usize = COMBINED_COUNT * COMBINED_SIZE * CIPHERTEXT_SIZE;

/// Exact private key file length: 18 x 256 x 18 plus twice
/// 16 x 256 x 16 bytes.
pub const PRIVATE_KEY_LEN: usize = CIPHERTEXT_SIZE * COMBINED_SIZE * CIPHERTEXT_SIZE
    + 2 * COMBINED_COUNT * COMBINED_SIZE * BLOCK_SIZE;

/// Errors from saving or loading key files.
#[derive(Debug, Error)]
pub enum KeyFileError {
    #[error("key file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("key file holds {actual} bytes, expected {expected}")]
    BadLength { expected: usize, actual: usize },
}

/// Saves the combined tables as a raw dump.
pub fn save_public_key(path: &Path, key: &PublicKey) -> Result<(), KeyFileError> {
    let mut buf = Vec::with_capacity(PUBLIC_KEY_LEN);
    for table in key.tables() {
        for record in table.iter() {
            buf.extend_from_slice(record);
        }
    }
    debug_assert_eq!(buf.len(), PUBLIC_KEY_LEN);
    fs::write(path, &buf)?;
    info!(path = %path.display(), bytes = buf.len(), "saved public key");
    Ok(())
}

/// Saves the three inverse stacks, concatenated in evaluation order.
pub fn save_private_key(path: &Path, key: &PrivateKey) -> Result<(), KeyFileError> {
    let mut buf = Vec::with_capacity(PRIVATE_KEY_LEN);
    for table in key.mix_stage() {
        for record in table.iter() {
            buf.extend_from_slice(record);
        }
    }
    for table in key.clear_stage() {
        for record in table.iter() {
            buf.extend_from_slice(record);
        }
    }
    for table in key.final_stage() {
        for record in table.iter() {
            buf.extend_from_slice(record);
        }
    }
    debug_assert_eq!(buf.len(), PRIVATE_KEY_LEN);
    fs::write(path, &buf)?;
    info!(path = %path.display(), bytes = buf.len(), "saved private key");
    Ok(())
}

/// Loads a public key, checking only the file length.
pub fn load_public_key(path: &Path) -> Result<PublicKey, KeyFileError> {
    let buf = fs::read(path)?;
    if buf.len() != PUBLIC_KEY_LEN {
        return Err(KeyFileError::BadLength {
            expected: PUBLIC_KEY_LEN,
            actual: buf.len(),
        });
    }
    let mut cursor = 0;
    let mut tables = Vec::with_capacity(COMBINED_COUNT);
    for _ in 0..COMBINED_COUNT {
        tables.push(read_mix_table(&buf, &mut cursor));
    }
    info!(path = %path.display(), "loaded public key");
    Ok(PublicKey::from_tables(tables))
}

/// Loads a private key, checking only the file length.
pub fn load_private_key(path: &Path) -> Result<PrivateKey, KeyFileError> {
    let buf = fs::read(path)?;
    if buf.len() != PRIVATE_KEY_LEN {
        return Err(KeyFileError::BadLength {
            expected: PRIVATE_KEY_LEN,
            actual: buf.len(),
        });
    }
    let mut cursor = 0;
    let mut mix_stage = Vec::with_capacity(CIPHERTEXT_SIZE);
    for _ in 0..CIPHERTEXT_SIZE {
        mix_stage.push(read_mix_table(&buf, &mut cursor));
    }
    let mut clear_stage = Vec::with_capacity(COMBINED_COUNT);
    for _ in 0..COMBINED_COUNT {
        clear_stage.push(read_clear_table(&buf, &mut cursor));
    }
    let mut final_stage = Vec::with_capacity(COMBINED_COUNT);
    for _ in 0..COMBINED_COUNT {
        final_stage.push(read_clear_table(&buf, &mut cursor));
    }
    info!(path = %path.display(), "loaded private key");
    Ok(PrivateKey::from_stages(mix_stage, clear_stage, final_stage))
}

fn read_mix_table(buf: &[u8], cursor: &mut usize) -> MixTable {
    let mut table = [[0u8; CIPHERTEXT_SIZE]; COMBINED_SIZE];
    for record in table.iter_mut() {
        record.copy_from_slice(&buf[*cursor..*cursor + CIPHERTEXT_SIZE]);
        *cursor += CIPHERTEXT_SIZE;
    }
    table
}

fn read_clear_table(buf: &[u8], cursor: &mut usize) -> ClearTable {
    let mut table = [[0u8; BLOCK_SIZE]; COMBINED_SIZE];
    for record in table.iter_mut() {
        record.copy_from_slice(&buf[*cursor..*cursor + BLOCK_SIZE]);
        *cursor += BLOCK_SIZE;
    }
    table
}
