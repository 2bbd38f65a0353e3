//! wbx - white-box cipher sample harness.
//!
//! Generates key pairs and exercises three scenarios: encrypt/decrypt,
//! save/load then encrypt/decrypt, and the hash-preimage signature.
//! Each scenario prints a single OK or ERROR line on stdout; the exit
//! code is always 0. Diagnostics go to stderr via tracing.

use anyhow::{Context, Result};
use rand::rngs::OsRng;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wbx::chaos::ChaoticSampler;
use wbx::cipher::{DecryptionKey, EncryptionKey, BLOCK_SIZE};
use wbx::{keyfile, sign};

/// The sample message; its first block is what gets encrypted.
const MESSAGE: &[u8] = b"This is fast white-box cipher!!";

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wbx=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    report("ENCR_DECR", run_round_trip());
    report("ENCR_DECR_SAVE_LOAD", run_save_load());
    report("SIGN", run_sign());
}

/// Prints the scenario verdict; a failure never changes the exit code.
fn report(name: &str, outcome: Result<bool>) {
    match outcome {
        Ok(true) => println!("{name} OK"),
        Ok(false) => println!("{name} ERROR"),
        Err(err) => {
            tracing::error!("{name} failed: {err:#}");
            println!("{name} ERROR");
        }
    }
}

fn sample_block() -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    block.copy_from_slice(&MESSAGE[..BLOCK_SIZE]);
    block
}

fn generate_key_pair() -> Result<(EncryptionKey, DecryptionKey)> {
    let mut chaos = ChaoticSampler::from_entropy(&mut OsRng);
    let encryption = EncryptionKey::generate(&mut OsRng, &mut chaos);
    let decryption =
        DecryptionKey::derive(&encryption).context("generated mixers failed to invert")?;
    Ok((encryption, decryption))
}

fn key_file_paths() -> (PathBuf, PathBuf) {
    let dir = std::env::temp_dir();
    (dir.join("pub.bin"), dir.join("priv.bin"))
}

/// Generate a key pair, encrypt the sample block, decrypt it back.
fn run_round_trip() -> Result<bool> {
    let (encryption, decryption) = generate_key_pair()?;
    let block = sample_block();
    let cipher = encryption.encrypt(&block);
    Ok(decryption.decrypt(&cipher) == block)
}

/// Generate a key pair, save both keys, load them back, and check the
/// loaded tables evaluate exactly like the in-memory ones.
fn run_save_load() -> Result<bool> {
    let (encryption, decryption) = generate_key_pair()?;
    let (pub_path, priv_path) = key_file_paths();

    keyfile::save_public_key(&pub_path, encryption.public_key()).context("saving public key")?;
    keyfile::save_private_key(&priv_path, decryption.private_key())
        .context("saving private key")?;

    let public = keyfile::load_public_key(&pub_path).context("loading public key")?;
    let private = keyfile::load_private_key(&priv_path).context("loading private key")?;

    let block = sample_block();
    let cipher = public.encrypt(&block);
    Ok(cipher == encryption.encrypt(&block) && private.decrypt(&cipher) == block)
}

/// Generate and persist a key pair, reload it, then probe for a
/// signature of the sample block and verify it.
fn run_sign() -> Result<bool> {
    let (encryption, decryption) = generate_key_pair()?;
    let (pub_path, priv_path) = key_file_paths();
    keyfile::save_public_key(&pub_path, encryption.public_key())?;
    keyfile::save_private_key(&priv_path, decryption.private_key())?;
    let public = keyfile::load_public_key(&pub_path)?;
    let private = keyfile::load_private_key(&priv_path)?;

    let block = sample_block();
    match sign::sign(&public, &private, &block) {
        Some(signature) => Ok(sign::verify(&public, &block, &signature)),
        None => Ok(false),
    }
}
