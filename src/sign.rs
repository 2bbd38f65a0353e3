//! Hash-preimage signature probe.
//!
//! A message is signed by searching for a counter whose SHA-256 digest,
//! truncated to ciphertext length, lands in the image of the encryption
//! tables: decrypting and re-encrypting the digest must reproduce it.
//! The image covers a 2^-16 fraction of the 144-bit space, so the
//! expected search visits about 2^16 counters; the bound of 2^24 makes
//! exhaustion vanishingly unlikely.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::cipher::{PrivateKey, PublicKey, BLOCK_SIZE, CIPHERTEXT_SIZE};

/// Counter bytes appended to the message before hashing.
pub const COUNTER_SIZE: usize = 3;

/// Trial bound for the preimage search.
pub const MAX_TRIALS: u32 = 1 << 24;

/// A successful probe: the counter and the block that encrypts to the
/// digest prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub counter: u32,
    pub preimage: [u8; BLOCK_SIZE],
}

/// Searches up to [`MAX_TRIALS`] counters for a digest the key pair
/// inverts exactly. `None` when the search space is exhausted.
pub fn sign(
    public: &PublicKey,
    private: &PrivateKey,
    message: &[u8; BLOCK_SIZE],
) -> Option<Signature> {
    for counter in 0..MAX_TRIALS {
        let target = digest_with_counter(message, counter);
        let preimage = private.decrypt(&target);
        if public.encrypt(&preimage) == target {
            debug!(counter, "preimage found");
            return Some(Signature { counter, preimage });
        }
        if counter % 0x1_0000 == 0xFFFF {
            debug!(counter, "preimage search still running");
        }
    }
    None
}

/// Checks a signature: the preimage must encrypt to the digest prefix
/// of the message under the signed counter.
pub fn verify(public: &PublicKey, message: &[u8; BLOCK_SIZE], signature: &Signature) -> bool {
    public.encrypt(&signature.preimage) == digest_with_counter(message, signature.counter)
}

/// SHA-256 of message plus little-endian counter, truncated to
/// ciphertext length.
fn digest_with_counter(message: &[u8; BLOCK_SIZE], counter: u32) -> [u8; CIPHERTEXT_SIZE] {
    let mut buf = [0u8; BLOCK_SIZE + COUNTER_SIZE];
    buf[..BLOCK_SIZE].copy_from_slice(message);
    buf[BLOCK_SIZE] = counter as u8;
    buf[BLOCK_SIZE + 1] = (counter >> 8) as u8;
    buf[BLOCK_SIZE + 2] = (counter >> 16) as u8;
    let digest = Sha256::digest(buf);
    let mut target = [0u8; CIPHERTEXT_SIZE];
    target.copy_from_slice(&digest[..CIPHERTEXT_SIZE]);
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use crate::chaos::ChaoticSampler;
    use crate::cipher::{DecryptionKey, EncryptionKey};

    fn key_pair() -> (EncryptionKey, DecryptionKey) {
        let seed: [u8; 32] = std::array::from_fn(|i| (7 * i) as u8);
        let mut chaos = ChaoticSampler::from_seed_bytes(&seed);
        let mut rng = ChaCha20Rng::from_seed([77u8; 32]);
        let encryption = EncryptionKey::generate(&mut rng, &mut chaos);
        let decryption = DecryptionKey::derive(&encryption).unwrap();
        (encryption, decryption)
    }

    #[test]
    fn signatures_verify() {
        let (encryption, decryption) = key_pair();
        let public = encryption.public_key();
        let private = decryption.private_key();
        let mut message = [0u8; BLOCK_SIZE];
        message.copy_from_slice(&b"This is fast whi"[..]);

        let signature = sign(public, private, &message).expect("search space exhausted");
        assert!(verify(public, &message, &signature));
    }

    #[test]
    fn tampering_breaks_verification() {
        let (encryption, decryption) = key_pair();
        let public = encryption.public_key();
        let private = decryption.private_key();
        let message = [0x42u8; BLOCK_SIZE];

        let signature = sign(public, private, &message).expect("search space exhausted");

        let mut other = message;
        other[0] ^= 1;
        assert!(!verify(public, &other, &signature));

        let mut forged = signature;
        forged.preimage[3] ^= 1;
        assert!(!verify(public, &message, &forged));
    }
}
