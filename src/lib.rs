//! White-box cipher proof of concept.
//!
//! The secret key of a block-like transformation is precompiled into
//! lookup tables: the public key is the forward table set, the private
//! key is a matching inverse table set, and together they form a
//! trapdoor usable both for 16-byte block encryption/decryption and for
//! a hash-preimage style signature probe.
//!
//! Key generation chains a chaotic permutation sampler ([`chaos`]), a
//! GF(2) bit-matrix toolkit ([`bits`]), and the table compilers
//! ([`cipher`]); evaluation is pure XOR folding and never touches the
//! generation machinery. [`keyfile`] dumps and reloads the opaque
//! tables; [`sign`] implements the signature probe.
//!
//! This is a proof of concept: it is not AES, and no resistance to
//! modern white-box attacks is claimed.

pub mod bits;
pub mod chaos;
pub mod cipher;
pub mod keyfile;
pub mod sign;
