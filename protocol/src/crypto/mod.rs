//! # Cryptographic Primitives
//!
//! Everything the transaction and block layers need from elliptic curves
//! and hash functions, and nothing more:
//!
//! - **Keccak-256** as the fast hash, plus hash-to-scalar and the tree hash.
//! - **Ristretto** (curve25519) for keys, derivations, key images and ring
//!   signatures.
//! - **ChaCha8** for message encryption.
//! - The proof-of-work slow hash is *not* implemented here. The node plugs
//!   one in through [`SlowHash`].
//!
//! Every function takes and returns the byte newtypes from [`keys`]. Group
//! elements never escape this module, so an invalid key arriving off the
//! wire surfaces as a [`CryptoError`] at the first call that touches it.

pub mod derivation;
pub mod hash;
pub mod keys;
pub mod ring;
pub mod stream;

pub use derivation::{
    derive_public_key, derive_secret_key, generate_key_derivation, generate_key_image,
};
pub use hash::{
    fast_hash, hash_to_scalar, tree_depth, tree_hash, tree_hash_from_branch, PowVariant, SlowHash,
};
pub use keys::{
    check_key, secret_key_to_public_key, CryptoError, Hash, KeyDerivation, KeyImage, KeyPair,
    PublicKey, SecretKey, Signature, NULL_HASH, NULL_PUBLIC_KEY,
};
pub use ring::{check_ring_signature, generate_ring_signature};
pub use stream::chacha8;
