//! # Key Material
//!
//! Fixed-size byte newtypes for everything the protocol puts on the wire:
//! hashes, public keys, secret keys, key derivations and key images. Points
//! and scalars live in the Ristretto group of curve25519; a 32-byte public
//! key is a compressed Ristretto point and a 32-byte secret key is a
//! canonical little-endian scalar.
//!
//! The newtypes only hold bytes. Conversion to group elements happens at the
//! point of use so that an invalid key on the wire is a recoverable
//! [`CryptoError`], never a panic.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::HASH_SIZE;

/// Errors raised by the primitive layer.
///
/// Deliberately coarse: "which point was bad" is useful for debugging, the
/// reason it was bad is not.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key: not a valid group element")]
    InvalidPublicKey,

    #[error("invalid secret key: not a canonical scalar")]
    InvalidSecretKey,

    #[error("invalid key image: not a valid group element")]
    InvalidKeyImage,

    #[error("invalid key derivation: not a valid group element")]
    InvalidDerivation,

    #[error("ring signature shape mismatch: {reason}")]
    InvalidRing { reason: String },

    #[error("malformed hex: {0}")]
    Hex(String),
}

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        pub struct $name(pub [u8; HASH_SIZE]);

        impl $name {
            pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
                let bytes = hex::decode(s).map_err(|e| CryptoError::Hex(e.to_string()))?;
                let arr: [u8; HASH_SIZE] = bytes.try_into().map_err(|v: Vec<u8>| {
                    CryptoError::Hex(format!("expected {} bytes, got {}", HASH_SIZE, v.len()))
                })?;
                Ok(Self(arr))
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; HASH_SIZE]
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; HASH_SIZE]> for $name {
            fn from(bytes: [u8; HASH_SIZE]) -> Self {
                Self(bytes)
            }
        }
    };
}

macro_rules! hex_display {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = CryptoError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }
    };
}

fixed_bytes!(
    /// Output of the fast hash: transaction ids, prefix hashes, merkle nodes.
    Hash
);
hex_display!(Hash);

fixed_bytes!(
    /// A compressed group element.
    PublicKey
);
hex_display!(PublicKey);

fixed_bytes!(
    /// A scalar. `Debug` is redacted; use [`SecretKey::to_hex`] if you
    /// really mean to print it.
    SecretKey
);

fixed_bytes!(
    /// Shared secret between a transaction key and an account view key.
    KeyDerivation
);
hex_display!(KeyDerivation);

fixed_bytes!(
    /// Spend tag published with every key input; unique per spent output.
    KeyImage
);
hex_display!(KeyImage);

/// The all-zero hash; also the merkle root of an empty list.
pub const NULL_HASH: Hash = Hash([0u8; HASH_SIZE]);

/// Sentinel returned when a transaction carries no public key.
pub const NULL_PUBLIC_KEY: PublicKey = PublicKey([0u8; HASH_SIZE]);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// One element of a ring signature.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signature {
    pub c: [u8; HASH_SIZE],
    pub r: [u8; HASH_SIZE],
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; 2 * HASH_SIZE] {
        let mut out = [0u8; 2 * HASH_SIZE];
        out[..HASH_SIZE].copy_from_slice(&self.c);
        out[HASH_SIZE..].copy_from_slice(&self.r);
        out
    }

    pub fn from_bytes(bytes: &[u8; 2 * HASH_SIZE]) -> Self {
        let mut c = [0u8; HASH_SIZE];
        let mut r = [0u8; HASH_SIZE];
        c.copy_from_slice(&bytes[..HASH_SIZE]);
        r.copy_from_slice(&bytes[HASH_SIZE..]);
        Self { c, r }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.to_bytes()))
    }
}

// ---------------------------------------------------------------------------
// KeyPair
// ---------------------------------------------------------------------------

/// A secret scalar with its public point.
///
/// Used for account view/spend keys, per-transaction keys and per-input
/// one-time keys alike.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub secret_key: SecretKey,
}

impl KeyPair {
    /// Fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        let scalar = Scalar::random(&mut OsRng);
        Self {
            public_key: public_from_scalar(&scalar),
            secret_key: SecretKey(scalar.to_bytes()),
        }
    }

    /// Rebuilds the pair from its secret half.
    pub fn from_secret(secret_key: SecretKey) -> Result<Self, CryptoError> {
        let public_key = secret_key_to_public_key(&secret_key)?;
        Ok(Self {
            public_key,
            secret_key,
        })
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("secret_key", &self.secret_key)
            .finish()
    }
}

/// `P = s·G`. Fails for non-canonical scalars.
pub fn secret_key_to_public_key(secret: &SecretKey) -> Result<PublicKey, CryptoError> {
    let scalar = secret.to_scalar()?;
    Ok(public_from_scalar(&scalar))
}

/// Returns `true` if `key` decodes to a group element.
pub fn check_key(key: &PublicKey) -> bool {
    key.to_point().is_ok()
}

// ---------------------------------------------------------------------------
// Group conversions
// ---------------------------------------------------------------------------

pub(crate) fn public_from_scalar(scalar: &Scalar) -> PublicKey {
    PublicKey(RistrettoPoint::mul_base(scalar).compress().to_bytes())
}

pub(crate) fn decompress(bytes: &[u8; HASH_SIZE]) -> Option<RistrettoPoint> {
    CompressedRistretto(*bytes).decompress()
}

impl PublicKey {
    pub(crate) fn to_point(&self) -> Result<RistrettoPoint, CryptoError> {
        decompress(&self.0).ok_or(CryptoError::InvalidPublicKey)
    }

    pub(crate) fn from_point(point: &RistrettoPoint) -> Self {
        Self(point.compress().to_bytes())
    }
}

impl SecretKey {
    pub(crate) fn to_scalar(&self) -> Result<Scalar, CryptoError> {
        Option::<Scalar>::from(Scalar::from_canonical_bytes(self.0))
            .ok_or(CryptoError::InvalidSecretKey)
    }

    pub(crate) fn from_scalar(scalar: &Scalar) -> Self {
        Self(scalar.to_bytes())
    }
}

impl KeyImage {
    pub(crate) fn to_point(&self) -> Result<RistrettoPoint, CryptoError> {
        decompress(&self.0).ok_or(CryptoError::InvalidKeyImage)
    }
}

impl KeyDerivation {
    pub(crate) fn to_point(&self) -> Result<RistrettoPoint, CryptoError> {
        decompress(&self.0).ok_or(CryptoError::InvalidDerivation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keypair_is_consistent() {
        let kp = KeyPair::generate();
        assert_eq!(secret_key_to_public_key(&kp.secret_key).unwrap(), kp.public_key);
        assert!(check_key(&kp.public_key));
    }

    #[test]
    fn from_secret_roundtrip() {
        let kp = KeyPair::generate();
        let rebuilt = KeyPair::from_secret(kp.secret_key).unwrap();
        assert_eq!(kp, rebuilt);
    }

    #[test]
    fn non_canonical_secret_rejected() {
        let secret = SecretKey([0xff; 32]);
        assert_eq!(
            secret_key_to_public_key(&secret),
            Err(CryptoError::InvalidSecretKey)
        );
    }

    #[test]
    fn check_key_rejects_garbage() {
        // Not a canonical Ristretto encoding (high bit set).
        assert!(!check_key(&PublicKey([0xff; 32])));
    }

    #[test]
    fn hex_roundtrip() {
        let kp = KeyPair::generate();
        let parsed: PublicKey = kp.public_key.to_hex().parse().unwrap();
        assert_eq!(parsed, kp.public_key);
        assert!(Hash::from_hex("abcd").is_err());
        assert!(Hash::from_hex("zz").is_err());
    }

    #[test]
    fn secret_key_debug_is_redacted() {
        let kp = KeyPair::generate();
        let debug = format!("{:?}", kp);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains(&kp.secret_key.to_hex()));
    }

    #[test]
    fn signature_bytes_roundtrip() {
        let sig = Signature {
            c: [1u8; 32],
            r: [2u8; 32],
        };
        assert_eq!(Signature::from_bytes(&sig.to_bytes()), sig);
    }
}
