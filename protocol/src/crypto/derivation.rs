//! Diffie-Hellman style key derivation and one-time keys.
//!
//! A sender with transaction secret `r` and a recipient with view secret `a`
//! share `D = r·A = a·R`. From `D` and an output position `i` both sides
//! compute the scalar `h = H_s(D ‖ varint(i))`; the output key is
//! `P = h·G + B` (B is the recipient's spend key) and only the holder of the
//! spend secret `b` knows `x = h + b` with `P = x·G`.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;

use super::hash::{hash_to_point, hash_to_scalar};
use super::keys::{CryptoError, KeyDerivation, KeyImage, PublicKey, SecretKey};
use crate::encoding::write_varint;

/// `D = secret·public`.
pub fn generate_key_derivation(
    public: &PublicKey,
    secret: &SecretKey,
) -> Result<KeyDerivation, CryptoError> {
    let point = public.to_point()?;
    let scalar = secret.to_scalar()?;
    Ok(KeyDerivation((point * scalar).compress().to_bytes()))
}

/// `H_s(D ‖ varint(index))`.
fn derivation_to_scalar(
    derivation: &KeyDerivation,
    output_index: usize,
) -> Result<Scalar, CryptoError> {
    // A derivation must itself be a group element.
    derivation.to_point()?;
    let mut buf = Vec::with_capacity(32 + 10);
    buf.extend_from_slice(derivation.as_bytes());
    write_varint(&mut buf, output_index as u64);
    Ok(hash_to_scalar(&buf))
}

/// One-time public key for output `output_index`: `H_s(D ‖ i)·G + base`.
pub fn derive_public_key(
    derivation: &KeyDerivation,
    output_index: usize,
    base: &PublicKey,
) -> Result<PublicKey, CryptoError> {
    let base_point = base.to_point()?;
    let h = derivation_to_scalar(derivation, output_index)?;
    let point = RistrettoPoint::mul_base(&h) + base_point;
    Ok(PublicKey::from_point(&point))
}

/// One-time secret key for output `output_index`: `H_s(D ‖ i) + base`.
pub fn derive_secret_key(
    derivation: &KeyDerivation,
    output_index: usize,
    base: &SecretKey,
) -> Result<SecretKey, CryptoError> {
    let base_scalar = base.to_scalar()?;
    let h = derivation_to_scalar(derivation, output_index)?;
    Ok(SecretKey::from_scalar(&(h + base_scalar)))
}

/// `I = x·H_p(P)`.
pub fn generate_key_image(public: &PublicKey, secret: &SecretKey) -> Result<KeyImage, CryptoError> {
    let scalar = secret.to_scalar()?;
    let image = hash_to_point(public) * scalar;
    Ok(KeyImage(image.compress().to_bytes()))
}
