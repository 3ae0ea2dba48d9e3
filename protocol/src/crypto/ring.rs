//! # Ring Signatures
//!
//! The classic CryptoNote one-time ring signature. A signer holding the
//! secret `x` of ring member `s` proves knowledge of *some* ring member's
//! secret and binds the proof to the key image `I = x·H_p(P_s)`, so two
//! signatures by the same output always expose the same image.
//!
//! For every member `i` the signature carries a pair `(c_i, r_i)`:
//!
//! ```text
//! i != s:  L_i = r_i·G + c_i·P_i         R_i = r_i·H_p(P_i) + c_i·I
//! i == s:  L_s = k·G                     R_s = k·H_p(P_s)
//! c = H_s(prefix ‖ L_0 ‖ R_0 ‖ … ‖ L_n ‖ R_n)
//! c_s = c − Σ_{i≠s} c_i                  r_s = k − c_s·x
//! ```
//!
//! The verifier recomputes every `L_i, R_i` from the pairs and checks that
//! the challenges sum to `c`.
//!
//! Nonces (`k` and the decoy pairs) come from a BLAKE3 XOF keyed by the
//! secret, the prefix hash, the image and the ring. Signing the same
//! message with the same key and ring therefore yields the same bytes,
//! which is what makes transaction construction reproducible.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};

use super::hash::{hash_to_point, hash_to_scalar};
use super::keys::{public_from_scalar, CryptoError, Hash, KeyImage, PublicKey, SecretKey, Signature};
use crate::config::HASH_SIZE;

const RING_NONCE_CONTEXT: &str = "cryptonote-protocol ring signature nonces v1";

/// Deterministic nonce source backed by the BLAKE3 extendable output.
struct HashRng(blake3::OutputReader);

impl HashRng {
    fn new(hasher: blake3::Hasher) -> Self {
        HashRng(hasher.finalize_xof())
    }
}

impl RngCore for HashRng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for HashRng {}

fn ring_error(reason: impl Into<String>) -> CryptoError {
    CryptoError::InvalidRing {
        reason: reason.into(),
    }
}

fn decompress_ring(ring: &[PublicKey]) -> Result<Vec<RistrettoPoint>, CryptoError> {
    ring.iter().map(PublicKey::to_point).collect()
}

/// Transcript of the challenge hash: prefix hash followed by every `(L, R)`.
fn challenge_buffer(prefix_hash: &Hash, ring_len: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HASH_SIZE + ring_len * 2 * HASH_SIZE);
    buf.extend_from_slice(prefix_hash.as_bytes());
    buf
}

fn push_pair(buf: &mut Vec<u8>, l: &RistrettoPoint, r: &RistrettoPoint) {
    buf.extend_from_slice(l.compress().as_bytes());
    buf.extend_from_slice(r.compress().as_bytes());
}

/// Signs `prefix_hash` on behalf of `ring[real_index]`.
///
/// `secret` must be the secret key of that member and `image` its key
/// image. Returns one signature element per ring member, in ring order.
pub fn generate_ring_signature(
    prefix_hash: &Hash,
    image: &KeyImage,
    ring: &[PublicKey],
    secret: &SecretKey,
    real_index: usize,
) -> Result<Vec<Signature>, CryptoError> {
    if ring.is_empty() {
        return Err(ring_error("empty ring"));
    }
    if real_index >= ring.len() {
        return Err(ring_error(format!(
            "real index {} outside ring of {}",
            real_index,
            ring.len()
        )));
    }

    let x = secret.to_scalar()?;
    if public_from_scalar(&x) != ring[real_index] {
        return Err(ring_error("secret key does not match the real ring member"));
    }
    let image_point = image.to_point()?;
    let points = decompress_ring(ring)?;

    let mut seed = blake3::Hasher::new_derive_key(RING_NONCE_CONTEXT);
    seed.update(secret.as_bytes());
    seed.update(prefix_hash.as_bytes());
    seed.update(image.as_bytes());
    for key in ring {
        seed.update(key.as_bytes());
    }
    let mut rng = HashRng::new(seed);

    let mut buf = challenge_buffer(prefix_hash, ring.len());
    let mut pairs: Vec<(Scalar, Scalar)> = Vec::with_capacity(ring.len());
    let mut k = Scalar::ZERO;
    let mut sum = Scalar::ZERO;

    for (i, (key, point)) in ring.iter().zip(&points).enumerate() {
        let hp = hash_to_point(key);
        if i == real_index {
            k = Scalar::random(&mut rng);
            push_pair(&mut buf, &RistrettoPoint::mul_base(&k), &(hp * k));
            pairs.push((Scalar::ZERO, Scalar::ZERO));
        } else {
            let c = Scalar::random(&mut rng);
            let r = Scalar::random(&mut rng);
            let l = RistrettoPoint::mul_base(&r) + point * c;
            let rr = hp * r + image_point * c;
            push_pair(&mut buf, &l, &rr);
            sum += c;
            pairs.push((c, r));
        }
    }

    let challenge = hash_to_scalar(&buf);
    let c_real = challenge - sum;
    pairs[real_index] = (c_real, k - c_real * x);

    Ok(pairs
        .into_iter()
        .map(|(c, r)| Signature {
            c: c.to_bytes(),
            r: r.to_bytes(),
        })
        .collect())
}

/// Verifies a ring signature produced by [`generate_ring_signature`].
///
/// Any malformed component (non-canonical scalar, undecodable key or image,
/// length mismatch) makes the signature invalid rather than an error.
pub fn check_ring_signature(
    prefix_hash: &Hash,
    image: &KeyImage,
    ring: &[PublicKey],
    signatures: &[Signature],
) -> bool {
    if ring.is_empty() || ring.len() != signatures.len() {
        return false;
    }
    let Ok(image_point) = image.to_point() else {
        return false;
    };
    let Ok(points) = decompress_ring(ring) else {
        return false;
    };

    let mut buf = challenge_buffer(prefix_hash, ring.len());
    let mut sum = Scalar::ZERO;
    for ((key, point), sig) in ring.iter().zip(&points).zip(signatures) {
        let c = Option::<Scalar>::from(Scalar::from_canonical_bytes(sig.c));
        let r = Option::<Scalar>::from(Scalar::from_canonical_bytes(sig.r));
        let (Some(c), Some(r)) = (c, r) else {
            return false;
        };
        let l = RistrettoPoint::mul_base(&r) + point * c;
        let rr = hash_to_point(key) * r + image_point * c;
        push_pair(&mut buf, &l, &rr);
        sum += c;
    }

    hash_to_scalar(&buf) == sum
}
