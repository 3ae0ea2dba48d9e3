//! # Hashing Utilities
//!
//! - **Fast hash** — Keccak-256 (the original, pre-NIST padding). Used for
//!   transaction ids, prefix hashes, merkle nodes, block ids and as the
//!   input of hash-to-scalar.
//! - **Hash-to-scalar** — fast hash reduced modulo the group order.
//! - **Hash-to-point** — maps a public key onto a group element with no
//!   known discrete log; the base of every key image.
//! - **Tree hash** — the CryptoNote merkle tree over transaction ids.
//! - **Slow hash** — the memory-hard proof-of-work function. It is supplied
//!   by the embedding node through [`SlowHash`]; this crate only chooses
//!   its parameters.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use tiny_keccak::{Hasher, Keccak};

use super::keys::{Hash, PublicKey, NULL_HASH};
use crate::config::HASH_SIZE;

/// Keccak-256 of `data`.
///
/// # Example
///
/// ```
/// use cryptonote_protocol::crypto::hash::fast_hash;
///
/// let id = fast_hash(b"");
/// assert_eq!(
///     id.to_hex(),
///     "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
/// );
/// ```
pub fn fast_hash(data: &[u8]) -> Hash {
    fast_hash_multi(&[data])
}

/// Keccak-256 over the concatenation of `parts`, without building the
/// concatenation.
pub fn fast_hash_multi(parts: &[&[u8]]) -> Hash {
    let mut keccak = Keccak::v256();
    for part in parts {
        keccak.update(part);
    }
    let mut out = [0u8; HASH_SIZE];
    keccak.finalize(&mut out);
    Hash(out)
}

/// Fast hash reduced modulo the group order.
pub fn hash_to_scalar(data: &[u8]) -> Scalar {
    Scalar::from_bytes_mod_order(fast_hash(data).0)
}

/// Maps a public key to a point whose discrete log nobody knows.
pub(crate) fn hash_to_point(key: &PublicKey) -> RistrettoPoint {
    RistrettoPoint::hash_from_bytes::<Sha512>(key.as_bytes())
}

// ---------------------------------------------------------------------------
// Proof of Work
// ---------------------------------------------------------------------------

/// Slow-hash algorithm revision selected by block major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowVariant {
    /// Original memory-hard function.
    Original = 0,
    /// First tweak (anti-ASIC).
    V1 = 1,
    /// Second tweak.
    V2 = 2,
}

/// The memory-hard proof-of-work function.
///
/// Implementations must be deterministic: consensus compares the output
/// byte for byte. The call may take milliseconds to seconds; callers that
/// need cancellation run it on a worker they can abandon.
pub trait SlowHash {
    fn slow_hash(&self, data: &[u8], variant: PowVariant, light: bool) -> Hash;
}

impl<F> SlowHash for F
where
    F: Fn(&[u8], PowVariant, bool) -> Hash,
{
    fn slow_hash(&self, data: &[u8], variant: PowVariant, light: bool) -> Hash {
        self(data, variant, light)
    }
}

// ---------------------------------------------------------------------------
// Merkle tree
// ---------------------------------------------------------------------------

fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    fast_hash_multi(&[&left.0[..], &right.0[..]])
}

/// Merkle root over `hashes` using the CryptoNote tree layout.
///
/// Unlike a Bitcoin-style tree nothing is duplicated. With `n` leaves and
/// `cnt` the largest power of two strictly below `n`, the first
/// `2·cnt − n` leaves are carried up unchanged and the remaining leaves are
/// paired, giving exactly `cnt` nodes; those are then halved until two
/// remain.
///
/// - `[]` → [`NULL_HASH`]
/// - `[a]` → `a`
/// - `[a, b]` → `H(a ‖ b)`
pub fn tree_hash(hashes: &[Hash]) -> Hash {
    match hashes.len() {
        0 => NULL_HASH,
        1 => hashes[0],
        2 => hash_pair(&hashes[0], &hashes[1]),
        count => {
            let cnt = 1usize << (usize::BITS - 1 - (count - 1).leading_zeros());
            let carried = 2 * cnt - count;

            let mut level: Vec<Hash> = Vec::with_capacity(cnt);
            level.extend_from_slice(&hashes[..carried]);
            for pair in hashes[carried..].chunks(2) {
                level.push(hash_pair(&pair[0], &pair[1]));
            }

            while level.len() > 2 {
                level = level
                    .chunks(2)
                    .map(|pair| hash_pair(&pair[0], &pair[1]))
                    .collect();
            }
            hash_pair(&level[0], &level[1])
        }
    }
}

/// `floor(log2(count))`: the length of the branch proving the first leaf of
/// a tree with `count` leaves. Zero for `count <= 1`.
pub fn tree_depth(count: usize) -> usize {
    if count <= 1 {
        return 0;
    }
    (usize::BITS - 1 - count.leading_zeros()) as usize
}

/// Recomputes a merkle root from a leaf and its authentication branch.
///
/// `branch[0]` is the sibling nearest the root and the last entry the
/// sibling of the leaf itself. `path` selects the
/// side at each level: bit `d` of `path` (little-endian bit order) set means
/// the running hash is the right child at depth `d`. `None` is the leftmost
/// path, which is what the base-transaction branch of a parent block uses.
pub fn tree_hash_from_branch(branch: &[Hash], leaf: &Hash, path: Option<&[u8]>) -> Hash {
    if branch.is_empty() {
        return *leaf;
    }

    let mut running = *leaf;
    for depth in (0..branch.len()).rev() {
        let goes_right = path
            .and_then(|p| p.get(depth >> 3))
            .map(|byte| byte & (1 << (depth & 7)) != 0)
            .unwrap_or(false);
        running = if goes_right {
            hash_pair(&branch[depth], &running)
        } else {
            hash_pair(&running, &branch[depth])
        };
    }
    running
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: u8) -> Vec<Hash> {
        (0..n).map(|i| fast_hash(&[i])).collect()
    }

    #[test]
    fn keccak_known_vector() {
        // Keccak-256("abc"), original padding.
        assert_eq!(
            fast_hash(b"abc").to_hex(),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn fast_hash_multi_matches_concatenation() {
        assert_eq!(
            fast_hash_multi(&[&b"hello"[..], &b" world"[..]]),
            fast_hash(b"hello world")
        );
    }

    #[test]
    fn hash_to_scalar_deterministic() {
        assert_eq!(hash_to_scalar(b"data"), hash_to_scalar(b"data"));
        assert_ne!(hash_to_scalar(b"data"), hash_to_scalar(b"Data"));
    }

    #[test]
    fn tree_hash_small_cases() {
        assert_eq!(tree_hash(&[]), NULL_HASH);
        let l = leaves(2);
        assert_eq!(tree_hash(&l[..1]), l[0]);
        assert_eq!(tree_hash(&l), hash_pair(&l[0], &l[1]));
    }

    #[test]
    fn tree_hash_three_leaves() {
        let l = leaves(3);
        // First leaf carried, last two paired.
        let expected = hash_pair(&l[0], &hash_pair(&l[1], &l[2]));
        assert_eq!(tree_hash(&l), expected);
    }

    #[test]
    fn tree_hash_four_leaves_is_balanced() {
        let l = leaves(4);
        let expected = hash_pair(&hash_pair(&l[0], &l[1]), &hash_pair(&l[2], &l[3]));
        assert_eq!(tree_hash(&l), expected);
    }

    #[test]
    fn tree_hash_five_leaves() {
        let l = leaves(5);
        // cnt = 4, carried = 3, then pair (3,4).
        let level = [l[0], l[1], l[2], hash_pair(&l[3], &l[4])];
        let expected = hash_pair(
            &hash_pair(&level[0], &level[1]),
            &hash_pair(&level[2], &level[3]),
        );
        assert_eq!(tree_hash(&l), expected);
    }

    #[test]
    fn tree_hash_order_matters() {
        let mut l = leaves(6);
        let a = tree_hash(&l);
        l.swap(0, 5);
        assert_ne!(a, tree_hash(&l));
    }

    #[test]
    fn tree_depth_values() {
        assert_eq!(tree_depth(1), 0);
        assert_eq!(tree_depth(2), 1);
        assert_eq!(tree_depth(3), 1);
        assert_eq!(tree_depth(4), 2);
        assert_eq!(tree_depth(9), 3);
    }

    #[test]
    fn branch_reproduces_root_for_first_leaf() {
        let l = leaves(4);
        let branch = vec![hash_pair(&l[2], &l[3]), l[1]];
        assert_eq!(tree_hash_from_branch(&branch, &l[0], None), tree_hash(&l));
    }

    #[test]
    fn branch_honours_path_bits() {
        let l = leaves(2);
        // Leaf 1 is a right child at depth 0.
        let root = tree_hash_from_branch(&[l[0]], &l[1], Some(&[0b1]));
        assert_eq!(root, tree_hash(&l));
    }

    #[test]
    fn empty_branch_is_leaf() {
        let l = leaves(1);
        assert_eq!(tree_hash_from_branch(&[], &l[0], None), l[0]);
    }

    #[test]
    fn closures_are_slow_hashers() {
        let hasher = |data: &[u8], variant: PowVariant, light: bool| {
            let mut buf = data.to_vec();
            buf.push(variant as u8);
            buf.push(light as u8);
            fast_hash(&buf)
        };
        assert_ne!(
            hasher.slow_hash(b"x", PowVariant::Original, false),
            hasher.slow_hash(b"x", PowVariant::V1, false)
        );
    }
}
