//! Block identity and proof-of-work inputs.
//!
//! ```text
//! hashing blob = header ‖ tree_root ‖ varint(transaction_hashes.len() + 1)
//! block hash   = H(hashing blob)                                 v1
//!              = H(hashing blob ‖ parent(hashing, full))         v2+
//! PoW input    = hashing blob                                    v1
//!              = parent(hashing, header only)                    v2+
//! ```

use tracing::debug;

use super::serialization::{parent_block_blob, write_header};
use super::types::Block;
use super::HashingError;
use crate::config::{
    BLOCK_MAJOR_VERSION_1, POW_LIGHT_FROM_MAJOR, POW_VARIANT_1_FROM_MAJOR,
    POW_VARIANT_2_FROM_MAJOR,
};
use crate::crypto::hash::{fast_hash, tree_hash, PowVariant, SlowHash};
use crate::crypto::keys::Hash;
use crate::encoding::BinaryWriter;

/// Merkle root over the base transaction id followed by the body ids.
pub fn tree_hash_for_block(block: &Block) -> Hash {
    let mut ids = Vec::with_capacity(block.transaction_hashes.len() + 1);
    ids.push(block.base_transaction.hash());
    ids.extend_from_slice(&block.transaction_hashes);
    tree_hash(&ids)
}

pub fn hashing_blob(block: &Block) -> Result<Vec<u8>, HashingError> {
    let mut w = BinaryWriter::with_capacity(128);
    write_header(&mut w, &block.header)?;
    w.bytes(tree_hash_for_block(block).as_bytes())
        .varint(block.transaction_hashes.len() as u64 + 1);
    Ok(w.into_bytes())
}

/// The block id.
pub fn block_hash(block: &Block) -> Result<Hash, HashingError> {
    let mut blob = hashing_blob(block)?;
    if block.header.major_version > BLOCK_MAJOR_VERSION_1 {
        blob.extend_from_slice(&parent_block_blob(block, true, false)?);
    }
    Ok(fast_hash(&blob))
}

/// Hash a merge-mining parent commits to: the hashing blob without the
/// parent section.
pub fn aux_block_header_hash(block: &Block) -> Result<Hash, HashingError> {
    Ok(fast_hash(&hashing_blob(block)?))
}

/// Slow-hash variant and light flag for a block major version.
pub fn pow_params(major_version: u8) -> (PowVariant, bool) {
    let variant = if major_version < POW_VARIANT_1_FROM_MAJOR {
        PowVariant::Original
    } else if major_version >= POW_VARIANT_2_FROM_MAJOR {
        PowVariant::V2
    } else {
        PowVariant::V1
    };
    (variant, major_version >= POW_LIGHT_FROM_MAJOR)
}

/// Proof-of-work hash of `block`, compared against the difficulty target.
pub fn long_hash<S: SlowHash + ?Sized>(slow_hash: &S, block: &Block) -> Result<Hash, HashingError> {
    let blob = if block.header.major_version == BLOCK_MAJOR_VERSION_1 {
        hashing_blob(block)?
    } else if block.header.major_version > BLOCK_MAJOR_VERSION_1 {
        parent_block_blob(block, true, true)?
    } else {
        return Err(HashingError::UnsupportedMajorVersion {
            version: block.header.major_version,
        });
    };

    let (variant, light) = pow_params(block.header.major_version);
    debug!(
        major_version = block.header.major_version,
        ?variant,
        light,
        "computing proof-of-work hash"
    );
    Ok(slow_hash.slow_hash(&blob, variant, light))
}
