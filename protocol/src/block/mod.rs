//! # Block Module
//!
//! Block value types, their binary form and the hashes consensus derives
//! from them: the transaction merkle root, the block id and the
//! proof-of-work input.
//!
//! ## Architecture
//!
//! ```text
//! types.rs         — Block, BlockHeader, ParentBlock
//! serialization.rs — Header, parent-block (merge-mining) and block encoding
//! hashing.rs       — Merkle root, hashing blob, block id, PoW hash
//! ```
//!
//! The slow PoW function itself is not implemented here; callers pass a
//! [`SlowHash`](crate::crypto::hash::SlowHash) and this module picks the
//! variant and input bytes.

pub mod hashing;
pub mod serialization;
pub mod types;

use thiserror::Error;

use crate::encoding::DecodeError;
use crate::extra::ExtraError;

pub use hashing::{
    aux_block_header_hash, block_hash, hashing_blob, long_hash, pow_params, tree_hash_for_block,
};
pub use serialization::parent_block_blob;
pub use types::{block_height, Block, BlockHeader, ParentBlock};

/// Why a block could not be serialized or hashed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashingError {
    #[error("unsupported block major version {version}")]
    UnsupportedMajorVersion { version: u8 },

    #[error("parent block has zero transactions")]
    ZeroTransactionCount,

    #[error("parent block transaction count {count} does not fit 16 bits")]
    TransactionCountOverflow { count: u64 },

    #[error("{branch} branch has {actual} hashes, expected {expected}")]
    BranchLengthMismatch {
        branch: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("parent base transaction has no usable merge-mining tag: {0}")]
    MissingMergeMiningTag(#[from] ExtraError),

    #[error("merge-mining depth {depth} too large")]
    MergeMiningDepthTooLarge { depth: u64 },

    #[error("malformed block: {0}")]
    Decode(#[from] DecodeError),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::crypto::hash::{fast_hash, hash_to_scalar};
    use crate::crypto::keys::{KeyPair, SecretKey};
    use crate::extra::{add_transaction_public_key_to_extra, append_merge_mining_tag, MergeMiningTag};
    use crate::transaction::{
        BaseInput, KeyOutput, Transaction, TransactionInput, TransactionOutput,
        TransactionOutputTarget, TransactionPrefix,
    };

    fn fixed_key(seed: &[u8]) -> KeyPair {
        KeyPair::from_secret(SecretKey::from_scalar(&hash_to_scalar(seed))).unwrap()
    }

    pub(crate) fn coinbase(height: u32) -> Transaction {
        let mut extra = Vec::new();
        add_transaction_public_key_to_extra(&mut extra, &fixed_key(b"coinbase tx key").public_key);
        Transaction {
            prefix: TransactionPrefix {
                version: 1,
                unlock_time: u64::from(height) + 10,
                inputs: vec![TransactionInput::Base(BaseInput {
                    block_index: height,
                })],
                outputs: vec![TransactionOutput {
                    amount: 1_000,
                    target: TransactionOutputTarget::Key(KeyOutput {
                        key: fixed_key(b"miner output").public_key,
                    }),
                }],
                extra,
            },
            signatures: vec![vec![]],
        }
    }

    pub(crate) fn standalone_block(nonce: u32) -> Block {
        Block {
            header: BlockHeader {
                major_version: 1,
                minor_version: 0,
                nonce,
                timestamp: 1_500_000,
                previous_block_hash: fast_hash(b"previous block"),
            },
            parent_block: ParentBlock::default(),
            base_transaction: coinbase(10),
            transaction_hashes: vec![],
        }
    }

    pub(crate) fn merge_mined_block(nonce: u32) -> Block {
        let mut parent_coinbase = coinbase(500).prefix;
        append_merge_mining_tag(
            &mut parent_coinbase.extra,
            &MergeMiningTag {
                depth: 2,
                merkle_root: fast_hash(b"aux root"),
            },
        );

        Block {
            header: BlockHeader {
                major_version: 2,
                minor_version: 0,
                nonce,
                timestamp: 1_500_000,
                previous_block_hash: fast_hash(b"previous block"),
            },
            parent_block: ParentBlock {
                major_version: 1,
                minor_version: 0,
                previous_block_hash: fast_hash(b"parent previous"),
                transaction_count: 5,
                base_transaction_branch: vec![fast_hash(b"b0"), fast_hash(b"b1")],
                base_transaction: parent_coinbase,
                blockchain_branch: vec![fast_hash(b"c0"), fast_hash(b"c1")],
            },
            base_transaction: coinbase(11),
            transaction_hashes: vec![fast_hash(b"tx")],
        }
    }

    #[test]
    fn height_comes_from_sole_base_input() {
        let block = standalone_block(0);
        assert_eq!(block_height(&block), 10);

        let mut two_inputs = block.clone();
        two_inputs
            .base_transaction
            .prefix
            .inputs
            .push(TransactionInput::Base(BaseInput { block_index: 3 }));
        assert_eq!(two_inputs.height(), 0);

        let mut no_inputs = block;
        no_inputs.base_transaction.prefix.inputs.clear();
        assert_eq!(no_inputs.height(), 0);
    }

    #[test]
    fn serde_json_roundtrip() {
        let block = merge_mined_block(3);
        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }
}
