//! # Block Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  BlockHeader                                 │
//! │  ├── major_version, minor_version            │
//! │  ├── nonce: u32                              │
//! │  ├── timestamp: u64                          │
//! │  └── previous_block_hash                     │
//! ├──────────────────────────────────────────────┤
//! │  ParentBlock        (major version ≥ 2 only) │
//! ├──────────────────────────────────────────────┤
//! │  base_transaction   (coinbase)               │
//! │  transaction_hashes: Vec<Hash>               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Body transactions are referenced by id only. The block's merkle root is
//! taken over the base transaction's id followed by those ids.

use serde::{Deserialize, Serialize};

use crate::crypto::keys::Hash;
use crate::transaction::{Transaction, TransactionInput, TransactionPrefix};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub major_version: u8,
    pub minor_version: u8,
    pub nonce: u32,
    /// UNIX time in seconds.
    pub timestamp: u64,
    pub previous_block_hash: Hash,
}

/// The block of another chain that merge-mines this one.
///
/// Only the parts needed to prove that the parent committed to this
/// block are kept: the parent's coinbase, its merkle branch to the parent
/// root, and the branch from this chain's aux header hash to the root
/// stored in the coinbase's merge-mining tag. The parent's timestamp and
/// nonce are shared with the child header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentBlock {
    pub major_version: u8,
    pub minor_version: u8,
    pub previous_block_hash: Hash,
    /// Number of transactions in the parent block, coinbase included.
    pub transaction_count: u16,
    /// Leftmost branch of the parent's transaction tree.
    pub base_transaction_branch: Vec<Hash>,
    pub base_transaction: TransactionPrefix,
    /// Branch from this chain to the merge-mining root.
    pub blockchain_branch: Vec<Hash>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    /// Ignored for major version 1.
    pub parent_block: ParentBlock,
    pub base_transaction: Transaction,
    pub transaction_hashes: Vec<Hash>,
}

impl Block {
    /// Height claimed by the coinbase: the index of its base input when that
    /// is the only input, otherwise 0.
    pub fn height(&self) -> u32 {
        match self.base_transaction.prefix.inputs.as_slice() {
            [TransactionInput::Base(base)] => base.block_index,
            _ => 0,
        }
    }
}

/// Free-function form of [`Block::height`].
pub fn block_height(block: &Block) -> u32 {
    block.height()
}
