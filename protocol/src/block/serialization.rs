//! Binary form of blocks, including the parent-block (merge-mining) wrapper.
//!
//! ```text
//! header v1  = varint major, varint minor, varint timestamp, prev[32], nonce u32le
//! header v2+ = varint major, varint minor, prev[32]
//!
//! parent     = varint parent.major, varint parent.minor,
//!              varint timestamp, parent.prev[32], nonce u32le,
//!              [merkle_root[32]]                       (hashing form only)
//!              varint transaction_count,
//!              base_branch[32 × tree_depth(count)],    ┐
//!              parent base transaction prefix,         ├ omitted when header-only
//!              blockchain_branch[32 × mm_tag.depth]    ┘
//!
//! block      = header, [parent (v2+)], base transaction,
//!              varint n, transaction_hash[32]*
//! ```
//!
//! The child's timestamp and nonce live in the parent section for v2+
//! blocks, which is why the parent serializer takes the whole block.

use super::types::{Block, BlockHeader, ParentBlock};
use super::HashingError;
use crate::config::{BLOCK_MAJOR_VERSION_1, MAX_MERGE_MINING_DEPTH};
use crate::crypto::hash::{tree_depth, tree_hash_from_branch};
use crate::crypto::keys::Hash;
use crate::encoding::{BinaryReader, BinaryWriter};
use crate::extra::merge_mining_tag_from_extra;
use crate::transaction::{Transaction, TransactionPrefix};

fn write_hashes(w: &mut BinaryWriter, hashes: &[Hash]) {
    for hash in hashes {
        w.bytes(hash.as_bytes());
    }
}

fn read_hashes(reader: &mut BinaryReader<'_>, count: usize) -> Result<Vec<Hash>, HashingError> {
    let mut hashes = Vec::with_capacity(count.min(reader.remaining() / 32));
    for _ in 0..count {
        hashes.push(Hash(reader.array()?));
    }
    Ok(hashes)
}

/// Depth of the merge-mining tag in a parent coinbase, bounds-checked.
fn blockchain_branch_depth(base_transaction: &TransactionPrefix) -> Result<usize, HashingError> {
    let tag = merge_mining_tag_from_extra(&base_transaction.extra)?;
    if tag.depth > MAX_MERGE_MINING_DEPTH {
        return Err(HashingError::MergeMiningDepthTooLarge { depth: tag.depth });
    }
    Ok(tag.depth as usize)
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

pub(crate) fn write_header(w: &mut BinaryWriter, header: &BlockHeader) -> Result<(), HashingError> {
    if header.major_version < BLOCK_MAJOR_VERSION_1 {
        return Err(HashingError::UnsupportedMajorVersion {
            version: header.major_version,
        });
    }
    w.varint(u64::from(header.major_version))
        .varint(u64::from(header.minor_version));
    if header.major_version == BLOCK_MAJOR_VERSION_1 {
        w.varint(header.timestamp)
            .bytes(header.previous_block_hash.as_bytes())
            .u32_le(header.nonce);
    } else {
        w.bytes(header.previous_block_hash.as_bytes());
    }
    Ok(())
}

fn read_header(reader: &mut BinaryReader<'_>) -> Result<BlockHeader, HashingError> {
    let major_version = reader.varint_u8()?;
    let minor_version = reader.varint_u8()?;
    if major_version < BLOCK_MAJOR_VERSION_1 {
        return Err(HashingError::UnsupportedMajorVersion {
            version: major_version,
        });
    }

    let mut header = BlockHeader {
        major_version,
        minor_version,
        ..BlockHeader::default()
    };
    if major_version == BLOCK_MAJOR_VERSION_1 {
        header.timestamp = reader.varint()?;
        header.previous_block_hash = Hash(reader.array()?);
        header.nonce = reader.u32_le()?;
    } else {
        header.previous_block_hash = Hash(reader.array()?);
    }
    Ok(header)
}

// ---------------------------------------------------------------------------
// Parent block
// ---------------------------------------------------------------------------

/// Writes the parent-block section of `block`.
///
/// `hashing` inserts the parent's merkle root (recomputed from the base
/// transaction and its branch); `header_only` stops after the transaction
/// count. The hashing, header-only form is the PoW input of merge-mined
/// blocks.
pub(crate) fn write_parent_block(
    w: &mut BinaryWriter,
    block: &Block,
    hashing: bool,
    header_only: bool,
) -> Result<(), HashingError> {
    let parent = &block.parent_block;
    w.varint(u64::from(parent.major_version))
        .varint(u64::from(parent.minor_version))
        .varint(block.header.timestamp)
        .bytes(parent.previous_block_hash.as_bytes())
        .u32_le(block.header.nonce);

    if hashing {
        let root = tree_hash_from_branch(
            &parent.base_transaction_branch,
            &parent.base_transaction.hash(),
            None,
        );
        w.bytes(root.as_bytes());
    }

    if parent.transaction_count < 1 {
        return Err(HashingError::ZeroTransactionCount);
    }
    w.varint(u64::from(parent.transaction_count));
    if header_only {
        return Ok(());
    }

    let expected = tree_depth(usize::from(parent.transaction_count));
    if parent.base_transaction_branch.len() != expected {
        return Err(HashingError::BranchLengthMismatch {
            branch: "base transaction",
            expected,
            actual: parent.base_transaction_branch.len(),
        });
    }
    write_hashes(w, &parent.base_transaction_branch);

    parent.base_transaction.encode(w);

    let depth = blockchain_branch_depth(&parent.base_transaction)?;
    if parent.blockchain_branch.len() != depth {
        return Err(HashingError::BranchLengthMismatch {
            branch: "blockchain",
            expected: depth,
            actual: parent.blockchain_branch.len(),
        });
    }
    write_hashes(w, &parent.blockchain_branch);
    Ok(())
}

/// Reads the full (non-hashing) parent section, moving the shared
/// timestamp and nonce into `header`.
fn read_parent_block(
    reader: &mut BinaryReader<'_>,
    header: &mut BlockHeader,
) -> Result<ParentBlock, HashingError> {
    let major_version = reader.varint_u8()?;
    let minor_version = reader.varint_u8()?;
    header.timestamp = reader.varint()?;
    let previous_block_hash = Hash(reader.array()?);
    header.nonce = reader.u32_le()?;

    let count = reader.varint()?;
    let transaction_count =
        u16::try_from(count).map_err(|_| HashingError::TransactionCountOverflow { count })?;
    if transaction_count < 1 {
        return Err(HashingError::ZeroTransactionCount);
    }

    let base_transaction_branch =
        read_hashes(reader, tree_depth(usize::from(transaction_count)))?;
    let base_transaction = TransactionPrefix::decode(reader)?;
    let depth = blockchain_branch_depth(&base_transaction)?;
    let blockchain_branch = read_hashes(reader, depth)?;

    Ok(ParentBlock {
        major_version,
        minor_version,
        previous_block_hash,
        transaction_count,
        base_transaction_branch,
        base_transaction,
        blockchain_branch,
    })
}

/// Parent-block section of `block` as a standalone blob.
pub fn parent_block_blob(
    block: &Block,
    hashing: bool,
    header_only: bool,
) -> Result<Vec<u8>, HashingError> {
    let mut w = BinaryWriter::with_capacity(256);
    write_parent_block(&mut w, block, hashing, header_only)?;
    Ok(w.into_bytes())
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

impl Block {
    pub fn encode(&self, w: &mut BinaryWriter) -> Result<(), HashingError> {
        write_header(w, &self.header)?;
        if self.header.major_version > BLOCK_MAJOR_VERSION_1 {
            write_parent_block(w, self, false, false)?;
        }
        self.base_transaction.encode(w);
        w.varint(self.transaction_hashes.len() as u64);
        write_hashes(w, &self.transaction_hashes);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, HashingError> {
        let mut w = BinaryWriter::with_capacity(512);
        self.encode(&mut w)?;
        Ok(w.into_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashingError> {
        let mut reader = BinaryReader::new(bytes);
        let mut header = read_header(&mut reader)?;
        let parent_block = if header.major_version > BLOCK_MAJOR_VERSION_1 {
            read_parent_block(&mut reader, &mut header)?
        } else {
            ParentBlock::default()
        };
        let base_transaction = Transaction::decode(&mut reader)?;
        let count = reader.length()?;
        let transaction_hashes = read_hashes(&mut reader, count)?;
        reader.finish()?;

        Ok(Self {
            header,
            parent_block,
            base_transaction,
            transaction_hashes,
        })
    }
}
