//! # Protocol Configuration & Constants
//!
//! Every consensus-relevant number used by the transaction and block layers
//! lives here. These values are part of the wire format: renumbering a tag
//! or shifting a fork threshold produces transactions and blocks that the
//! rest of the network rejects.

// ---------------------------------------------------------------------------
// Transaction Versions
// ---------------------------------------------------------------------------

/// Original transaction format: key inputs and key outputs only.
pub const TRANSACTION_VERSION_1: u8 = 1;

/// Adds multisignature inputs and outputs.
pub const TRANSACTION_VERSION_2: u8 = 2;

// ---------------------------------------------------------------------------
// Block Versions
// ---------------------------------------------------------------------------

/// Standalone blocks; the hashing blob is also the PoW input.
pub const BLOCK_MAJOR_VERSION_1: u8 = 1;

/// Merge-mined blocks carrying a parent block.
pub const BLOCK_MAJOR_VERSION_2: u8 = 2;

/// First major version hashed with PoW variant 2.
pub const BLOCK_MAJOR_VERSION_6: u8 = 6;

/// First major version hashed in light mode.
pub const BLOCK_MAJOR_VERSION_9: u8 = 9;

/// First major version hashed with PoW variant 1.
pub const POW_VARIANT_1_FROM_MAJOR: u8 = 5;

/// First major version hashed with PoW variant 2.
pub const POW_VARIANT_2_FROM_MAJOR: u8 = BLOCK_MAJOR_VERSION_6;

/// First major version hashed in light mode.
pub const POW_LIGHT_FROM_MAJOR: u8 = BLOCK_MAJOR_VERSION_9;

// ---------------------------------------------------------------------------
// Transaction Extra
// ---------------------------------------------------------------------------

/// Longest run of zero bytes (tag included) accepted as padding.
pub const TX_EXTRA_PADDING_MAX_COUNT: usize = 255;

/// Longest nonce payload; the length travels in a single byte.
pub const TX_EXTRA_NONCE_MAX_COUNT: usize = 255;

pub const TX_EXTRA_TAG_PADDING: u8 = 0x00;
pub const TX_EXTRA_TAG_PUBKEY: u8 = 0x01;
pub const TX_EXTRA_NONCE: u8 = 0x02;
pub const TX_EXTRA_MERGE_MINING_TAG: u8 = 0x03;
pub const TX_EXTRA_MESSAGE_TAG: u8 = 0x04;
pub const TX_EXTRA_TTL: u8 = 0x05;
pub const TX_EXTRA_YIELD_COMMITMENT: u8 = 0x07;
pub const TX_EXTRA_HEAT_COMMITMENT: u8 = 0x08;

/// Sub-tag inside a nonce marking a 32-byte payment id.
pub const TX_EXTRA_NONCE_PAYMENT_ID: u8 = 0x00;

/// Zero bytes appended to every message before encryption.
pub const TX_EXTRA_MESSAGE_CHECKSUM_SIZE: usize = 4;

/// Upper bound on a merge-mining tag depth: one branch hash per bit of a hash.
pub const MAX_MERGE_MINING_DEPTH: u64 = 8 * 32;

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

/// Output length of the fast hash and size of every key on the wire.
pub const HASH_SIZE: usize = 32;

/// A ring signature element is a `(c, r)` scalar pair.
pub const SIGNATURE_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// Denominations
// ---------------------------------------------------------------------------

/// Number of canonical ("pretty") denominations.
pub const PRETTY_AMOUNTS_COUNT: usize = 9 * 19 + 1;

/// Canonical output denominations in ascending order:
/// `d * 10^e` for `d` in `1..=9` and `e` in `0..=18`, followed by `10^19`.
pub const PRETTY_AMOUNTS: [u64; PRETTY_AMOUNTS_COUNT] = build_pretty_amounts();

const fn build_pretty_amounts() -> [u64; PRETTY_AMOUNTS_COUNT] {
    let mut table = [0u64; PRETTY_AMOUNTS_COUNT];
    let mut position = 0;
    let mut power: u64 = 1;
    let mut exponent = 0;
    while exponent < 19 {
        let mut digit = 1;
        while digit <= 9 {
            table[position] = digit * power;
            position += 1;
            digit += 1;
        }
        power *= 10;
        exponent += 1;
    }
    // 10^19 still fits in a u64 (max is ~1.8 * 10^19).
    table[position] = power;
    table
}
