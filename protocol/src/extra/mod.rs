//! # Transaction Extra
//!
//! Every transaction carries a free-form `extra` blob. In practice it is a
//! sequence of tagged records: the transaction public key, a nonce (usually
//! a payment id), the merge-mining tag of a parent chain, encrypted
//! messages, a mempool time-to-live, and commitment records.
//!
//! - [`field`] — the record types and the tagged binary codec.
//! - [`message`] — per-recipient message encryption.
//! - [`payment_id`] — payment ids carried inside a nonce.
//! - [`commitment`] — heat and yield commitment records.
//!
//! Parsing is strict: an unknown tag or a malformed record fails the whole
//! blob. Callers that only want an optional value (the transaction public
//! key, the list of readable messages) use the tolerant lookups, which log
//! and carry on.

pub mod commitment;
pub mod field;
pub mod message;
pub mod payment_id;

use thiserror::Error;

use crate::crypto::keys::CryptoError;
use crate::encoding::DecodeError;

pub use commitment::{
    add_heat_commitment, add_yield_commitment, create_extra_with_heat_commitment,
    create_extra_with_yield_commitment, heat_commitment_from_extra, yield_commitment_from_extra,
    HeatCommitment, YieldCommitment,
};
pub use field::{
    add_extra_nonce_to_extra, add_transaction_public_key_to_extra, add_ttl_to_extra,
    append_extra_field, append_merge_mining_tag, find_field, merge_mining_tag_from_extra,
    parse_extra, transaction_public_key_from_extra, ttl_from_extra, write_extra, ExtraField,
    ExtraFieldKind, ExtraNonce, ExtraPadding, ExtraPublicKey, ExtraTtl, MergeMiningTag,
};
pub use message::{messages_from_extra, ExtraMessage};
pub use payment_id::{
    create_extra_with_payment_id, parse_payment_id, payment_id_from_extra,
    payment_id_from_nonce, payment_id_to_nonce,
};

/// Everything that can go wrong reading or writing an extra blob.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtraError {
    #[error("malformed extra: {0}")]
    Decode(#[from] DecodeError),

    #[error("non-zero byte inside padding at offset {offset}")]
    NonZeroPadding { offset: usize },

    #[error("padding of {size} byte(s) outside 1..=255")]
    InvalidPaddingSize { size: usize },

    #[error("padding must be the last extra record")]
    PaddingNotLast,

    #[error("nonce of {size} byte(s) exceeds the 255-byte limit")]
    NonceTooLong { size: usize },

    #[error("{field} of {size} byte(s) exceeds the 255-byte limit")]
    FieldTooLong { field: &'static str, size: usize },

    #[error("unknown extra tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("ttl declares {declared} byte(s) but its varint takes {actual}")]
    TtlSizeMismatch { declared: u64, actual: usize },

    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("no {field} field in extra")]
    FieldNotFound { field: &'static str },

    #[error("invalid payment id: {reason}")]
    InvalidPaymentId { reason: String },

    #[error("message of {size} byte(s) is shorter than its checksum")]
    MessageTooShort { size: usize },

    #[error("message checksum mismatch")]
    ChecksumMismatch,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
