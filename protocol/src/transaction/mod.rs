//! # Transaction Module
//!
//! Data model, wire format, construction and stateless validation of
//! CryptoNote transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs      — Inputs, outputs, prefix and signed transaction
//! codec.rs      — Binary encoding, transaction and prefix hashes
//! stealth.rs    — Recognising outputs addressed to an account
//! key_image.rs  — One-time key pair and key image of an owned output
//! builder.rs    — Fluent TransactionBuilder: inputs, outputs, extra, ring signatures
//! validation.rs — Structural consensus checks that need no chain state
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: [`TransactionBuilder`] produces a signed [`Transaction`] and
//!    the transaction secret key.
//! 2. **Encode**: [`Transaction::to_bytes`] gives the wire form; its fast
//!    hash is the transaction id.
//! 3. **Validate**: nodes run the checks in [`validation`] before looking at
//!    chain state.
//! 4. **Scan**: recipients find their outputs with [`lookup_acc_outs`].
//!
//! ## Design Decisions
//!
//! - All amounts are `u64` atomic units. Sums on untrusted data use checked
//!   arithmetic.
//! - Construction is deterministic. The transaction key is derived from the
//!   sender's view key and the inputs, and ring signature nonces from the
//!   signing key and message.
//! - Rings are signed in the order the caller supplies; global output
//!   indexes are stored relative, in that same order.

pub mod builder;
pub mod codec;
pub mod key_image;
pub mod stealth;
pub mod types;
pub mod validation;

pub use builder::{
    deterministic_transaction_keys, deterministic_transaction_keys_for,
    key_input_absolute_indexes, verify_transaction_signatures, BuildError, GlobalOutput,
    MessageEntry, TransactionBuilder, TransactionDestinationEntry, TransactionSourceEntry,
};
pub use codec::{inputs_hash, parse_transaction, short_hash_str};
pub use key_image::generate_key_image_helper;
pub use stealth::{
    derive_one_time_key, is_out_to_acc, is_out_to_acc_with_derivation, lookup_acc_outs,
    lookup_acc_outs_with_key, ScanError,
};
pub use types::{
    absolute_to_relative, relative_to_absolute, BaseInput, KeyInput, KeyOutput,
    MultisignatureInput, MultisignatureOutput, Transaction, TransactionInput, TransactionOutput,
    TransactionOutputTarget, TransactionPrefix,
};
pub use validation::{
    check_inputs_overflow, check_inputs_types_supported, check_money_overflow,
    check_multisignature_inputs_diff, check_outs_overflow, check_outs_valid,
    is_valid_decomposed_amount, ValidationError,
};
