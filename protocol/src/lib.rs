// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # CryptoNote Protocol — Core Library
//!
//! The transaction-construction and metadata layer of a CryptoNote-family
//! node: one-time stealth outputs, key images, ring-signed transactions,
//! the tagged "extra" blob every transaction carries, and the hashes that
//! give blocks their identity and proof of work.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants: extra tags, versions, PoW thresholds.
//! - **crypto** — Ristretto keys, derivations, ring signatures, Keccak,
//!   merkle trees and the ChaCha8 message cipher.
//! - **encoding** — Varint binary reader/writer behind every wire format.
//! - **account** — Spend/view key pairs and public addresses.
//! - **extra** — Extra-field codec, encrypted messages, payment ids,
//!   commitments.
//! - **transaction** — Value types, binary form, output scanning, the
//!   transaction builder and stateless validation.
//! - **block** — Block types, merge-mining parent serialization, block id
//!   and PoW hash inputs.
//!
//! ## Design Philosophy
//!
//! 1. Byte-exact: everything that reaches the wire or a hash is encoded by
//!    hand, field by field.
//! 2. Deterministic: the same spend request always yields the same bytes.
//! 3. No panics on untrusted input. Bad keys, truncated blobs and
//!    overflowing amounts are errors.
//! 4. No I/O and no shared state; every call is safe to run in parallel.

pub mod account;
pub mod block;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod extra;
pub mod transaction;
