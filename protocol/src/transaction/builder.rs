//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] turns a spend request into a signed
//! transaction:
//!
//! 1. Every source becomes a key input. The spender's one-time key pair and
//!    key image are recovered and checked against the ring member they are
//!    supposed to match.
//! 2. The transaction key pair is derived from the view secret and the
//!    input list, so rebuilding the same spend yields the same key.
//! 3. Destinations are sorted by amount and each gets a one-time output key.
//! 4. Messages and the TTL go into extra.
//! 5. Every input is ring-signed over the prefix hash, its ring taken in
//!    ascending global index order like a verifier reads it.
//!
//! Construction is deterministic: the same request always produces the
//! same bytes.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use super::codec::inputs_hash;
use super::key_image::generate_key_image_helper;
use super::types::{
    absolute_to_relative, relative_to_absolute, KeyInput, KeyOutput, Transaction,
    TransactionInput, TransactionOutput, TransactionOutputTarget, TransactionPrefix,
};
use crate::account::{AccountKeys, AccountPublicAddress};
use crate::config::TRANSACTION_VERSION_1;
use crate::crypto::derivation::{derive_public_key, generate_key_derivation};
use crate::crypto::hash::hash_to_scalar;
use crate::crypto::keys::{CryptoError, Hash, KeyPair, PublicKey, SecretKey};
use crate::crypto::ring::{check_ring_signature, generate_ring_signature};
use crate::extra::{
    add_transaction_public_key_to_extra, add_ttl_to_extra, append_extra_field, ExtraError,
    ExtraField, ExtraMessage,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Why a transaction could not be built. Nothing is returned on failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("source {source_index} has an empty ring")]
    EmptyRing { source_index: usize },

    #[error("source {source_index}: real output {real_output} outside ring of {ring_size}")]
    RealOutputOutOfRange {
        source_index: usize,
        real_output: usize,
        ring_size: usize,
    },

    #[error("source {source_index}: global output {global_index} appears twice in the ring")]
    DuplicateRingMember { source_index: usize, global_index: u32 },

    #[error("source {source_index}: derived key {derived} does not match ring member {expected}")]
    KeyMismatch {
        source_index: usize,
        derived: PublicKey,
        expected: PublicKey,
    },

    #[error("destination {destination_index} has zero amount")]
    ZeroAmountDestination { destination_index: usize },

    #[error("input amounts overflow")]
    InputAmountOverflow,

    #[error("output amounts overflow")]
    OutputAmountOverflow,

    #[error("outputs ({outputs}) exceed inputs ({inputs})")]
    MoneyCreated { inputs: u64, outputs: u64 },

    #[error("crypto primitive failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("extra encoding failed: {0}")]
    Extra(#[from] ExtraError),
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A ring member: global output index and one-time public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalOutput {
    pub index: u32,
    pub key: PublicKey,
}

/// An output to spend, hidden among decoys of the same amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSourceEntry {
    /// The ring, in any order. It is signed in ascending global index
    /// order, the order readers recover from the input's offsets.
    pub outputs: Vec<GlobalOutput>,
    /// Position of the real output in `outputs`.
    pub real_output: usize,
    /// Public key of the transaction that created the real output.
    pub real_transaction_public_key: PublicKey,
    /// Key index of the real output within that transaction.
    pub real_output_index_in_transaction: usize,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDestinationEntry {
    pub amount: u64,
    pub address: AccountPublicAddress,
}

/// A message to embed. With a recipient only that address can read it;
/// without one it is stored in the clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub message: String,
    pub recipient: Option<AccountPublicAddress>,
}

// ---------------------------------------------------------------------------
// Deterministic transaction keys
// ---------------------------------------------------------------------------

/// `s = H_s(view_secret ‖ inputs_hash)`, `P = s·G`.
pub fn deterministic_transaction_keys(
    inputs_hash: &Hash,
    view_secret_key: &SecretKey,
) -> Result<KeyPair, CryptoError> {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(view_secret_key.as_bytes());
    buf[32..].copy_from_slice(inputs_hash.as_bytes());
    let secret = SecretKey::from_scalar(&hash_to_scalar(&buf));
    KeyPair::from_secret(secret)
}

/// The transaction key pair `tx` was built with, if `view_secret_key`
/// belongs to its sender.
pub fn deterministic_transaction_keys_for(
    tx: &TransactionPrefix,
    view_secret_key: &SecretKey,
) -> Result<KeyPair, CryptoError> {
    deterministic_transaction_keys(&inputs_hash(&tx.inputs), view_secret_key)
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// A source's ring member keys in ascending global index order, with the
/// real member's position in that order.
#[derive(Debug, Clone)]
struct SortedRing {
    keys: Vec<PublicKey>,
    real: usize,
}

/// Fluent builder for signed transactions.
///
/// # Usage
///
/// ```rust,no_run
/// # use cryptonote_protocol::account::AccountKeys;
/// # use cryptonote_protocol::transaction::{TransactionBuilder, TransactionSourceEntry, TransactionDestinationEntry};
/// # fn sources() -> Vec<TransactionSourceEntry> { vec![] }
/// # let sender = AccountKeys::generate();
/// # let bob = AccountKeys::generate();
/// let (tx, tx_secret) = TransactionBuilder::new(&sender)
///     .sources(sources())
///     .destination(TransactionDestinationEntry { amount: 90, address: bob.address })
///     .ttl(3_600)
///     .build()?;
/// # Ok::<(), cryptonote_protocol::transaction::BuildError>(())
/// ```
///
/// `build` returns the transaction and its secret key. The secret key is
/// not part of the transaction; keep it to prove payments later.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    sender: AccountKeys,
    sources: Vec<TransactionSourceEntry>,
    destinations: Vec<TransactionDestinationEntry>,
    messages: Vec<MessageEntry>,
    ttl: u64,
    extra: Vec<u8>,
    unlock_time: u64,
}

impl TransactionBuilder {
    pub fn new(sender: &AccountKeys) -> Self {
        Self {
            sender: sender.clone(),
            sources: Vec::new(),
            destinations: Vec::new(),
            messages: Vec::new(),
            ttl: 0,
            extra: Vec::new(),
            unlock_time: 0,
        }
    }

    pub fn source(mut self, source: TransactionSourceEntry) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(mut self, sources: Vec<TransactionSourceEntry>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn destination(mut self, destination: TransactionDestinationEntry) -> Self {
        self.destinations.push(destination);
        self
    }

    pub fn destinations(mut self, destinations: Vec<TransactionDestinationEntry>) -> Self {
        self.destinations.extend(destinations);
        self
    }

    pub fn message(mut self, message: MessageEntry) -> Self {
        self.messages.push(message);
        self
    }

    /// Mempool time-to-live in seconds. Zero (the default) writes no TTL.
    pub fn ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Extra bytes to start from, e.g. a payment id nonce.
    pub fn extra(mut self, extra: Vec<u8>) -> Self {
        self.extra = extra;
        self
    }

    pub fn unlock_time(mut self, unlock_time: u64) -> Self {
        self.unlock_time = unlock_time;
        self
    }

    /// Builds and signs the transaction.
    ///
    /// # Errors
    ///
    /// The first malformed source or destination, any key that fails to
    /// decode, and outputs worth more than the inputs. Every failure is
    /// also logged at `error` level.
    pub fn build(self) -> Result<(Transaction, SecretKey), BuildError> {
        self.construct().map_err(|err| {
            error!(error = %err, "transaction construction failed");
            err
        })
    }

    fn construct(self) -> Result<(Transaction, SecretKey), BuildError> {
        let mut prefix = TransactionPrefix {
            version: TRANSACTION_VERSION_1,
            unlock_time: self.unlock_time,
            inputs: Vec::with_capacity(self.sources.len()),
            outputs: Vec::with_capacity(self.destinations.len()),
            extra: self.extra,
        };

        // Inputs.
        let mut signers = Vec::with_capacity(self.sources.len());
        let mut inputs_money: u64 = 0;
        for (source_index, source) in self.sources.iter().enumerate() {
            if source.outputs.is_empty() {
                return Err(BuildError::EmptyRing { source_index });
            }
            if source.real_output >= source.outputs.len() {
                return Err(BuildError::RealOutputOutOfRange {
                    source_index,
                    real_output: source.real_output,
                    ring_size: source.outputs.len(),
                });
            }
            inputs_money = inputs_money
                .checked_add(source.amount)
                .ok_or(BuildError::InputAmountOverflow)?;

            let (ephemeral, key_image) = generate_key_image_helper(
                &self.sender,
                &source.real_transaction_public_key,
                source.real_output_index_in_transaction,
            )?;
            let expected = source.outputs[source.real_output].key;
            if ephemeral.public_key != expected {
                return Err(BuildError::KeyMismatch {
                    source_index,
                    derived: ephemeral.public_key,
                    expected,
                });
            }

            let real_index = source.outputs[source.real_output].index;
            let mut order: Vec<usize> = (0..source.outputs.len()).collect();
            order.sort_by_key(|&i| source.outputs[i].index);
            let absolute: Vec<u32> = order.iter().map(|&i| source.outputs[i].index).collect();
            if let Some(pair) = absolute.windows(2).find(|pair| pair[0] == pair[1]) {
                return Err(BuildError::DuplicateRingMember {
                    source_index,
                    global_index: pair[0],
                });
            }
            let ring = SortedRing {
                keys: order.iter().map(|&i| source.outputs[i].key).collect(),
                real: absolute.partition_point(|&index| index < real_index),
            };

            prefix.inputs.push(TransactionInput::Key(KeyInput {
                amount: source.amount,
                output_indexes: absolute_to_relative(&absolute),
                key_image,
            }));
            signers.push((ephemeral, key_image, ring));
        }

        // Transaction key.
        let tx_key = deterministic_transaction_keys_for(&prefix, &self.sender.view_secret_key)?;
        add_transaction_public_key_to_extra(&mut prefix.extra, &tx_key.public_key);

        // Outputs, smallest amount first.
        let mut destinations = self.destinations;
        destinations.sort_by_key(|destination| destination.amount);

        let mut outputs_money: u64 = 0;
        for (output_index, destination) in destinations.iter().enumerate() {
            if destination.amount == 0 {
                return Err(BuildError::ZeroAmountDestination {
                    destination_index: output_index,
                });
            }
            let derivation =
                generate_key_derivation(&destination.address.view_public_key, &tx_key.secret_key)?;
            let key = derive_public_key(
                &derivation,
                output_index,
                &destination.address.spend_public_key,
            )?;
            prefix.outputs.push(TransactionOutput {
                amount: destination.amount,
                target: TransactionOutputTarget::Key(KeyOutput { key }),
            });
            outputs_money = outputs_money
                .checked_add(destination.amount)
                .ok_or(BuildError::OutputAmountOverflow)?;
        }

        if outputs_money > inputs_money {
            return Err(BuildError::MoneyCreated {
                inputs: inputs_money,
                outputs: outputs_money,
            });
        }

        // Extra tail.
        for (index, entry) in self.messages.iter().enumerate() {
            let message =
                ExtraMessage::encrypt(index, &entry.message, entry.recipient.as_ref(), &tx_key)?;
            append_extra_field(&mut prefix.extra, &ExtraField::Message(message))?;
        }
        if self.ttl != 0 {
            add_ttl_to_extra(&mut prefix.extra, self.ttl);
        }

        // Signatures.
        let prefix_hash = prefix.hash();
        let mut signatures = Vec::with_capacity(signers.len());
        for (ephemeral, key_image, ring) in &signers {
            signatures.push(generate_ring_signature(
                &prefix_hash,
                key_image,
                &ring.keys,
                &ephemeral.secret_key,
                ring.real,
            )?);
        }

        debug!(
            inputs = prefix.inputs.len(),
            outputs = prefix.outputs.len(),
            inputs_money,
            outputs_money,
            messages = self.messages.len(),
            "transaction constructed"
        );

        Ok((Transaction { prefix, signatures }, tx_key.secret_key))
    }
}

// ---------------------------------------------------------------------------
// Signature verification
// ---------------------------------------------------------------------------

/// Checks every key input's ring signature against `rings[i]`, the ring
/// members' public keys in ascending global index order (the order of
/// [`key_input_absolute_indexes`]).
///
/// Non-key inputs are skipped. Returns `false` on any count mismatch.
pub fn verify_transaction_signatures(tx: &Transaction, rings: &[Vec<PublicKey>]) -> bool {
    if tx.signatures.len() != tx.prefix.inputs.len() || rings.len() != tx.prefix.inputs.len() {
        return false;
    }
    let prefix_hash = tx.prefix.hash();

    tx.prefix
        .inputs
        .iter()
        .zip(&tx.signatures)
        .zip(rings)
        .all(|((input, signatures), ring)| match input {
            TransactionInput::Key(key_input) => {
                ring.len() == key_input.output_indexes.len()
                    && check_ring_signature(&prefix_hash, &key_input.key_image, ring, signatures)
            }
            _ => true,
        })
}

/// Absolute global indexes referenced by a key input.
pub fn key_input_absolute_indexes(input: &KeyInput) -> Option<Vec<u32>> {
    relative_to_absolute(&input.output_indexes)
}
