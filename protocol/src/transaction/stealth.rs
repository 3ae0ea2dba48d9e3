//! Recognising outputs that belong to an account.
//!
//! Every key output of a transaction is `H_s(D ‖ i)·G + B` for some
//! recipient, where `D` is the derivation between the transaction key and
//! the recipient's view key and `i` the output's *key index*. The key index
//! counts public keys, not outputs: a multisignature output with `n` keys
//! consumes `n` indexes even though it is never matched here.

use thiserror::Error;
use tracing::debug;

use super::types::{KeyOutput, TransactionOutputTarget, TransactionPrefix};
use crate::account::AccountKeys;
use crate::crypto::derivation::{derive_public_key, generate_key_derivation};
use crate::crypto::keys::{CryptoError, KeyDerivation, PublicKey, NULL_PUBLIC_KEY};
use crate::extra::transaction_public_key_from_extra;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("transaction extra carries no public key")]
    MissingTransactionPublicKey,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// The one-time key the output at `key_index` gets when it pays the owner
/// of `spend_public_key`.
pub fn derive_one_time_key(
    derivation: &KeyDerivation,
    key_index: usize,
    spend_public_key: &PublicKey,
) -> Result<PublicKey, CryptoError> {
    derive_public_key(derivation, key_index, spend_public_key)
}

/// Whether `output` at `key_index` pays `account`, given the derivation
/// shared with the transaction key.
pub fn is_out_to_acc_with_derivation(
    account: &AccountKeys,
    output: &KeyOutput,
    derivation: &KeyDerivation,
    key_index: usize,
) -> bool {
    derive_one_time_key(derivation, key_index, &account.address.spend_public_key)
        .map(|key| key == output.key)
        .unwrap_or(false)
}

/// Whether `output` at `key_index` pays `account`.
pub fn is_out_to_acc(
    account: &AccountKeys,
    output: &KeyOutput,
    tx_public_key: &PublicKey,
    key_index: usize,
) -> bool {
    match generate_key_derivation(tx_public_key, &account.view_secret_key) {
        Ok(derivation) => is_out_to_acc_with_derivation(account, output, &derivation, key_index),
        Err(_) => false,
    }
}

/// Output positions paying `account` and their total amount, using the
/// public key found in the transaction's extra.
pub fn lookup_acc_outs(
    account: &AccountKeys,
    tx: &TransactionPrefix,
) -> Result<(Vec<usize>, u64), ScanError> {
    let tx_public_key = transaction_public_key_from_extra(&tx.extra);
    if tx_public_key == NULL_PUBLIC_KEY {
        return Err(ScanError::MissingTransactionPublicKey);
    }
    lookup_acc_outs_with_key(account, tx, &tx_public_key)
}

/// Same as [`lookup_acc_outs`] with an explicit transaction public key.
pub fn lookup_acc_outs_with_key(
    account: &AccountKeys,
    tx: &TransactionPrefix,
    tx_public_key: &PublicKey,
) -> Result<(Vec<usize>, u64), ScanError> {
    let derivation = generate_key_derivation(tx_public_key, &account.view_secret_key)?;

    let mut owned = Vec::new();
    let mut money: u64 = 0;
    let mut key_index = 0usize;

    for (output_index, output) in tx.outputs.iter().enumerate() {
        match &output.target {
            TransactionOutputTarget::Key(key) => {
                if is_out_to_acc_with_derivation(account, key, &derivation, key_index) {
                    owned.push(output_index);
                    money = money.saturating_add(output.amount);
                }
                key_index += 1;
            }
            TransactionOutputTarget::Multisignature(multisig) => {
                key_index += multisig.keys.len();
            }
        }
    }

    debug!(matched = owned.len(), money, "scanned transaction outputs");
    Ok((owned, money))
}
