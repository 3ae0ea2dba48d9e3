//! Stateless structural checks on a transaction prefix.
//!
//! These run before anything touches the chain: they only look at the
//! transaction itself. Key image uniqueness, ring membership and
//! unlock times need chain state and are checked elsewhere.

use std::collections::HashSet;

use thiserror::Error;

use super::types::{TransactionInput, TransactionOutputTarget, TransactionPrefix};
use crate::config::{PRETTY_AMOUNTS, TRANSACTION_VERSION_2};
use crate::crypto::keys::check_key;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A consensus rule the transaction breaks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("input {index} has an unsupported type")]
    UnsupportedInputType { index: usize },

    #[error("multisignature input {index} requires transaction version 2, got {version}")]
    MultisignatureInputBeforeV2 { index: usize, version: u8 },

    #[error("output {index} has zero amount")]
    ZeroAmountOutput { index: usize },

    #[error("output {index} has an invalid public key")]
    InvalidOutputKey { index: usize },

    #[error("multisignature output {index} requires transaction version 2, got {version}")]
    MultisignatureOutputBeforeV2 { index: usize, version: u8 },

    #[error("multisignature output {index} requires {required} of {available} signatures")]
    InvalidRequiredSignatureCount {
        index: usize,
        required: u8,
        available: usize,
    },

    #[error("multisignature output {index} has an invalid public key")]
    InvalidMultisignatureKey { index: usize },

    #[error("multisignature output (amount {amount}, index {output_index}) spent twice")]
    DuplicateMultisignatureInput { amount: u64, output_index: u32 },

    #[error("input amounts overflow")]
    InputsOverflow,

    #[error("output amounts overflow")]
    OutputsOverflow,
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Every input is a key input, or a multisignature input in a version 2
/// transaction. Coinbase inputs are not accepted here.
pub fn check_inputs_types_supported(tx: &TransactionPrefix) -> Result<(), ValidationError> {
    for (index, input) in tx.inputs.iter().enumerate() {
        match input {
            TransactionInput::Key(_) => {}
            TransactionInput::Multisignature(_) => {
                if tx.version < TRANSACTION_VERSION_2 {
                    return Err(ValidationError::MultisignatureInputBeforeV2 {
                        index,
                        version: tx.version,
                    });
                }
            }
            TransactionInput::Base(_) => {
                return Err(ValidationError::UnsupportedInputType { index });
            }
        }
    }
    Ok(())
}

/// Output amounts, keys and multisignature parameters are well-formed.
pub fn check_outs_valid(tx: &TransactionPrefix) -> Result<(), ValidationError> {
    for (index, output) in tx.outputs.iter().enumerate() {
        match &output.target {
            TransactionOutputTarget::Key(key) => {
                if output.amount == 0 {
                    return Err(ValidationError::ZeroAmountOutput { index });
                }
                if !check_key(&key.key) {
                    return Err(ValidationError::InvalidOutputKey { index });
                }
            }
            TransactionOutputTarget::Multisignature(multisig) => {
                if tx.version < TRANSACTION_VERSION_2 {
                    return Err(ValidationError::MultisignatureOutputBeforeV2 {
                        index,
                        version: tx.version,
                    });
                }
                if multisig.required_signature_count as usize > multisig.keys.len() {
                    return Err(ValidationError::InvalidRequiredSignatureCount {
                        index,
                        required: multisig.required_signature_count,
                        available: multisig.keys.len(),
                    });
                }
                if !multisig.keys.iter().all(check_key) {
                    return Err(ValidationError::InvalidMultisignatureKey { index });
                }
            }
        }
    }
    Ok(())
}

/// No two multisignature inputs reference the same `(amount, output_index)`.
pub fn check_multisignature_inputs_diff(tx: &TransactionPrefix) -> Result<(), ValidationError> {
    let mut used = HashSet::new();
    for input in &tx.inputs {
        if let TransactionInput::Multisignature(multisig) = input {
            if !used.insert((multisig.amount, multisig.output_index)) {
                return Err(ValidationError::DuplicateMultisignatureInput {
                    amount: multisig.amount,
                    output_index: multisig.output_index,
                });
            }
        }
    }
    Ok(())
}

fn sums_without_overflow(amounts: impl IntoIterator<Item = u64>) -> bool {
    let mut total: u64 = 0;
    for amount in amounts {
        match total.checked_add(amount) {
            Some(next) => total = next,
            None => return false,
        }
    }
    true
}

pub fn check_inputs_overflow(tx: &TransactionPrefix) -> Result<(), ValidationError> {
    if sums_without_overflow(tx.inputs.iter().map(TransactionInput::amount)) {
        Ok(())
    } else {
        Err(ValidationError::InputsOverflow)
    }
}

pub fn check_outs_overflow(tx: &TransactionPrefix) -> Result<(), ValidationError> {
    if sums_without_overflow(tx.outputs.iter().map(|output| output.amount)) {
        Ok(())
    } else {
        Err(ValidationError::OutputsOverflow)
    }
}

/// Neither the input nor the output total wraps a `u64`.
pub fn check_money_overflow(tx: &TransactionPrefix) -> Result<(), ValidationError> {
    check_inputs_overflow(tx)?;
    check_outs_overflow(tx)
}

/// Whether `amount` is one of the canonical denominations.
pub fn is_valid_decomposed_amount(amount: u64) -> bool {
    PRETTY_AMOUNTS.binary_search(&amount).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TRANSACTION_VERSION_1;
    use crate::crypto::keys::{KeyImage, KeyPair, PublicKey};
    use crate::transaction::types::{
        BaseInput, KeyInput, KeyOutput, MultisignatureInput, MultisignatureOutput,
        TransactionOutput,
    };

    fn key_input(amount: u64) -> TransactionInput {
        TransactionInput::Key(KeyInput {
            amount,
            output_indexes: vec![0],
            key_image: KeyImage::default(),
        })
    }

    fn multisig_input(amount: u64, output_index: u32) -> TransactionInput {
        TransactionInput::Multisignature(MultisignatureInput {
            amount,
            signature_count: 1,
            output_index,
        })
    }

    fn key_output(amount: u64, key: PublicKey) -> TransactionOutput {
        TransactionOutput {
            amount,
            target: TransactionOutputTarget::Key(KeyOutput { key }),
        }
    }

    fn multisig_output(keys: Vec<PublicKey>, required: u8) -> TransactionOutput {
        TransactionOutput {
            amount: 10,
            target: TransactionOutputTarget::Multisignature(MultisignatureOutput {
                keys,
                required_signature_count: required,
            }),
        }
    }

    fn prefix(version: u8) -> TransactionPrefix {
        TransactionPrefix {
            version,
            ..TransactionPrefix::default()
        }
    }

    #[test]
    fn key_inputs_are_always_supported() {
        let mut tx = prefix(TRANSACTION_VERSION_1);
        tx.inputs = vec![key_input(1), key_input(2)];
        assert!(check_inputs_types_supported(&tx).is_ok());
    }

    #[test]
    fn multisig_inputs_need_v2() {
        let mut tx = prefix(TRANSACTION_VERSION_1);
        tx.inputs = vec![key_input(1), multisig_input(1, 0)];
        assert_eq!(
            check_inputs_types_supported(&tx),
            Err(ValidationError::MultisignatureInputBeforeV2 {
                index: 1,
                version: 1
            })
        );
        tx.version = TRANSACTION_VERSION_2;
        assert!(check_inputs_types_supported(&tx).is_ok());
    }

    #[test]
    fn base_input_is_not_a_spend() {
        let mut tx = prefix(TRANSACTION_VERSION_2);
        tx.inputs = vec![TransactionInput::Base(BaseInput { block_index: 1 })];
        assert_eq!(
            check_inputs_types_supported(&tx),
            Err(ValidationError::UnsupportedInputType { index: 0 })
        );
    }

    #[test]
    fn output_checks() {
        let good = KeyPair::generate().public_key;
        let bad = PublicKey([0xff; 32]);

        let mut tx = prefix(TRANSACTION_VERSION_1);
        tx.outputs = vec![key_output(5, good)];
        assert!(check_outs_valid(&tx).is_ok());

        tx.outputs = vec![key_output(5, good), key_output(0, good)];
        assert_eq!(
            check_outs_valid(&tx),
            Err(ValidationError::ZeroAmountOutput { index: 1 })
        );

        tx.outputs = vec![key_output(5, bad)];
        assert_eq!(
            check_outs_valid(&tx),
            Err(ValidationError::InvalidOutputKey { index: 0 })
        );
    }

    #[test]
    fn multisig_output_checks() {
        let good = KeyPair::generate().public_key;
        let bad = PublicKey([0xff; 32]);

        let mut tx = prefix(TRANSACTION_VERSION_1);
        tx.outputs = vec![multisig_output(vec![good], 1)];
        assert!(matches!(
            check_outs_valid(&tx),
            Err(ValidationError::MultisignatureOutputBeforeV2 { .. })
        ));

        tx.version = TRANSACTION_VERSION_2;
        assert!(check_outs_valid(&tx).is_ok());

        tx.outputs = vec![multisig_output(vec![good], 2)];
        assert_eq!(
            check_outs_valid(&tx),
            Err(ValidationError::InvalidRequiredSignatureCount {
                index: 0,
                required: 2,
                available: 1
            })
        );

        tx.outputs = vec![multisig_output(vec![good, bad], 1)];
        assert_eq!(
            check_outs_valid(&tx),
            Err(ValidationError::InvalidMultisignatureKey { index: 0 })
        );
    }

    #[test]
    fn duplicate_multisig_inputs() {
        let mut tx = prefix(TRANSACTION_VERSION_2);
        tx.inputs = vec![multisig_input(10, 1), multisig_input(10, 2), multisig_input(20, 1)];
        assert!(check_multisignature_inputs_diff(&tx).is_ok());

        tx.inputs.push(multisig_input(10, 2));
        assert_eq!(
            check_multisignature_inputs_diff(&tx),
            Err(ValidationError::DuplicateMultisignatureInput {
                amount: 10,
                output_index: 2
            })
        );
    }

    #[test]
    fn overflow_is_detected_not_wrapped() {
        let key = KeyPair::generate().public_key;
        let mut tx = prefix(TRANSACTION_VERSION_1);
        tx.outputs = vec![key_output(u64::MAX, key), key_output(1, key)];
        assert_eq!(check_outs_overflow(&tx), Err(ValidationError::OutputsOverflow));
        assert_eq!(check_money_overflow(&tx), Err(ValidationError::OutputsOverflow));

        tx.outputs = vec![key_output(u64::MAX, key)];
        tx.inputs = vec![key_input(u64::MAX - 1), key_input(2)];
        assert_eq!(check_inputs_overflow(&tx), Err(ValidationError::InputsOverflow));

        tx.inputs = vec![key_input(u64::MAX - 1), key_input(1)];
        assert!(check_money_overflow(&tx).is_ok());
    }

    #[test]
    fn decomposed_amounts() {
        assert!(is_valid_decomposed_amount(1));
        assert!(is_valid_decomposed_amount(10));
        assert!(is_valid_decomposed_amount(7));
        assert!(is_valid_decomposed_amount(900_000));
        assert!(is_valid_decomposed_amount(10_000_000_000_000_000_000));
        assert!(!is_valid_decomposed_amount(0));
        assert!(!is_valid_decomposed_amount(11));
        assert!(!is_valid_decomposed_amount(123));
    }
}
