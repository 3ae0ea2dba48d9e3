//! Transaction value types.
//!
//! A transaction is a prefix (everything that gets signed) plus one ring
//! signature per input. Inputs and outputs are closed sum types; the binary
//! tags that identify each variant on the wire live in [`super::codec`].

use serde::{Deserialize, Serialize};

use crate::crypto::keys::{KeyImage, PublicKey, Signature};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Coinbase input: mints the block reward at `block_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseInput {
    pub block_index: u32,
}

/// Spends one output out of a ring of same-amount outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub amount: u64,
    /// Global output indexes of the ring, in relative (delta) form.
    pub output_indexes: Vec<u32>,
    pub key_image: KeyImage,
}

/// Spends a multisignature output, referenced directly by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisignatureInput {
    pub amount: u64,
    pub signature_count: u8,
    pub output_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionInput {
    Base(BaseInput),
    Key(KeyInput),
    Multisignature(MultisignatureInput),
}

impl TransactionInput {
    /// Amount moved by this input; zero for a coinbase input.
    pub fn amount(&self) -> u64 {
        match self {
            TransactionInput::Base(_) => 0,
            TransactionInput::Key(input) => input.amount,
            TransactionInput::Multisignature(input) => input.amount,
        }
    }

    /// Number of signature elements this input carries.
    pub fn signature_count(&self) -> usize {
        match self {
            TransactionInput::Base(_) => 0,
            TransactionInput::Key(input) => input.output_indexes.len(),
            TransactionInput::Multisignature(input) => input.signature_count as usize,
        }
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Output spendable by whoever can derive the secret of `key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOutput {
    pub key: PublicKey,
}

/// Output spendable by `required_signature_count` of `keys`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisignatureOutput {
    pub keys: Vec<PublicKey>,
    pub required_signature_count: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionOutputTarget {
    Key(KeyOutput),
    Multisignature(MultisignatureOutput),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub amount: u64,
    pub target: TransactionOutputTarget,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// The signed part of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionPrefix {
    pub version: u8,
    /// Block height (below the height/time threshold) or UNIX time before
    /// which the outputs may not be spent.
    pub unlock_time: u64,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub extra: Vec<u8>,
}

impl TransactionPrefix {
    /// Sum of key and multisignature input amounts. Saturates; run
    /// [`super::validation::check_inputs_overflow`] first on untrusted data.
    pub fn inputs_money(&self) -> u64 {
        self.inputs
            .iter()
            .fold(0u64, |total, input| total.saturating_add(input.amount()))
    }

    /// Sum of output amounts. Saturates like [`Self::inputs_money`].
    pub fn outputs_money(&self) -> u64 {
        self.outputs
            .iter()
            .fold(0u64, |total, output| total.saturating_add(output.amount))
    }
}

/// A prefix plus its signatures.
///
/// `signatures[i]` belongs to `prefix.inputs[i]` and holds
/// [`TransactionInput::signature_count`] elements.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub prefix: TransactionPrefix,
    pub signatures: Vec<Vec<Signature>>,
}

// ---------------------------------------------------------------------------
// Relative output indexes
// ---------------------------------------------------------------------------

/// Sorts `absolute` and replaces every entry after the first with its
/// distance from the previous one.
///
/// ```
/// use cryptonote_protocol::transaction::absolute_to_relative;
///
/// assert_eq!(absolute_to_relative(&[30, 10, 25]), vec![10, 15, 5]);
/// ```
pub fn absolute_to_relative(absolute: &[u32]) -> Vec<u32> {
    let mut offsets = absolute.to_vec();
    offsets.sort_unstable();
    for i in (1..offsets.len()).rev() {
        offsets[i] -= offsets[i - 1];
    }
    offsets
}

/// Inverse of [`absolute_to_relative`]. `None` if the running sum leaves
/// the `u32` range.
pub fn relative_to_absolute(relative: &[u32]) -> Option<Vec<u32>> {
    let mut absolute = relative.to_vec();
    for i in 1..absolute.len() {
        absolute[i] = absolute[i].checked_add(absolute[i - 1])?;
    }
    Some(absolute)
}
