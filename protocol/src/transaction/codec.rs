//! Binary form of transactions and the hashes derived from it.
//!
//! ```text
//! prefix    = varint version, varint unlock_time,
//!             varint n_in,  input*,
//!             varint n_out, output*,
//!             varint extra_len, extra
//! input     = 0xff varint block_index
//!           | 0x02 varint amount, varint n, varint offset*, key_image[32]
//!           | 0x03 varint amount, varint signature_count, varint output_index
//! output    = varint amount, target
//! target    = 0x02 key[32]
//!           | 0x03 varint n, key*, varint required_signature_count
//! tx        = prefix, signature[64]*   (count per input, no length prefix)
//! ```
//!
//! The transaction id is the fast hash of the whole encoding; the prefix
//! hash (what ring signatures sign) covers the prefix only.

use super::types::{
    BaseInput, KeyInput, KeyOutput, MultisignatureInput, MultisignatureOutput, Transaction,
    TransactionInput, TransactionOutput, TransactionOutputTarget, TransactionPrefix,
};
use crate::config::SIGNATURE_SIZE;
use crate::crypto::hash::fast_hash;
use crate::crypto::keys::{Hash, KeyImage, PublicKey, Signature};
use crate::encoding::{BinaryReader, BinaryWriter, DecodeError};

pub const TAG_BASE_INPUT: u8 = 0xff;
pub const TAG_KEY_INPUT: u8 = 0x02;
pub const TAG_MULTISIGNATURE_INPUT: u8 = 0x03;
pub const TAG_KEY_OUTPUT: u8 = 0x02;
pub const TAG_MULTISIGNATURE_OUTPUT: u8 = 0x03;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn write_input(w: &mut BinaryWriter, input: &TransactionInput) {
    match input {
        TransactionInput::Base(base) => {
            w.byte(TAG_BASE_INPUT).varint(u64::from(base.block_index));
        }
        TransactionInput::Key(key) => {
            w.byte(TAG_KEY_INPUT)
                .varint(key.amount)
                .varint(key.output_indexes.len() as u64);
            for offset in &key.output_indexes {
                w.varint(u64::from(*offset));
            }
            w.bytes(key.key_image.as_bytes());
        }
        TransactionInput::Multisignature(multisig) => {
            w.byte(TAG_MULTISIGNATURE_INPUT)
                .varint(multisig.amount)
                .varint(u64::from(multisig.signature_count))
                .varint(u64::from(multisig.output_index));
        }
    }
}

fn write_output(w: &mut BinaryWriter, output: &TransactionOutput) {
    w.varint(output.amount);
    match &output.target {
        TransactionOutputTarget::Key(key) => {
            w.byte(TAG_KEY_OUTPUT).bytes(key.key.as_bytes());
        }
        TransactionOutputTarget::Multisignature(multisig) => {
            w.byte(TAG_MULTISIGNATURE_OUTPUT)
                .varint(multisig.keys.len() as u64);
            for key in &multisig.keys {
                w.bytes(key.as_bytes());
            }
            w.varint(u64::from(multisig.required_signature_count));
        }
    }
}

fn write_inputs(w: &mut BinaryWriter, inputs: &[TransactionInput]) {
    w.varint(inputs.len() as u64);
    for input in inputs {
        write_input(w, input);
    }
}

impl TransactionPrefix {
    pub fn encode(&self, w: &mut BinaryWriter) {
        w.varint(u64::from(self.version)).varint(self.unlock_time);
        write_inputs(w, &self.inputs);
        w.varint(self.outputs.len() as u64);
        for output in &self.outputs {
            write_output(w, output);
        }
        w.length_prefixed(&self.extra);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = BinaryWriter::with_capacity(256);
        self.encode(&mut w);
        w.into_bytes()
    }

    /// The message every ring signature of the transaction signs.
    pub fn hash(&self) -> Hash {
        fast_hash(&self.to_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = BinaryReader::new(bytes);
        let prefix = Self::decode(&mut reader)?;
        reader.finish()?;
        Ok(prefix)
    }

    pub fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, DecodeError> {
        let version = reader.varint_u8()?;
        let unlock_time = reader.varint()?;

        let input_count = reader.length()?;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            inputs.push(read_input(reader)?);
        }

        let output_count = reader.length()?;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            outputs.push(read_output(reader)?);
        }

        let extra = reader.length_prefixed()?.to_vec();
        Ok(Self {
            version,
            unlock_time,
            inputs,
            outputs,
            extra,
        })
    }
}

impl Transaction {
    pub fn encode(&self, w: &mut BinaryWriter) {
        self.prefix.encode(w);
        for signature in self.signatures.iter().flatten() {
            w.bytes(&signature.to_bytes());
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = BinaryWriter::with_capacity(512);
        self.encode(&mut w);
        w.into_bytes()
    }

    /// Transaction id: fast hash of the full encoding.
    pub fn hash(&self) -> Hash {
        fast_hash(&self.to_bytes())
    }

    pub fn prefix_hash(&self) -> Hash {
        self.prefix.hash()
    }

    /// Decodes a transaction. Signatures are split per input according to
    /// [`TransactionInput::signature_count`], so the result always holds one
    /// (possibly empty) vector per input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = BinaryReader::new(bytes);
        let tx = Self::decode(&mut reader)?;
        reader.finish()?;
        Ok(tx)
    }

    /// Reads one transaction from `reader`, leaving whatever follows it.
    pub fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, DecodeError> {
        let prefix = TransactionPrefix::decode(reader)?;

        let mut signatures = Vec::with_capacity(prefix.inputs.len());
        for input in &prefix.inputs {
            let count = input.signature_count();
            let needed = count.saturating_mul(SIGNATURE_SIZE);
            if needed > reader.remaining() {
                return Err(DecodeError::UnexpectedEnd {
                    offset: reader.position(),
                    needed: needed - reader.remaining(),
                });
            }
            let mut ring = Vec::with_capacity(count);
            for _ in 0..count {
                ring.push(Signature::from_bytes(&reader.array()?));
            }
            signatures.push(ring);
        }

        Ok(Self { prefix, signatures })
    }
}

/// Hash of the encoded input list. Keys the deterministic transaction key.
pub fn inputs_hash(inputs: &[TransactionInput]) -> Hash {
    let mut w = BinaryWriter::new();
    write_inputs(&mut w, inputs);
    fast_hash(w.as_slice())
}

/// Decodes `bytes` and returns the transaction with its id and prefix hash.
pub fn parse_transaction(bytes: &[u8]) -> Result<(Transaction, Hash, Hash), DecodeError> {
    let tx = Transaction::from_bytes(bytes)?;
    let hash = fast_hash(bytes);
    let prefix_hash = tx.prefix.hash();
    Ok((tx, hash, prefix_hash))
}

/// `aaaaaaaa....bbbbbbbb`: first and last eight hex digits of a hash.
pub fn short_hash_str(hash: &Hash) -> String {
    let hex = hash.to_hex();
    format!("{}....{}", &hex[..8], &hex[hex.len() - 8..])
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn read_input(reader: &mut BinaryReader<'_>) -> Result<TransactionInput, DecodeError> {
    match reader.byte()? {
        TAG_BASE_INPUT => Ok(TransactionInput::Base(BaseInput {
            block_index: reader.varint_u32()?,
        })),
        TAG_KEY_INPUT => {
            let amount = reader.varint()?;
            let count = reader.length()?;
            let mut output_indexes = Vec::with_capacity(count);
            for _ in 0..count {
                output_indexes.push(reader.varint_u32()?);
            }
            let key_image = KeyImage(reader.array()?);
            Ok(TransactionInput::Key(KeyInput {
                amount,
                output_indexes,
                key_image,
            }))
        }
        TAG_MULTISIGNATURE_INPUT => Ok(TransactionInput::Multisignature(MultisignatureInput {
            amount: reader.varint()?,
            signature_count: reader.varint_u8()?,
            output_index: reader.varint_u32()?,
        })),
        tag => Err(DecodeError::UnknownTag {
            kind: "transaction input",
            tag,
        }),
    }
}

fn read_output(reader: &mut BinaryReader<'_>) -> Result<TransactionOutput, DecodeError> {
    let amount = reader.varint()?;
    let target = match reader.byte()? {
        TAG_KEY_OUTPUT => TransactionOutputTarget::Key(KeyOutput {
            key: PublicKey(reader.array()?),
        }),
        TAG_MULTISIGNATURE_OUTPUT => {
            let count = reader.length()?;
            let mut keys = Vec::with_capacity(count);
            for _ in 0..count {
                keys.push(PublicKey(reader.array()?));
            }
            TransactionOutputTarget::Multisignature(MultisignatureOutput {
                keys,
                required_signature_count: reader.varint_u8()?,
            })
        }
        tag => {
            return Err(DecodeError::UnknownTag {
                kind: "transaction output",
                tag,
            })
        }
    };
    Ok(TransactionOutput { amount, target })
}
