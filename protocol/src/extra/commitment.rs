//! Heat and yield commitment records.
//!
//! Both records use fixed-width little-endian integers and single-byte
//! length prefixes rather than varints:
//!
//! ```text
//! Heat   0x08, commitment[32], amount:u64le, meta_len:u8, meta
//! Yield  0x07, commitment[32], amount:u64le, term_months:u32le,
//!              scheme_len:u8, scheme, meta_len:u8, meta
//! ```

use serde::{Deserialize, Serialize};

use super::field::{append_extra_field, find_field, parse_extra, ExtraField};
use super::ExtraError;
use crate::config::{TX_EXTRA_HEAT_COMMITMENT, TX_EXTRA_YIELD_COMMITMENT};
use crate::crypto::keys::Hash;
use crate::encoding::{BinaryReader, BinaryWriter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatCommitment {
    pub commitment: Hash,
    pub amount: u64,
    pub metadata: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldCommitment {
    pub commitment: Hash,
    pub amount: u64,
    pub term_months: u32,
    pub yield_scheme: String,
    pub metadata: Vec<u8>,
}

fn short_length(field: &'static str, data: &[u8]) -> Result<u8, ExtraError> {
    u8::try_from(data.len()).map_err(|_| ExtraError::FieldTooLong {
        field,
        size: data.len(),
    })
}

fn read_short_bytes<'a>(reader: &mut BinaryReader<'a>) -> Result<&'a [u8], ExtraError> {
    let len = reader.byte()? as usize;
    Ok(reader.bytes(len)?)
}

impl HeatCommitment {
    pub(crate) fn encode(&self, w: &mut BinaryWriter) -> Result<(), ExtraError> {
        let meta_len = short_length("heat commitment metadata", &self.metadata)?;
        w.byte(TX_EXTRA_HEAT_COMMITMENT)
            .bytes(self.commitment.as_bytes())
            .u64_le(self.amount)
            .byte(meta_len)
            .bytes(&self.metadata);
        Ok(())
    }

    /// Reads the body; the tag has already been consumed.
    pub(crate) fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, ExtraError> {
        let commitment = Hash(reader.array()?);
        let amount = reader.u64_le()?;
        let metadata = read_short_bytes(reader)?.to_vec();
        Ok(Self {
            commitment,
            amount,
            metadata,
        })
    }
}

impl YieldCommitment {
    pub(crate) fn encode(&self, w: &mut BinaryWriter) -> Result<(), ExtraError> {
        let scheme_len = short_length("yield scheme", self.yield_scheme.as_bytes())?;
        let meta_len = short_length("yield commitment metadata", &self.metadata)?;
        w.byte(TX_EXTRA_YIELD_COMMITMENT)
            .bytes(self.commitment.as_bytes())
            .u64_le(self.amount)
            .u32_le(self.term_months)
            .byte(scheme_len)
            .bytes(self.yield_scheme.as_bytes())
            .byte(meta_len)
            .bytes(&self.metadata);
        Ok(())
    }

    pub(crate) fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, ExtraError> {
        let commitment = Hash(reader.array()?);
        let amount = reader.u64_le()?;
        let term_months = reader.u32_le()?;
        let yield_scheme = std::str::from_utf8(read_short_bytes(reader)?)
            .map_err(|_| ExtraError::InvalidUtf8 {
                field: "yield scheme",
            })?
            .to_owned();
        let metadata = read_short_bytes(reader)?.to_vec();
        Ok(Self {
            commitment,
            amount,
            term_months,
            yield_scheme,
            metadata,
        })
    }
}

pub fn add_heat_commitment(
    extra: &mut Vec<u8>,
    commitment: &HeatCommitment,
) -> Result<(), ExtraError> {
    append_extra_field(extra, &ExtraField::HeatCommitment(commitment.clone()))
}

pub fn create_extra_with_heat_commitment(
    commitment: &Hash,
    amount: u64,
    metadata: &[u8],
) -> Result<Vec<u8>, ExtraError> {
    let mut extra = Vec::new();
    add_heat_commitment(
        &mut extra,
        &HeatCommitment {
            commitment: *commitment,
            amount,
            metadata: metadata.to_vec(),
        },
    )?;
    Ok(extra)
}

pub fn heat_commitment_from_extra(extra: &[u8]) -> Result<HeatCommitment, ExtraError> {
    let fields = parse_extra(extra)?;
    find_field::<HeatCommitment>(&fields).cloned()
}

pub fn add_yield_commitment(
    extra: &mut Vec<u8>,
    commitment: &YieldCommitment,
) -> Result<(), ExtraError> {
    append_extra_field(extra, &ExtraField::YieldCommitment(commitment.clone()))
}

pub fn create_extra_with_yield_commitment(
    commitment: &Hash,
    amount: u64,
    term_months: u32,
    yield_scheme: &str,
    metadata: &[u8],
) -> Result<Vec<u8>, ExtraError> {
    let mut extra = Vec::new();
    add_yield_commitment(
        &mut extra,
        &YieldCommitment {
            commitment: *commitment,
            amount,
            term_months,
            yield_scheme: yield_scheme.to_owned(),
            metadata: metadata.to_vec(),
        },
    )?;
    Ok(extra)
}

pub fn yield_commitment_from_extra(extra: &[u8]) -> Result<YieldCommitment, ExtraError> {
    let fields = parse_extra(extra)?;
    find_field::<YieldCommitment>(&fields).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::fast_hash;

    #[test]
    fn heat_layout() {
        let commitment = fast_hash(b"burn");
        let extra = create_extra_with_heat_commitment(&commitment, 0x0102, &[0xee]).unwrap();
        assert_eq!(extra[0], TX_EXTRA_HEAT_COMMITMENT);
        assert_eq!(&extra[1..33], commitment.as_bytes());
        assert_eq!(&extra[33..41], &0x0102u64.to_le_bytes());
        assert_eq!(&extra[41..], &[1, 0xee]);

        let parsed = heat_commitment_from_extra(&extra).unwrap();
        assert_eq!(parsed.amount, 0x0102);
        assert_eq!(parsed.metadata, vec![0xee]);
    }

    #[test]
    fn yield_layout() {
        let commitment = fast_hash(b"stake");
        let extra =
            create_extra_with_yield_commitment(&commitment, 5, 24, "compound", b"m").unwrap();
        assert_eq!(extra[0], TX_EXTRA_YIELD_COMMITMENT);
        assert_eq!(&extra[41..45], &24u32.to_le_bytes());
        assert_eq!(extra[45], 8);
        assert_eq!(&extra[46..54], b"compound");
        assert_eq!(&extra[54..], &[1, b'm']);

        let parsed = yield_commitment_from_extra(&extra).unwrap();
        assert_eq!(parsed.term_months, 24);
        assert_eq!(parsed.yield_scheme, "compound");
    }

    #[test]
    fn oversized_metadata_is_rejected() {
        let err = create_extra_with_heat_commitment(&fast_hash(b"x"), 1, &[0u8; 256]).unwrap_err();
        assert!(matches!(err, ExtraError::FieldTooLong { size: 256, .. }));
    }

    #[test]
    fn missing_commitment() {
        assert_eq!(
            heat_commitment_from_extra(&[]),
            Err(ExtraError::FieldNotFound {
                field: "heat commitment"
            })
        );
    }

    #[test]
    fn truncated_yield_fails() {
        let extra =
            create_extra_with_yield_commitment(&fast_hash(b"y"), 1, 1, "s", &[]).unwrap();
        assert!(yield_commitment_from_extra(&extra[..extra.len() - 1]).is_err());
    }
}
