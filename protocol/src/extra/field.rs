//! Extra record types and the tagged binary codec.
//!
//! ```text
//! Padding      0x00, then size−1 more zero bytes (size counts the tag)
//! PublicKey    0x01, key[32]
//! Nonce        0x02, len:u8, bytes[len]
//! MergeMining  0x03, varint blob_len, blob = { varint depth, root[32] }
//! Message      0x04, varint len, bytes[len]
//! TTL          0x05, varint size, varint ttl   (size = encoded width of ttl)
//! Yield        0x07, see `commitment`
//! Heat         0x08, see `commitment`
//! ```
//!
//! Padding must be the last record: it runs to the end of the blob.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::commitment::{HeatCommitment, YieldCommitment};
use super::message::ExtraMessage;
use super::ExtraError;
use crate::config::{
    TX_EXTRA_HEAT_COMMITMENT, TX_EXTRA_MERGE_MINING_TAG, TX_EXTRA_MESSAGE_TAG, TX_EXTRA_NONCE,
    TX_EXTRA_NONCE_MAX_COUNT, TX_EXTRA_PADDING_MAX_COUNT, TX_EXTRA_TAG_PADDING,
    TX_EXTRA_TAG_PUBKEY, TX_EXTRA_TTL, TX_EXTRA_YIELD_COMMITMENT,
};
use crate::crypto::keys::{Hash, PublicKey, NULL_PUBLIC_KEY};
use crate::encoding::{varint_bytes, BinaryReader, BinaryWriter};

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// A run of zero bytes. `size` includes the tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraPadding {
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraPublicKey {
    pub public_key: PublicKey,
}

/// Opaque bytes, at most 255 of them. A payment id lives here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraNonce {
    pub nonce: Vec<u8>,
}

/// Commitment of a merge-mined child chain inside a parent base transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeMiningTag {
    pub depth: u64,
    pub merkle_root: Hash,
}

/// How long, in seconds, a transaction may sit in the mempool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraTtl {
    pub ttl: u64,
}

/// One record of a transaction's extra blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtraField {
    Padding(ExtraPadding),
    PublicKey(ExtraPublicKey),
    Nonce(ExtraNonce),
    MergeMiningTag(MergeMiningTag),
    Message(ExtraMessage),
    Ttl(ExtraTtl),
    HeatCommitment(HeatCommitment),
    YieldCommitment(YieldCommitment),
}

/// Implemented by every record type so callers can look one up by type.
pub trait ExtraFieldKind: Sized {
    /// Human-readable name used in errors.
    const NAME: &'static str;

    fn from_field(field: &ExtraField) -> Option<&Self>;
}

macro_rules! field_kind {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl ExtraFieldKind for $ty {
            const NAME: &'static str = $name;

            fn from_field(field: &ExtraField) -> Option<&Self> {
                match field {
                    ExtraField::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for ExtraField {
            fn from(value: $ty) -> Self {
                ExtraField::$variant(value)
            }
        }
    };
}

field_kind!(ExtraPadding, Padding, "padding");
field_kind!(ExtraPublicKey, PublicKey, "public key");
field_kind!(ExtraNonce, Nonce, "nonce");
field_kind!(MergeMiningTag, MergeMiningTag, "merge mining tag");
field_kind!(ExtraMessage, Message, "message");
field_kind!(ExtraTtl, Ttl, "ttl");
field_kind!(HeatCommitment, HeatCommitment, "heat commitment");
field_kind!(YieldCommitment, YieldCommitment, "yield commitment");

/// First record of type `T` in `fields`.
pub fn find_field<T: ExtraFieldKind>(fields: &[ExtraField]) -> Result<&T, ExtraError> {
    fields
        .iter()
        .find_map(T::from_field)
        .ok_or(ExtraError::FieldNotFound { field: T::NAME })
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses an extra blob into its records, in byte order.
///
/// Any malformed record, and any tag this crate does not know, fails the
/// whole blob.
pub fn parse_extra(extra: &[u8]) -> Result<Vec<ExtraField>, ExtraError> {
    let mut reader = BinaryReader::new(extra);
    let mut fields = Vec::new();
    while !reader.is_empty() {
        fields.push(read_field(&mut reader)?);
    }
    Ok(fields)
}

fn read_field(reader: &mut BinaryReader<'_>) -> Result<ExtraField, ExtraError> {
    let offset = reader.position();
    let tag = reader.byte()?;
    let field = match tag {
        TX_EXTRA_TAG_PADDING => {
            let remaining = reader.remaining();
            let run = reader.bytes(remaining)?;
            if let Some(pos) = run.iter().position(|b| *b != 0) {
                return Err(ExtraError::NonZeroPadding {
                    offset: offset + 1 + pos,
                });
            }
            let size = run.len() + 1;
            if size > TX_EXTRA_PADDING_MAX_COUNT {
                return Err(ExtraError::InvalidPaddingSize { size });
            }
            ExtraField::Padding(ExtraPadding { size })
        }
        TX_EXTRA_TAG_PUBKEY => ExtraField::PublicKey(ExtraPublicKey {
            public_key: PublicKey(reader.array()?),
        }),
        TX_EXTRA_NONCE => {
            let len = reader.byte()? as usize;
            ExtraField::Nonce(ExtraNonce {
                nonce: reader.bytes(len)?.to_vec(),
            })
        }
        TX_EXTRA_MERGE_MINING_TAG => {
            let blob = reader.length_prefixed()?;
            let mut inner = BinaryReader::new(blob);
            let depth = inner.varint()?;
            let merkle_root = Hash(inner.array()?);
            inner.finish()?;
            ExtraField::MergeMiningTag(MergeMiningTag { depth, merkle_root })
        }
        TX_EXTRA_MESSAGE_TAG => ExtraField::Message(ExtraMessage {
            data: reader.length_prefixed()?.to_vec(),
        }),
        TX_EXTRA_TTL => {
            let declared = reader.varint()?;
            let start = reader.position();
            let ttl = reader.varint()?;
            let actual = reader.position() - start;
            if declared != actual as u64 {
                return Err(ExtraError::TtlSizeMismatch { declared, actual });
            }
            ExtraField::Ttl(ExtraTtl { ttl })
        }
        TX_EXTRA_HEAT_COMMITMENT => ExtraField::HeatCommitment(HeatCommitment::decode(reader)?),
        TX_EXTRA_YIELD_COMMITMENT => ExtraField::YieldCommitment(YieldCommitment::decode(reader)?),
        tag => return Err(ExtraError::UnknownTag { tag, offset }),
    };
    Ok(field)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn write_public_key(w: &mut BinaryWriter, key: &PublicKey) {
    w.byte(TX_EXTRA_TAG_PUBKEY).bytes(key.as_bytes());
}

fn write_merge_mining_tag(w: &mut BinaryWriter, tag: &MergeMiningTag) {
    let mut blob = BinaryWriter::with_capacity(42);
    blob.varint(tag.depth).bytes(tag.merkle_root.as_bytes());
    w.byte(TX_EXTRA_MERGE_MINING_TAG).length_prefixed(blob.as_slice());
}

fn write_ttl(w: &mut BinaryWriter, ttl: u64) {
    let encoded = varint_bytes(ttl);
    w.byte(TX_EXTRA_TTL)
        .varint(encoded.len() as u64)
        .bytes(&encoded);
}

fn encode_field(field: &ExtraField) -> Result<Vec<u8>, ExtraError> {
    let mut w = BinaryWriter::new();
    match field {
        ExtraField::Padding(padding) => {
            if padding.size == 0 || padding.size > TX_EXTRA_PADDING_MAX_COUNT {
                return Err(ExtraError::InvalidPaddingSize { size: padding.size });
            }
            w.bytes(&vec![TX_EXTRA_TAG_PADDING; padding.size]);
        }
        ExtraField::PublicKey(key) => write_public_key(&mut w, &key.public_key),
        ExtraField::Nonce(nonce) => {
            if nonce.nonce.len() > TX_EXTRA_NONCE_MAX_COUNT {
                return Err(ExtraError::NonceTooLong {
                    size: nonce.nonce.len(),
                });
            }
            w.byte(TX_EXTRA_NONCE)
                .byte(nonce.nonce.len() as u8)
                .bytes(&nonce.nonce);
        }
        ExtraField::MergeMiningTag(tag) => write_merge_mining_tag(&mut w, tag),
        ExtraField::Message(message) => {
            w.byte(TX_EXTRA_MESSAGE_TAG).length_prefixed(&message.data);
        }
        ExtraField::Ttl(ttl) => write_ttl(&mut w, ttl.ttl),
        ExtraField::HeatCommitment(commitment) => commitment.encode(&mut w)?,
        ExtraField::YieldCommitment(commitment) => commitment.encode(&mut w)?,
    }
    Ok(w.into_bytes())
}

/// Padding swallows everything after its tag, so a blob ending in padding
/// cannot take another record.
fn ends_with_padding(extra: &[u8]) -> bool {
    extra.last() == Some(&TX_EXTRA_TAG_PADDING)
        && matches!(
            parse_extra(extra).ok().as_deref().and_then(<[ExtraField]>::last),
            Some(ExtraField::Padding(_))
        )
}

/// Appends one record. On error `extra` is left untouched.
pub fn append_extra_field(extra: &mut Vec<u8>, field: &ExtraField) -> Result<(), ExtraError> {
    if ends_with_padding(extra) {
        return Err(ExtraError::PaddingNotLast);
    }
    let bytes = encode_field(field)?;
    extra.extend_from_slice(&bytes);
    Ok(())
}

/// Serializes `fields` in order. Padding may only be the last record.
pub fn write_extra(fields: &[ExtraField]) -> Result<Vec<u8>, ExtraError> {
    if let Some(position) = fields.iter().position(|f| matches!(f, ExtraField::Padding(_))) {
        if position + 1 != fields.len() {
            return Err(ExtraError::PaddingNotLast);
        }
    }
    let mut extra = Vec::new();
    for field in fields {
        extra.extend_from_slice(&encode_field(field)?);
    }
    Ok(extra)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The transaction public key, or [`NULL_PUBLIC_KEY`] if the blob has none
/// or cannot be parsed.
pub fn transaction_public_key_from_extra(extra: &[u8]) -> PublicKey {
    match parse_extra(extra) {
        Ok(fields) => find_field::<ExtraPublicKey>(&fields)
            .map(|field| field.public_key)
            .unwrap_or(NULL_PUBLIC_KEY),
        Err(err) => {
            warn!(error = %err, "unparsable extra, no transaction public key");
            NULL_PUBLIC_KEY
        }
    }
}

pub fn add_transaction_public_key_to_extra(extra: &mut Vec<u8>, key: &PublicKey) {
    let mut w = BinaryWriter::with_capacity(33);
    write_public_key(&mut w, key);
    extra.extend_from_slice(w.as_slice());
}

pub fn add_extra_nonce_to_extra(extra: &mut Vec<u8>, nonce: &[u8]) -> Result<(), ExtraError> {
    append_extra_field(
        extra,
        &ExtraField::Nonce(ExtraNonce {
            nonce: nonce.to_vec(),
        }),
    )
}

pub fn add_ttl_to_extra(extra: &mut Vec<u8>, ttl: u64) {
    let mut w = BinaryWriter::new();
    write_ttl(&mut w, ttl);
    extra.extend_from_slice(w.as_slice());
}

pub fn ttl_from_extra(extra: &[u8]) -> Result<u64, ExtraError> {
    let fields = parse_extra(extra)?;
    Ok(find_field::<ExtraTtl>(&fields)?.ttl)
}

pub fn append_merge_mining_tag(extra: &mut Vec<u8>, tag: &MergeMiningTag) {
    let mut w = BinaryWriter::new();
    write_merge_mining_tag(&mut w, tag);
    extra.extend_from_slice(w.as_slice());
}

pub fn merge_mining_tag_from_extra(extra: &[u8]) -> Result<MergeMiningTag, ExtraError> {
    let fields = parse_extra(extra)?;
    find_field::<MergeMiningTag>(&fields).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::fast_hash;
    use crate::crypto::keys::KeyPair;

    fn sample_fields() -> Vec<ExtraField> {
        vec![
            ExtraPublicKey {
                public_key: KeyPair::generate().public_key,
            }
            .into(),
            ExtraNonce {
                nonce: vec![1, 2, 3],
            }
            .into(),
            MergeMiningTag {
                depth: 3,
                merkle_root: fast_hash(b"root"),
            }
            .into(),
            ExtraMessage {
                data: b"opaque".to_vec(),
            }
            .into(),
            ExtraTtl { ttl: 3600 }.into(),
            HeatCommitment {
                commitment: fast_hash(b"heat"),
                amount: 42,
                metadata: vec![9; 5],
            }
            .into(),
            YieldCommitment {
                commitment: fast_hash(b"yield"),
                amount: 7,
                term_months: 12,
                yield_scheme: "fixed".into(),
                metadata: vec![],
            }
            .into(),
            ExtraPadding { size: 4 }.into(),
        ]
    }

    #[test]
    fn every_field_survives_write_then_parse() {
        let fields = sample_fields();
        let bytes = write_extra(&fields).unwrap();
        assert_eq!(parse_extra(&bytes).unwrap(), fields);
    }

    #[test]
    fn empty_extra_has_no_fields() {
        assert!(parse_extra(&[]).unwrap().is_empty());
        assert_eq!(write_extra(&[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn public_key_layout() {
        let key = KeyPair::generate().public_key;
        let mut extra = Vec::new();
        add_transaction_public_key_to_extra(&mut extra, &key);
        assert_eq!(extra.len(), 33);
        assert_eq!(extra[0], TX_EXTRA_TAG_PUBKEY);
        assert_eq!(&extra[1..], key.as_bytes());
        assert_eq!(transaction_public_key_from_extra(&extra), key);
    }

    #[test]
    fn missing_or_garbled_public_key_is_null() {
        assert_eq!(transaction_public_key_from_extra(&[]), NULL_PUBLIC_KEY);
        // Truncated key.
        assert_eq!(
            transaction_public_key_from_extra(&[TX_EXTRA_TAG_PUBKEY, 1, 2]),
            NULL_PUBLIC_KEY
        );
    }

    #[test]
    fn ttl_layout() {
        let mut extra = Vec::new();
        add_ttl_to_extra(&mut extra, 300);
        assert_eq!(extra, vec![TX_EXTRA_TTL, 2, 0xac, 0x02]);
        assert_eq!(ttl_from_extra(&extra).unwrap(), 300);
    }

    #[test]
    fn ttl_size_must_match() {
        let extra = [TX_EXTRA_TTL, 1, 0xac, 0x02];
        assert_eq!(
            parse_extra(&extra),
            Err(ExtraError::TtlSizeMismatch {
                declared: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn padding_runs_to_the_end() {
        assert_eq!(
            parse_extra(&[0, 0, 0]).unwrap(),
            vec![ExtraField::Padding(ExtraPadding { size: 3 })]
        );
        assert_eq!(
            parse_extra(&[0, 0, 5]),
            Err(ExtraError::NonZeroPadding { offset: 2 })
        );
        assert_eq!(
            parse_extra(&[0u8; 256]),
            Err(ExtraError::InvalidPaddingSize { size: 256 })
        );
        assert!(parse_extra(&[0u8; 255]).is_ok());
    }

    #[test]
    fn padding_size_is_bounded_on_write() {
        for size in [0, 256] {
            assert_eq!(
                write_extra(&[ExtraPadding { size }.into()]),
                Err(ExtraError::InvalidPaddingSize { size })
            );
        }
    }

    #[test]
    fn padding_must_be_last_record() {
        let fields: Vec<ExtraField> =
            vec![ExtraPadding { size: 4 }.into(), ExtraTtl { ttl: 5 }.into()];
        assert_eq!(write_extra(&fields), Err(ExtraError::PaddingNotLast));

        let tail_padded: Vec<ExtraField> =
            vec![ExtraTtl { ttl: 5 }.into(), ExtraPadding { size: 4 }.into()];
        let bytes = write_extra(&tail_padded).unwrap();
        assert_eq!(parse_extra(&bytes).unwrap(), tail_padded);

        let mut extra = bytes.clone();
        assert_eq!(
            append_extra_field(&mut extra, &ExtraTtl { ttl: 9 }.into()),
            Err(ExtraError::PaddingNotLast)
        );
        assert_eq!(extra, bytes);
    }

    #[test]
    fn zero_byte_ending_a_record_is_not_padding() {
        let mut extra = write_extra(&[ExtraNonce { nonce: vec![7, 0] }.into()]).unwrap();
        append_extra_field(&mut extra, &ExtraTtl { ttl: 5 }.into()).unwrap();
        assert_eq!(parse_extra(&extra).unwrap().len(), 2);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(
            parse_extra(&[0x06, 1, 2]),
            Err(ExtraError::UnknownTag {
                tag: 0x06,
                offset: 0
            })
        );
    }

    #[test]
    fn oversized_nonce_leaves_extra_untouched() {
        let mut extra = vec![0xaa];
        let err = add_extra_nonce_to_extra(&mut extra, &[0u8; 256]).unwrap_err();
        assert_eq!(err, ExtraError::NonceTooLong { size: 256 });
        assert_eq!(extra, vec![0xaa]);

        add_extra_nonce_to_extra(&mut extra, &[0u8; 255]).unwrap();
        assert_eq!(extra.len(), 1 + 2 + 255);
    }

    #[test]
    fn truncated_nonce_fails() {
        assert!(matches!(
            parse_extra(&[TX_EXTRA_NONCE, 4, 1, 2]),
            Err(ExtraError::Decode(_))
        ));
    }

    #[test]
    fn merge_mining_tag_helpers() {
        let tag = MergeMiningTag {
            depth: 200,
            merkle_root: fast_hash(b"aux"),
        };
        let mut extra = Vec::new();
        append_merge_mining_tag(&mut extra, &tag);
        // tag, blob length, two-byte depth varint, root
        assert_eq!(extra.len(), 1 + 1 + 2 + 32);
        assert_eq!(extra[1], 34);
        assert_eq!(merge_mining_tag_from_extra(&extra).unwrap(), tag);
    }

    #[test]
    fn find_field_reports_missing_kind() {
        let fields = vec![ExtraField::Ttl(ExtraTtl { ttl: 1 })];
        assert_eq!(find_field::<ExtraTtl>(&fields).unwrap().ttl, 1);
        assert_eq!(
            find_field::<ExtraNonce>(&fields),
            Err(ExtraError::FieldNotFound { field: "nonce" })
        );
    }

    #[test]
    fn find_field_returns_first_match() {
        let fields = vec![
            ExtraTtl { ttl: 1 }.into(),
            ExtraTtl { ttl: 2 }.into(),
        ];
        assert_eq!(find_field::<ExtraTtl>(&fields).unwrap().ttl, 1);
    }
}
