//! Messages embedded in a transaction's extra.
//!
//! A message is the text followed by four zero bytes. When it is addressed
//! to someone the buffer is then run through ChaCha8 under a key only the
//! sender and that recipient can compute:
//!
//! ```text
//! D   = derivation(recipient spend public, tx secret)
//!     = derivation(tx public, recipient spend secret)
//! key = H(D ‖ 0x80 ‖ 0x00)
//! ct  = chacha8(key, nonce = message index, text ‖ 0000)
//! ```
//!
//! The recipient deciphers and checks the four trailing zeros. Anyone else
//! gets garbage and a checksum mismatch.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::field::{parse_extra, ExtraField};
use super::ExtraError;
use crate::account::AccountPublicAddress;
use crate::config::TX_EXTRA_MESSAGE_CHECKSUM_SIZE;
use crate::crypto::derivation::generate_key_derivation;
use crate::crypto::hash::fast_hash;
use crate::crypto::keys::{KeyDerivation, KeyPair, PublicKey, SecretKey};
use crate::crypto::stream::chacha8;

const MESSAGE_KEY_MAGIC: [u8; 2] = [0x80, 0x00];

/// Message payload as stored in the extra blob: cleartext or ciphertext,
/// always including the checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraMessage {
    pub data: Vec<u8>,
}

fn message_key(derivation: &KeyDerivation) -> [u8; 32] {
    let mut buf = [0u8; 34];
    buf[..32].copy_from_slice(derivation.as_bytes());
    buf[32..].copy_from_slice(&MESSAGE_KEY_MAGIC);
    fast_hash(&buf).0
}

impl ExtraMessage {
    /// Seals `message` as the `index`-th message of a transaction.
    ///
    /// With no recipient the text is stored in the clear.
    pub fn encrypt(
        index: usize,
        message: impl AsRef<[u8]>,
        recipient: Option<&AccountPublicAddress>,
        tx_key: &KeyPair,
    ) -> Result<Self, ExtraError> {
        let message = message.as_ref();
        let mut data = Vec::with_capacity(message.len() + TX_EXTRA_MESSAGE_CHECKSUM_SIZE);
        data.extend_from_slice(message);
        data.extend_from_slice(&[0u8; TX_EXTRA_MESSAGE_CHECKSUM_SIZE]);

        if let Some(recipient) = recipient {
            let derivation =
                generate_key_derivation(&recipient.spend_public_key, &tx_key.secret_key)?;
            chacha8(&message_key(&derivation), index as u64, &mut data);
        }
        Ok(Self { data })
    }

    /// Opens the `index`-th message of a transaction.
    ///
    /// Pass the recipient's spend secret key for an addressed message and
    /// `None` for a cleartext one. The text comes back as raw bytes; other
    /// wallets are free to send non-UTF-8 payloads.
    pub fn decrypt(
        &self,
        index: usize,
        tx_public_key: &PublicKey,
        recipient_secret_key: Option<&SecretKey>,
    ) -> Result<Vec<u8>, ExtraError> {
        if self.data.len() < TX_EXTRA_MESSAGE_CHECKSUM_SIZE {
            return Err(ExtraError::MessageTooShort {
                size: self.data.len(),
            });
        }

        let mut buf = self.data.clone();
        if let Some(secret) = recipient_secret_key {
            let derivation = generate_key_derivation(tx_public_key, secret)?;
            chacha8(&message_key(&derivation), index as u64, &mut buf);
        }

        let text_len = buf.len() - TX_EXTRA_MESSAGE_CHECKSUM_SIZE;
        if buf[text_len..].iter().any(|b| *b != 0) {
            return Err(ExtraError::ChecksumMismatch);
        }
        buf.truncate(text_len);
        Ok(buf)
    }
}

/// Every message in `extra` that opens under the given key, in order.
///
/// A message's index is its position among the message records. Messages
/// that fail to open are skipped; an unparsable blob yields nothing.
pub fn messages_from_extra(
    extra: &[u8],
    tx_public_key: &PublicKey,
    recipient_secret_key: Option<&SecretKey>,
) -> Vec<Vec<u8>> {
    let fields = match parse_extra(extra) {
        Ok(fields) => fields,
        Err(err) => {
            warn!(error = %err, "unparsable extra, no messages");
            return Vec::new();
        }
    };

    fields
        .iter()
        .filter_map(|field| match field {
            ExtraField::Message(message) => Some(message),
            _ => None,
        })
        .enumerate()
        .filter_map(|(index, message)| {
            match message.decrypt(index, tx_public_key, recipient_secret_key) {
                Ok(text) => Some(text),
                Err(err) => {
                    debug!(index, error = %err, "skipping unreadable message");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountKeys;
    use crate::extra::field::{add_transaction_public_key_to_extra, append_extra_field};

    #[test]
    fn addressed_message_roundtrip() {
        let bob = AccountKeys::generate();
        let tx_key = KeyPair::generate();

        let sealed = ExtraMessage::encrypt(0, "hello", Some(&bob.address), &tx_key).unwrap();
        assert_ne!(&sealed.data[..5], b"hello");
        assert_eq!(sealed.data.len(), 5 + TX_EXTRA_MESSAGE_CHECKSUM_SIZE);

        let opened = sealed
            .decrypt(0, &tx_key.public_key, Some(&bob.spend_secret_key))
            .unwrap();
        assert_eq!(opened, b"hello");
    }

    #[test]
    fn wrong_recipient_fails_checksum() {
        let bob = AccountKeys::generate();
        let eve = AccountKeys::generate();
        let tx_key = KeyPair::generate();

        let sealed = ExtraMessage::encrypt(0, "hello", Some(&bob.address), &tx_key).unwrap();
        assert_eq!(
            sealed.decrypt(0, &tx_key.public_key, Some(&eve.spend_secret_key)),
            Err(ExtraError::ChecksumMismatch)
        );
    }

    #[test]
    fn wrong_index_fails_checksum() {
        let bob = AccountKeys::generate();
        let tx_key = KeyPair::generate();
        let sealed = ExtraMessage::encrypt(1, "hi there", Some(&bob.address), &tx_key).unwrap();
        assert_eq!(
            sealed.decrypt(0, &tx_key.public_key, Some(&bob.spend_secret_key)),
            Err(ExtraError::ChecksumMismatch)
        );
    }

    #[test]
    fn cleartext_message() {
        let tx_key = KeyPair::generate();
        let sealed = ExtraMessage::encrypt(0, "public note", None, &tx_key).unwrap();
        assert_eq!(&sealed.data[..11], b"public note");
        assert_eq!(
            sealed.decrypt(0, &tx_key.public_key, None).unwrap(),
            b"public note"
        );
    }

    #[test]
    fn short_payload_rejected() {
        let msg = ExtraMessage { data: vec![0, 0] };
        assert_eq!(
            msg.decrypt(0, &KeyPair::generate().public_key, None),
            Err(ExtraError::MessageTooShort { size: 2 })
        );
    }

    #[test]
    fn listing_skips_messages_for_others() {
        let bob = AccountKeys::generate();
        let carol = AccountKeys::generate();
        let tx_key = KeyPair::generate();

        let mut extra = Vec::new();
        add_transaction_public_key_to_extra(&mut extra, &tx_key.public_key);
        for (index, (text, to)) in [("for bob", &bob), ("for carol", &carol), ("bob again", &bob)]
            .into_iter()
            .enumerate()
        {
            let sealed = ExtraMessage::encrypt(index, text, Some(&to.address), &tx_key).unwrap();
            append_extra_field(&mut extra, &ExtraField::Message(sealed)).unwrap();
        }

        let read = messages_from_extra(&extra, &tx_key.public_key, Some(&bob.spend_secret_key));
        assert_eq!(read, vec![b"for bob".to_vec(), b"bob again".to_vec()]);
    }

    #[test]
    fn binary_payload_roundtrip() {
        let bob = AccountKeys::generate();
        let tx_key = KeyPair::generate();
        let payload = [0xff, 0xfe, 0x00, 0x80];

        let sealed = ExtraMessage::encrypt(2, payload, Some(&bob.address), &tx_key).unwrap();
        let opened = sealed
            .decrypt(2, &tx_key.public_key, Some(&bob.spend_secret_key))
            .unwrap();
        assert_eq!(opened, payload);
    }
}
