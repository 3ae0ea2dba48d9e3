//! Payment ids.
//!
//! A payment id is a 32-byte value the receiver uses to tell incoming
//! payments apart. It travels inside an extra nonce as the sub-tag `0x00`
//! followed by the 32 bytes, and is written by humans as 64 hex digits.

use super::field::{add_extra_nonce_to_extra, find_field, parse_extra, ExtraNonce};
use super::ExtraError;
use crate::config::{HASH_SIZE, TX_EXTRA_NONCE_PAYMENT_ID};
use crate::crypto::keys::Hash;

fn invalid(reason: impl Into<String>) -> ExtraError {
    ExtraError::InvalidPaymentId {
        reason: reason.into(),
    }
}

/// Nonce bytes carrying `payment_id`.
pub fn payment_id_to_nonce(payment_id: &Hash) -> Vec<u8> {
    let mut nonce = Vec::with_capacity(1 + HASH_SIZE);
    nonce.push(TX_EXTRA_NONCE_PAYMENT_ID);
    nonce.extend_from_slice(payment_id.as_bytes());
    nonce
}

/// Extracts a payment id from nonce bytes.
pub fn payment_id_from_nonce(nonce: &[u8]) -> Result<Hash, ExtraError> {
    if nonce.len() != 1 + HASH_SIZE {
        return Err(invalid(format!(
            "nonce is {} byte(s), expected {}",
            nonce.len(),
            1 + HASH_SIZE
        )));
    }
    if nonce[0] != TX_EXTRA_NONCE_PAYMENT_ID {
        return Err(invalid(format!("unexpected nonce sub-tag 0x{:02x}", nonce[0])));
    }
    let mut id = [0u8; HASH_SIZE];
    id.copy_from_slice(&nonce[1..]);
    Ok(Hash(id))
}

/// Parses the 64-hex-digit form.
pub fn parse_payment_id(text: &str) -> Result<Hash, ExtraError> {
    Hash::from_hex(text).map_err(|e| invalid(e.to_string()))
}

/// A fresh extra blob holding only the payment id given in hex.
pub fn create_extra_with_payment_id(text: &str) -> Result<Vec<u8>, ExtraError> {
    let payment_id = parse_payment_id(text)?;
    let mut extra = Vec::new();
    add_extra_nonce_to_extra(&mut extra, &payment_id_to_nonce(&payment_id))?;
    Ok(extra)
}

/// The payment id in the first nonce of `extra`.
pub fn payment_id_from_extra(extra: &[u8]) -> Result<Hash, ExtraError> {
    let fields = parse_extra(extra)?;
    let nonce = find_field::<ExtraNonce>(&fields)?;
    payment_id_from_nonce(&nonce.nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TX_EXTRA_NONCE;

    const ID: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn extra_with_payment_id_layout() {
        let extra = create_extra_with_payment_id(ID).unwrap();
        assert_eq!(extra.len(), 2 + 1 + 32);
        assert_eq!(extra[0], TX_EXTRA_NONCE);
        assert_eq!(extra[1], 33);
        assert_eq!(extra[2], TX_EXTRA_NONCE_PAYMENT_ID);
        assert_eq!(payment_id_from_extra(&extra).unwrap().to_hex(), ID);
    }

    #[test]
    fn bad_hex_is_rejected() {
        assert!(parse_payment_id("xyz").is_err());
        assert!(parse_payment_id(&ID[..62]).is_err());
        assert!(create_extra_with_payment_id("").is_err());
    }

    #[test]
    fn nonce_shape_is_checked() {
        let id = parse_payment_id(ID).unwrap();
        let mut nonce = payment_id_to_nonce(&id);
        assert_eq!(payment_id_from_nonce(&nonce).unwrap(), id);

        nonce[0] = 0x01;
        assert!(matches!(
            payment_id_from_nonce(&nonce),
            Err(ExtraError::InvalidPaymentId { .. })
        ));
        assert!(payment_id_from_nonce(&nonce[..10]).is_err());
    }

    #[test]
    fn no_nonce_means_no_payment_id() {
        assert_eq!(
            payment_id_from_extra(&[]),
            Err(ExtraError::FieldNotFound { field: "nonce" })
        );
    }
}
