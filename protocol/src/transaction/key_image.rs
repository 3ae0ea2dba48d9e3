//! Recovering the one-time key pair and key image of an owned output.

use crate::account::AccountKeys;
use crate::crypto::derivation::{
    derive_public_key, derive_secret_key, generate_key_derivation, generate_key_image,
};
use crate::crypto::keys::{CryptoError, KeyImage, KeyPair, PublicKey};

/// One-time key pair and key image of the output at `real_output_index` in
/// the transaction whose public key is `tx_public_key`.
///
/// The caller must compare the returned public key with the output key it
/// expects; a mismatch means the output does not belong to `account` or
/// the index is wrong.
pub fn generate_key_image_helper(
    account: &AccountKeys,
    tx_public_key: &PublicKey,
    real_output_index: usize,
) -> Result<(KeyPair, KeyImage), CryptoError> {
    let derivation = generate_key_derivation(tx_public_key, &account.view_secret_key)?;
    let public_key = derive_public_key(
        &derivation,
        real_output_index,
        &account.address.spend_public_key,
    )?;
    let secret_key = derive_secret_key(&derivation, real_output_index, &account.spend_secret_key)?;
    let image = generate_key_image(&public_key, &secret_key)?;

    Ok((
        KeyPair {
            public_key,
            secret_key,
        },
        image,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::secret_key_to_public_key;

    #[test]
    fn ephemeral_pair_is_consistent() {
        let account = AccountKeys::generate();
        let tx_key = KeyPair::generate();
        let (ephemeral, _) = generate_key_image_helper(&account, &tx_key.public_key, 2).unwrap();
        assert_eq!(
            secret_key_to_public_key(&ephemeral.secret_key).unwrap(),
            ephemeral.public_key
        );
    }

    #[test]
    fn key_image_is_deterministic() {
        let account = AccountKeys::generate();
        let tx_key = KeyPair::generate();
        let (_, a) = generate_key_image_helper(&account, &tx_key.public_key, 0).unwrap();
        let (_, b) = generate_key_image_helper(&account, &tx_key.public_key, 0).unwrap();
        assert_eq!(a, b);

        let (_, c) = generate_key_image_helper(&account, &tx_key.public_key, 1).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn matches_the_sender_side_output_key() {
        let account = AccountKeys::generate();
        let tx_key = KeyPair::generate();
        let d = generate_key_derivation(&account.address.view_public_key, &tx_key.secret_key)
            .unwrap();
        let output_key = derive_public_key(&d, 5, &account.address.spend_public_key).unwrap();

        let (ephemeral, _) = generate_key_image_helper(&account, &tx_key.public_key, 5).unwrap();
        assert_eq!(ephemeral.public_key, output_key);
    }

    #[test]
    fn invalid_transaction_key_fails() {
        let account = AccountKeys::generate();
        assert_eq!(
            generate_key_image_helper(&account, &PublicKey([0xff; 32]), 0),
            Err(CryptoError::InvalidPublicKey)
        );
    }
}
