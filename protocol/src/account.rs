//! Account key material as the transaction layer sees it.
//!
//! An account is two key pairs. The **view** pair lets its holder recognise
//! incoming outputs; the **spend** pair is needed to actually spend them.
//! Wallet persistence, passwords and address strings are not this crate's
//! business: the builder and the scanner only read these structs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::keys::{secret_key_to_public_key, CryptoError, KeyPair, PublicKey, SecretKey};

/// The public half of an account: what a sender needs to pay it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountPublicAddress {
    pub spend_public_key: PublicKey,
    pub view_public_key: PublicKey,
}

/// Full account keys.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKeys {
    pub address: AccountPublicAddress,
    pub spend_secret_key: SecretKey,
    pub view_secret_key: SecretKey,
}

impl AccountKeys {
    /// Fresh, independent spend and view keys.
    pub fn generate() -> Self {
        let spend = KeyPair::generate();
        let view = KeyPair::generate();
        Self::from_key_pairs(spend, view)
    }

    pub fn from_key_pairs(spend: KeyPair, view: KeyPair) -> Self {
        Self {
            address: AccountPublicAddress {
                spend_public_key: spend.public_key,
                view_public_key: view.public_key,
            },
            spend_secret_key: spend.secret_key,
            view_secret_key: view.secret_key,
        }
    }

    /// Rebuilds an account from its two secret keys.
    pub fn from_secret_keys(
        spend_secret_key: SecretKey,
        view_secret_key: SecretKey,
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            address: AccountPublicAddress {
                spend_public_key: secret_key_to_public_key(&spend_secret_key)?,
                view_public_key: secret_key_to_public_key(&view_secret_key)?,
            },
            spend_secret_key,
            view_secret_key,
        })
    }

    pub fn spend_key_pair(&self) -> KeyPair {
        KeyPair {
            public_key: self.address.spend_public_key,
            secret_key: self.spend_secret_key,
        }
    }

    pub fn view_key_pair(&self) -> KeyPair {
        KeyPair {
            public_key: self.address.view_public_key,
            secret_key: self.view_secret_key,
        }
    }
}

impl fmt::Debug for AccountKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountKeys")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_keys_rebuild_address() {
        let account = AccountKeys::generate();
        let rebuilt =
            AccountKeys::from_secret_keys(account.spend_secret_key, account.view_secret_key)
                .unwrap();
        assert_eq!(account, rebuilt);
    }

    #[test]
    fn spend_and_view_differ() {
        let account = AccountKeys::generate();
        assert_ne!(
            account.address.spend_public_key,
            account.address.view_public_key
        );
    }

    #[test]
    fn debug_hides_secrets() {
        let account = AccountKeys::generate();
        let debug = format!("{:?}", account);
        assert!(!debug.contains(&account.spend_secret_key.to_hex()));
        assert!(!debug.contains(&account.view_secret_key.to_hex()));
    }

    #[test]
    fn address_serde_roundtrip() {
        let account = AccountKeys::generate();
        let json = serde_json::to_string(&account.address).unwrap();
        let back: AccountPublicAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account.address);
    }
}
