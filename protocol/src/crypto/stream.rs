//! ChaCha8 keystream with a 64-bit nonce.
//!
//! The nonce occupies the last eight bytes of the 96-bit IETF nonce with the
//! first four left at zero, which reproduces the original 64-bit-nonce
//! ChaCha keystream for any payload shorter than 256 GiB.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::{ChaCha8, Key, Nonce};

/// XORs the ChaCha8 keystream for `(key, nonce)` into `data`.
///
/// Encryption and decryption are the same call.
pub fn chacha8(key: &[u8; 32], nonce: u64, data: &mut [u8]) {
    let mut iv = [0u8; 12];
    iv[4..].copy_from_slice(&nonce.to_le_bytes());
    let mut cipher = ChaCha8::new(Key::from_slice(key), Nonce::from_slice(&iv));
    cipher.apply_keystream(data);
}
