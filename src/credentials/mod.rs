//! Encryption for third-party secrets at rest.
//!
//! Integration settings carry API keys, OAuth client secrets and refresh
//! tokens. Each secret is encrypted individually with AES-256-CBC and a
//! unique IV, and stored as `hex(iv):hex(ciphertext)` so a value can be
//! decrypted without any surrounding metadata.
//!
//! # Security
//!
//! - 256-bit key, provided at startup (the process refuses to boot without one)
//! - Fresh random 16-byte IV per `encrypt` call (never reused)
//! - Decryption failure is a recoverable condition: callers get `None` from
//!   [`SecretCipher::try_decrypt`] and decide whether to treat the stored
//!   value as plaintext or as absent

mod cipher;

pub use cipher::SecretCipher;
