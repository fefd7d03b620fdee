//! AES-256-CBC secret cipher with hex-encoded `iv:ciphertext` output.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use anyhow::{anyhow, Result};
use rand::RngCore;
use sha2::{Digest, Sha256};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Size of the encryption key in bytes (256 bits)
const KEY_SIZE: usize = 32;

/// Size of the CBC IV in bytes (one AES block)
const IV_SIZE: usize = 16;

/// Symmetric cipher for secrets stored in the settings record.
///
/// Stored format is `hex(iv) + ":" + hex(ciphertext)`. The key is either a
/// 64-character hex string (decoded directly to 32 bytes) or an arbitrary
/// secret whose raw bytes are hashed down to 32 bytes. The hash fallback
/// exists for compatibility with hand-entered secrets, not as a KDF
/// recommendation.
#[derive(Clone)]
pub struct SecretCipher {
    key: [u8; KEY_SIZE],
}

impl SecretCipher {
    /// Derive a cipher from the configured secret.
    ///
    /// Fails only when the secret is empty; key material must be injected
    /// explicitly, there is no built-in default.
    pub fn new(secret: &str) -> Result<Self> {
        if secret.trim().is_empty() {
            return Err(anyhow!("encryption key must not be empty"));
        }

        let key: [u8; KEY_SIZE] = match hex::decode(secret) {
            Ok(bytes) if bytes.len() == KEY_SIZE => bytes
                .try_into()
                .map_err(|_| anyhow!("encryption key has invalid length"))?,
            _ => Sha256::digest(secret.as_bytes()).into(),
        };

        Ok(Self { key })
    }

    /// Encrypt a plaintext secret for storage.
    ///
    /// Generates a fresh random 16-byte IV on every call, so encrypting the
    /// same plaintext twice never yields the same output.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        format!("{}:{}", hex::encode(iv), hex::encode(ciphertext))
    }

    /// Attempt to decrypt a stored value.
    ///
    /// Returns `None` for anything that is not a well-formed
    /// `iv_hex:ciphertext_hex` string encrypted under this key: malformed
    /// input, a foreign key, bad padding, or non-UTF8 plaintext. Never
    /// propagates an error past this boundary.
    pub fn try_decrypt(&self, stored: &str) -> Option<String> {
        let (iv_hex, ct_hex) = stored.split_once(':')?;

        let iv_bytes = hex::decode(iv_hex).ok()?;
        let iv: [u8; IV_SIZE] = iv_bytes.try_into().ok()?;
        let ciphertext = hex::decode(ct_hex).ok()?;
        if ciphertext.is_empty() || ciphertext.len() % IV_SIZE != 0 {
            return None;
        }

        let plaintext = Aes256CbcDec::new(&self.key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .ok()?;

        String::from_utf8(plaintext).ok()
    }

    /// Decrypt a stored value, falling back to the value itself.
    ///
    /// Settings written before encryption was enabled (or entered directly
    /// into the database) hold plaintext; those are returned unchanged.
    pub fn decrypt_or_plaintext(&self, stored: &str) -> String {
        match self.try_decrypt(stored) {
            Some(plaintext) => plaintext,
            None => {
                tracing::debug!("stored value is not decryptable, treating as plaintext");
                stored.to_string()
            }
        }
    }
}
