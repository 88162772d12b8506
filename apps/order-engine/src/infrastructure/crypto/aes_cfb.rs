//! AES in full-block CFB mode over `base64(iv || ciphertext)`.

use aes::{Aes128, Aes192, Aes256};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use cfb_mode::{Decryptor, Encryptor};
use rand::Rng;

use crate::application::ports::{CipherError, SecretCipher};

const IV_LEN: usize = 16;

/// Decrypts API secrets stored by the key-registration flow. The key length
/// selects AES-128, AES-192 or AES-256.
#[derive(Clone)]
pub struct AesCfbCipher {
    key: Vec<u8>,
}

impl std::fmt::Debug for AesCfbCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesCfbCipher")
            .field("key_bits", &(self.key.len() * 8))
            .finish()
    }
}

impl AesCfbCipher {
    /// Create a cipher from the raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyLength` unless the key is 16, 24 or 32 bytes.
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, CipherError> {
        let key = key.into();
        match key.len() {
            16 | 24 | 32 => Ok(Self { key }),
            length => Err(CipherError::InvalidKeyLength { length }),
        }
    }

    /// Encrypt `plaintext` under a fresh random IV.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut iv = [0u8; IV_LEN];
        rand::rng().fill(&mut iv[..]);

        let mut buf = plaintext.as_bytes().to_vec();
        match self.key.len() {
            16 => cipher_init::<Encryptor<Aes128>>(&self.key, &iv)?.encrypt(&mut buf),
            24 => cipher_init::<Encryptor<Aes192>>(&self.key, &iv)?.encrypt(&mut buf),
            _ => cipher_init::<Encryptor<Aes256>>(&self.key, &iv)?.encrypt(&mut buf),
        }

        let mut out = Vec::with_capacity(IV_LEN + buf.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&buf);
        Ok(STANDARD.encode(out))
    }
}

impl SecretCipher for AesCfbCipher {
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let raw = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| CipherError::Malformed {
                message: e.to_string(),
            })?;

        if raw.len() < IV_LEN {
            return Err(CipherError::Malformed {
                message: "ciphertext shorter than one block".to_string(),
            });
        }

        let (iv, body) = raw.split_at(IV_LEN);
        let mut buf = body.to_vec();
        match self.key.len() {
            16 => cipher_init::<Decryptor<Aes128>>(&self.key, iv)?.decrypt(&mut buf),
            24 => cipher_init::<Decryptor<Aes192>>(&self.key, iv)?.decrypt(&mut buf),
            _ => cipher_init::<Decryptor<Aes256>>(&self.key, iv)?.decrypt(&mut buf),
        }

        String::from_utf8(buf).map_err(|_| CipherError::InvalidUtf8)
    }
}

fn cipher_init<C: KeyIvInit>(key: &[u8], iv: &[u8]) -> Result<C, CipherError> {
    C::new_from_slices(key, iv).map_err(|_| CipherError::InvalidKeyLength { length: key.len() })
}
