//! Secret Cipher Adapters
//!
//! Implementations of [`SecretCipher`](crate::application::ports::SecretCipher).

mod aes_cfb;

pub use aes_cfb::AesCfbCipher;
