use crate::error::ConfigProtectedError;
use crate::policy::Unprotect;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce, aead::Aead};
use bs58::{decode, encode};
use hmac::{Hmac, Mac};
use rand::{RngCore, thread_rng};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const MASTER_KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Generates a random 32-byte master key and returns it Base58-encoded.
pub fn generate_key() -> String {
    let mut key = [0u8; MASTER_KEY_LEN];
    thread_rng().fill_bytes(&mut key);
    encode(&key).into_string()
}

/// AES-256-GCM protector with per-purpose key separation: each purpose
/// string maps to its own cipher key, derived as HMAC-SHA-256(master_key,
/// purpose). Payloads are Base58 text with the random nonce prepended.
pub struct AesGcmProtector {
    master_key: [u8; MASTER_KEY_LEN],
}

impl AesGcmProtector {
    /// Builds a protector from a Base58-encoded 32-byte master key.
    pub fn new(key: &str) -> Result<Self, ConfigProtectedError> {
        let key_bytes = decode(key)
            .into_vec()
            .map_err(|e| ConfigProtectedError::InvalidEncoding(e.to_string()))?;
        Self::from_bytes(&key_bytes)
    }

    pub fn from_bytes(key_bytes: &[u8]) -> Result<Self, ConfigProtectedError> {
        if key_bytes.len() != MASTER_KEY_LEN {
            return Err(ConfigProtectedError::InvalidKeyLength(key_bytes.len()));
        }
        let mut master_key = [0u8; MASTER_KEY_LEN];
        master_key.copy_from_slice(key_bytes);
        Ok(Self { master_key })
    }

    fn cipher_for(&self, purpose: &str) -> Result<Aes256Gcm, ConfigProtectedError> {
        // Fully qualified: `aes_gcm::KeyInit` is in scope and also provides
        // a `new_from_slice`.
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.master_key)
            .map_err(|_| ConfigProtectedError::InvalidKeyLength(self.master_key.len()))?;
        mac.update(purpose.as_bytes());
        let derived = mac.finalize().into_bytes();

        Aes256Gcm::new_from_slice(derived.as_slice())
            .map_err(|_| ConfigProtectedError::InvalidKeyLength(derived.len()))
    }

    /// Encrypts `plaintext` under the given purpose and returns the Base58
    /// payload text for a `Protected:{...}` token.
    pub fn protect(&self, purpose: &str, plaintext: &str) -> Result<String, ConfigProtectedError> {
        let cipher = self.cipher_for(purpose)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        match cipher.encrypt(nonce, plaintext.as_bytes()) {
            Ok(ciphertext) => {
                let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
                sealed.extend_from_slice(&nonce_bytes);
                sealed.extend_from_slice(&ciphertext);
                Ok(encode(&sealed).into_string())
            }
            Err(_) => Err(ConfigProtectedError::EncryptionFailed),
        }
    }
}

impl Unprotect for AesGcmProtector {
    fn unprotect(&self, purpose: &str, ciphertext: &str) -> Result<String, ConfigProtectedError> {
        let sealed = decode(ciphertext)
            .into_vec()
            .map_err(|e| ConfigProtectedError::InvalidEncoding(e.to_string()))?;
        if sealed.len() < NONCE_LEN {
            return Err(ConfigProtectedError::CiphertextTooShort);
        }

        let (nonce_bytes, body) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        let cipher = self.cipher_for(purpose)?;

        match cipher.decrypt(nonce, body) {
            Ok(plaintext) => String::from_utf8(plaintext)
                .map_err(|e| ConfigProtectedError::InvalidUtf8(e.to_string())),
            Err(_) => Err(ConfigProtectedError::DecryptionFailed),
        }
    }
}
