//! Credential cipher: Argon2id turns a short PIN plus a stored salt into a
//! ChaCha20-Poly1305 key; each credential string is sealed into a
//! nonce + ciphertext + tag envelope that can sit in the settings JSON.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::TimecardError;

const TAG_SIZE: usize = 16;
const NONCE_SIZE: usize = 12;
const DERIVED_KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 16;
pub const MIN_PIN_LEN: usize = 4;

/// Argon2id cost: 19 MiB, 3 passes, 1 lane.
const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 3;
const PARALLELISM: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncryptedSecret {
    pub nonce: String,
    pub ciphertext: String,
    pub tag: String,
}

/// Fresh random salt for a new PIN.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

pub struct CredentialCipher {
    key: Key,
}

impl CredentialCipher {
    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self, TimecardError> {
        if key_bytes.len() != DERIVED_KEY_LEN {
            return Err(TimecardError::Crypto(
                "invalid key length; expected 32 bytes".to_string(),
            ));
        }
        let mut key = Key::default();
        key.copy_from_slice(key_bytes);
        Ok(Self { key })
    }

    /// Derive the cipher key from a PIN and the salt stored with the settings.
    pub fn derive_from_pin(pin: &str, salt: &[u8]) -> Result<Self, TimecardError> {
        if pin.chars().count() < MIN_PIN_LEN {
            return Err(TimecardError::invalid(format!(
                "PIN must be at least {MIN_PIN_LEN} characters"
            )));
        }

        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, Some(DERIVED_KEY_LEN))
            .map_err(|e| TimecardError::Crypto(format!("argon2 params: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut output = [0u8; DERIVED_KEY_LEN];
        argon2
            .hash_password_into(pin.as_bytes(), salt, &mut output)
            .map_err(|e| TimecardError::Crypto(format!("argon2 derivation failed: {e}")))?;

        let cipher = Self::from_key_bytes(&output);
        output.zeroize();
        cipher
    }

    pub fn encrypt_str(&self, plaintext: &str) -> Result<EncryptedSecret, TimecardError> {
        let cipher = ChaCha20Poly1305::new(&self.key);
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

        let mut sealed = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| TimecardError::Crypto(format!("encryption failed: {e}")))?;
        if sealed.len() < TAG_SIZE {
            return Err(TimecardError::Crypto(
                "ciphertext shorter than authentication tag".to_string(),
            ));
        }
        let tag = sealed.split_off(sealed.len() - TAG_SIZE);

        Ok(EncryptedSecret {
            nonce: STANDARD_NO_PAD.encode(nonce),
            ciphertext: STANDARD_NO_PAD.encode(sealed),
            tag: STANDARD_NO_PAD.encode(tag),
        })
    }

    pub fn decrypt_str(&self, secret: &EncryptedSecret) -> Result<String, TimecardError> {
        let nonce = STANDARD_NO_PAD.decode(secret.nonce.as_bytes())?;
        let ciphertext = STANDARD_NO_PAD.decode(secret.ciphertext.as_bytes())?;
        let tag = STANDARD_NO_PAD.decode(secret.tag.as_bytes())?;

        if nonce.len() != NONCE_SIZE {
            return Err(TimecardError::Crypto("nonce length mismatch".to_string()));
        }

        let mut combined = Vec::with_capacity(ciphertext.len() + tag.len());
        combined.extend_from_slice(&ciphertext);
        combined.extend_from_slice(&tag);

        let cipher = ChaCha20Poly1305::new(&self.key);
        let plain = cipher
            .decrypt(Nonce::from_slice(&nonce), combined.as_ref())
            .map_err(|e| TimecardError::Crypto(format!("decryption failed: {e}")))?;

        String::from_utf8(plain)
            .map_err(|e| TimecardError::Crypto(format!("decrypted value is not UTF-8: {e}")))
    }
}

impl Drop for CredentialCipher {
    fn drop(&mut self) {
        self.key.as_mut_slice().zeroize();
    }
}
