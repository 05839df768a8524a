//! PIN-based protection for the stored ConnectWise credentials.

pub mod cipher;

pub use cipher::{CredentialCipher, EncryptedSecret, generate_salt};
