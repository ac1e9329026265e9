//! Crypto primitive layer
//!
//! Symmetric encryption of credential fields, key derivation and password
//! hashing.

mod cipher;
pub mod key;
mod password;

pub use cipher::{EncryptionService, KeySource};
pub use password::{generate_password, hash_password, verify_password};
