//! Field encryption service (AES-256-CBC, PKCS7, base64 of IV || ciphertext).

use std::sync::{LazyLock, PoisonError, RwLock};

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretBox};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use super::key::{self, KeyBytes, IV_LEN};
use crate::error::{CryptoError, CryptoResult};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size in bytes
const BLOCK_LEN: usize = 16;

/// Shortest string that could hold base64 of an IV plus one block
const MIN_ENCRYPTED_LEN: usize = 20;

static BASE64_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/]*={0,2}$").ok());

/// Where the active key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// User-supplied master passphrase
    Passphrase,
    /// Machine fingerprint (no passphrase configured)
    MachineFingerprint,
}

struct ActiveKey {
    key: SecretBox<KeyBytes>,
    source: KeySource,
}

/// Symmetric encryption of credential fields
///
/// One instance is created at startup and shared by handle. Every call
/// before [`initialize`](Self::initialize) fails with
/// [`CryptoError::NotInitialized`].
pub struct EncryptionService {
    active: RwLock<Option<ActiveKey>>,
    rng: SystemRandom,
}

impl Default for EncryptionService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("ready", &self.is_ready())
            .field("source", &self.key_source())
            .finish_non_exhaustive()
    }
}

impl EncryptionService {
    /// Creates an uninitialized service
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: RwLock::new(None),
            rng: SystemRandom::new(),
        }
    }

    /// Derives and installs the key
    ///
    /// With `Some(passphrase)` the key is PBKDF2 of the passphrase, otherwise
    /// it is derived from the machine fingerprint. Re-initializing with the
    /// same input installs the same key.
    pub fn initialize(&self, master_password: Option<&str>) {
        let (key, source) = match master_password.filter(|p| !p.is_empty()) {
            Some(passphrase) => (key::derive_from_passphrase(passphrase), KeySource::Passphrase),
            None => (
                key::derive_from_fingerprint(&key::machine_fingerprint()),
                KeySource::MachineFingerprint,
            ),
        };
        self.install(key, source);
        info!(?source, "Encryption service initialized");
    }

    fn install(&self, key: KeyBytes, source: KeySource) {
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(ActiveKey {
            key: SecretBox::new(Box::new(key)),
            source,
        });
    }

    /// Returns true once a key has been derived
    pub fn is_ready(&self) -> bool {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns where the active key came from
    pub fn key_source(&self) -> Option<KeySource> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|a| a.source)
    }

    fn with_key<T>(&self, f: impl FnOnce(&KeyBytes) -> CryptoResult<T>) -> CryptoResult<T> {
        let guard = self.active.read().unwrap_or_else(PoisonError::into_inner);
        let active = guard.as_ref().ok_or(CryptoError::NotInitialized)?;
        f(active.key.expose_secret())
    }

    /// Encrypts a string; empty input gives empty output
    ///
    /// Each call draws a fresh random IV, so equal plaintexts give different
    /// ciphertexts.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NotInitialized`] before `initialize`, or
    /// [`CryptoError::Encryption`] if the random source fails.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        self.with_key(|key| {
            let mut iv = [0u8; IV_LEN];
            self.rng
                .fill(&mut iv)
                .map_err(|_| CryptoError::Encryption("random IV generation failed".to_string()))?;
            let cipher = Aes256CbcEnc::new_from_slices(key, &iv)
                .map_err(|e| CryptoError::Encryption(e.to_string()))?;
            let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

            let mut blob = Vec::with_capacity(IV_LEN + ciphertext.len());
            blob.extend_from_slice(&iv);
            blob.extend_from_slice(&ciphertext);
            Ok(STANDARD.encode(blob))
        })
    }

    /// Decrypts a blob produced by [`encrypt`](Self::encrypt); empty input
    /// gives empty output
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NotInitialized`] before `initialize`, or
    /// [`CryptoError::Decryption`] for malformed blobs, bad padding, a wrong
    /// key or non-UTF-8 output.
    pub fn decrypt(&self, blob: &str) -> CryptoResult<String> {
        if blob.is_empty() {
            return Ok(String::new());
        }
        self.with_key(|key| {
            let bytes = STANDARD
                .decode(blob.trim())
                .map_err(|e| CryptoError::Decryption(format!("invalid base64: {e}")))?;
            if bytes.len() < IV_LEN + BLOCK_LEN || (bytes.len() - IV_LEN) % BLOCK_LEN != 0 {
                return Err(CryptoError::Decryption(format!(
                    "ciphertext has invalid length {}",
                    bytes.len()
                )));
            }
            let (iv, ciphertext) = bytes.split_at(IV_LEN);
            let cipher = Aes256CbcDec::new_from_slices(key, iv)
                .map_err(|e| CryptoError::Decryption(e.to_string()))?;
            let plaintext = cipher
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(|_| CryptoError::Decryption("bad padding or wrong key".to_string()))?;
            String::from_utf8(plaintext)
                .map_err(|_| CryptoError::Decryption("plaintext is not valid UTF-8".to_string()))
        })
    }

    /// Heuristic: does `value` look like output of [`encrypt`](Self::encrypt)?
    ///
    /// True only for base64 text of at least 20 characters that decodes to
    /// an IV followed by a whole number of cipher blocks. Used on load and
    /// import to tell legacy plaintext from ciphertext.
    #[must_use]
    pub fn is_encrypted_data(value: &str) -> bool {
        if value.len() < MIN_ENCRYPTED_LEN {
            return false;
        }
        let Some(pattern) = BASE64_PATTERN.as_ref() else {
            return false;
        };
        if !pattern.is_match(value) {
            return false;
        }
        STANDARD.decode(value).is_ok_and(|bytes| {
            bytes.len() >= IV_LEN + BLOCK_LEN && (bytes.len() - IV_LEN) % BLOCK_LEN == 0
        })
    }

    /// Decrypts `value` if it looks encrypted, otherwise returns it unchanged
    ///
    /// # Errors
    ///
    /// Propagates decryption errors for values that look encrypted.
    pub fn decrypt_if_encrypted(&self, value: &str) -> CryptoResult<String> {
        if Self::is_encrypted_data(value) {
            self.decrypt(value)
        } else {
            Ok(value.to_string())
        }
    }

    /// Short fingerprint of the active key
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NotInitialized`] before `initialize`.
    pub fn key_fingerprint(&self) -> CryptoResult<String> {
        self.with_key(|key| Ok(key::key_fingerprint(key)))
    }

    /// Compares the active key against a stored fingerprint
    ///
    /// `None` (nothing stored yet) counts as a match.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NotInitialized`] before `initialize`.
    pub fn verify_key_fingerprint(&self, stored: Option<&str>) -> CryptoResult<bool> {
        let current = self.key_fingerprint()?;
        Ok(match stored.map(str::trim) {
            None | Some("") => true,
            Some(stored) => {
                let matches = stored == current;
                if !matches {
                    warn!("Encryption key fingerprint changed; existing data may not decrypt");
                }
                matches
            }
        })
    }

    /// Replaces the key if `old` derives the active key
    ///
    /// `old = None` means the current key came from the machine fingerprint.
    /// Returns false (and keeps the current key) when `old` does not match.
    /// Data encrypted under the old key is not touched here.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NotInitialized`] before `initialize`.
    pub fn change_master_password(&self, old: Option<&str>, new: &str) -> CryptoResult<bool> {
        let candidate = match old.filter(|p| !p.is_empty()) {
            Some(passphrase) => key::derive_from_passphrase(passphrase),
            None => key::derive_from_fingerprint(&key::machine_fingerprint()),
        };
        let matches = self.with_key(|current| {
            Ok(bool::from(current[..].ct_eq(&candidate[..])))
        })?;
        if !matches {
            debug!("Master password change rejected: old password does not match");
            return Ok(false);
        }
        self.initialize(Some(new));
        Ok(true)
    }

    /// Forgets the key; the service is not ready afterwards
    pub fn cleanup(&self) {
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
        debug!("Encryption key cleared");
    }
}
