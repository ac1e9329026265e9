//! Key derivation.
//!
//! A key comes either from a user passphrase (PBKDF2-HMAC-SHA256 with a fixed
//! application salt) or, when no passphrase is configured, from a machine
//! fingerprint hashed with SHA-256.
//!
//! The fingerprint is built from the OS name, the locale and the UTC offset.
//! Anyone with local access can recompute it, so a fingerprint key only keeps
//! passwords out of casual view of the JSON file. It is not a defence against
//! a local attacker. It is kept stable because changing the inputs would make
//! every existing ciphertext undecryptable.
//!
//! The UTC offset is read at derivation time, so in time zones with daylight
//! saving the fingerprint key differs between summer and winter. Data saved
//! on one side of a transition fails the key fingerprint check on the other.
//! Configure a master password to avoid this.

use std::fmt::Write as _;
use std::num::NonZeroU32;

use ring::{digest, pbkdf2};

/// Length of the derived symmetric key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// Length of the CBC initialization vector in bytes
pub const IV_LEN: usize = 16;

/// PBKDF2 iteration count for passphrase-derived keys and password hashes
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Application salt for passphrase-derived keys
const APP_SALT: &[u8] = b"RemoteDeck-Salt-v1";

/// Version marker mixed into the machine fingerprint
const FINGERPRINT_TAG: &str = "RemoteDeck-v1.0";

/// Number of hex characters kept from the key digest
const KEY_FINGERPRINT_LEN: usize = 8;

/// Raw key bytes
pub type KeyBytes = [u8; KEY_LEN];

fn iterations() -> NonZeroU32 {
    NonZeroU32::new(PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN)
}

/// PBKDF2-HMAC-SHA256 into `out`
pub(crate) fn pbkdf2_sha256(secret: &[u8], salt: &[u8], out: &mut [u8]) {
    pbkdf2::derive(pbkdf2::PBKDF2_HMAC_SHA256, iterations(), salt, secret, out);
}

/// Derives a key from a passphrase; the same passphrase always gives the same key
#[must_use]
pub fn derive_from_passphrase(passphrase: &str) -> KeyBytes {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_sha256(passphrase.as_bytes(), APP_SALT, &mut key);
    key
}

/// Derives a key from a fingerprint string
#[must_use]
pub fn derive_from_fingerprint(fingerprint: &str) -> KeyBytes {
    let hash = digest::digest(&digest::SHA256, fingerprint.as_bytes());
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(hash.as_ref());
    key
}

/// Builds the fingerprint of the current machine: `os|locale|tz|tag`
#[must_use]
pub fn machine_fingerprint() -> String {
    let locale = ["LC_ALL", "LC_MESSAGES", "LANG"]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| "en_US".to_string());
    // Minutes west of UTC, so UTC+2 is -120
    let offset_minutes = -chrono::Local::now().offset().local_minus_utc() / 60;
    format!(
        "{}|{}|{}|{}",
        std::env::consts::OS,
        locale,
        offset_minutes,
        FINGERPRINT_TAG
    )
}

/// Short fingerprint of a key, persisted to detect silent key changes
#[must_use]
pub fn key_fingerprint(key: &KeyBytes) -> String {
    let hash = digest::digest(&digest::SHA256, key);
    to_hex(hash.as_ref())[..KEY_FINGERPRINT_LEN].to_string()
}

/// Lowercase hex encoding
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Decodes lowercase or uppercase hex
pub(crate) fn from_hex(value: &str) -> Option<Vec<u8>> {
    if value.len() % 2 != 0 {
        return None;
    }
    (0..value.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(value.get(i..i + 2)?, 16).ok())
        .collect()
}
