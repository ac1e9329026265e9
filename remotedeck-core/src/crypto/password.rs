//! Password hashing and random password generation.
//!
//! Independent of the field-encryption key: hashes use their own random
//! salt per call.

use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;

use super::key::{from_hex, pbkdf2_sha256, to_hex};
use crate::error::{CryptoError, CryptoResult};

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Hashes a password as `salt:hash` (both hex)
///
/// When `salt` is `None` a random 16-byte salt is generated.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivation`] if the random source fails.
pub fn hash_password(password: &str, salt: Option<&str>) -> CryptoResult<String> {
    let salt = match salt {
        Some(salt) => salt.to_string(),
        None => {
            let mut bytes = [0u8; SALT_LEN];
            SystemRandom::new()
                .fill(&mut bytes)
                .map_err(|_| CryptoError::KeyDerivation("random salt generation failed".to_string()))?;
            to_hex(&bytes)
        }
    };
    let mut hash = [0u8; HASH_LEN];
    pbkdf2_sha256(password.as_bytes(), salt.as_bytes(), &mut hash);
    Ok(format!("{salt}:{}", to_hex(&hash)))
}

/// Verifies a password against a `salt:hash` string
///
/// Malformed stored values never verify.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected_hex)) = stored.split_once(':') else {
        return false;
    };
    let Some(expected) = from_hex(expected_hex) else {
        return false;
    };
    let mut actual = vec![0u8; expected.len()];
    if actual.is_empty() {
        return false;
    }
    pbkdf2_sha256(password.as_bytes(), salt.as_bytes(), &mut actual);
    actual.as_slice().ct_eq(expected.as_slice()).into()
}

/// Generates a random password from letters, digits and optionally symbols
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivation`] if the random source fails.
pub fn generate_password(length: usize, include_symbols: bool) -> CryptoResult<String> {
    let mut charset = String::from(LOWERCASE);
    charset.push_str(UPPERCASE);
    charset.push_str(DIGITS);
    if include_symbols {
        charset.push_str(SYMBOLS);
    }
    let pool: Vec<char> = charset.chars().collect();

    let rng = SystemRandom::new();
    let mut out = String::with_capacity(length);
    for _ in 0..length {
        let mut buf = [0u8; 4];
        rng.fill(&mut buf)
            .map_err(|_| CryptoError::KeyDerivation("random generation failed".to_string()))?;
        let idx = u32::from_le_bytes(buf) as usize % pool.len();
        out.push(pool[idx]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("correct horse", None).unwrap();
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn test_random_salt_differs() {
        let a = hash_password("pw", None).unwrap();
        let b = hash_password("pw", None).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_explicit_salt_is_deterministic() {
        assert_eq!(
            hash_password("pw", Some("abcd")).unwrap(),
            hash_password("pw", Some("abcd")).unwrap()
        );
    }

    #[test]
    fn test_malformed_stored_hash() {
        assert!(!verify_password("pw", "no-separator"));
        assert!(!verify_password("pw", "salt:not-hex"));
        assert!(!verify_password("pw", "salt:"));
    }

    #[test]
    fn test_truncated_hash_never_verifies() {
        let stored = hash_password("pw", Some("abcd")).unwrap();
        let truncated = &stored[..stored.len() - 2];
        assert!(!verify_password("pw", truncated));
    }

    #[test]
    fn test_generate_password() {
        let pw = generate_password(24, false).unwrap();
        assert_eq!(pw.chars().count(), 24);
        assert!(pw.chars().all(char::is_alphanumeric));
        assert!(generate_password(0, true).unwrap().is_empty());
    }
}
