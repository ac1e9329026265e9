//! Property-based tests for password encryption

use proptest::prelude::*;
use remotedeck_core::crypto::{hash_password, verify_password, EncryptionService};

fn service(passphrase: &str) -> EncryptionService {
    let service = EncryptionService::new();
    service.initialize(Some(passphrase));
    service
}

// ========== Strategies ==========

/// Strategy for generating non-empty plaintexts, including non-ASCII text
fn arb_plaintext() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ -~]{1,64}",
        "\\PC{1,32}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // ========== Round trip ==========

    #[test]
    fn decrypt_inverts_encrypt(plaintext in arb_plaintext()) {
        let service = service("round-trip");
        let blob = service.encrypt(&plaintext).unwrap();
        prop_assert_eq!(service.decrypt(&blob).unwrap(), plaintext);
    }

    #[test]
    fn encryption_is_randomized(plaintext in arb_plaintext()) {
        let service = service("random-iv");
        let first = service.encrypt(&plaintext).unwrap();
        let second = service.encrypt(&plaintext).unwrap();
        prop_assert_ne!(first, second);
    }

    // ========== Ciphertext detection ==========

    #[test]
    fn ciphertext_is_detected(plaintext in arb_plaintext()) {
        let service = service("detect");
        let blob = service.encrypt(&plaintext).unwrap();
        prop_assert!(EncryptionService::is_encrypted_data(&blob));
    }

    #[test]
    fn short_strings_are_plaintext(value in "[A-Za-z0-9+/=]{0,19}") {
        prop_assert!(!EncryptionService::is_encrypted_data(&value));
    }

    #[test]
    fn non_base64_is_plaintext(prefix in "[A-Za-z0-9]{20,40}", bad in "[ !@#$%^&*]") {
        let value = format!("{prefix}{bad}");
        prop_assert!(!EncryptionService::is_encrypted_data(&value));
    }

    // ========== Keys ==========

    #[test]
    fn wrong_key_never_yields_plaintext(plaintext in "[a-z]{8,24}") {
        let blob = service("right").encrypt(&plaintext).unwrap();
        let other = service("wrong").decrypt(&blob);
        prop_assert!(other.map_or(true, |p| p != plaintext));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn password_hash_verifies(password in "[ -~]{1,32}") {
        let stored = hash_password(&password, None).unwrap();
        prop_assert!(verify_password(&password, &stored));
        let wrong = format!("{password}x");
        prop_assert!(!verify_password(&wrong, &stored));
    }
}

#[test]
fn uninitialized_service_refuses_to_encrypt() {
    let service = EncryptionService::new();
    assert!(!service.is_ready());
    assert!(service.encrypt("secret").is_err());
}

#[test]
fn fingerprint_tracks_key() {
    let a = service("alpha");
    let fingerprint = a.key_fingerprint().unwrap();
    assert_eq!(fingerprint.len(), 8);
    assert!(a.verify_key_fingerprint(Some(&fingerprint)).unwrap());
    assert!(!service("beta").verify_key_fingerprint(Some(&fingerprint)).unwrap());
}
