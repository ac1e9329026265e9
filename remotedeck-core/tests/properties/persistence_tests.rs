//! Persistence tests against a real data directory

use std::sync::Arc;

use proptest::prelude::*;
use remotedeck_core::config::{ConfigManager, CONNECTIONS_FILE};
use remotedeck_core::crypto::EncryptionService;
use remotedeck_core::host::LocalHost;
use remotedeck_core::models::{ConnectionConfig, ConnectionGroup, ConnectionProfile, ConnectionType};
use remotedeck_core::testing::ConnectionTester;
use secrecy::SecretString;
use tempfile::TempDir;

fn manager(dir: &TempDir, password: &str) -> ConfigManager {
    let host = Arc::new(LocalHost::with_data_dir(dir.path().to_string_lossy()));
    ConfigManager::new(host, Arc::new(EncryptionService::new()))
        .with_master_password(SecretString::from(password.to_string()))
}

fn sample(password: &str) -> ConnectionConfig {
    let profile = ConnectionProfile::new("db1", ConnectionType::Ssh, "10.0.0.1", 22)
        .with_username("admin")
        .with_password(password);
    ConnectionConfig {
        groups: vec![ConnectionGroup::new("Servers").with_child(profile)],
        ..ConnectionConfig::default()
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn passwords_are_ciphertext_at_rest(password in "[ -~]{1,32}") {
        let dir = TempDir::new().unwrap();
        runtime().block_on(async {
            let manager = manager(&dir, "master");
            manager.save_connections(&sample(&password)).await.unwrap();

            let raw = std::fs::read_to_string(dir.path().join(CONNECTIONS_FILE)).unwrap();
            let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
            let at_rest = stored["groups"][0]["children"][0]["password"].as_str().unwrap();
            assert_ne!(at_rest, password);
            assert!(EncryptionService::is_encrypted_data(at_rest));

            let loaded = manager.load_connections().await.unwrap();
            assert!(loaded.warnings.is_empty());
            assert_eq!(loaded.config.profiles()[0].password, password);
        });
    }
}

#[tokio::test]
async fn save_load_save_keeps_plaintext_tree() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir, "master");
    manager.save_connections(&sample("pass word")).await.unwrap();
    let first = std::fs::read_to_string(dir.path().join(CONNECTIONS_FILE)).unwrap();

    let loaded = manager.load_connections().await.unwrap().config;
    manager.save_connections(&loaded).await.unwrap();
    let second = std::fs::read_to_string(dir.path().join(CONNECTIONS_FILE)).unwrap();
    assert_ne!(first, second, "IVs are re-randomized on every save");

    let reloaded = manager.load_connections().await.unwrap().config;
    assert_eq!(reloaded.groups, loaded.groups);
}

#[tokio::test]
async fn different_master_password_clears_fields() {
    let dir = TempDir::new().unwrap();
    manager(&dir, "first")
        .save_connections(&sample("secret"))
        .await
        .unwrap();

    let other = manager(&dir, "second");
    let loaded = other.load_connections().await.unwrap();
    assert!(other.key_changed());
    assert!(!loaded.warnings.is_empty());
    let profiles = loaded.config.profiles();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].username, "admin");
    assert!(profiles[0].password.is_empty());

    let on_disk = std::fs::read_to_string(dir.path().join(CONNECTIONS_FILE)).unwrap();
    assert!(other.save_connections(&loaded.config).await.is_err());
    assert_eq!(
        std::fs::read_to_string(dir.path().join(CONNECTIONS_FILE)).unwrap(),
        on_disk
    );
    let again = manager(&dir, "first").load_connections().await.unwrap();
    assert_eq!(again.config.profiles()[0].password, "secret");
}

#[tokio::test]
async fn corrupt_file_is_quarantined() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(CONNECTIONS_FILE), "{ not json").unwrap();

    let loaded = manager(&dir, "master").load_connections().await.unwrap();
    assert!(loaded.config.groups.is_empty());
    assert_eq!(loaded.warnings.len(), 1);

    let quarantined = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .any(|e| e.file_name().to_string_lossy().starts_with("connections.json.corrupt-"));
    assert!(quarantined);
}

#[tokio::test]
async fn export_then_import_into_fresh_store() {
    let source_dir = TempDir::new().unwrap();
    let target_dir = TempDir::new().unwrap();
    let export_path = source_dir.path().join("export.json");

    let source = manager(&source_dir, "one");
    let exported = source
        .export_connections(&sample("s3cret"), &export_path, true)
        .await;
    assert!(exported.success);

    let target = manager(&target_dir, "two");
    let imported = target.import_connections(&export_path).await;
    assert!(imported.success, "{imported:?}");
    let summary = imported.data.unwrap();
    assert_eq!(summary.imported, 2);
    assert!(summary.conflicts.is_empty());

    let loaded = target.load_connections().await.unwrap().config;
    assert_eq!(loaded.profiles()[0].password, "s3cret");

    let again = target.import_connections(&export_path).await.data.unwrap();
    assert_eq!(again.imported, 0);
    assert_eq!(again.conflicts.len(), 1);
}

#[tokio::test]
async fn import_without_groups_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"version":"1.0.0"}"#).unwrap();

    let result = manager(&dir, "master").import_connections(&path).await;
    assert!(!result.success);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn unreachable_probe_resolves_within_timeout() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let profile = ConnectionProfile::new("closed", ConnectionType::Ssh, "127.0.0.1", port);
    let tester = ConnectionTester::new().with_timeout(std::time::Duration::from_millis(300));

    let started = std::time::Instant::now();
    let result = tester.test(&profile).await;
    assert!(!result.success);
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
}
