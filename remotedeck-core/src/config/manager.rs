//! Configuration manager for JSON file operations
//!
//! This module provides the `ConfigManager`, which loads and saves the
//! connection tree and application settings through the host, encrypting
//! and decrypting password fields on the way. It also implements export,
//! import and backup.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::document::{ExportDocument, ExportInfo, RawConnections, StoredConnections};
use super::settings::AppSettings;
use crate::crypto::EncryptionService;
use crate::error::{ConfigError, ConfigResult, CryptoError, ImportError, ImportResult};
use crate::host::HostShell;
use crate::import::{self, ConflictAction, ConflictInfo, ImportSummary};
use crate::models::tree::{strip_passwords, transform_groups, NodeTransform};
use crate::models::{ConnectionConfig, ConnectionGroup, ConnectionProfile};
use crate::result::OperationResult;

/// File names inside the data directory
pub const CONNECTIONS_FILE: &str = "connections.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const FINGERPRINT_FILE: &str = "encryption-key-fingerprint.txt";
pub const BACKUP_DIR: &str = "backups";

/// A loaded configuration plus the problems that were recovered from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConnections {
    pub config: ConnectionConfig,
    /// User-facing warnings (corruption, cleared fields, key change)
    pub warnings: Vec<String>,
}

/// Encrypts every password before writing
struct EncryptPasswords<'a>(&'a EncryptionService);

impl NodeTransform for EncryptPasswords<'_> {
    type Error = CryptoError;

    fn profile(&mut self, mut profile: ConnectionProfile) -> Result<ConnectionProfile, CryptoError> {
        profile.password = self.0.encrypt(&profile.password)?;
        Ok(profile)
    }
}

/// Decrypts passwords after reading; a bad field is cleared, only a missing
/// key aborts the pass
struct DecryptPasswords<'a> {
    crypto: &'a EncryptionService,
    cleared: usize,
}

impl NodeTransform for DecryptPasswords<'_> {
    type Error = CryptoError;

    fn profile(&mut self, mut profile: ConnectionProfile) -> Result<ConnectionProfile, CryptoError> {
        if profile.password.is_empty() {
            return Ok(profile);
        }
        if !EncryptionService::is_encrypted_data(&profile.password) {
            debug!(connection = %profile.name, "Keeping legacy plaintext password");
            return Ok(profile);
        }
        match self.crypto.decrypt(&profile.password) {
            Ok(plaintext) => profile.password = plaintext,
            Err(CryptoError::NotInitialized) => return Err(CryptoError::NotInitialized),
            Err(e) => {
                warn!(connection = %profile.name, error = %e, "Password could not be decrypted; cleared");
                profile.password.clear();
                self.cleared += 1;
            }
        }
        Ok(profile)
    }
}

/// Configuration manager for `RemoteDeck`
///
/// Owns the persisted state. The data directory is resolved once, on first
/// use, and cached; concurrent first calls wait for the same resolution.
pub struct ConfigManager {
    host: Arc<dyn HostShell>,
    crypto: Arc<EncryptionService>,
    master_password: Option<SecretString>,
    data_dir: OnceCell<PathBuf>,
    key_mismatch: AtomicBool,
    /// Passwords the last load cleared because the key changed
    unreadable_passwords: AtomicUsize,
    discard_unreadable: AtomicBool,
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("data_dir", &self.data_dir.get())
            .field("crypto", &self.crypto)
            .finish_non_exhaustive()
    }
}

impl ConfigManager {
    /// Creates a manager; nothing is resolved until the first operation
    #[must_use]
    pub fn new(host: Arc<dyn HostShell>, crypto: Arc<EncryptionService>) -> Self {
        Self {
            host,
            crypto,
            master_password: None,
            data_dir: OnceCell::new(),
            key_mismatch: AtomicBool::new(false),
            unreadable_passwords: AtomicUsize::new(0),
            discard_unreadable: AtomicBool::new(false),
        }
    }

    /// Derives the key from a master passphrase instead of the machine
    /// fingerprint
    #[must_use]
    pub fn with_master_password(mut self, password: SecretString) -> Self {
        self.master_password = Some(password);
        self
    }

    /// Returns the encryption service
    #[must_use]
    pub fn crypto(&self) -> &Arc<EncryptionService> {
        &self.crypto
    }

    /// Returns the host
    #[must_use]
    pub fn host(&self) -> &Arc<dyn HostShell> {
        &self.host
    }

    /// Returns the data directory once resolved
    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.get().map(PathBuf::as_path)
    }

    /// True if the stored key fingerprint did not match the derived key
    #[must_use]
    pub fn key_changed(&self) -> bool {
        self.key_mismatch.load(Ordering::SeqCst)
    }

    /// Number of stored passwords the last load could not decrypt after a
    /// key change; saving while this is non-zero is refused
    #[must_use]
    pub fn unreadable_passwords(&self) -> usize {
        self.unreadable_passwords.load(Ordering::SeqCst)
    }

    /// Allows saves that overwrite passwords the current key cannot read
    pub fn discard_unreadable_passwords(&self) {
        warn!(
            count = self.unreadable_passwords(),
            "Undecryptable passwords will be erased on the next save"
        );
        self.discard_unreadable.store(true, Ordering::SeqCst);
    }

    fn ensure_writable(&self) -> ConfigResult<()> {
        let count = self.unreadable_passwords();
        if count > 0 && !self.discard_unreadable.load(Ordering::SeqCst) {
            return Err(ConfigError::UnreadablePasswords(count));
        }
        Ok(())
    }

    /// Resolves the data directory, derives the key and checks the key
    /// fingerprint; later calls return the cached directory
    ///
    /// # Errors
    ///
    /// Returns an error if the host has no data directory or the fingerprint
    /// file cannot be read or written.
    pub async fn initialize(&self) -> ConfigResult<&Path> {
        let dir = self
            .data_dir
            .get_or_try_init(|| async {
                let dir = self.host.user_data_path()?;
                if !self.crypto.is_ready() {
                    self.crypto.initialize(
                        self.master_password
                            .as_ref()
                            .map(|p| p.expose_secret()),
                    );
                }
                self.check_key_fingerprint(&dir).await?;
                info!(dir = %dir.display(), "Configuration store initialized");
                Ok::<_, ConfigError>(dir)
            })
            .await?;
        Ok(dir.as_path())
    }

    async fn check_key_fingerprint(&self, dir: &Path) -> ConfigResult<()> {
        let stored = self.host.read_file(dir, FINGERPRINT_FILE).await?;
        match stored {
            None => self.write_key_fingerprint(dir).await,
            Some(stored) => {
                if !self.crypto.verify_key_fingerprint(Some(&stored))? {
                    self.key_mismatch.store(true, Ordering::SeqCst);
                }
                Ok(())
            }
        }
    }

    async fn write_key_fingerprint(&self, dir: &Path) -> ConfigResult<()> {
        let fingerprint = self.crypto.key_fingerprint()?;
        self.write(dir, FINGERPRINT_FILE, &fingerprint).await?;
        debug!("Stored encryption key fingerprint");
        Ok(())
    }

    async fn write(&self, dir: &Path, name: &str, content: &str) -> ConfigResult<()> {
        self.host.write_file(dir, name, content).await.map_err(|e| {
            ConfigError::Write(format!("Failed to write {}: {e}", dir.join(name).display()))
        })
    }

    fn to_json<T: Serialize>(value: &T) -> ConfigResult<String> {
        serde_json::to_string_pretty(value)
            .map_err(|e| ConfigError::Serialize(format!("Failed to serialize: {e}")))
    }

    // ========== Connections ==========

    /// Loads the connection tree and settings
    ///
    /// A missing file gives an empty tree. A file that is not valid JSON is
    /// copied aside and replaced by an empty tree with a warning. Nodes that
    /// do not parse are dropped one by one, with a warning each and a copy
    /// of the file set aside. Passwords that fail to decrypt are cleared one
    /// by one; duplicate ids are repaired.
    ///
    /// # Errors
    ///
    /// Returns an error only if the data directory cannot be resolved or the
    /// file exists but cannot be read.
    pub async fn load_connections(&self) -> ConfigResult<LoadedConnections> {
        let dir = self.initialize().await?.to_path_buf();
        self.unreadable_passwords.store(0, Ordering::SeqCst);
        let mut warnings = Vec::new();
        if self.key_changed() {
            warnings.push(
                "The encryption key changed since the data was saved; stored passwords may not decrypt"
                    .to_string(),
            );
        }

        let settings = match self.read_settings().await {
            Ok((settings, rejected)) => {
                warnings.extend(
                    rejected
                        .into_iter()
                        .map(|key| format!("Setting '{key}' was invalid and reset to its default")),
                );
                settings
            }
            Err(e) => {
                warn!(error = %e, "Settings unreadable, using defaults");
                warnings.push(format!("Settings could not be loaded ({e}); defaults are used"));
                AppSettings::default()
            }
        };
        let empty = ConnectionConfig::with_settings(settings.clone());

        let Some(content) = self.host.read_file(&dir, CONNECTIONS_FILE).await? else {
            debug!("No connections file yet");
            return Ok(LoadedConnections { config: empty, warnings });
        };

        let stored: RawConnections = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Connections file corrupted");
                self.quarantine(&dir, &content).await;
                warnings.push(format!(
                    "The connections file is corrupted ({e}); starting with an empty configuration"
                ));
                return Ok(LoadedConnections { config: empty, warnings });
            }
        };

        let mut skipped = Vec::new();
        let groups: Vec<ConnectionGroup> = stored
            .groups
            .into_iter()
            .filter_map(|group| ConnectionGroup::salvage(group, &mut skipped))
            .collect();
        if !skipped.is_empty() {
            warn!(skipped = skipped.len(), "Malformed nodes dropped from the connections file");
            self.quarantine(&dir, &content).await;
            warnings.extend(
                skipped
                    .into_iter()
                    .map(|reason| format!("Skipped a malformed entry: {reason}")),
            );
        }

        let mut decrypt = DecryptPasswords {
            crypto: &self.crypto,
            cleared: 0,
        };
        let groups = match transform_groups(groups, &mut decrypt) {
            Ok(groups) => groups,
            Err(e) => {
                error!(error = %e, "Decrypting the connection tree failed");
                warnings.push(format!(
                    "Stored connections could not be decrypted ({e}); starting with an empty configuration"
                ));
                return Ok(LoadedConnections { config: empty, warnings });
            }
        };
        if decrypt.cleared > 0 {
            warnings.push(format!(
                "{} password(s) could not be decrypted and were cleared",
                decrypt.cleared
            ));
            if self.key_changed() {
                self.unreadable_passwords
                    .store(decrypt.cleared, Ordering::SeqCst);
            }
        }

        let mut config = ConnectionConfig {
            version: stored.version,
            groups,
            settings,
        };
        let repaired = config.repair_duplicate_ids();
        if repaired > 0 {
            warn!(repaired, "Duplicate node ids were reassigned");
            warnings.push(format!("{repaired} duplicate id(s) were reassigned"));
        }

        let (groups, profiles) = config.counts();
        debug!(groups, profiles, "Loaded connections");
        Ok(LoadedConnections { config, warnings })
    }

    /// Copies an unparseable or partly unparseable connections file aside
    async fn quarantine(&self, dir: &Path, content: &str) {
        let name = format!(
            "{CONNECTIONS_FILE}.corrupt-{}",
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        match self.host.write_file(dir, &name, content).await {
            Ok(()) => warn!(backup = %name, "Corrupted connections file backed up"),
            Err(e) => error!(error = %e, "Failed to back up corrupted connections file"),
        }
    }

    /// Saves the connection tree with every password encrypted
    ///
    /// The caller's tree is left untouched (plaintext).
    ///
    /// # Errors
    ///
    /// Returns an error if encryption, serialization or writing fails, or
    /// [`ConfigError::UnreadablePasswords`] if the last load cleared
    /// passwords under a changed key and that loss was not accepted with
    /// [`discard_unreadable_passwords`](Self::discard_unreadable_passwords).
    pub async fn save_connections(&self, config: &ConnectionConfig) -> ConfigResult<()> {
        let dir = self.initialize().await?.to_path_buf();
        self.ensure_writable()?;
        let groups = transform_groups(config.groups.clone(), &mut EncryptPasswords(&self.crypto))?;
        let document = StoredConnections {
            version: config.version.clone(),
            groups,
        };
        self.write(&dir, CONNECTIONS_FILE, &Self::to_json(&document)?)
            .await?;
        let (groups, profiles) = config.counts();
        debug!(groups, profiles, "Saved connections");
        Ok(())
    }

    /// Records a launch of the profile and persists the tree
    ///
    /// # Errors
    ///
    /// Returns an error if the profile does not exist or saving fails.
    pub async fn record_connection(&self, config: &mut ConnectionConfig, id: &str) -> ConfigResult<()> {
        config.record_connection(id)?;
        self.save_connections(config).await
    }

    // ========== Settings ==========

    /// Loads settings; stored values are laid over the defaults key by key
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not a
    /// JSON object.
    pub async fn load_settings(&self) -> ConfigResult<AppSettings> {
        Ok(self.read_settings().await?.0)
    }

    /// Settings plus the keys that fell back to their defaults
    async fn read_settings(&self) -> ConfigResult<(AppSettings, Vec<String>)> {
        let dir = self.initialize().await?.to_path_buf();
        let Some(content) = self.host.read_file(&dir, SETTINGS_FILE).await? else {
            return Ok((AppSettings::default(), Vec::new()));
        };
        let stored: Map<String, Value> = serde_json::from_str(&content).map_err(|e| {
            ConfigError::Deserialize(format!("Failed to parse {SETTINGS_FILE}: {e}"))
        })?;
        let (settings, rejected) = AppSettings::merge_stored(stored);
        for key in &rejected {
            warn!(%key, "Invalid setting value; default used");
        }
        Ok((settings, rejected))
    }

    /// Saves settings
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn save_settings(&self, settings: &AppSettings) -> ConfigResult<()> {
        let dir = self.initialize().await?.to_path_buf();
        self.write(&dir, SETTINGS_FILE, &Self::to_json(settings)?)
            .await
    }

    // ========== Export / Import / Backup ==========

    /// Writes `{version, groups}` to `destination`
    ///
    /// Without `include_passwords` every password is blanked. With it,
    /// passwords are written in plaintext and the document is marked with
    /// `exportInfo.passwordEncrypted = false`.
    pub async fn export_connections(
        &self,
        config: &ConnectionConfig,
        destination: &Path,
        include_passwords: bool,
    ) -> OperationResult<PathBuf> {
        match self
            .try_export(config, destination, include_passwords)
            .await
        {
            Ok(()) => {
                info!(path = %destination.display(), include_passwords, "Exported connections");
                OperationResult::ok(destination.to_path_buf())
            }
            Err(e) => {
                error!(error = %e, "Export failed");
                OperationResult::failure("Export failed", Some(e.to_string()))
            }
        }
    }

    async fn try_export(
        &self,
        config: &ConnectionConfig,
        destination: &Path,
        include_passwords: bool,
    ) -> ConfigResult<()> {
        let (dir, name) = split_path(destination)?;
        let document = ExportDocument {
            version: config.version.clone(),
            groups: if include_passwords {
                config.groups.clone()
            } else {
                strip_passwords(&config.groups)
            },
            export_info: include_passwords.then(|| ExportInfo::plaintext(&config.version)),
        };
        self.write(dir, name, &Self::to_json(&document)?).await
    }

    /// Imports a document and merges it into the stored tree
    ///
    /// Conflicting profiles are reported with action `skip` and left alone;
    /// see [`apply_resolutions`](Self::apply_resolutions).
    pub async fn import_connections(&self, source: &Path) -> OperationResult<ImportSummary> {
        match self.try_import(source).await {
            Ok(summary) => {
                info!(
                    imported = summary.imported,
                    conflicts = summary.conflicts.len(),
                    "Import finished"
                );
                OperationResult::ok(summary)
            }
            Err(e) => {
                error!(error = %e, "Import failed");
                OperationResult::failure("Import failed", Some(e.to_string()))
            }
        }
    }

    async fn try_import(&self, source: &Path) -> ImportResult<ImportSummary> {
        self.initialize()
            .await
            .map_err(|e| ImportError::Load(e.to_string()))?;
        let (dir, name) =
            split_path(source).map_err(|_| ImportError::FileNotFound(source.to_path_buf()))?;
        let content = self
            .host
            .read_file(dir, name)
            .await?
            .ok_or_else(|| ImportError::FileNotFound(source.to_path_buf()))?;
        let document = import::parse_document(&content)?;
        let declared_plaintext = document.declares_plaintext();

        let (groups, cleared) =
            import::normalize_passwords(document.groups, &self.crypto, declared_plaintext);
        if cleared > 0 {
            warn!(cleared, "Some imported passwords were cleared");
        }

        let mut config = self
            .load_connections()
            .await
            .map_err(|e| ImportError::Load(e.to_string()))?
            .config;
        let outcome = import::merge_groups(&mut config.groups, groups);
        self.save_connections(&config).await?;
        Ok(outcome.into())
    }

    /// Applies caller-chosen resolutions to conflicts from an import and
    /// saves; returns how many changed the tree
    ///
    /// # Errors
    ///
    /// Returns an error if loading, resolving or saving fails.
    pub async fn apply_resolutions(
        &self,
        resolutions: &[(ConflictInfo, ConflictAction)],
    ) -> ConfigResult<usize> {
        let mut config = self.load_connections().await?.config;
        let mut changed = 0;
        for (conflict, action) in resolutions {
            if import::resolve_conflict(&mut config, conflict, *action)? {
                changed += 1;
            }
        }
        if changed > 0 {
            self.save_connections(&config).await?;
        }
        Ok(changed)
    }

    /// Exports the stored tree, passwords included, to
    /// `backups/backup-<timestamp>.json`
    pub async fn create_backup(&self) -> OperationResult<PathBuf> {
        let loaded = match self.load_connections().await {
            Ok(loaded) => loaded,
            Err(e) => return OperationResult::failure("Backup failed", Some(e.to_string())),
        };
        let Some(dir) = self.data_dir() else {
            return OperationResult::failure("Backup failed", None);
        };
        let destination = dir.join(BACKUP_DIR).join(backup_file_name());
        self.export_connections(&loaded.config, &destination, true)
            .await
    }

    // ========== Key management ==========

    /// Re-keys the store
    ///
    /// The tree is decrypted with the current key and saved under the new
    /// one. Returns false, changing nothing, if `old` does not derive the
    /// current key (`None` for the machine key).
    ///
    /// # Errors
    ///
    /// Returns an error if loading or saving fails.
    pub async fn change_master_password(&self, old: Option<&str>, new: &str) -> ConfigResult<bool> {
        let dir = self.initialize().await?.to_path_buf();
        let loaded = self.load_connections().await?;
        self.ensure_writable()?;
        if !self.crypto.change_master_password(old, new)? {
            return Ok(false);
        }
        self.save_connections(&loaded.config).await?;
        self.write_key_fingerprint(&dir).await?;
        self.key_mismatch.store(false, Ordering::SeqCst);
        info!("Master password changed");
        Ok(true)
    }
}

/// `backup-2024-05-01T10-20-30-123Z.json`
fn backup_file_name() -> String {
    format!("backup-{}.json", Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

fn split_path(path: &Path) -> ConfigResult<(&Path, &str)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ConfigError::Validation {
            field: "path".to_string(),
            reason: format!("{} has no file name", path.display()),
        })?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok((dir, name))
}

/// Convenience for callers that hold root groups only
#[must_use]
pub fn config_from_groups(groups: Vec<ConnectionGroup>) -> ConnectionConfig {
    ConnectionConfig {
        groups,
        ..ConnectionConfig::default()
    }
}
