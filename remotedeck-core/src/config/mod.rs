//! Configuration management for `RemoteDeck`
//!
//! This module provides the `ConfigManager` for loading and saving the
//! connection tree and settings as JSON, plus export, import and backup.

mod document;
mod manager;
pub mod settings;

pub use document::{ExportDocument, ExportInfo, RawConnections, StoredConnections, EXPORTED_BY};
pub use manager::{
    config_from_groups, ConfigManager, LoadedConnections, BACKUP_DIR, CONNECTIONS_FILE,
    FINGERPRINT_FILE, SETTINGS_FILE,
};
pub use settings::{AppSettings, ClientConfig, Language, Theme};
