//! `RemoteDeck` Core Library
//!
//! This crate provides the core of the `RemoteDeck` remote-access launcher:
//! the connection tree model, password encryption, persistence through a
//! host shell, import merging, and launching external clients.

pub mod config;
pub mod crypto;
pub mod error;
pub mod host;
pub mod import;
pub mod launcher;
pub mod models;
pub mod protocol;
pub mod result;
pub mod testing;

pub use config::{AppSettings, ClientConfig, ConfigManager, LoadedConnections};
pub use crypto::{EncryptionService, KeySource};
pub use error::{
    ConfigError, ConfigResult, CryptoError, CryptoResult, ImportError, ImportResult, LaunchError,
    LaunchResult, RemoteDeckError,
};
pub use host::{HostShell, LocalHost, MemoryHost};
pub use import::{ConflictAction, ConflictInfo, ImportSummary};
pub use launcher::{ClientLauncher, LaunchPlan};
pub use models::{
    ConnectionConfig, ConnectionGroup, ConnectionProfile, ConnectionType, ProtocolOptions,
    SearchFilter, TreeNode, DEFAULT_PORTS,
};
pub use protocol::{Protocol, ProtocolRegistry};
pub use result::OperationResult;
pub use testing::{ConnectionTestResult, ConnectionTester};
