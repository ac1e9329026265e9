//! Error types for `RemoteDeck`
//!
//! This module defines all error types used throughout the core library,
//! covering the crypto layer, configuration persistence, import/merge and
//! external client launching.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::ConnectionType;

/// Top-level error type for `RemoteDeck` operations
#[derive(Debug, Error)]
pub enum RemoteDeckError {
    /// Crypto-layer errors
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Client launch errors
    #[error("Launch error: {0}")]
    Launch(#[from] LaunchError),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the symmetric encryption service
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encrypt or decrypt was called before a key was derived
    #[error("Encryption service is not initialized")]
    NotInitialized,

    /// Ciphertext was malformed, had bad padding or the key did not match
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Key derivation failed
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}

/// Errors related to configuration file operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {reason}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// The reason for validation failure
        reason: String,
    },

    /// Configuration directory or node not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to write configuration file
    #[error("Failed to write configuration: {0}")]
    Write(String),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// Failed to deserialize configuration
    #[error("Failed to deserialize configuration: {0}")]
    Deserialize(String),

    /// Saving would overwrite passwords the current key cannot decrypt
    #[error("{0} stored password(s) cannot be decrypted with the current key; refusing to overwrite them")]
    UnreadablePasswords(usize),

    /// Encryption of a field failed while saving
    #[error("Failed to encrypt credentials: {0}")]
    Crypto(#[from] CryptoError),

    /// Backing store could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to importing an external connection document
#[derive(Debug, Error)]
pub enum ImportError {
    /// Import source file is missing or unreadable
    #[error("File not found or unreadable: {0}")]
    FileNotFound(PathBuf),

    /// Document parsed but has the wrong shape
    #[error("Invalid import document: {0}")]
    Validation(String),

    /// Document is not valid JSON
    #[error("Failed to parse import document: {0}")]
    Parse(String),

    /// The current configuration could not be loaded for merging
    #[error("Failed to load current configuration: {0}")]
    Load(String),

    /// The merged configuration could not be persisted
    #[error("Failed to save merged configuration: {0}")]
    Save(#[from] ConfigError),

    /// I/O error during import
    #[error("IO error during import: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to launching external clients
#[derive(Debug, Error)]
pub enum LaunchError {
    /// No protocol handler exists for the connection type
    #[error("Unsupported connection type: {0}")]
    UnsupportedType(String),

    /// No enabled client with a path was configured for the protocol
    #[error("No enabled {protocol} client configured (tried: {tried})")]
    NoClient {
        /// Protocol that was requested
        protocol: ConnectionType,
        /// Candidate client keys that were checked
        tried: String,
    },

    /// The external process failed to start
    #[error("Failed to start {client}: {reason}")]
    SpawnFailed {
        /// Display name of the client
        client: String,
        /// Underlying error message
        reason: String,
    },

    /// The profile is not valid for its protocol
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// The argument template could not be rendered
    #[error("Invalid argument template: {0}")]
    InvalidTemplate(String),
}

/// Result type alias for `RemoteDeck` operations
pub type Result<T> = std::result::Result<T, RemoteDeckError>;

/// Result type alias for crypto operations
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for import operations
pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// Result type alias for launch operations
pub type LaunchResult<T> = std::result::Result<T, LaunchError>;
