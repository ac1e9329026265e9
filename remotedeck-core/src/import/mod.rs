//! Import of external connection documents
//!
//! Parsing and validation of the document, password normalization and the
//! tree merge. Persisting the merged result is done by
//! [`ConfigManager::import_connections`](crate::config::ConfigManager::import_connections).

mod conflict;
mod merge;

use serde::Serialize;
use tracing::warn;

pub use conflict::{resolve_conflict, ConflictAction, ConflictInfo, ConflictKind};
pub use merge::{merge_groups, MergeOutcome};

use crate::config::ExportDocument;
use crate::crypto::EncryptionService;
use crate::error::{ImportError, ImportResult};
use crate::models::tree::{transform_groups, NodeTransform};
use crate::models::{ConnectionGroup, ConnectionProfile};

/// Returned to the caller after an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub conflicts: Vec<ConflictInfo>,
}

impl From<MergeOutcome> for ImportSummary {
    fn from(outcome: MergeOutcome) -> Self {
        Self {
            imported: outcome.imported,
            conflicts: outcome.conflicts,
        }
    }
}

/// Parses an import document, requiring a `groups` array
///
/// # Errors
///
/// Returns [`ImportError::Parse`] for invalid JSON and
/// [`ImportError::Validation`] when `groups` is missing, is not an array or
/// contains malformed nodes.
pub fn parse_document(content: &str) -> ImportResult<ExportDocument> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ImportError::Parse(e.to_string()))?;
    if !value.get("groups").is_some_and(serde_json::Value::is_array) {
        return Err(ImportError::Validation(
            "document has no groups array".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| ImportError::Validation(e.to_string()))
}

/// Brings every imported password to plaintext
///
/// With `declared_plaintext` (the document says so) passwords are taken as
/// they are. Otherwise a value that looks encrypted is decrypted with the
/// local key and cleared if that fails.
struct PasswordNormalizer<'a> {
    crypto: &'a EncryptionService,
    declared_plaintext: bool,
    cleared: usize,
}

impl NodeTransform for PasswordNormalizer<'_> {
    type Error = std::convert::Infallible;

    fn profile(&mut self, mut profile: ConnectionProfile) -> Result<ConnectionProfile, Self::Error> {
        if self.declared_plaintext || !EncryptionService::is_encrypted_data(&profile.password) {
            return Ok(profile);
        }
        match self.crypto.decrypt(&profile.password) {
            Ok(plaintext) => profile.password = plaintext,
            Err(e) => {
                warn!(connection = %profile.name, error = %e, "Imported password could not be decrypted; cleared");
                profile.password.clear();
                self.cleared += 1;
            }
        }
        Ok(profile)
    }
}

/// Normalizes the passwords of an imported tree; returns the tree and the
/// number of passwords that had to be cleared
pub fn normalize_passwords(
    groups: Vec<ConnectionGroup>,
    crypto: &EncryptionService,
    declared_plaintext: bool,
) -> (Vec<ConnectionGroup>, usize) {
    let mut normalizer = PasswordNormalizer {
        crypto,
        declared_plaintext,
        cleared: 0,
    };
    match transform_groups(groups, &mut normalizer) {
        Ok(groups) => (groups, normalizer.cleared),
        Err(never) => match never {},
    }
}
