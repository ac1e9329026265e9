//! Merge conflicts and their caller-driven resolution.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::models::{ConnectionConfig, ConnectionProfile, TreeNode};

/// What collided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// Same `(name, host)` in the same group
    Connection,
}

/// How a conflict is (or will be) resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictAction {
    /// Keep the existing profile, drop the imported one
    #[default]
    Skip,
    /// Replace the existing profile's fields, keeping its id and creation time
    Overwrite,
    /// Insert the imported profile next to the existing one with a new id
    KeepBoth,
}

impl ConflictAction {
    /// Parses `skip`, `overwrite` or `keep-both`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "skip" => Some(Self::Skip),
            "overwrite" => Some(Self::Overwrite),
            "keep-both" | "keepboth" | "keep_both" => Some(Self::KeepBoth),
            _ => None,
        }
    }
}

/// A collision found while merging an import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictInfo {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    /// Slash-separated group path plus the profile name, e.g. `Servers/db1`
    pub path: String,
    pub existing: ConnectionProfile,
    /// Imported profile with its password already normalized to plaintext
    pub imported: ConnectionProfile,
    /// Always `Skip` when produced by the merge
    pub action: ConflictAction,
}

/// Applies `action` to one conflict; returns true if the tree changed
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if the existing profile is no longer in
/// the tree, or a validation error if the imported profile is invalid.
pub fn resolve_conflict(
    config: &mut ConnectionConfig,
    conflict: &ConflictInfo,
    action: ConflictAction,
) -> ConfigResult<bool> {
    match action {
        ConflictAction::Skip => Ok(false),
        ConflictAction::Overwrite => {
            config.update_profile(&conflict.existing.id, conflict.imported.clone())?;
            info!(path = %conflict.path, "Conflict resolved by overwriting");
            Ok(true)
        }
        ConflictAction::KeepBoth => {
            conflict.imported.validate()?;
            let parent = config
                .parent_group_mut(&conflict.existing.id)
                .ok_or_else(|| ConfigError::NotFound(format!("connection {}", conflict.path)))?;
            parent
                .children
                .push(TreeNode::Profile(conflict.imported.cloned_fresh()));
            parent.touch();
            info!(path = %conflict.path, "Conflict resolved by keeping both");
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConnectionGroup, ConnectionType};

    fn setup() -> (ConnectionConfig, ConflictInfo) {
        let existing = ConnectionProfile::new("db1", ConnectionType::Ssh, "10.0.0.1", 22)
            .with_username("old");
        let mut config = ConnectionConfig::default();
        config
            .groups
            .push(ConnectionGroup::new("Servers").with_child(existing.clone()));
        let imported = ConnectionProfile::new("db1", ConnectionType::Ssh, "10.0.0.1", 2222)
            .with_username("new");
        let conflict = ConflictInfo {
            kind: ConflictKind::Connection,
            path: "Servers/db1".to_string(),
            existing,
            imported,
            action: ConflictAction::Skip,
        };
        (config, conflict)
    }

    #[test]
    fn test_skip_leaves_tree() {
        let (mut config, conflict) = setup();
        let before = config.clone();
        assert!(!resolve_conflict(&mut config, &conflict, ConflictAction::Skip).unwrap());
        assert_eq!(config, before);
    }

    #[test]
    fn test_overwrite_keeps_identity() {
        let (mut config, conflict) = setup();
        assert!(resolve_conflict(&mut config, &conflict, ConflictAction::Overwrite).unwrap());
        let profile = config.find_profile(&conflict.existing.id).unwrap();
        assert_eq!(profile.username, "new");
        assert_eq!(profile.port, 2222);
        assert_eq!(profile.created_at, conflict.existing.created_at);
        assert_eq!(config.counts(), (1, 1));
    }

    #[test]
    fn test_keep_both_adds_fresh_copy() {
        let (mut config, conflict) = setup();
        assert!(resolve_conflict(&mut config, &conflict, ConflictAction::KeepBoth).unwrap());
        assert_eq!(config.counts(), (1, 2));
        assert!(config.find_profile(&conflict.imported.id).is_none());
        assert!(config.duplicate_ids().is_empty());
    }

    #[test]
    fn test_conflict_wire_shape() {
        let (_, conflict) = setup();
        let json = serde_json::to_value(&conflict).unwrap();
        assert_eq!(json["type"], "connection");
        assert_eq!(json["action"], "skip");
        assert_eq!(ConflictAction::parse("Keep-Both"), Some(ConflictAction::KeepBoth));
    }
}
