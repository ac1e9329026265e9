//! Aggregate root of the connection tree.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::connection::{new_id, ConnectionProfile};
use super::group::ConnectionGroup;
use super::node::TreeNode;
use super::tree::for_each_profile;
use crate::config::AppSettings;
use crate::error::{ConfigError, ConfigResult};

/// Current on-disk format tag
pub const CONFIG_VERSION: &str = "1.0.0";

/// The whole tree plus settings, loaded and saved as one value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Format tag
    pub version: String,
    /// Root-level groups
    pub groups: Vec<ConnectionGroup>,
    /// Application settings (persisted in their own file)
    #[serde(default)]
    pub settings: AppSettings,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            groups: Vec::new(),
            settings: AppSettings::default(),
        }
    }
}

impl ConnectionConfig {
    /// Creates an empty config with the given settings
    #[must_use]
    pub fn with_settings(settings: AppSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Iterates over all profiles depth-first
    pub fn profiles(&self) -> Vec<&ConnectionProfile> {
        let mut out = Vec::new();
        for_each_profile(&self.groups, &mut |p| out.push(p));
        out
    }

    /// Returns `(groups, profiles)` counts over the whole tree
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        fn walk(children: &[TreeNode], groups: &mut usize, profiles: &mut usize) {
            for child in children {
                match child {
                    TreeNode::Group(g) => {
                        *groups += 1;
                        walk(&g.children, groups, profiles);
                    }
                    TreeNode::Profile(_) => *profiles += 1,
                }
            }
        }

        let mut groups = self.groups.len();
        let mut profiles = 0;
        for group in &self.groups {
            walk(&group.children, &mut groups, &mut profiles);
        }
        (groups, profiles)
    }

    /// Finds a group anywhere in the tree
    pub fn find_group(&self, id: &str) -> Option<&ConnectionGroup> {
        fn walk<'a>(group: &'a ConnectionGroup, id: &str) -> Option<&'a ConnectionGroup> {
            if group.id == id {
                return Some(group);
            }
            group.groups().find_map(|g| walk(g, id))
        }
        self.groups.iter().find_map(|g| walk(g, id))
    }

    /// Finds a group anywhere in the tree, mutably
    pub fn find_group_mut(&mut self, id: &str) -> Option<&mut ConnectionGroup> {
        fn walk<'a>(group: &'a mut ConnectionGroup, id: &str) -> Option<&'a mut ConnectionGroup> {
            if group.id == id {
                return Some(group);
            }
            group
                .children
                .iter_mut()
                .filter_map(TreeNode::as_group_mut)
                .find_map(|g| walk(g, id))
        }
        self.groups.iter_mut().find_map(|g| walk(g, id))
    }

    /// Finds a profile anywhere in the tree
    pub fn find_profile(&self, id: &str) -> Option<&ConnectionProfile> {
        self.profiles().into_iter().find(|p| p.id == id)
    }

    /// Finds a profile anywhere in the tree, mutably
    pub fn find_profile_mut(&mut self, id: &str) -> Option<&mut ConnectionProfile> {
        fn walk<'a>(children: &'a mut [TreeNode], id: &str) -> Option<&'a mut ConnectionProfile> {
            for child in children {
                match child {
                    TreeNode::Profile(p) if p.id == id => return Some(p),
                    TreeNode::Profile(_) => {}
                    TreeNode::Group(g) => {
                        if let Some(found) = walk(&mut g.children, id) {
                            return Some(found);
                        }
                    }
                }
            }
            None
        }
        self.groups
            .iter_mut()
            .find_map(|g| walk(&mut g.children, id))
    }

    /// Finds the group that directly contains the node `child_id`
    pub fn parent_group_mut(&mut self, child_id: &str) -> Option<&mut ConnectionGroup> {
        fn walk<'a>(group: &'a mut ConnectionGroup, id: &str) -> Option<&'a mut ConnectionGroup> {
            if group.children.iter().any(|c| c.id() == id) {
                return Some(group);
            }
            group
                .children
                .iter_mut()
                .filter_map(TreeNode::as_group_mut)
                .find_map(|g| walk(g, id))
        }
        self.groups.iter_mut().find_map(|g| walk(g, child_id))
    }

    /// Finds a profile by exact id or case-insensitive name
    pub fn find_profile_by_name_or_id(&self, key: &str) -> Option<&ConnectionProfile> {
        self.find_profile(key).or_else(|| {
            self.profiles()
                .into_iter()
                .find(|p| p.name.eq_ignore_ascii_case(key))
        })
    }

    /// Adds a group at the root (`parent_id = None`) or under another group
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the parent does not exist.
    pub fn add_group(&mut self, parent_id: Option<&str>, group: ConnectionGroup) -> ConfigResult<String> {
        if group.name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "name".to_string(),
                reason: "Group name cannot be empty".to_string(),
            });
        }
        let id = group.id.clone();
        match parent_id {
            None => self.groups.push(group),
            Some(parent_id) => {
                let parent = self
                    .find_group_mut(parent_id)
                    .ok_or_else(|| ConfigError::NotFound(format!("group {parent_id}")))?;
                parent.children.push(TreeNode::Group(group));
                parent.touch();
            }
        }
        Ok(id)
    }

    /// Adds a profile to an existing group
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is invalid or the group does not exist.
    pub fn add_profile(&mut self, group_id: &str, profile: ConnectionProfile) -> ConfigResult<String> {
        profile.validate()?;
        let id = profile.id.clone();
        let group = self
            .find_group_mut(group_id)
            .ok_or_else(|| ConfigError::NotFound(format!("group {group_id}")))?;
        group.children.push(TreeNode::Profile(profile));
        group.touch();
        Ok(id)
    }

    /// Replaces a profile, keeping its id and creation time
    ///
    /// # Errors
    ///
    /// Returns an error if the profile does not exist or is invalid.
    pub fn update_profile(&mut self, id: &str, mut updated: ConnectionProfile) -> ConfigResult<()> {
        updated.validate()?;
        let existing = self
            .find_profile_mut(id)
            .ok_or_else(|| ConfigError::NotFound(format!("connection {id}")))?;
        updated.id = existing.id.clone();
        updated.created_at = existing.created_at;
        updated.touch();
        *existing = updated;
        Ok(())
    }

    /// Records a launch of the given profile
    ///
    /// # Errors
    ///
    /// Returns an error if the profile does not exist.
    pub fn record_connection(&mut self, id: &str) -> ConfigResult<()> {
        let profile = self
            .find_profile_mut(id)
            .ok_or_else(|| ConfigError::NotFound(format!("connection {id}")))?;
        profile.record_connection();
        Ok(())
    }

    /// Removes a node and its whole subtree; returns the removed node
    pub fn remove_node(&mut self, id: &str) -> Option<TreeNode> {
        fn walk(group: &mut ConnectionGroup, id: &str) -> Option<TreeNode> {
            if let Some(pos) = group.children.iter().position(|c| c.id() == id) {
                group.touch();
                return Some(group.children.remove(pos));
            }
            group
                .children
                .iter_mut()
                .filter_map(TreeNode::as_group_mut)
                .find_map(|g| walk(g, id))
        }

        if let Some(pos) = self.groups.iter().position(|g| g.id == id) {
            return Some(TreeNode::Group(self.groups.remove(pos)));
        }
        self.groups.iter_mut().find_map(|g| walk(g, id))
    }

    /// Returns ids that occur more than once in the tree
    #[must_use]
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        self.visit_ids(&mut |id| {
            if !seen.insert(id.to_string()) {
                duplicates.push(id.to_string());
            }
        });
        duplicates
    }

    fn visit_ids(&self, f: &mut impl FnMut(&str)) {
        fn walk(children: &[TreeNode], f: &mut impl FnMut(&str)) {
            for child in children {
                f(child.id());
                if let TreeNode::Group(g) = child {
                    walk(&g.children, f);
                }
            }
        }
        for group in &self.groups {
            f(&group.id);
            walk(&group.children, f);
        }
    }

    /// Gives a fresh id to every node whose id was already used earlier in
    /// depth-first order (or is blank); returns how many were reassigned
    pub fn repair_duplicate_ids(&mut self) -> usize {
        fn walk(children: &mut [TreeNode], seen: &mut HashSet<String>, fixed: &mut usize) {
            for child in children {
                match child {
                    TreeNode::Group(g) => {
                        fix(&mut g.id, seen, fixed);
                        walk(&mut g.children, seen, fixed);
                    }
                    TreeNode::Profile(p) => fix(&mut p.id, seen, fixed),
                }
            }
        }
        fn fix(id: &mut String, seen: &mut HashSet<String>, fixed: &mut usize) {
            if id.trim().is_empty() || !seen.insert(id.clone()) {
                *id = new_id();
                seen.insert(id.clone());
                *fixed += 1;
            }
        }

        let mut seen = HashSet::new();
        let mut fixed = 0;
        for group in &mut self.groups {
            fix(&mut group.id, &mut seen, &mut fixed);
            walk(&mut group.children, &mut seen, &mut fixed);
        }
        fixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionType;

    fn sample() -> (ConnectionConfig, String, String) {
        let mut config = ConnectionConfig::default();
        let root = config.add_group(None, ConnectionGroup::new("Servers")).unwrap();
        let nested = config
            .add_group(Some(&root), ConnectionGroup::new("Databases"))
            .unwrap();
        config
            .add_profile(
                &nested,
                ConnectionProfile::new("db1", ConnectionType::Ssh, "10.0.0.1", 22),
            )
            .unwrap();
        (config, root, nested)
    }

    #[test]
    fn test_add_and_count() {
        let (config, _, _) = sample();
        assert_eq!(config.counts(), (2, 1));
        assert!(config.duplicate_ids().is_empty());
    }

    #[test]
    fn test_add_profile_to_missing_group_fails() {
        let (mut config, _, _) = sample();
        let profile = ConnectionProfile::new("x", ConnectionType::Ssh, "h", 22);
        assert!(matches!(
            config.add_profile("missing", profile),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_group_removes_subtree() {
        let (mut config, _, nested) = sample();
        let removed = config.remove_node(&nested).unwrap();
        assert!(removed.is_group());
        assert_eq!(config.counts(), (1, 0));
        assert!(config.find_profile_by_name_or_id("db1").is_none());
    }

    #[test]
    fn test_update_profile_preserves_identity() {
        let (mut config, _, _) = sample();
        let original = config.find_profile_by_name_or_id("DB1").unwrap().clone();
        let mut edited = original.clone();
        edited.id = "something-else".to_string();
        edited.host = "10.0.0.9".to_string();
        config.update_profile(&original.id, edited).unwrap();

        let stored = config.find_profile(&original.id).unwrap();
        assert_eq!(stored.host, "10.0.0.9");
        assert_eq!(stored.created_at, original.created_at);
        assert!(stored.updated_at >= original.updated_at);
    }

    #[test]
    fn test_repair_duplicate_ids() {
        let (mut config, root, _) = sample();
        let mut copy = ConnectionProfile::new("db2", ConnectionType::Ssh, "10.0.0.2", 22);
        copy.id = root.clone();
        config.add_profile(&root, copy).unwrap();
        assert_eq!(config.duplicate_ids(), vec![root.clone()]);

        assert_eq!(config.repair_duplicate_ids(), 1);
        assert!(config.duplicate_ids().is_empty());
        assert!(config.find_group(&root).is_some());
    }
}
