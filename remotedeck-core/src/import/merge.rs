//! Tree merge of an imported document into the current configuration.
//!
//! Groups match by name at each level, profiles by `(name, host)` within the
//! matched group. A matched profile becomes a [`ConflictInfo`] with action
//! `skip`; everything unmatched is inserted as a fresh copy with new ids and
//! timestamps, so imported ids are never reused.

use tracing::debug;

use super::conflict::{ConflictAction, ConflictInfo, ConflictKind};
use crate::models::{ConnectionGroup, ConnectionProfile, TreeNode};

/// Result of a merge pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Number of inserted nodes, groups and profiles alike
    pub imported: usize,
    /// Collisions in encounter order
    pub conflicts: Vec<ConflictInfo>,
}

/// Merges imported root groups into `target` in place
pub fn merge_groups(target: &mut Vec<ConnectionGroup>, imported: Vec<ConnectionGroup>) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    for group in imported {
        match target.iter_mut().find(|g| g.name == group.name) {
            Some(existing) => {
                let path = group.name.clone();
                merge_children(existing, group.children, &path, &mut outcome);
            }
            None => {
                outcome.imported += count_nodes(&group);
                debug!(group = %group.name, "Adding new group");
                target.push(group.cloned_fresh());
            }
        }
    }
    outcome
}

fn merge_children(
    existing: &mut ConnectionGroup,
    imported: Vec<TreeNode>,
    path: &str,
    outcome: &mut MergeOutcome,
) {
    let before = outcome.imported;
    for child in imported {
        match child {
            TreeNode::Group(group) => {
                let child_path = format!("{path}/{}", group.name);
                if let Some(matched) = existing.find_group_mut(&group.name) {
                    merge_children(matched, group.children, &child_path, outcome);
                } else {
                    outcome.imported += count_nodes(&group);
                    debug!(path = %child_path, "Adding new group");
                    existing.children.push(TreeNode::Group(group.cloned_fresh()));
                }
            }
            TreeNode::Profile(profile) => merge_profile(existing, profile, path, outcome),
        }
    }
    if outcome.imported > before {
        existing.touch();
    }
}

fn merge_profile(
    existing: &mut ConnectionGroup,
    imported: ConnectionProfile,
    path: &str,
    outcome: &mut MergeOutcome,
) {
    let profile_path = format!("{path}/{}", imported.name);
    if let Some(current) = existing.find_profile(&imported.name, &imported.host) {
        debug!(path = %profile_path, "Connection conflict");
        outcome.conflicts.push(ConflictInfo {
            kind: ConflictKind::Connection,
            path: profile_path,
            existing: current.clone(),
            imported,
            action: ConflictAction::Skip,
        });
    } else {
        debug!(path = %profile_path, "Adding new connection");
        existing.children.push(TreeNode::Profile(imported.cloned_fresh()));
        outcome.imported += 1;
    }
}

/// Counts a group and everything below it
fn count_nodes(group: &ConnectionGroup) -> usize {
    1 + group
        .children
        .iter()
        .map(|child| match child {
            TreeNode::Group(g) => count_nodes(g),
            TreeNode::Profile(_) => 1,
        })
        .sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionType;

    fn servers_with_db1() -> ConnectionGroup {
        ConnectionGroup::new("Servers")
            .with_child(ConnectionProfile::new("db1", ConnectionType::Ssh, "10.0.0.1", 22))
    }

    #[test]
    fn test_same_name_and_host_is_conflict() {
        let mut target = vec![servers_with_db1()];
        let outcome = merge_groups(&mut target, vec![servers_with_db1()]);
        assert_eq!(outcome.imported, 0);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].kind, ConflictKind::Connection);
        assert_eq!(outcome.conflicts[0].path, "Servers/db1");
        assert_eq!(outcome.conflicts[0].action, ConflictAction::Skip);
        assert_eq!(target[0].children.len(), 1);
    }

    #[test]
    fn test_same_name_other_host_is_inserted() {
        let mut target = vec![servers_with_db1()];
        let incoming = ConnectionGroup::new("Servers")
            .with_child(ConnectionProfile::new("db1", ConnectionType::Ssh, "10.0.0.2", 22));
        let outcome = merge_groups(&mut target, vec![incoming]);
        assert_eq!(outcome.imported, 1);
        assert!(outcome.conflicts.is_empty());
        assert_eq!(target[0].children.len(), 2);
    }

    #[test]
    fn test_empty_target_gets_fresh_ids() {
        let source = vec![servers_with_db1()];
        let mut target = Vec::new();
        let outcome = merge_groups(&mut target, source.clone());
        assert_eq!(outcome.imported, 2);
        assert!(outcome.conflicts.is_empty());
        assert_ne!(target[0].id, source[0].id);
        assert_ne!(target[0].children[0].id(), source[0].children[0].id());
    }

    #[test]
    fn test_nested_groups_merge_by_name() {
        let mut target = vec![ConnectionGroup::new("Prod").with_child(
            ConnectionGroup::new("Web")
                .with_child(ConnectionProfile::new("w1", ConnectionType::Rdp, "w1", 3389)),
        )];
        let incoming = ConnectionGroup::new("Prod")
            .with_child(
                ConnectionGroup::new("Web")
                    .with_child(ConnectionProfile::new("w1", ConnectionType::Rdp, "w1", 3389))
                    .with_child(ConnectionProfile::new("w2", ConnectionType::Rdp, "w2", 3389)),
            )
            .with_child(
                ConnectionGroup::new("Db")
                    .with_child(ConnectionProfile::new("d1", ConnectionType::Ssh, "d1", 22)),
            );

        let outcome = merge_groups(&mut target, vec![incoming]);
        // w2, Db and d1
        assert_eq!(outcome.imported, 3);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].path, "Prod/Web/w1");
        assert_eq!(target.len(), 1);
        assert_eq!(target[0].children.len(), 2);
    }
}
