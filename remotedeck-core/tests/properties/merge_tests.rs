//! Property-based tests for the import merge

use std::collections::HashSet;

use proptest::prelude::*;
use remotedeck_core::import::{merge_groups, resolve_conflict, ConflictAction, ConflictKind};
use remotedeck_core::models::{
    ConnectionConfig, ConnectionGroup, ConnectionProfile, ConnectionType, TreeNode,
};

fn servers_with_db1() -> ConnectionGroup {
    ConnectionGroup::new("Servers").with_child(ConnectionProfile::new(
        "db1",
        ConnectionType::Ssh,
        "10.0.0.1",
        22,
    ))
}

fn collect_ids(groups: &[ConnectionGroup], ids: &mut HashSet<String>) {
    fn walk(children: &[TreeNode], ids: &mut HashSet<String>) {
        for child in children {
            ids.insert(child.id().to_string());
            if let TreeNode::Group(group) = child {
                walk(&group.children, ids);
            }
        }
    }
    for group in groups {
        ids.insert(group.id.clone());
        walk(&group.children, ids);
    }
}

// ========== Fixed cases ==========

#[test]
fn existing_profile_is_a_conflict() {
    let mut target = vec![servers_with_db1()];
    let outcome = merge_groups(&mut target, vec![servers_with_db1()]);

    assert_eq!(outcome.imported, 0);
    assert_eq!(outcome.conflicts.len(), 1);
    let conflict = &outcome.conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::Connection);
    assert_eq!(conflict.path, "Servers/db1");
    assert_eq!(conflict.action, ConflictAction::Skip);
    assert_eq!(target[0].children.len(), 1);
}

#[test]
fn empty_target_takes_whole_tree_with_new_ids() {
    let source = vec![servers_with_db1()];
    let mut source_ids = HashSet::new();
    collect_ids(&source, &mut source_ids);

    let mut target = Vec::new();
    let outcome = merge_groups(&mut target, source);

    assert_eq!(outcome.imported, 2);
    assert!(outcome.conflicts.is_empty());
    let mut target_ids = HashSet::new();
    collect_ids(&target, &mut target_ids);
    assert_eq!(target_ids.len(), 2);
    assert!(target_ids.is_disjoint(&source_ids));
}

#[test]
fn same_name_other_host_is_new() {
    let mut target = vec![servers_with_db1()];
    let imported = ConnectionGroup::new("Servers").with_child(ConnectionProfile::new(
        "db1",
        ConnectionType::Ssh,
        "10.0.0.2",
        22,
    ));
    let outcome = merge_groups(&mut target, vec![imported]);
    assert_eq!(outcome.imported, 1);
    assert!(outcome.conflicts.is_empty());
    assert_eq!(target[0].children.len(), 2);
}

#[test]
fn keep_both_resolution_adds_copy() {
    let mut config = ConnectionConfig {
        groups: vec![servers_with_db1()],
        ..ConnectionConfig::default()
    };
    let outcome = merge_groups(&mut config.groups, vec![servers_with_db1()]);
    let conflict = &outcome.conflicts[0];

    assert!(resolve_conflict(&mut config, conflict, ConflictAction::KeepBoth).unwrap());
    assert_eq!(config.counts(), (1, 2));
    assert!(config.duplicate_ids().is_empty());
}

// ========== Properties ==========

/// Strategy for a flat imported group of distinct profiles
fn arb_group() -> impl Strategy<Value = ConnectionGroup> {
    (
        "[A-Z][a-z]{2,8}",
        prop::collection::btree_set(("[a-z]{2,6}", 1u8..=254), 0..6),
    )
        .prop_map(|(name, profiles)| {
            profiles.into_iter().fold(ConnectionGroup::new(name), |group, (pname, octet)| {
                group.with_child(ConnectionProfile::new(
                    pname,
                    ConnectionType::Ssh,
                    format!("10.0.0.{octet}"),
                    22,
                ))
            })
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn merging_twice_conflicts_on_every_profile(group in arb_group()) {
        let profile_count = group.profiles().count();
        let mut target = Vec::new();

        let first = merge_groups(&mut target, vec![group.clone()]);
        prop_assert_eq!(first.imported, profile_count + 1);
        prop_assert!(first.conflicts.is_empty());

        let second = merge_groups(&mut target, vec![group]);
        prop_assert_eq!(second.imported, 0);
        prop_assert_eq!(second.conflicts.len(), profile_count);
        prop_assert_eq!(target.len(), 1);
        prop_assert_eq!(target[0].profiles().count(), profile_count);
    }

    #[test]
    fn merged_ids_stay_unique(a in arb_group(), b in arb_group()) {
        let mut target = vec![a];
        merge_groups(&mut target, vec![b]);
        let config = ConnectionConfig { groups: target, ..ConnectionConfig::default() };
        prop_assert!(config.duplicate_ids().is_empty());
    }
}
