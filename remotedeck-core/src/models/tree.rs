//! Depth-first tree rebuilding.
//!
//! Whole-tree passes (encrypt on save, decrypt on load, blanking passwords
//! for export, normalizing imported passwords) are expressed as a
//! [`NodeTransform`] applied leaf by leaf. The tree is consumed and rebuilt
//! on the way up, so callers that need to keep the original clone first.

use std::convert::Infallible;

use super::connection::ConnectionProfile;
use super::group::ConnectionGroup;
use super::node::TreeNode;

/// Per-node transform applied by [`transform_groups`]
pub trait NodeTransform {
    /// Error that aborts the whole pass
    type Error;

    /// Transforms a single profile
    ///
    /// # Errors
    ///
    /// Returning an error aborts the pass.
    fn profile(&mut self, profile: ConnectionProfile) -> Result<ConnectionProfile, Self::Error>;

    /// Transforms a group after its children have been rebuilt
    ///
    /// # Errors
    ///
    /// Returning an error aborts the pass.
    fn group(&mut self, group: ConnectionGroup) -> Result<ConnectionGroup, Self::Error> {
        Ok(group)
    }
}

/// Rebuilds a list of root groups through `transform`
///
/// # Errors
///
/// Returns the first error produced by the transform.
pub fn transform_groups<T: NodeTransform>(
    groups: Vec<ConnectionGroup>,
    transform: &mut T,
) -> Result<Vec<ConnectionGroup>, T::Error> {
    groups
        .into_iter()
        .map(|group| transform_group(group, transform))
        .collect()
}

fn transform_group<T: NodeTransform>(
    mut group: ConnectionGroup,
    transform: &mut T,
) -> Result<ConnectionGroup, T::Error> {
    let children = std::mem::take(&mut group.children);
    group.children = children
        .into_iter()
        .map(|child| match child {
            TreeNode::Group(g) => transform_group(g, transform).map(TreeNode::Group),
            TreeNode::Profile(p) => transform.profile(p).map(TreeNode::Profile),
        })
        .collect::<Result<_, _>>()?;
    transform.group(group)
}

/// Infallible transform built from a closure over profiles
pub struct MapProfiles<F>(pub F);

impl<F> NodeTransform for MapProfiles<F>
where
    F: FnMut(ConnectionProfile) -> ConnectionProfile,
{
    type Error = Infallible;

    fn profile(&mut self, profile: ConnectionProfile) -> Result<ConnectionProfile, Infallible> {
        Ok((self.0)(profile))
    }
}

/// Applies an infallible per-profile mapping to a tree
#[must_use]
pub fn map_profiles<F>(groups: Vec<ConnectionGroup>, f: F) -> Vec<ConnectionGroup>
where
    F: FnMut(ConnectionProfile) -> ConnectionProfile,
{
    match transform_groups(groups, &mut MapProfiles(f)) {
        Ok(groups) => groups,
        Err(never) => match never {},
    }
}

/// Returns a copy of the tree with every password blanked
#[must_use]
pub fn strip_passwords(groups: &[ConnectionGroup]) -> Vec<ConnectionGroup> {
    map_profiles(groups.to_vec(), |mut profile| {
        profile.password.clear();
        profile
    })
}

/// Visits every profile in depth-first order
pub fn for_each_profile<'a>(groups: &'a [ConnectionGroup], f: &mut impl FnMut(&'a ConnectionProfile)) {
    for group in groups {
        visit_children(&group.children, f);
    }
}

fn visit_children<'a>(children: &'a [TreeNode], f: &mut impl FnMut(&'a ConnectionProfile)) {
    for child in children {
        match child {
            TreeNode::Group(g) => visit_children(&g.children, f),
            TreeNode::Profile(p) => f(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionType;

    fn sample() -> Vec<ConnectionGroup> {
        vec![ConnectionGroup::new("root")
            .with_child(
                ConnectionGroup::new("nested").with_child(
                    ConnectionProfile::new("a", ConnectionType::Ssh, "h1", 22).with_password("pw-a"),
                ),
            )
            .with_child(ConnectionProfile::new("b", ConnectionType::Rdp, "h2", 3389).with_password("pw-b"))]
    }

    #[test]
    fn test_strip_passwords_leaves_original() {
        let groups = sample();
        let stripped = strip_passwords(&groups);
        let mut passwords = Vec::new();
        for_each_profile(&stripped, &mut |p| passwords.push(p.password.clone()));
        assert_eq!(passwords, vec![String::new(), String::new()]);

        let mut original = Vec::new();
        for_each_profile(&groups, &mut |p| original.push(p.password.clone()));
        assert_eq!(original, vec!["pw-a".to_string(), "pw-b".to_string()]);
    }

    #[test]
    fn test_transform_error_aborts() {
        struct FailOn(&'static str);
        impl NodeTransform for FailOn {
            type Error = String;
            fn profile(&mut self, profile: ConnectionProfile) -> Result<ConnectionProfile, String> {
                if profile.name == self.0 {
                    Err(format!("failed on {}", profile.name))
                } else {
                    Ok(profile)
                }
            }
        }

        let result = transform_groups(sample(), &mut FailOn("b"));
        assert_eq!(result.unwrap_err(), "failed on b");
    }

    #[test]
    fn test_depth_first_order() {
        let mut names = Vec::new();
        for_each_profile(&sample(), &mut |p| names.push(p.name.clone()));
        assert_eq!(names, vec!["a", "b"]);
    }
}
