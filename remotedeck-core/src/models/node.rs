//! Tree node sum type.
//!
//! On disk a node is a group when it has a `children` array and a profile
//! when it has `type` and `host`; there is no separate tag. In memory the
//! distinction is an explicit enum so every walk site matches exhaustively.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::connection::ConnectionProfile;
use super::group::ConnectionGroup;

/// A node of the connection tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// Internal node
    Group(ConnectionGroup),
    /// Leaf node
    Profile(ConnectionProfile),
}

impl TreeNode {
    /// Returns the node id
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Group(g) => &g.id,
            Self::Profile(p) => &p.id,
        }
    }

    /// Returns the node name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Group(g) => &g.name,
            Self::Profile(p) => &p.name,
        }
    }

    /// Returns true for groups
    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Returns true for profiles
    #[must_use]
    pub const fn is_profile(&self) -> bool {
        matches!(self, Self::Profile(_))
    }

    pub const fn as_group(&self) -> Option<&ConnectionGroup> {
        match self {
            Self::Group(g) => Some(g),
            Self::Profile(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut ConnectionGroup> {
        match self {
            Self::Group(g) => Some(g),
            Self::Profile(_) => None,
        }
    }

    pub const fn as_profile(&self) -> Option<&ConnectionProfile> {
        match self {
            Self::Profile(p) => Some(p),
            Self::Group(_) => None,
        }
    }

    pub fn as_profile_mut(&mut self) -> Option<&mut ConnectionProfile> {
        match self {
            Self::Profile(p) => Some(p),
            Self::Group(_) => None,
        }
    }

    /// Deep copy with new ids and fresh timestamps throughout
    #[must_use]
    pub fn cloned_fresh(&self) -> Self {
        match self {
            Self::Group(g) => Self::Group(g.cloned_fresh()),
            Self::Profile(p) => Self::Profile(p.cloned_fresh()),
        }
    }
}

impl From<ConnectionGroup> for TreeNode {
    fn from(group: ConnectionGroup) -> Self {
        Self::Group(group)
    }
}

impl From<ConnectionProfile> for TreeNode {
    fn from(profile: ConnectionProfile) -> Self {
        Self::Profile(profile)
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Group(g) => g.serialize(serializer),
            Self::Profile(p) => p.serialize(serializer),
        }
    }
}

/// What a raw JSON node looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Group,
    Profile,
}

fn shape_of(value: &Value) -> Result<Shape, String> {
    let Some(object) = value.as_object() else {
        return Err("tree node must be a JSON object".to_string());
    };
    if object.contains_key("children") {
        return Ok(Shape::Group);
    }
    if object.contains_key("type") && object.contains_key("host") {
        return Ok(Shape::Profile);
    }
    Err(format!(
        "node '{}' is neither a group (children) nor a connection (type + host)",
        node_label(value)
    ))
}

/// Name of a raw node for messages
pub(crate) fn node_label(value: &Value) -> &str {
    value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
}

impl TreeNode {
    /// Builds a node from raw JSON, dropping malformed descendants
    ///
    /// Every dropped node adds one message to `skipped`. Returns `None` when
    /// the node itself cannot be used.
    pub fn salvage(value: Value, skipped: &mut Vec<String>) -> Option<Self> {
        match shape_of(&value) {
            Ok(Shape::Group) => ConnectionGroup::salvage(value, skipped).map(Self::Group),
            Ok(Shape::Profile) => {
                let label = node_label(&value).to_string();
                match ConnectionProfile::deserialize(value) {
                    Ok(profile) => Some(Self::Profile(profile)),
                    Err(e) => {
                        skipped.push(format!("connection '{label}': {e}"));
                        None
                    }
                }
            }
            Err(reason) => {
                skipped.push(reason);
                None
            }
        }
    }
}

impl<'de> Deserialize<'de> for TreeNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match shape_of(&value).map_err(D::Error::custom)? {
            Shape::Group => ConnectionGroup::deserialize(value)
                .map(Self::Group)
                .map_err(D::Error::custom),
            Shape::Profile => ConnectionProfile::deserialize(value)
                .map(Self::Profile)
                .map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionType;

    #[test]
    fn test_structural_discrimination() {
        let json = r#"[
            {"id":"g1","name":"Servers","children":[]},
            {"id":"p1","name":"db1","type":"ssh","host":"10.0.0.1","port":22}
        ]"#;
        let nodes: Vec<TreeNode> = serde_json::from_str(json).unwrap();
        assert!(nodes[0].is_group());
        assert!(nodes[1].is_profile());
        assert_eq!(nodes[1].id(), "p1");
    }

    #[test]
    fn test_unknown_node_shape_is_rejected() {
        let json = r#"{"name":"orphan","host":"h"}"#;
        let err = serde_json::from_str::<TreeNode>(json).unwrap_err();
        assert!(err.to_string().contains("orphan"));
    }

    #[test]
    fn test_salvage_drops_only_bad_children() {
        let json = serde_json::json!({
            "id": "g1",
            "name": "Servers",
            "children": [
                {"name": "good", "type": "ssh", "host": "10.0.0.1", "port": 22},
                {"name": "alien", "type": "gopher", "host": "10.0.0.2", "port": 70},
                {"name": "loose"},
                {"name": "nested", "children": [
                    {"host": "10.0.0.3", "type": "ssh", "port": 22}
                ]}
            ]
        });
        let mut skipped = Vec::new();
        let node = TreeNode::salvage(json, &mut skipped).unwrap();
        let group = node.as_group().unwrap();
        assert_eq!(group.children.len(), 2);
        assert_eq!(group.children[0].name(), "good");
        assert!(group.groups().next().unwrap().children.is_empty());
        assert_eq!(skipped.len(), 3);
        assert!(skipped[0].contains("alien"));
        assert!(skipped[1].contains("loose"));
    }

    #[test]
    fn test_salvage_rejects_non_object() {
        let mut skipped = Vec::new();
        assert!(TreeNode::salvage(serde_json::json!(42), &mut skipped).is_none());
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn test_serialize_round_trip_keeps_kind() {
        let node: TreeNode = ConnectionGroup::new("g")
            .with_child(ConnectionProfile::new("p", ConnectionType::Ftp, "ftp.local", 21))
            .into();
        let json = serde_json::to_string(&node).unwrap();
        let back: TreeNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
