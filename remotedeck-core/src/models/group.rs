//! Connection group model for hierarchical organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::connection::{new_id, ConnectionProfile};
use super::node::{node_label, TreeNode};

/// A named container of profiles and nested groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionGroup {
    /// Unique identifier, opaque
    #[serde(default = "new_id")]
    pub id: String,
    /// Human-readable name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the group is expanded in the UI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    /// Ordered children; presence of this field is what makes a node a group
    pub children: Vec<TreeNode>,
    /// Timestamp when the group was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Timestamp when the group was last modified
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl ConnectionGroup {
    /// Creates a new empty group
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            icon: None,
            description: None,
            expanded: Some(true),
            children: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a child node
    #[must_use]
    pub fn with_child(mut self, child: impl Into<TreeNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Updates the `updated_at` timestamp to now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Iterates over direct child groups
    pub fn groups(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(TreeNode::as_group)
    }

    /// Iterates over direct child profiles
    pub fn profiles(&self) -> impl Iterator<Item = &ConnectionProfile> {
        self.children.iter().filter_map(TreeNode::as_profile)
    }

    /// Finds a direct child group by name
    pub fn find_group_mut(&mut self, name: &str) -> Option<&mut Self> {
        self.children
            .iter_mut()
            .filter_map(TreeNode::as_group_mut)
            .find(|g| g.name == name)
    }

    /// Finds a direct child profile with the same `(name, host)`
    pub fn find_profile(&self, name: &str, host: &str) -> Option<&ConnectionProfile> {
        self.profiles().find(|p| p.name == name && p.host == host)
    }

    /// Builds a group from raw JSON, keeping every child that parses
    ///
    /// Malformed descendants are dropped with one message each in `skipped`.
    /// Returns `None` if the group's own fields are unusable.
    pub fn salvage(mut value: Value, skipped: &mut Vec<String>) -> Option<Self> {
        let label = node_label(&value).to_string();
        let Some(object) = value.as_object_mut() else {
            skipped.push(format!("group '{label}' is not a JSON object"));
            return None;
        };
        let children = match object.insert("children".to_string(), Value::Array(Vec::new())) {
            Some(Value::Array(children)) => children,
            Some(_) => {
                skipped.push(format!("group '{label}': children is not a list"));
                Vec::new()
            }
            None => {
                skipped.push(format!("'{label}' is not a group (no children)"));
                return None;
            }
        };

        let mut group = match Self::deserialize(value) {
            Ok(group) => group,
            Err(e) => {
                skipped.push(format!("group '{label}': {e}"));
                return None;
            }
        };
        group.children = children
            .into_iter()
            .filter_map(|child| TreeNode::salvage(child, skipped))
            .collect();
        Some(group)
    }

    /// Returns a deep copy in which every node has a new id and fresh timestamps
    #[must_use]
    pub fn cloned_fresh(&self) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: self.name.clone(),
            icon: self.icon.clone(),
            description: self.description.clone(),
            expanded: self.expanded,
            children: self.children.iter().map(TreeNode::cloned_fresh).collect(),
            created_at: now,
            updated_at: now,
        }
    }
}
