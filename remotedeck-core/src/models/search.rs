//! Profile filtering for the connection list.

use super::config::ConnectionConfig;
use super::connection::ConnectionProfile;
use super::group::ConnectionGroup;
use super::protocol::ConnectionType;

/// Filter over profiles; empty fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Case-insensitive substring of name, host, username or description
    pub keyword: Option<String>,
    pub connection_type: Option<ConnectionType>,
    /// Every listed tag must be present
    pub tags: Vec<String>,
    /// Restrict to the subtree of this group
    pub group_id: Option<String>,
}

impl SearchFilter {
    /// Returns true if the profile satisfies the filter (ignores `group_id`)
    #[must_use]
    pub fn matches(&self, profile: &ConnectionProfile) -> bool {
        if let Some(connection_type) = self.connection_type {
            if profile.connection_type() != connection_type {
                return false;
            }
        }
        if !self.tags.iter().all(|t| profile.tags.contains(t)) {
            return false;
        }
        match self.keyword.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(keyword) => {
                let keyword = keyword.to_lowercase();
                [
                    Some(profile.name.as_str()),
                    Some(profile.host.as_str()),
                    Some(profile.username.as_str()),
                    profile.description.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&keyword))
            }
        }
    }
}

impl ConnectionConfig {
    /// Returns profiles matching the filter in tree order
    #[must_use]
    pub fn search(&self, filter: &SearchFilter) -> Vec<&ConnectionProfile> {
        let scope: Vec<&ConnectionGroup> = match filter.group_id.as_deref() {
            Some(id) => self.find_group(id).into_iter().collect(),
            None => self.groups.iter().collect(),
        };

        let mut out = Vec::new();
        for group in scope {
            super::tree::for_each_profile(std::slice::from_ref(group), &mut |p| {
                if filter.matches(p) {
                    out.push(p);
                }
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectionConfig {
        let mut config = ConnectionConfig::default();
        let prod = config.add_group(None, ConnectionGroup::new("Prod")).unwrap();
        let lab = config.add_group(None, ConnectionGroup::new("Lab")).unwrap();
        config
            .add_profile(
                &prod,
                ConnectionProfile::new("Billing DB", ConnectionType::Ssh, "db.prod", 22)
                    .with_tags(["database"]),
            )
            .unwrap();
        config
            .add_profile(
                &lab,
                ConnectionProfile::new("Desktop", ConnectionType::Rdp, "win.lab", 3389),
            )
            .unwrap();
        config
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let filter = SearchFilter {
            keyword: Some("billing".to_string()),
            ..SearchFilter::default()
        };
        let found = config().search(&filter).iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        assert_eq!(found, vec!["Billing DB"]);
    }

    #[test]
    fn test_type_and_tag_filters() {
        let config = config();
        let by_type = SearchFilter {
            connection_type: Some(ConnectionType::Rdp),
            ..SearchFilter::default()
        };
        assert_eq!(config.search(&by_type).len(), 1);

        let by_tag = SearchFilter {
            tags: vec!["database".to_string()],
            ..SearchFilter::default()
        };
        assert_eq!(config.search(&by_tag)[0].host, "db.prod");
    }

    #[test]
    fn test_group_scope() {
        let config = config();
        let lab_id = config.groups[1].id.clone();
        let filter = SearchFilter {
            group_id: Some(lab_id),
            ..SearchFilter::default()
        };
        let found = config.search(&filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Desktop");
    }
}
