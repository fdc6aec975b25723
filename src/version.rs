use std::collections::BTreeMap;

/// Split an api version on its last slash into `(group, version)`.
///
/// The core group has no slash and yields an empty group.
pub fn split_group_version(api_version: &str) -> (&str, &str) {
    api_version.rsplit_once('/').unwrap_or(("", api_version))
}

/// Join `group` and `version` into the api version string the API server
/// accepts: the bare version for the core group, `group/version` otherwise.
pub fn group_version(group: &str, version: &str) -> String {
    if group.is_empty() {
        version.to_string()
    } else {
        format!("{group}/{version}")
    }
}

/// Versions served by the cluster, indexed by API group.
///
/// Versions keep the order they were listed in, duplicates included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionIndex {
    groups: BTreeMap<String, Vec<String>>,
}

impl VersionIndex {
    /// Build the index from `group/version` strings such as the output of
    /// `kubectl api-versions`. Blank entries are ignored.
    pub fn from_api_versions<I, S>(api_versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for api_version in api_versions {
            let api_version = api_version.as_ref().trim();
            if api_version.is_empty() {
                continue;
            }
            let (group, version) = split_group_version(api_version);
            groups
                .entry(group.to_string())
                .or_default()
                .push(version.to_string());
        }
        Self { groups }
    }

    /// Versions recorded for `group`; empty when the group is unknown.
    pub fn versions(&self, group: &str) -> &[String] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of distinct groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
