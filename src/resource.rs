use std::{collections::HashSet, fmt};

use crate::{
    table::{Table, TableError},
    version::split_group_version,
};

/// API groups excluded unless the caller supplies its own list.
pub const DEFAULT_GROUP_DENYLIST: [&str; 2] = ["authentication.k8s.io", "authorization.k8s.io"];

/// Kinds excluded unless the caller supplies its own list.
pub const DEFAULT_KIND_DENYLIST: [&str; 1] = ["Binding"];

/// One resource kind as listed by `kubectl api-resources`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceRow {
    /// Plural resource name, e.g. `pods`.
    pub name: String,
    /// Comma-separated short names, e.g. `po`.
    pub short_names: String,
    /// API group; empty for the core group.
    pub group: String,
    /// `true` or `false`, kept as printed.
    pub namespaced: String,
    pub kind: String,
}

impl ResourceRow {
    pub fn new(
        name: impl Into<String>,
        short_names: impl Into<String>,
        group: impl Into<String>,
        namespaced: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            short_names: short_names.into(),
            group: group.into(),
            namespaced: namespaced.into(),
            kind: kind.into(),
        }
    }
}

/// Read resource rows out of an `api-resources` table.
///
/// Columns are taken by position: name, short names, group, namespaced, kind.
/// Newer kubectl prints `APIVERSION` in place of `APIGROUP`; the group is then
/// the part of the api version before its last slash.
pub fn rows_from_table(table: &Table) -> Result<Vec<ResourceRow>, TableError> {
    const COLUMNS: usize = 5;
    const GROUP: usize = 2;
    if table.header.len() < COLUMNS {
        return Err(TableError::TooFewColumns {
            expected: COLUMNS,
            found: table.header.len(),
        });
    }

    let group_is_api_version = table.column("APIVERSION") == Some(GROUP);
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let group = if group_is_api_version {
                split_group_version(&row[GROUP]).0
            } else {
                row[GROUP].as_str()
            };
            ResourceRow::new(&row[0], &row[1], group, &row[3], &row[4])
        })
        .collect();
    Ok(rows)
}

/// Groups and kinds excluded before probing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Denylist {
    groups: HashSet<String>,
    kinds: HashSet<String>,
}

impl Denylist {
    pub fn new<G, K>(groups: G, kinds: K) -> Self
    where
        G: IntoIterator,
        G::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
            kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    /// The lists used when the caller does not override them.
    pub fn standard() -> Self {
        Self::new(DEFAULT_GROUP_DENYLIST, DEFAULT_KIND_DENYLIST)
    }

    pub fn denies(&self, row: &ResourceRow) -> bool {
        self.kinds.contains(&row.kind) || self.groups.contains(&row.group)
    }

    /// Rows of `rows` that pass the denylist, in input order.
    pub fn filter<'a>(
        &'a self,
        rows: &'a [ResourceRow],
    ) -> impl Iterator<Item = &'a ResourceRow> + 'a {
        rows.iter().filter(|row| !self.denies(row))
    }
}

/// A validated `(group, version, kind)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentifier {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl ResourceIdentifier {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = if self.group.is_empty() {
            "core"
        } else {
            &self.group
        };
        write!(f, "{group}/{}/{}", self.version, self.kind)
    }
}
