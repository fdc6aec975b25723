use std::{num::NonZeroUsize, time::Duration};

use futures::stream::{self, StreamExt};
use tracing::{debug, trace};

use crate::{
    discover::{Introspect, with_timeout},
    resource::{ResourceIdentifier, ResourceRow},
    version::{VersionIndex, group_version},
};

/// Number of probes in flight when the caller does not choose.
pub const DEFAULT_CONCURRENCY: NonZeroUsize = NonZeroUsize::new(8).unwrap();

/// Per-call timeout when the caller does not choose.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for [`probe_resources`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Maximum number of checks in flight.
    pub concurrency: NonZeroUsize,
    /// Deadline for a single external call. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ProbeOptions {
    pub fn with_concurrency(mut self, concurrency: NonZeroUsize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// Result of a probing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Pairings that passed, in row order then version order.
    pub identifiers: Vec<ResourceIdentifier>,
    /// Checks issued.
    pub attempted: usize,
    /// Checks that failed or timed out.
    pub failed: usize,
}

/// Check every `(row, version)` pairing drawn from `rows` and `index`.
///
/// Up to `options.concurrency` checks run at once. Each pairing carries its
/// sequence number so the outcome keeps row order, then version-index order,
/// regardless of completion order. A failed check only drops its own pairing.
pub async fn probe_resources<'a, C, I>(
    client: &C,
    rows: I,
    index: &'a VersionIndex,
    options: &ProbeOptions,
) -> ProbeOutcome
where
    C: Introspect,
    I: IntoIterator<Item = &'a ResourceRow>,
{
    let pairings: Vec<(usize, &ResourceRow, &str)> = rows
        .into_iter()
        .flat_map(|row| {
            index
                .versions(&row.group)
                .iter()
                .map(move |version| (row, version.as_str()))
        })
        .enumerate()
        .map(|(seq, (row, version))| (seq, row, version))
        .collect();
    let attempted = pairings.len();

    let mut results: Vec<(usize, Option<ResourceIdentifier>)> = stream::iter(pairings)
        .map(|(seq, row, version)| async move {
            let api_version = group_version(&row.group, version);
            let check = client.check_version(&row.name, &api_version);
            match with_timeout(options.timeout, check).await {
                Ok(()) => {
                    trace!(resource = %row.name, %api_version, "pairing is served");
                    let id = ResourceIdentifier::new(&row.group, version, &row.kind);
                    (seq, Some(id))
                }
                Err(error) => {
                    debug!(resource = %row.name, %api_version, %error, "dropping pairing");
                    (seq, None)
                }
            }
        })
        .buffer_unordered(options.concurrency.get())
        .collect()
        .await;

    results.sort_unstable_by_key(|(seq, _)| *seq);
    let failed = results.iter().filter(|(_, id)| id.is_none()).count();

    ProbeOutcome {
        identifiers: results.into_iter().filter_map(|(_, id)| id).collect(),
        attempted,
        failed,
    }
}
