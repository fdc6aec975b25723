use std::{future::Future, io, process::ExitStatus, time::Duration};

use futures::join;
use tracing::{debug, info, warn};

use crate::{
    format::IdentifierFormat,
    probe::{ProbeOptions, probe_resources},
    resource::{Denylist, ResourceIdentifier, ResourceRow},
    table::TableError,
    version::VersionIndex,
};

pub mod client;
pub mod kubectl;
#[cfg(test)]
pub(crate) mod testing;

/// Failure of a single call to the control plane.
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    /// The external command could not be started.
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The external command ran and reported failure.
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("kubernetes API request failed: {0}")]
    Kube(#[from] kube::Error),

    /// The group/version does not serve the named resource.
    #[error("{name} is not served under {api_version}")]
    NotServed { name: String, api_version: String },

    #[error("call did not complete within {0:?}")]
    Timeout(Duration),

    #[error("malformed table output: {0}")]
    Table(#[from] TableError),
}

/// Deadline for each of the two listing calls when the caller does not choose.
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(60);

/// The three primitive queries the discovery pipeline needs from a cluster.
pub trait Introspect {
    /// Every resource kind the cluster serves, one row per kind.
    fn list_resources(&self) -> impl Future<Output = Result<Vec<ResourceRow>, QueryError>>;

    /// Every `group/version` the cluster serves (`version` for the core group).
    fn list_api_versions(&self) -> impl Future<Output = Result<Vec<String>, QueryError>>;

    /// Succeeds when `name` is servable under `api_version`.
    fn check_version(
        &self,
        name: &str,
        api_version: &str,
    ) -> impl Future<Output = Result<(), QueryError>>;
}

/// Await `call`, giving up after `timeout` when one is set.
pub(crate) async fn with_timeout<T, F>(timeout: Option<Duration>, call: F) -> Result<T, QueryError>
where
    F: Future<Output = Result<T, QueryError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| QueryError::Timeout(limit))?,
        None => call.await,
    }
}

/// What to do when listing resources or versions fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure and continue as if the listing were empty.
    #[default]
    Degrade,
    /// Abort discovery with a [`DiscoveryError`].
    Propagate,
}

/// Listing failure surfaced under [`FailurePolicy::Propagate`].
#[derive(thiserror::Error, Debug)]
pub enum DiscoveryError {
    #[error("failed to list API resources")]
    ListResources(#[source] QueryError),

    #[error("failed to list API versions")]
    ListApiVersions(#[source] QueryError),
}

/// Options for [`discover_identifiers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverOptions {
    pub denylist: Denylist,
    /// Probe pool size and the per-probe timeout.
    pub probe: ProbeOptions,
    /// Deadline for listing resources and for listing versions. `None` waits
    /// indefinitely.
    pub list_timeout: Option<Duration>,
    pub policy: FailurePolicy,
}

impl DiscoverOptions {
    pub fn with_denylist(mut self, denylist: Denylist) -> Self {
        self.denylist = denylist;
        self
    }

    pub fn with_probe(mut self, probe: ProbeOptions) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_list_timeout(mut self, list_timeout: Option<Duration>) -> Self {
        self.list_timeout = list_timeout;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            denylist: Denylist::standard(),
            probe: ProbeOptions::default(),
            list_timeout: Some(DEFAULT_LIST_TIMEOUT),
            policy: FailurePolicy::default(),
        }
    }
}

/// Result of one discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Validated identifiers in deterministic order.
    pub identifiers: Vec<ResourceIdentifier>,
    /// External calls issued, listings included.
    pub calls: usize,
    /// External calls that failed or timed out.
    pub failures: usize,
}

impl DiscoveryReport {
    /// True when calls were made and none of them succeeded.
    pub fn all_calls_failed(&self) -> bool {
        self.calls > 0 && self.failures == self.calls
    }

    /// Render the identifiers with `format`, joined by `delimiter`.
    pub fn render(&self, format: &IdentifierFormat, delimiter: &str) -> String {
        format.render_all(&self.identifiers, delimiter)
    }
}

/// Run the discovery pipeline against `client`.
///
/// Resources and versions are listed concurrently. Rows passing the denylist
/// are probed against every version listed for their group, and the pairings
/// that pass become the report's identifiers.
pub async fn discover_identifiers<C>(
    client: &C,
    options: &DiscoverOptions,
) -> Result<DiscoveryReport, DiscoveryError>
where
    C: Introspect,
{
    let timeout = options.list_timeout;
    let (resources, api_versions) = join!(
        with_timeout(timeout, client.list_resources()),
        with_timeout(timeout, client.list_api_versions()),
    );

    let mut report = DiscoveryReport {
        calls: 2,
        ..Default::default()
    };

    let resources = match resources {
        Ok(resources) => resources,
        Err(error) if options.policy == FailurePolicy::Propagate => {
            return Err(DiscoveryError::ListResources(error));
        }
        Err(error) => {
            warn!(%error, "listing API resources failed, continuing without resources");
            report.failures += 1;
            Vec::new()
        }
    };

    let api_versions = match api_versions {
        Ok(api_versions) => api_versions,
        Err(error) if options.policy == FailurePolicy::Propagate => {
            return Err(DiscoveryError::ListApiVersions(error));
        }
        Err(error) => {
            warn!(%error, "listing API versions failed, continuing without versions");
            report.failures += 1;
            Vec::new()
        }
    };

    let index = VersionIndex::from_api_versions(&api_versions);
    let candidates: Vec<&ResourceRow> = options.denylist.filter(&resources).collect();
    debug!(
        resources = resources.len(),
        candidates = candidates.len(),
        groups = index.len(),
        "probing candidate resources"
    );

    let outcome = probe_resources(client, candidates, &index, &options.probe).await;
    report.calls += outcome.attempted;
    report.failures += outcome.failed;
    report.identifiers = outcome.identifiers;

    info!(
        identifiers = report.identifiers.len(),
        calls = report.calls,
        failures = report.failures,
        "discovery finished"
    );
    Ok(report)
}
