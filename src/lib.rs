#![cfg_attr(not(doctest), doc = include_str!("../README.md"))]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::path::Path;

pub use clap_complete;
pub use k8s_openapi;
pub use kube;

pub mod claputil;
pub use claputil::context_value_completer;
pub mod discover;
pub use discover::{
    DiscoverOptions, DiscoveryError, DiscoveryReport, FailurePolicy, Introspect, QueryError,
    client::DiscoverClient, discover_identifiers, kubectl::Kubectl,
};
pub mod format;
pub use format::{FormatError, IdentifierFormat};
pub mod logging;
pub mod probe;
pub use probe::{ProbeOptions, ProbeOutcome, probe_resources};
pub mod resource;
pub use resource::{Denylist, ResourceIdentifier, ResourceRow};
pub mod table;
pub mod version;
pub use version::VersionIndex;

use kube::config::Kubeconfig;

/// Detects the Kubernetes context the queries will target.
///
/// Context determination follows this priority:
/// 1. Uses the context if explicitly specified.
/// 2. Retrieves the current context from `kubeconfig`, or from the default
///    kubeconfig location when no path is given.
///
/// # Errors
/// Returns an error if the kubeconfig file cannot be read or if no current
/// context is set in the kubeconfig.
pub fn determine_context(
    context: Option<&str>,
    kubeconfig: Option<&Path>,
) -> anyhow::Result<String> {
    if let Some(context) = context {
        return Ok(context.to_string());
    }

    let kubeconfig = match kubeconfig {
        Some(path) => Kubeconfig::read_from(path)?,
        None => Kubeconfig::read()?,
    };
    kubeconfig
        .current_context
        .ok_or_else(|| anyhow::anyhow!("current_context is not set"))
}
