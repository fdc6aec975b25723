use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

use api_resources::{
    Denylist, DiscoverOptions, FailurePolicy, IdentifierFormat, ProbeOptions,
    context_value_completer,
    discover::{DEFAULT_LIST_TIMEOUT, kubectl::DEFAULT_PROGRAM},
    probe::DEFAULT_CONCURRENCY,
    resource::{DEFAULT_GROUP_DENYLIST, DEFAULT_KIND_DENYLIST},
};
use clap::{ArgAction, Parser, ValueEnum};

/// How the cluster is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Run kubectl.
    Kubectl,
    /// Call the API server discovery endpoints directly.
    Native,
}

/// List the group/version/kind of every API resource a cluster serves.
#[derive(Debug, Parser)]
#[command(name = "api-resources", version, about, long_about = None)]
pub struct Cli {
    /// Delimiter string placed between identifiers [default: newline]
    #[arg(long, default_value = "\n", hide_default_value = true)]
    pub delimiter: String,

    /// Format string applied to each identifier; `%s` is replaced by the identifier
    #[arg(long, default_value = "%s")]
    pub format: IdentifierFormat,

    /// API groups to leave out
    #[arg(long, value_name = "GROUP", num_args = 0.., default_values = DEFAULT_GROUP_DENYLIST)]
    pub group_denylist: Vec<String>,

    /// Resource kinds to leave out
    #[arg(long, value_name = "KIND", num_args = 0.., default_values = DEFAULT_KIND_DENYLIST)]
    pub kind_denylist: Vec<String>,

    /// How to query the cluster
    #[arg(long, value_enum, default_value_t = Backend::Kubectl, env = "API_RESOURCES_BACKEND")]
    pub backend: Backend,

    /// kubectl binary used by the kubectl backend
    #[arg(long, env = "KUBECTL", default_value = DEFAULT_PROGRAM)]
    pub kubectl: PathBuf,

    /// Kubernetes context to target
    #[arg(long, add = context_value_completer())]
    pub context: Option<String>,

    /// Path to the kubeconfig file
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Maximum number of version checks in flight
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: NonZeroUsize,

    /// Seconds to wait for each version check, 0 to wait indefinitely
    #[arg(long, value_name = "SECONDS", default_value = "5", value_parser = parse_seconds)]
    pub timeout: Duration,

    /// Seconds to wait for listing resources or versions, 0 to wait indefinitely
    #[arg(long, value_name = "SECONDS", default_value = "60", value_parser = parse_seconds)]
    pub list_timeout: Duration,

    /// Fail when resources or versions cannot be listed instead of printing nothing
    #[arg(long)]
    pub strict: bool,

    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn denylist(&self) -> Denylist {
        Denylist::new(&self.group_denylist, &self.kind_denylist)
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions::default()
            .with_concurrency(self.concurrency)
            .with_timeout(deadline(self.timeout))
    }

    pub fn list_timeout(&self) -> Option<Duration> {
        deadline(self.list_timeout)
    }

    pub fn policy(&self) -> FailurePolicy {
        if self.strict {
            FailurePolicy::Propagate
        } else {
            FailurePolicy::Degrade
        }
    }

    pub fn discover_options(&self) -> DiscoverOptions {
        DiscoverOptions::default()
            .with_denylist(self.denylist())
            .with_probe(self.probe_options())
            .with_list_timeout(self.list_timeout())
            .with_policy(self.policy())
    }
}

fn deadline(timeout: Duration) -> Option<Duration> {
    Some(timeout).filter(|timeout| !timeout.is_zero())
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number of seconds"))?;
    Duration::try_from_secs_f64(seconds).map_err(|error| error.to_string())
}
