use std::{ffi::OsString, path::PathBuf, process::Stdio};

use tokio::process::Command;
use tracing::trace;

use super::{Introspect, QueryError};
use crate::{
    resource::{ResourceRow, rows_from_table},
    table::parse_table,
};

/// Program used when no path is configured.
pub const DEFAULT_PROGRAM: &str = "kubectl";

/// [`Introspect`] implementation that runs `kubectl`.
///
/// - resources: `kubectl api-resources`, read with the column-aligned table parser
/// - versions: `kubectl api-versions`
/// - checks: `kubectl explain <name> --api-version <api-version>`, by exit status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kubectl {
    program: PathBuf,
    context: Option<String>,
    kubeconfig: Option<PathBuf>,
}

impl Kubectl {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            context: None,
            kubeconfig: None,
        }
    }

    /// Pass `--context` to every invocation.
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    /// Pass `--kubeconfig` to every invocation.
    pub fn with_kubeconfig(mut self, kubeconfig: Option<PathBuf>) -> Self {
        self.kubeconfig = kubeconfig;
        self
    }

    fn args(&self, args: &[&str]) -> Vec<OsString> {
        let mut full = Vec::with_capacity(args.len() + 4);
        if let Some(context) = &self.context {
            full.push("--context".into());
            full.push(context.into());
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            full.push("--kubeconfig".into());
            full.push(kubeconfig.into());
        }
        full.extend(args.iter().map(OsString::from));
        full
    }

    async fn run(&self, args: &[&str]) -> Result<String, QueryError> {
        let args = self.args(args);
        let command = std::iter::once(self.program.as_os_str())
            .chain(args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        trace!(%command, "running");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| QueryError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(QueryError::CommandFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

/// One api version per non-blank line.
pub fn parse_api_versions(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

impl Introspect for Kubectl {
    async fn list_resources(&self) -> Result<Vec<ResourceRow>, QueryError> {
        let stdout = self.run(&["api-resources"]).await?;
        let table = parse_table(&stdout)?;
        Ok(rows_from_table(&table)?)
    }

    async fn list_api_versions(&self) -> Result<Vec<String>, QueryError> {
        let stdout = self.run(&["api-versions"]).await?;
        Ok(parse_api_versions(&stdout))
    }

    async fn check_version(&self, name: &str, api_version: &str) -> Result<(), QueryError> {
        self.run(&["explain", name, "--api-version", api_version])
            .await
            .map(drop)
    }
}
