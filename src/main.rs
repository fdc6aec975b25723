use std::process::ExitCode;

use anyhow::Context;
use api_resources::{
    DiscoverClient, DiscoveryReport, Kubectl, determine_context, discover_identifiers, logging,
};
use clap::{CommandFactory, Parser};
use tracing::{debug, error, info};

mod cli;
use cli::{Backend, Cli};

/// Exit status when no call to the cluster succeeded.
const EXIT_UNREACHABLE: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    api_resources::clap_complete::CompleteEnv::with_factory(Cli::command).complete();

    let cli = Cli::parse();
    logging::initialize(cli.verbose)?;

    match determine_context(cli.context.as_deref(), cli.kubeconfig.as_deref()) {
        Ok(context) => info!(%context, backend = ?cli.backend, "discovering API resources"),
        Err(error) => debug!(%error, "no kubeconfig context, relying on the backend defaults"),
    }

    let report = discover(&cli).await.context("API discovery failed")?;
    println!("{}", report.render(&cli.format, &cli.delimiter));

    if report.all_calls_failed() {
        error!(calls = report.calls, "every call to the cluster failed");
        return Ok(ExitCode::from(EXIT_UNREACHABLE));
    }
    Ok(ExitCode::SUCCESS)
}

async fn discover(cli: &Cli) -> anyhow::Result<DiscoveryReport> {
    let options = cli.discover_options();
    let report = match cli.backend {
        Backend::Kubectl => {
            let kubectl = Kubectl::new(&cli.kubectl)
                .with_context(cli.context.clone())
                .with_kubeconfig(cli.kubeconfig.clone());
            discover_identifiers(&kubectl, &options).await?
        }
        Backend::Native => {
            let client =
                DiscoverClient::try_from_kubeconfig(cli.context.clone(), cli.kubeconfig.as_deref())
                    .await?;
            discover_identifiers(&client, &options).await?
        }
    };
    Ok(report)
}
