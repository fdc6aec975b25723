use std::path::Path;

use anyhow::Context;
use futures::future::try_join_all;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use kube::{
    Client, Config,
    config::{KubeConfigOptions, Kubeconfig},
};

use super::{Introspect, QueryError};
use crate::{resource::ResourceRow, version::split_group_version};

/// [`Introspect`] implementation that talks to the API server's discovery
/// endpoints directly.
#[derive(Clone)]
pub struct DiscoverClient {
    client: Client,
}

impl DiscoverClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from kubeconfig.
    ///
    /// With neither `context` nor `kubeconfig`, the configuration is inferred
    /// the way kube does it (in-cluster environment first, then kubeconfig).
    pub async fn try_from_kubeconfig(
        context: Option<String>,
        kubeconfig: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let options = KubeConfigOptions {
            context,
            ..Default::default()
        };

        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("Failed to read kubeconfig at {path:?}"))?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .context("Failed to load kubeconfig")?
            }
            None if options.context.is_some() => Config::from_kubeconfig(&options)
                .await
                .context("Failed to load kubeconfig")?,
            None => Config::infer()
                .await
                .context("Failed to infer Kubernetes configuration")?,
        };

        let client = Client::try_from(config).context("Failed to build Kubernetes client")?;
        Ok(Self::new(client))
    }

    /// List the resources of the preferred version of every group,
    /// subresources excluded, core group first.
    pub async fn list_api_resources(&self) -> Result<Vec<APIResource>, kube::Error> {
        let core = self.client.list_core_api_versions().await?;
        let core_lists = try_join_all(
            core.versions
                .first()
                .map(|version| self.client.list_core_api_resources(version)),
        );

        let groups = self.client.list_api_groups().await?;
        let group_lists = try_join_all(groups.groups.iter().filter_map(|group| {
            group
                .preferred_version
                .as_ref()
                .or_else(|| group.versions.first())
                .map(|version| self.client.list_api_group_resources(&version.group_version))
        }));

        let (core_lists, group_lists) = futures::try_join!(core_lists, group_lists)?;
        Ok(core_lists
            .into_iter()
            .chain(group_lists)
            .flat_map(resources_in)
            .collect())
    }

    async fn resource_list(&self, api_version: &str) -> Result<APIResourceList, kube::Error> {
        if api_version.contains('/') {
            self.client.list_api_group_resources(api_version).await
        } else {
            self.client.list_core_api_resources(api_version).await
        }
    }
}

/// Top-level resources of `list`, with group and version filled in from the
/// list's group version.
pub fn resources_in(list: APIResourceList) -> impl Iterator<Item = APIResource> {
    let (group, version) = split_group_version(&list.group_version);
    let (group, version) = (group.to_string(), version.to_string());
    list.resources
        .into_iter()
        .filter(|resource| !resource.name.contains('/'))
        .map(move |mut resource| {
            resource.group = Some(group.clone());
            resource.version = Some(version.clone());
            resource
        })
}

/// Convert a discovered resource into the row `kubectl api-resources` prints.
pub fn row_from_api_resource(resource: &APIResource) -> ResourceRow {
    ResourceRow::new(
        &resource.name,
        resource
            .short_names
            .as_deref()
            .map(|short_names| short_names.join(","))
            .unwrap_or_default(),
        resource.group.as_deref().unwrap_or_default(),
        resource.namespaced.to_string(),
        &resource.kind,
    )
}

impl Introspect for DiscoverClient {
    async fn list_resources(&self) -> Result<Vec<ResourceRow>, QueryError> {
        let resources = self.list_api_resources().await?;
        Ok(resources.iter().map(row_from_api_resource).collect())
    }

    async fn list_api_versions(&self) -> Result<Vec<String>, QueryError> {
        let (core, groups) = futures::try_join!(
            self.client.list_core_api_versions(),
            self.client.list_api_groups()
        )?;

        Ok(core
            .versions
            .into_iter()
            .chain(
                groups
                    .groups
                    .into_iter()
                    .flat_map(|group| group.versions)
                    .map(|version| version.group_version),
            )
            .collect())
    }

    async fn check_version(&self, name: &str, api_version: &str) -> Result<(), QueryError> {
        let list = self.resource_list(api_version).await?;
        if list.resources.iter().any(|resource| resource.name == name) {
            Ok(())
        } else {
            Err(QueryError::NotServed {
                name: name.to_string(),
                api_version: api_version.to_string(),
            })
        }
    }
}
