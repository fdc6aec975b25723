//! In-memory [`Introspect`] used by the pipeline tests.

use std::{
    collections::{HashMap, HashSet},
    io,
    sync::Mutex,
    time::Duration,
};

use super::{Introspect, QueryError};
use crate::resource::ResourceRow;

type Pairing = (String, String);

fn pairing(name: &str, api_version: &str) -> Pairing {
    (name.to_string(), api_version.to_string())
}

fn unreachable() -> QueryError {
    QueryError::Spawn {
        program: String::from("kubectl"),
        source: io::Error::new(io::ErrorKind::ConnectionRefused, "cluster is unreachable"),
    }
}

#[derive(Debug)]
pub(crate) struct FakeCluster {
    resources: Option<Vec<ResourceRow>>,
    api_versions: Option<Vec<String>>,
    hang_resources: bool,
    resources_delay: Option<Duration>,
    served: HashSet<Pairing>,
    delays: HashMap<Pairing, Duration>,
    hung: HashSet<Pairing>,
    checked: Mutex<Vec<String>>,
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self {
            resources: Some(Vec::new()),
            api_versions: Some(Vec::new()),
            hang_resources: false,
            resources_delay: None,
            served: HashSet::new(),
            delays: HashMap::new(),
            hung: HashSet::new(),
            checked: Mutex::new(Vec::new()),
        }
    }
}

impl FakeCluster {
    pub fn with_resources(mut self, rows: impl IntoIterator<Item = ResourceRow>) -> Self {
        self.resources = Some(rows.into_iter().collect());
        self
    }

    pub fn with_api_versions<'a>(
        mut self,
        api_versions: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.api_versions = Some(api_versions.into_iter().map(String::from).collect());
        self
    }

    pub fn fail_resources(mut self) -> Self {
        self.resources = None;
        self
    }

    pub fn fail_api_versions(mut self) -> Self {
        self.api_versions = None;
        self
    }

    pub fn hang_resources(mut self) -> Self {
        self.hang_resources = true;
        self
    }

    pub fn delay_resources(mut self, delay: Duration) -> Self {
        self.resources_delay = Some(delay);
        self
    }

    /// Make `name` servable under `api_version`.
    pub fn serve(mut self, name: &str, api_version: &str) -> Self {
        self.served.insert(pairing(name, api_version));
        self
    }

    /// Delay the answer for one pairing.
    pub fn delay(mut self, name: &str, api_version: &str, delay: Duration) -> Self {
        self.delays.insert(pairing(name, api_version), delay);
        self
    }

    /// Never answer for one pairing.
    pub fn hang(mut self, name: &str, api_version: &str) -> Self {
        self.hung.insert(pairing(name, api_version));
        self
    }

    /// Checks issued so far as `name@api_version`, sorted.
    pub fn checked(&self) -> Vec<String> {
        let mut checked = self.checked.lock().unwrap().clone();
        checked.sort();
        checked
    }
}

impl Introspect for FakeCluster {
    async fn list_resources(&self) -> Result<Vec<ResourceRow>, QueryError> {
        if self.hang_resources {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.resources_delay {
            tokio::time::sleep(delay).await;
        }
        self.resources.clone().ok_or_else(unreachable)
    }

    async fn list_api_versions(&self) -> Result<Vec<String>, QueryError> {
        self.api_versions.clone().ok_or_else(unreachable)
    }

    async fn check_version(&self, name: &str, api_version: &str) -> Result<(), QueryError> {
        self.checked
            .lock()
            .unwrap()
            .push(format!("{name}@{api_version}"));

        let key = pairing(name, api_version);
        if self.hung.contains(&key) {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }

        if self.served.contains(&key) {
            Ok(())
        } else {
            Err(QueryError::NotServed {
                name: name.to_string(),
                api_version: api_version.to_string(),
            })
        }
    }
}
