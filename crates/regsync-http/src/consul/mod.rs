use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use regsync_core::{RegistryGateway, SyncError, SyncResult};
use regsync_model::{ServiceRecord, TaskId};

use crate::{client, config::HttpConfig};

const TOKEN_HEADER: &str = "X-Consul-Token";

/// Agent service definition as accepted by `/v1/agent/service/register`.
#[derive(Debug, Serialize)]
struct Registration<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Tags")]
    tags: &'a [String],
    #[serde(rename = "Address")]
    address: &'a str,
    #[serde(rename = "Port")]
    port: u16,
    #[serde(rename = "Check", skip_serializing_if = "Option::is_none")]
    check: Option<Check<'a>>,
}

#[derive(Debug, Serialize)]
struct Check<'a> {
    #[serde(rename = "HTTP")]
    http: &'a str,
    #[serde(rename = "Interval")]
    interval: &'a str,
    #[serde(rename = "Timeout")]
    timeout: &'a str,
}

impl<'a> From<&'a ServiceRecord> for Registration<'a> {
    fn from(r: &'a ServiceRecord) -> Self {
        Self {
            id: r.id.as_str(),
            name: &r.name,
            tags: &r.tags,
            address: &r.address,
            port: r.port,
            check: r.check.as_ref().map(|c| Check {
                http: &c.url,
                interval: &c.interval,
                timeout: &c.timeout,
            }),
        }
    }
}

/// Entry of the `/v1/agent/services` map.
#[derive(Debug, Deserialize)]
struct AgentService {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Tags", default)]
    tags: Option<Vec<String>>,
}

/// Registry gateway over the Consul agent API.
pub struct ConsulClient {
    client: Client,
    base_url: String,
    cfg: HttpConfig,
}

impl ConsulClient {
    pub fn new(base_url: &str, cfg: HttpConfig) -> SyncResult<Self> {
        Ok(Self {
            client: client::build(&cfg)?,
            base_url: client::base_url(base_url),
            cfg,
        })
    }

    fn prepare(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.timeout(self.cfg.timeout);
        match &self.cfg.token {
            Some(token) => req.header(TOKEN_HEADER, token),
            None => req,
        }
    }
}

#[async_trait]
impl RegistryGateway for ConsulClient {
    async fn register(&self, record: &ServiceRecord) -> SyncResult<()> {
        let url = format!("{}/v1/agent/service/register", self.base_url);
        let response = self
            .prepare(self.client.put(&url))
            .json(&Registration::from(record))
            .send()
            .await
            .map_err(client::transport)?;
        client::check(response).await?;
        Ok(())
    }

    async fn deregister(&self, id: &TaskId) -> SyncResult<()> {
        let url = client::endpoint(
            &self.base_url,
            &["v1", "agent", "service", "deregister", id.as_str()],
        )?;
        let response = self
            .prepare(self.client.put(url))
            .send()
            .await
            .map_err(client::transport)?;

        match client::check(response).await {
            Ok(_) => Ok(()),
            Err(SyncError::NotFound(_)) => {
                debug!(task = %id, "entry already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn list(&self, scope_tag: &str) -> SyncResult<HashSet<TaskId>> {
        let url = format!("{}/v1/agent/services", self.base_url);
        let response = self
            .prepare(self.client.get(&url))
            .send()
            .await
            .map_err(client::transport)?;
        let services: HashMap<String, AgentService> =
            client::json(client::check(response).await?).await?;

        Ok(services
            .into_values()
            .filter(|s| {
                s.tags
                    .as_deref()
                    .is_some_and(|tags| tags.iter().any(|t| t == scope_tag))
            })
            .map(|s| TaskId::from(s.id))
            .collect())
    }
}
