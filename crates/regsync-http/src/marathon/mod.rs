use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, header::ACCEPT};
use tracing::debug;

use regsync_core::{ByteStream, SchedulerGateway, SyncResult};
use regsync_model::{AppEnvelope, AppId, AppList, Application};

use crate::{client, config::HttpConfig};

/// Event kinds requested from the scheduler's event bus.
const EVENT_TYPES: [&str; 2] = ["status_update_event", "api_post_event"];

/// Scheduler gateway over the Marathon REST API.
pub struct MarathonClient {
    client: Client,
    base_url: String,
    cfg: HttpConfig,
}

impl MarathonClient {
    pub fn new(base_url: &str, cfg: HttpConfig) -> SyncResult<Self> {
        Ok(Self {
            client: client::build(&cfg)?,
            base_url: client::base_url(base_url),
            cfg,
        })
    }

    fn app_url(&self, id: &AppId) -> String {
        let id = id.as_str();
        let sep = if id.starts_with('/') { "" } else { "/" };
        format!("{}/v2/apps{sep}{id}?embed=app.tasks", self.base_url)
    }

    fn events_url(&self) -> String {
        let filter: Vec<String> = EVENT_TYPES
            .iter()
            .map(|t| format!("event_type={t}"))
            .collect();
        format!("{}/v2/events?{}", self.base_url, filter.join("&"))
    }
}

#[async_trait]
impl SchedulerGateway for MarathonClient {
    async fn list_applications(&self) -> SyncResult<Vec<Application>> {
        let url = format!("{}/v2/apps?embed=apps.tasks", self.base_url);
        debug!(%url, "fetching applications");

        let response = self
            .client
            .get(&url)
            .timeout(self.cfg.timeout)
            .send()
            .await
            .map_err(client::transport)?;
        let list: AppList = client::json(client::check(response).await?).await?;
        Ok(list.apps)
    }

    async fn get_application(&self, id: &AppId) -> SyncResult<Application> {
        let response = self
            .client
            .get(self.app_url(id))
            .timeout(self.cfg.timeout)
            .send()
            .await
            .map_err(client::transport)?;
        let envelope: AppEnvelope = client::json(client::check(response).await?).await?;
        Ok(envelope.app)
    }

    /// No total timeout: the response body is open-ended.
    async fn open_event_stream(&self) -> SyncResult<ByteStream> {
        let url = self.events_url();
        debug!(%url, "opening event stream");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(client::transport)?;
        let response = client::check(response).await?;

        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(client::transport)),
        ))
    }
}
