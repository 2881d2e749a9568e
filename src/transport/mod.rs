pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::errors::{FetchExhausted, TransportError};
use routes::{build_routes, RetrievalRoute};

const USER_AGENT_DEFAULT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";

/// Issues a single GET and returns the body of a successful response.
#[async_trait]
pub trait PageClient: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String, TransportError>;
}

pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT_DEFAULT)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageClient for ReqwestClient {
    async fn get_text(&self, url: &str) -> Result<String, TransportError> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(resp.text().await?)
    }
}

/// Fetches page text through an ordered list of retrieval routes.
pub struct Transport {
    client: Arc<dyn PageClient>,
    routes: Vec<Box<dyn RetrievalRoute>>,
    min_payload_len: usize,
}

impl Transport {
    pub fn new(
        client: Arc<dyn PageClient>,
        routes: Vec<Box<dyn RetrievalRoute>>,
        min_payload_len: usize,
    ) -> Self {
        Self {
            client,
            routes,
            min_payload_len,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let client = ReqwestClient::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(
            Arc::new(client),
            build_routes(&config.routes),
            config.min_payload_len,
        ))
    }

    /// Tries each route in turn; the first body of at least `min_payload_len`
    /// characters wins and later routes are not contacted.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchExhausted> {
        for route in &self.routes {
            let name = route.name();
            let route_url = route.rewrite(url);

            log::debug!("route={name} requesting {route_url}");

            let text = match self.client.get_text(&route_url).await {
                Ok(text) => text,
                Err(err) => {
                    log::warn!("route={name} url={url} outcome=error err={err}");
                    continue;
                }
            };

            let len = text.chars().count();
            if len < self.min_payload_len {
                log::warn!("route={name} url={url} outcome=undersized len={len}");
                continue;
            }

            log::debug!("route={name} url={url} outcome=success len={len}");
            return Ok(text);
        }

        Err(FetchExhausted {
            url: url.to_string(),
        })
    }
}
