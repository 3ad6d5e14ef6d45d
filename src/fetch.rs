use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::ResolveError;

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(&self) -> bool { (200..300).contains(&self.status) }
    pub fn text(&self) -> &str { &self.body }
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> { serde_json::from_str(&self.body) }
}

/// Network seam used by the publisher resolver.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse, ResolveError>;
}

/// reqwest-backed fetcher. No timeouts or retries: a hung request stalls only
/// the resolution chain waiting on it.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, ResolveError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok(FetchResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
