use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ResolveError;
use crate::fetch::Fetcher;
use crate::youtube;

pub const DEFAULT_OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

/// Publisher identity assembled at the end of a resolution chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPublisher {
    pub channel_id: String,
    pub publisher_key: String,
    pub media_key: String,
    pub fav_icon_url: String,
    pub publisher_name: String,
    pub publisher_url: String,
}

/// One step of the chain. A failed chain is the `Err` of [`PublisherResolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveState {
    OembedFetch,
    ScrapeFetch,
    ChannelPageFetch { author_name: String, author_url: String },
    Resolved(ResolvedPublisher),
}

#[derive(Deserialize)]
struct OembedResponse {
    #[serde(default)]
    author_url: String,
    #[serde(default)]
    author_name: String,
}

/// Runs the oembed → channel page / scrape fallback chain for one video URL.
#[derive(Clone)]
pub struct PublisherResolver {
    fetcher: Arc<dyn Fetcher>,
    oembed_endpoint: String,
}

impl PublisherResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, oembed_endpoint: impl Into<String>) -> Self {
        Self { fetcher, oembed_endpoint: oembed_endpoint.into() }
    }

    /// Resolve starting from oembed. `Ok(None)` when the URL names no video.
    pub async fn resolve(&self, url: &str) -> Result<Option<ResolvedPublisher>, ResolveError> {
        self.run(url, ResolveState::OembedFetch).await
    }

    /// Resolve by scraping the page directly, skipping oembed.
    pub async fn scrape(&self, url: &str) -> Result<Option<ResolvedPublisher>, ResolveError> {
        self.run(url, ResolveState::ScrapeFetch).await
    }

    async fn run(&self, url: &str, entry: ResolveState) -> Result<Option<ResolvedPublisher>, ResolveError> {
        let media_id = youtube::media_id_from_url(url);
        if media_id.is_empty() {
            debug!(url, "no media id in url, skipping resolution");
            return Ok(None);
        }

        let mut state = entry;
        loop {
            debug!(?state, url, "resolver step");
            state = match state {
                ResolveState::OembedFetch => self.fetch_oembed(&media_id).await?,
                ResolveState::ScrapeFetch => self.fetch_scrape(url, &media_id).await?,
                ResolveState::ChannelPageFetch { author_name, author_url } => {
                    self.fetch_channel_page(&media_id, author_name, author_url).await?
                }
                ResolveState::Resolved(publisher) => return Ok(Some(publisher)),
            };
        }
    }

    async fn fetch_oembed(&self, media_id: &str) -> Result<ResolveState, ResolveError> {
        let url = oembed_url(&self.oembed_endpoint, media_id);
        let resp = self.fetcher.get(&url).await?;
        if resp.status == 401 {
            info!(media_id, "embedding disabled, scraping video page instead");
            return Ok(ResolveState::ScrapeFetch);
        }
        if !resp.ok() {
            return Err(ResolveError::Fetch { stage: "oembed", url, status: resp.status, status_text: resp.status_text });
        }
        let oembed: OembedResponse = resp.json().map_err(|source| ResolveError::Decode { what: "oembed", source })?;
        Ok(ResolveState::ChannelPageFetch { author_name: oembed.author_name, author_url: oembed.author_url })
    }

    async fn fetch_channel_page(&self, media_id: &str, author_name: String, author_url: String) -> Result<ResolveState, ResolveError> {
        let resp = self.fetcher.get(&author_url).await?;
        if !resp.ok() {
            return Err(ResolveError::Fetch { stage: "publisher", url: author_url, status: resp.status, status_text: resp.status_text });
        }
        let publisher = assemble(media_id, resp.text(), author_name, author_url)?;
        Ok(ResolveState::Resolved(publisher))
    }

    async fn fetch_scrape(&self, url: &str, media_id: &str) -> Result<ResolveState, ResolveError> {
        let resp = self.fetcher.get(url).await?;
        if !resp.ok() {
            return Err(ResolveError::Fetch { stage: "publisher", url: url.to_string(), status: resp.status, status_text: resp.status_text });
        }
        let publisher = assemble(media_id, resp.text(), String::new(), String::new())?;
        Ok(ResolveState::Resolved(publisher))
    }
}

/// oembed query URL for a video; the video URL is percent-encoded as a single query value.
pub fn oembed_url(endpoint: &str, media_id: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(youtube::video_url(media_id).as_bytes()).collect();
    format!("{endpoint}?format=json&url={encoded}")
}

// Known name/url win over anything derived from the page body.
fn assemble(media_id: &str, body: &str, name: String, url: String) -> Result<ResolvedPublisher, ResolveError> {
    let channel_id = youtube::channel_id(body);
    let publisher_name = if name.is_empty() { youtube::publisher_name(body)? } else { name };
    let publisher_url = if url.is_empty() { youtube::channel_url(&channel_id) } else { url };
    Ok(ResolvedPublisher {
        publisher_key: youtube::publisher_key(&channel_id),
        media_key: youtube::media_key(media_id),
        fav_icon_url: youtube::fav_icon_url(body),
        channel_id,
        publisher_name,
        publisher_url,
    })
}
