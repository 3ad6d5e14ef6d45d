use thiserror::Error;

/// Failures that terminate a publisher resolution chain.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Non-OK HTTP status (other than the handled oembed 401).
    #[error("YouTube {stage} request failed: {status_text} ({status})")]
    Fetch { stage: &'static str, url: String, status: u16, status_text: String },

    /// Escaped text embedded in a page could not be decoded.
    #[error("error parsing publisher name from response: {0}")]
    Extraction(#[source] serde_json::Error),

    #[error("YouTube fetch request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid {what} response body: {source}")]
    Decode { what: &'static str, #[source] source: serde_json::Error },
}

impl ResolveError {
    pub fn is_fetch_failure(&self) -> bool { matches!(self, Self::Fetch { .. }) }
    pub fn is_extraction_failure(&self) -> bool { matches!(self, Self::Extraction(_)) }
}
