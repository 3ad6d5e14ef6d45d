//! In-memory fetcher and ledger doubles for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::ResolveError;
use crate::fetch::{FetchResponse, Fetcher};
use crate::storage::MediaLedger;
use crate::types::*;

/// Serves canned responses by exact URL and records every request. Unknown URLs get a 404.
#[derive(Default)]
pub(crate) struct MockFetcher {
    routes: HashMap<String, (u16, String)>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub(crate) fn new() -> Self { Self::default() }

    pub(crate) fn route(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(url.to_string(), (status, body.to_string()));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, ResolveError> {
        self.calls.lock().unwrap().push(url.to_string());
        let (status, body) = self.routes.get(url).cloned().unwrap_or((404, String::new()));
        let status_text = match status { 200 => "OK", 401 => "Unauthorized", 404 => "Not Found", 500 => "Internal Server Error", _ => "" };
        Ok(FetchResponse { status, status_text: status_text.to_string(), body })
    }
}

/// Answers lookups with a fixed status and keeps every record it was handed.
pub(crate) struct RecordingLedger {
    status: LedgerStatus,
    info: Option<PublisherInfo>,
    lookups: Mutex<Vec<String>>,
    records: Mutex<Vec<MediaVisitRecord>>,
}

impl RecordingLedger {
    pub(crate) fn new(status: LedgerStatus, info: Option<PublisherInfo>) -> Self {
        Self { status, info, lookups: Mutex::new(Vec::new()), records: Mutex::new(Vec::new()) }
    }

    pub(crate) fn lookups(&self) -> Vec<String> { self.lookups.lock().unwrap().clone() }
    pub(crate) fn records(&self) -> Vec<MediaVisitRecord> { self.records.lock().unwrap().clone() }

    fn push(&self, record: MediaVisitRecord) { self.records.lock().unwrap().push(record); }
}

#[async_trait]
impl MediaLedger for RecordingLedger {
    async fn get_media_publisher_info(&self, media_key: &str) -> Result<(LedgerStatus, Option<PublisherInfo>)> {
        self.lookups.lock().unwrap().push(media_key.to_string());
        Ok((self.status, self.info.clone()))
    }
    async fn save_media_visit_video(&self, visit: &VideoVisit) -> Result<()> { self.push(MediaVisitRecord::Video(visit.clone())); Ok(()) }
    async fn save_media_visit_channel(&self, visit: &ChannelVisit) -> Result<()> { self.push(MediaVisitRecord::Channel(visit.clone())); Ok(()) }
    async fn save_media_visit_user(&self, visit: &UserVisit) -> Result<()> { self.push(MediaVisitRecord::User(visit.clone())); Ok(()) }
    async fn save_media_visit_custom(&self, visit: &CustomVisit) -> Result<()> { self.push(MediaVisitRecord::Custom(visit.clone())); Ok(()) }
    async fn update_media_duration(&self, update: &DurationUpdate) -> Result<()> { self.push(MediaVisitRecord::Duration(update.clone())); Ok(()) }
    async fn get_publisher_panel_info(&self, request: &PanelInfoRequest) -> Result<Option<PublisherInfo>> {
        self.push(MediaVisitRecord::PanelInfo(request.clone()));
        Ok(self.info.clone())
    }
}
