pub mod config;
pub mod dao;
pub mod db;
pub mod dispatcher;
pub mod duration;
pub mod error;
pub mod events;
pub mod extract;
pub mod fetch;
pub mod mapping;
pub mod resolver;
pub mod storage;
pub mod types;
pub mod youtube;

#[cfg(test)]
mod testing;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::dispatcher::VisitDispatcher;
    pub use crate::error::ResolveError;
    pub use crate::events::{BrowserEvent, EventLoop, RequestType};
    pub use crate::resolver::{PublisherResolver, ResolvedPublisher};
    pub use crate::storage::MediaLedger;
    pub use crate::types::*;
    pub use crate::MediaVisits;
}

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::db::Database;
use crate::dispatcher::VisitDispatcher;
use crate::events::{BrowserEvent, EventLoop};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::resolver::{PublisherResolver, ResolvedPublisher};
use crate::storage::MediaLedger;
use crate::types::{Dispatch, LedgerStatus, PathClassification, PublisherInfo};

/// Async library entry point. Owns the ledger and the dispatcher built on it.
#[derive(Clone)]
pub struct MediaVisits {
    ledger: Arc<dyn MediaLedger>,
    dispatcher: VisitDispatcher,
    database: Option<Database>,
    event_buffer: usize,
}

impl MediaVisits {
    /// Open the SQLite ledger named by `config` and build an HTTP-backed resolver.
    pub async fn connect(config: &Config, run_migrations: bool) -> Result<Self> {
        let db = Database::connect(config.database_url.as_deref()).await?;
        if run_migrations { db.run_migrations().await?; }
        let fetcher = Arc::new(HttpFetcher::new(&config.user_agent)?);
        let mut visits = Self::with_parts(Arc::new(db.clone()), fetcher, config);
        visits.database = Some(db);
        Ok(visits)
    }

    /// Build on a caller-supplied ledger and fetcher.
    pub fn with_parts(ledger: Arc<dyn MediaLedger>, fetcher: Arc<dyn Fetcher>, config: &Config) -> Self {
        let resolver = PublisherResolver::new(fetcher, config.oembed_endpoint.clone());
        let dispatcher = VisitDispatcher::new(ledger.clone(), resolver);
        Self { ledger, dispatcher, database: None, event_buffer: config.event_buffer }
    }

    /// The SQLite ledger when built by [`MediaVisits::connect`].
    pub fn database(&self) -> Option<&Database> { self.database.as_ref() }

    pub async fn handle_navigation(&self, classification: &PathClassification, window_id: u64, tab_id: u64) -> Result<Dispatch> {
        self.dispatcher.handle_navigation(classification, window_id, tab_id).await
    }

    pub async fn handle_watchtime(&self, tab_id: u64, url: &str) -> Result<Dispatch> {
        self.dispatcher.handle_watchtime(tab_id, url).await
    }

    /// Run the resolver alone, without touching the ledger.
    pub async fn resolve(&self, url: &str, scrape: bool) -> Result<Option<ResolvedPublisher>> {
        let resolver = self.dispatcher.resolver();
        let resolved = if scrape { resolver.scrape(url).await? } else { resolver.resolve(url).await? };
        Ok(resolved)
    }

    pub async fn publisher_info(&self, media_key: &str) -> Result<(LedgerStatus, Option<PublisherInfo>)> {
        self.ledger.get_media_publisher_info(media_key).await
    }

    /// A sender for browser events and the loop that consumes them. Drive the loop with
    /// [`EventLoop::run`]; it stops once every sender is dropped.
    pub fn event_loop(&self) -> (mpsc::Sender<BrowserEvent>, EventLoop) {
        EventLoop::new(self.dispatcher.clone(), self.event_buffer)
    }

    /// Feed `events` through a fresh event loop and collect the outcomes.
    pub async fn run_events(&self, events: Vec<BrowserEvent>) -> Result<Vec<Dispatch>> {
        let (tx, event_loop) = self.event_loop();
        let runner = event_loop.run();
        let feeder = async move {
            for ev in events {
                tx.send(ev).await.map_err(|_| anyhow::anyhow!("event loop closed early"))?;
            }
            Ok::<_, anyhow::Error>(())
        };
        let (fed, outcomes) = tokio::join!(feeder, runner);
        fed?;
        Ok(outcomes)
    }
}
