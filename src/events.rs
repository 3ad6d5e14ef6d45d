use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dispatcher::VisitDispatcher;
use crate::types::{Dispatch, PathClassification};

pub const WATCHTIME_URL_PREFIX: &str = "https://www.youtube.com/api/stats/watchtime?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    MainFrame,
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Font,
    Object,
    Xmlhttprequest,
    Ping,
    Media,
    Websocket,
    Other,
}

/// Events delivered by the browser host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BrowserEvent {
    #[serde(rename_all = "camelCase")]
    Navigation { window_id: u64, tab_id: u64, publisher_info: PathClassification },
    #[serde(rename_all = "camelCase")]
    RequestCompleted {
        tab_id: u64,
        url: String,
        #[serde(rename = "type")]
        request_type: RequestType,
    },
}

/// True for completed requests the watch-time handler cares about.
pub fn is_watchtime_request(url: &str, request_type: RequestType) -> bool {
    matches!(request_type, RequestType::Image | RequestType::Media | RequestType::Script | RequestType::Xmlhttprequest)
        && url.starts_with(WATCHTIME_URL_PREFIX)
}

/// Single-task event loop. Handlers run concurrently as futures polled by this
/// task; a slow fetch only delays its own chain.
pub struct EventLoop {
    dispatcher: VisitDispatcher,
    rx: mpsc::Receiver<BrowserEvent>,
}

impl EventLoop {
    pub fn new(dispatcher: VisitDispatcher, buffer: usize) -> (mpsc::Sender<BrowserEvent>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { dispatcher, rx })
    }

    /// Run until every sender is dropped and all in-flight handlers finish.
    /// Returns the outcomes in completion order; handler errors are logged and skipped.
    pub async fn run(mut self) -> Vec<Dispatch> {
        let dispatcher = &self.dispatcher;
        let mut inflight = FuturesUnordered::new();
        let mut outcomes = Vec::new();
        let mut open = true;

        loop {
            tokio::select! {
                ev = self.rx.recv(), if open => match ev {
                    Some(ev) => inflight.push(handle_event(dispatcher, ev)),
                    None => open = false,
                },
                Some(res) = inflight.next() => match res {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => warn!("media visit handler failed: {e:#}"),
                },
                else => break,
            }
        }
        outcomes
    }
}

async fn handle_event(dispatcher: &VisitDispatcher, ev: BrowserEvent) -> Result<Dispatch> {
    match ev {
        BrowserEvent::Navigation { window_id, tab_id, publisher_info } => {
            dispatcher.handle_navigation(&publisher_info, window_id, tab_id).await
        }
        BrowserEvent::RequestCompleted { tab_id, url, request_type } => {
            if !is_watchtime_request(&url, request_type) {
                debug!(%url, ?request_type, "ignoring completed request");
                return Ok(Dispatch::Dropped);
            }
            dispatcher.handle_watchtime(tab_id, &url).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::resolver::{PublisherResolver, DEFAULT_OEMBED_ENDPOINT};
    use crate::testing::{MockFetcher, RecordingLedger};
    use crate::types::{ChannelPathData, LedgerStatus, MediaVisitRecord, PublisherInfo};

    #[test]
    fn watchtime_filter() {
        let url = "https://www.youtube.com/api/stats/watchtime?docid=abc&st=0&et=1";
        assert!(is_watchtime_request(url, RequestType::Xmlhttprequest));
        assert!(is_watchtime_request(url, RequestType::Image));
        assert!(!is_watchtime_request(url, RequestType::MainFrame));
        assert!(!is_watchtime_request("https://www.youtube.com/api/stats/playback?docid=abc", RequestType::Xmlhttprequest));
        assert!(!is_watchtime_request("https://www.youtube.com/api/stats/watchtime", RequestType::Media));
    }

    #[test]
    fn parses_host_events() {
        let nav = r#"{"event":"navigation","windowId":1,"tabId":2,"publisherInfo":{"pathType":"video","data":{"url":"https://www.youtube.com/watch?v=x","channelId":"","publisherKey":"","title":""}}}"#;
        assert!(matches!(serde_json::from_str::<BrowserEvent>(nav).unwrap(), BrowserEvent::Navigation { tab_id: 2, .. }));
        let req = r#"{"event":"requestCompleted","tabId":3,"url":"https://www.youtube.com/api/stats/watchtime?docid=x","type":"xmlhttprequest"}"#;
        assert!(matches!(
            serde_json::from_str::<BrowserEvent>(req).unwrap(),
            BrowserEvent::RequestCompleted { tab_id: 3, request_type: RequestType::Xmlhttprequest, .. }
        ));
    }

    #[tokio::test]
    async fn loop_drives_both_event_kinds() {
        let info = PublisherInfo { publisher_key: "youtube#channel:UC1".into(), name: "Chan".into(), ..Default::default() };
        let ledger = Arc::new(RecordingLedger::new(LedgerStatus::Ok, Some(info)));
        let fetcher = Arc::new(MockFetcher::new());
        let dispatcher = VisitDispatcher::new(ledger.clone(), PublisherResolver::new(fetcher, DEFAULT_OEMBED_ENDPOINT));
        let (tx, event_loop) = EventLoop::new(dispatcher, 8);

        tx.send(BrowserEvent::Navigation {
            window_id: 1,
            tab_id: 2,
            publisher_info: PathClassification::Channel(ChannelPathData {
                url: "https://www.youtube.com/channel/UC1".into(),
                channel_id: "UC1".into(),
                publisher_key: "youtube#channel:UC1".into(),
                fav_icon_url: String::new(),
                title: "Chan".into(),
            }),
        }).await.unwrap();
        tx.send(BrowserEvent::RequestCompleted {
            tab_id: 2,
            url: "https://www.youtube.com/api/stats/watchtime?docid=abc&st=0&et=4".into(),
            request_type: RequestType::Xmlhttprequest,
        }).await.unwrap();
        tx.send(BrowserEvent::RequestCompleted {
            tab_id: 2,
            url: "https://www.youtube.com/generate_204".into(),
            request_type: RequestType::Image,
        }).await.unwrap();
        drop(tx);

        let outcomes = event_loop.run().await;
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.iter().filter(|o| **o == Dispatch::Dropped).count(), 1);
        let records = ledger.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| matches!(r, MediaVisitRecord::Duration(u) if u.duration == 4)));
    }

    #[tokio::test]
    async fn loop_survives_oversized_watchtime() {
        let info = PublisherInfo { publisher_key: "youtube#channel:UC1".into(), ..Default::default() };
        let ledger = Arc::new(RecordingLedger::new(LedgerStatus::Ok, Some(info)));
        let fetcher = Arc::new(MockFetcher::new());
        let dispatcher = VisitDispatcher::new(ledger.clone(), PublisherResolver::new(fetcher, DEFAULT_OEMBED_ENDPOINT));
        let (tx, event_loop) = EventLoop::new(dispatcher, 8);

        for et in ["1e300,1e300", "inf,inf", "4,4"] {
            tx.send(BrowserEvent::RequestCompleted {
                tab_id: 1,
                url: format!("https://www.youtube.com/api/stats/watchtime?docid=a&st=0,0&et={et}"),
                request_type: RequestType::Xmlhttprequest,
            }).await.unwrap();
        }
        drop(tx);

        let outcomes = event_loop.run().await;
        assert_eq!(outcomes.len(), 3);
        let mut durations: Vec<i64> = ledger.records().iter().filter_map(|r| match r {
            MediaVisitRecord::Duration(u) => Some(u.duration),
            _ => None,
        }).collect();
        durations.sort();
        assert_eq!(durations, vec![0, 0, 8]);
    }

    #[tokio::test]
    async fn loop_survives_failing_handler() {
        let ledger = Arc::new(RecordingLedger::new(LedgerStatus::NotFound, None));
        let fetcher = Arc::new(MockFetcher::new());
        let dispatcher = VisitDispatcher::new(ledger.clone(), PublisherResolver::new(fetcher, DEFAULT_OEMBED_ENDPOINT));
        let (tx, event_loop) = EventLoop::new(dispatcher, 8);

        // oembed 404 from the mock fails the chain
        tx.send(BrowserEvent::RequestCompleted {
            tab_id: 1,
            url: "https://www.youtube.com/api/stats/watchtime?docid=abc".into(),
            request_type: RequestType::Media,
        }).await.unwrap();
        drop(tx);

        let outcomes = event_loop.run().await;
        assert!(outcomes.is_empty());
        assert!(ledger.records().is_empty());
    }
}
