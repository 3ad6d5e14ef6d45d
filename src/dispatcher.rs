use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::duration::duration_from_parts;
use crate::resolver::{PublisherResolver, ResolvedPublisher};
use crate::storage::MediaLedger;
use crate::types::*;
use crate::youtube::{self, MEDIA_TYPE};

/// Routes classified navigations and watch-time telemetry to ledger records.
#[derive(Clone)]
pub struct VisitDispatcher {
    ledger: Arc<dyn MediaLedger>,
    resolver: PublisherResolver,
}

impl VisitDispatcher {
    pub fn new(ledger: Arc<dyn MediaLedger>, resolver: PublisherResolver) -> Self {
        Self { ledger, resolver }
    }

    pub fn resolver(&self) -> &PublisherResolver { &self.resolver }

    pub async fn handle_navigation(&self, classification: &PathClassification, window_id: u64, tab_id: u64) -> Result<Dispatch> {
        debug!(window_id, tab_id, path_type = classification.path_type(), "navigation");
        match classification {
            PathClassification::Channel(data) => self.handle_channel(tab_id, data).await,
            PathClassification::User(data) => self.handle_user(tab_id, data).await,
            PathClassification::Video(data) => self.handle_video(tab_id, data).await,
            PathClassification::Custom(data) => self.handle_custom(tab_id, data).await,
        }
    }

    async fn handle_channel(&self, tab_id: u64, data: &ChannelPathData) -> Result<Dispatch> {
        let visit = ChannelVisit {
            tab_id,
            url: data.url.clone(),
            channel_id: data.channel_id.clone(),
            publisher_key: data.publisher_key.clone(),
            fav_icon_url: data.fav_icon_url.clone(),
            title: data.title.clone(),
        };
        info!(tab_id, url = %visit.url, channel_id = %visit.channel_id, publisher_key = %visit.publisher_key, title = %visit.title, "visited a channel url");
        self.ledger.save_media_visit_channel(&visit).await?;
        Ok(Dispatch::Emitted(MediaVisitRecord::Channel(visit)))
    }

    async fn handle_user(&self, tab_id: u64, data: &UserPathData) -> Result<Dispatch> {
        let visit = UserVisit {
            tab_id,
            url: data.url.clone(),
            channel_id: data.channel_id.clone(),
            publisher_key: data.publisher_key.clone(),
            media_key: data.media_key.clone(),
            title: data.title.clone(),
        };
        info!(tab_id, url = %visit.url, channel_id = %visit.channel_id, media_key = %visit.media_key, title = %visit.title, "visited a user url");
        self.ledger.save_media_visit_user(&visit).await?;
        Ok(Dispatch::Emitted(MediaVisitRecord::User(visit)))
    }

    async fn handle_custom(&self, tab_id: u64, data: &CustomPathData) -> Result<Dispatch> {
        let visit = CustomVisit {
            tab_id,
            url: data.url.clone(),
            channel_id: data.channel_id.clone(),
            publisher_key: data.publisher_key.clone(),
            fav_icon_url: data.fav_icon_url.clone(),
            title: data.title.clone(),
        };
        info!(tab_id, url = %visit.url, channel_id = %visit.channel_id, publisher_key = %visit.publisher_key, title = %visit.title, "visited a custom url");
        self.ledger.save_media_visit_custom(&visit).await?;
        Ok(Dispatch::Emitted(MediaVisitRecord::Custom(visit)))
    }

    async fn handle_video(&self, tab_id: u64, data: &VideoPathData) -> Result<Dispatch> {
        let media_id = youtube::media_id_from_url(&data.url);
        if media_id.is_empty() { return Ok(Dispatch::Dropped); }
        let media_key = youtube::media_key(&media_id);

        let (status, info) = self.ledger.get_media_publisher_info(&media_key).await?;
        debug!(%media_key, status = status.code(), "media publisher lookup");
        match (status, info) {
            (LedgerStatus::Ok, Some(_)) => {
                // Cold panel lookup: favicon intentionally blank.
                let request = PanelInfoRequest {
                    tab_id,
                    url: data.url.clone(),
                    channel_id: data.channel_id.clone(),
                    publisher_key: data.publisher_key.clone(),
                    fav_icon_url: String::new(),
                    title: data.title.clone(),
                };
                self.ledger.get_publisher_panel_info(&request).await?;
                Ok(Dispatch::Emitted(MediaVisitRecord::PanelInfo(request)))
            }
            (LedgerStatus::NotFound, _) => self.resolve_and_save(tab_id, &data.url).await,
            (status, _) => Ok(Dispatch::Ignored(status)),
        }
    }

    /// Handle a completed watch-time request (`/api/stats/watchtime?docid=…&st=…&et=…`).
    pub async fn handle_watchtime(&self, tab_id: u64, url: &str) -> Result<Dispatch> {
        let params = youtube::query_params(url);
        let media_id = youtube::media_id_from_parts(&params);
        if media_id.is_empty() { return Ok(Dispatch::Dropped); }
        let media_key = youtube::media_key(&media_id);
        let duration = duration_from_parts(&params);

        let (status, info) = self.ledger.get_media_publisher_info(&media_key).await?;
        debug!(%media_key, status = status.code(), "media publisher lookup");
        match (status, info) {
            (LedgerStatus::Ok, Some(info)) => {
                let update = DurationUpdate {
                    tab_id,
                    url: url.to_string(),
                    media_type: MEDIA_TYPE.to_string(),
                    publisher_key: info.publisher_key,
                    media_id,
                    media_key,
                    fav_icon_url: info.favicon_url,
                    name: info.name,
                    duration,
                };
                info!(tab_id, url, publisher_key = %update.publisher_key, media_key = %update.media_key, duration, "updating media duration");
                self.ledger.update_media_duration(&update).await?;
                Ok(Dispatch::Emitted(MediaVisitRecord::Duration(update)))
            }
            // The duration sample is not replayed once the publisher is known.
            (LedgerStatus::NotFound, _) => self.resolve_and_save(tab_id, &youtube::video_url(&media_id)).await,
            (status, _) => Ok(Dispatch::Ignored(status)),
        }
    }

    async fn resolve_and_save(&self, tab_id: u64, url: &str) -> Result<Dispatch> {
        let Some(publisher) = self.resolver.resolve(url).await? else { return Ok(Dispatch::Dropped) };
        let visit = video_visit(tab_id, publisher);
        info!(
            tab_id, url, fav_icon_url = %visit.fav_icon_url, channel_id = %visit.channel_id,
            publisher_name = %visit.publisher_name, publisher_url = %visit.publisher_url,
            "visited a video url"
        );
        self.ledger.save_media_visit_video(&visit).await?;
        Ok(Dispatch::Emitted(MediaVisitRecord::Video(visit)))
    }
}

fn video_visit(tab_id: u64, p: ResolvedPublisher) -> VideoVisit {
    VideoVisit {
        tab_id,
        publisher_url: p.publisher_url,
        channel_id: p.channel_id,
        publisher_key: p.publisher_key,
        media_key: p.media_key,
        fav_icon_url: p.fav_icon_url,
        publisher_name: p.publisher_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::DEFAULT_OEMBED_ENDPOINT;
    use crate::testing::{MockFetcher, RecordingLedger};

    const VIDEO: &str = "https://www.youtube.com/watch?v=abc123";
    const OEMBED: &str = "https://www.youtube.com/oembed?format=json&url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dabc123";
    const AUTHOR_URL: &str = "https://www.youtube.com/@someone";
    const WATCHTIME: &str = "https://www.youtube.com/api/stats/watchtime?ns=yt&docid=abc123&st=1,5&et=3,10";

    fn setup(status: LedgerStatus, info: Option<PublisherInfo>, fetcher: MockFetcher) -> (VisitDispatcher, Arc<RecordingLedger>, Arc<MockFetcher>) {
        let ledger = Arc::new(RecordingLedger::new(status, info));
        let fetcher = Arc::new(fetcher);
        let resolver = PublisherResolver::new(fetcher.clone(), DEFAULT_OEMBED_ENDPOINT);
        (VisitDispatcher::new(ledger.clone(), resolver), ledger, fetcher)
    }

    fn resolvable() -> MockFetcher {
        MockFetcher::new()
            .route(OEMBED, 200, &format!(r#"{{"author_name":"Someone","author_url":"{AUTHOR_URL}"}}"#))
            .route(AUTHOR_URL, 200, r#"{"ucid":"UCsomeone"},"avatar":{"thumbnails":[{"url":"https://yt3/s.jpg"}]}"#)
    }

    fn cached() -> PublisherInfo {
        PublisherInfo {
            publisher_key: "youtube#channel:UCsomeone".into(),
            name: "Someone".into(),
            url: AUTHOR_URL.into(),
            favicon_url: "https://yt3/s.jpg".into(),
            channel_id: "UCsomeone".into(),
        }
    }

    fn video_path() -> PathClassification {
        PathClassification::Video(VideoPathData {
            url: VIDEO.into(),
            channel_id: "UCsomeone".into(),
            publisher_key: "youtube#channel:UCsomeone".into(),
            title: "A video".into(),
        })
    }

    #[tokio::test]
    async fn channel_path_emits_without_fetch() {
        let (d, ledger, fetcher) = setup(LedgerStatus::NotFound, None, MockFetcher::new());
        let path = PathClassification::Channel(ChannelPathData {
            url: "https://www.youtube.com/channel/UC1".into(),
            channel_id: "UC1".into(),
            publisher_key: "youtube#channel:UC1".into(),
            fav_icon_url: "https://yt3/1.jpg".into(),
            title: "Chan".into(),
        });
        let out = d.handle_navigation(&path, 1, 7).await.unwrap();
        let Some(MediaVisitRecord::Channel(v)) = out.record() else { panic!("expected channel record") };
        assert_eq!(v.tab_id, 7);
        assert_eq!(v.fav_icon_url, "https://yt3/1.jpg");
        assert_eq!(ledger.records().len(), 1);
        assert!(ledger.lookups().is_empty());
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn user_and_custom_paths_emit_immediately() {
        let (d, ledger, fetcher) = setup(LedgerStatus::NotFound, None, MockFetcher::new());
        let user = PathClassification::User(UserPathData {
            url: "https://www.youtube.com/user/someone".into(),
            channel_id: "UC2".into(),
            publisher_key: "youtube#channel:UC2".into(),
            media_key: "youtube_user_someone".into(),
            title: "User".into(),
        });
        let custom = PathClassification::Custom(CustomPathData {
            url: "https://www.youtube.com/c/someone".into(),
            channel_id: "UC3".into(),
            publisher_key: "youtube#channel:UC3".into(),
            fav_icon_url: "https://yt3/3.jpg".into(),
            title: "Custom".into(),
        });
        d.handle_navigation(&user, 1, 2).await.unwrap();
        d.handle_navigation(&custom, 1, 2).await.unwrap();
        let records = ledger.records();
        assert!(matches!(&records[0], MediaVisitRecord::User(u) if u.media_key == "youtube_user_someone"));
        assert!(matches!(&records[1], MediaVisitRecord::Custom(c) if c.channel_id == "UC3"));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn cached_video_requests_panel_info_without_fetch() {
        let (d, ledger, fetcher) = setup(LedgerStatus::Ok, Some(cached()), resolvable());
        let out = d.handle_navigation(&video_path(), 1, 3).await.unwrap();
        let Some(MediaVisitRecord::PanelInfo(p)) = out.record() else { panic!("expected panel info") };
        assert_eq!(p.fav_icon_url, "");
        assert_eq!(p.title, "A video");
        assert_eq!(ledger.lookups(), vec!["youtube_abc123".to_string()]);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn uncached_video_runs_oembed_chain_once() {
        let (d, ledger, fetcher) = setup(LedgerStatus::NotFound, None, resolvable());
        let out = d.handle_navigation(&video_path(), 1, 3).await.unwrap();
        assert_eq!(fetcher.calls(), vec![OEMBED.to_string(), AUTHOR_URL.to_string()]);
        let records = ledger.records();
        assert_eq!(records.len(), 1);
        let MediaVisitRecord::Video(v) = &records[0] else { panic!("expected video record") };
        assert_eq!(v.publisher_name, "Someone");
        assert_eq!(v.publisher_url, AUTHOR_URL);
        assert_eq!(v.channel_id, "UCsomeone");
        assert_eq!(v.media_key, "youtube_abc123");
        assert_eq!(v.fav_icon_url, "https://yt3/s.jpg");
        assert_eq!(out.record(), Some(&records[0]));
    }

    #[tokio::test]
    async fn unknown_status_does_nothing() {
        for (status, info) in [(LedgerStatus::Other(24), Some(cached())), (LedgerStatus::Ok, None)] {
            let (d, ledger, fetcher) = setup(status, info, resolvable());
            let out = d.handle_navigation(&video_path(), 1, 3).await.unwrap();
            assert_eq!(out, Dispatch::Ignored(status));
            assert!(ledger.records().is_empty());
            assert!(fetcher.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn video_without_media_id_is_dropped() {
        let (d, ledger, _) = setup(LedgerStatus::NotFound, None, resolvable());
        let path = PathClassification::Video(VideoPathData {
            url: "https://www.youtube.com/watch".into(),
            channel_id: String::new(),
            publisher_key: String::new(),
            title: String::new(),
        });
        assert_eq!(d.handle_navigation(&path, 1, 3).await.unwrap(), Dispatch::Dropped);
        assert!(ledger.lookups().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_and_emits_nothing() {
        let (d, ledger, _) = setup(LedgerStatus::NotFound, None, MockFetcher::new().route(OEMBED, 500, ""));
        let err = d.handle_navigation(&video_path(), 1, 3).await.unwrap_err();
        let resolve_err = err.downcast_ref::<crate::error::ResolveError>().expect("resolve error");
        assert!(resolve_err.is_fetch_failure());
        assert!(ledger.records().is_empty());
    }

    #[tokio::test]
    async fn watchtime_with_cached_publisher_updates_duration() {
        let (d, ledger, fetcher) = setup(LedgerStatus::Ok, Some(cached()), resolvable());
        let out = d.handle_watchtime(9, WATCHTIME).await.unwrap();
        let Some(MediaVisitRecord::Duration(u)) = out.record() else { panic!("expected duration update") };
        assert_eq!(u.duration, 7);
        assert_eq!(u.media_type, "youtube");
        assert_eq!(u.media_id, "abc123");
        assert_eq!(u.media_key, "youtube_abc123");
        assert_eq!(u.publisher_key, "youtube#channel:UCsomeone");
        assert_eq!(u.name, "Someone");
        assert_eq!(u.url, WATCHTIME);
        assert_eq!(ledger.records().len(), 1);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn watchtime_without_publisher_resolves_and_drops_duration() {
        let (d, ledger, fetcher) = setup(LedgerStatus::NotFound, None, resolvable());
        let out = d.handle_watchtime(9, WATCHTIME).await.unwrap();
        assert!(matches!(out.record(), Some(MediaVisitRecord::Video(_))));
        assert_eq!(fetcher.calls(), vec![OEMBED.to_string(), AUTHOR_URL.to_string()]);
        assert!(ledger.records().iter().all(|r| !matches!(r, MediaVisitRecord::Duration(_))));
    }

    #[tokio::test]
    async fn watchtime_without_docid_is_dropped() {
        let (d, ledger, _) = setup(LedgerStatus::Ok, Some(cached()), resolvable());
        let out = d.handle_watchtime(9, "https://www.youtube.com/api/stats/watchtime?st=1&et=2").await.unwrap();
        assert_eq!(out, Dispatch::Dropped);
        assert!(ledger.lookups().is_empty());
    }

    #[tokio::test]
    async fn watchtime_unknown_status_does_nothing() {
        let (d, ledger, fetcher) = setup(LedgerStatus::Other(1), None, resolvable());
        assert_eq!(d.handle_watchtime(9, WATCHTIME).await.unwrap(), Dispatch::Ignored(LedgerStatus::Other(1)));
        assert!(ledger.records().is_empty());
        assert!(fetcher.calls().is_empty());
    }
}
