use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ChannelVisit, CustomVisit, DurationUpdate, LedgerStatus, PanelInfoRequest, PublisherInfo, UserVisit, VideoVisit};

/// Persistence interface of the rewards ledger.
///
/// The dispatcher only reads through [`MediaLedger::get_media_publisher_info`];
/// everything else is a hand-off of a finished record.
#[async_trait]
pub trait MediaLedger: Send + Sync {
    async fn get_media_publisher_info(&self, media_key: &str) -> Result<(LedgerStatus, Option<PublisherInfo>)>;
    async fn save_media_visit_video(&self, visit: &VideoVisit) -> Result<()>;
    async fn save_media_visit_channel(&self, visit: &ChannelVisit) -> Result<()>;
    async fn save_media_visit_user(&self, visit: &UserVisit) -> Result<()>;
    async fn save_media_visit_custom(&self, visit: &CustomVisit) -> Result<()>;
    async fn update_media_duration(&self, update: &DurationUpdate) -> Result<()>;
    async fn get_publisher_panel_info(&self, request: &PanelInfoRequest) -> Result<Option<PublisherInfo>>;
}
