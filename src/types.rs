use serde::{Deserialize, Serialize};

// --- Classifier payloads ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPathData {
    pub url: String,
    pub channel_id: String,
    pub publisher_key: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPathData {
    pub url: String,
    pub channel_id: String,
    pub publisher_key: String,
    pub media_key: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPathData {
    pub url: String,
    pub channel_id: String,
    pub publisher_key: String,
    pub fav_icon_url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPathData {
    pub url: String,
    pub channel_id: String,
    pub publisher_key: String,
    pub fav_icon_url: String,
    pub title: String,
}

/// What the navigation classifier decided a YouTube page is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pathType", content = "data", rename_all = "lowercase")]
pub enum PathClassification {
    Video(VideoPathData),
    Channel(ChannelPathData),
    User(UserPathData),
    Custom(CustomPathData),
}

impl PathClassification {
    pub fn path_type(&self) -> &'static str {
        match self {
            Self::Video(_) => "video",
            Self::Channel(_) => "channel",
            Self::User(_) => "user",
            Self::Custom(_) => "custom",
        }
    }
}

// --- Ledger side ---

/// Status of a media publisher lookup. Only 0 and 9 carry meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerStatus {
    Ok,
    NotFound,
    Other(i32),
}

impl LedgerStatus {
    pub fn from_code(code: i32) -> Self {
        match code { 0 => Self::Ok, 9 => Self::NotFound, c => Self::Other(c) }
    }

    pub fn code(&self) -> i32 {
        match self { Self::Ok => 0, Self::NotFound => 9, Self::Other(c) => *c }
    }
}

/// Cached publisher record for a media key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublisherInfo {
    pub publisher_key: String,
    pub name: String,
    pub url: String,
    pub favicon_url: String,
    pub channel_id: String,
}

// --- Emitted records ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelInfoRequest {
    pub tab_id: u64,
    pub url: String,
    pub channel_id: String,
    pub publisher_key: String,
    pub fav_icon_url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoVisit {
    pub tab_id: u64,
    pub publisher_url: String,
    pub channel_id: String,
    pub publisher_key: String,
    pub media_key: String,
    pub fav_icon_url: String,
    pub publisher_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVisit {
    pub tab_id: u64,
    pub url: String,
    pub channel_id: String,
    pub publisher_key: String,
    pub fav_icon_url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVisit {
    pub tab_id: u64,
    pub url: String,
    pub channel_id: String,
    pub publisher_key: String,
    pub media_key: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomVisit {
    pub tab_id: u64,
    pub url: String,
    pub channel_id: String,
    pub publisher_key: String,
    pub fav_icon_url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationUpdate {
    pub tab_id: u64,
    pub url: String,
    pub media_type: String,
    pub publisher_key: String,
    pub media_id: String,
    pub media_key: String,
    pub fav_icon_url: String,
    pub name: String,
    pub duration: i64,
}

/// A normalized record handed to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MediaVisitRecord {
    PanelInfo(PanelInfoRequest),
    Video(VideoVisit),
    Channel(ChannelVisit),
    User(UserVisit),
    Custom(CustomVisit),
    Duration(DurationUpdate),
}

/// What a dispatcher handler did with an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "camelCase")]
pub enum Dispatch {
    Emitted(MediaVisitRecord),
    /// The event carried no usable identity.
    Dropped,
    /// The ledger answered with a status this core does not act on.
    Ignored(LedgerStatus),
}

impl Dispatch {
    pub fn record(&self) -> Option<&MediaVisitRecord> {
        match self { Self::Emitted(r) => Some(r), _ => None }
    }
}
