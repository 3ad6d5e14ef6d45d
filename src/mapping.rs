use crate::dao::{MediaPublisherInsert, PublisherInsert, VisitInsert};
use crate::types::{ChannelVisit, CustomVisit, DurationUpdate, UserVisit, VideoVisit};

// SQLite integers are signed; tab ids beyond i64::MAX are clamped.
fn tab_id_column(tab_id: u64) -> i64 {
    i64::try_from(tab_id).unwrap_or(i64::MAX)
}

fn visit(kind: &str, tab_id: u64, url: &str, publisher_key: &str, media_key: &str, duration: i64) -> VisitInsert {
    VisitInsert {
        id: uuid::Uuid::new_v4().to_string(),
        kind: kind.to_string(),
        tab_id: tab_id_column(tab_id),
        url: url.to_string(),
        publisher_key: publisher_key.to_string(),
        media_key: media_key.to_string(),
        duration,
    }
}

pub fn publisher_insert_from_video(v: &VideoVisit) -> PublisherInsert {
    PublisherInsert {
        publisher_key: v.publisher_key.clone(),
        channel_id: v.channel_id.clone(),
        name: v.publisher_name.clone(),
        url: v.publisher_url.clone(),
        favicon_url: v.fav_icon_url.clone(),
    }
}

pub fn media_publisher_from_video(v: &VideoVisit) -> MediaPublisherInsert {
    MediaPublisherInsert { media_key: v.media_key.clone(), publisher_key: v.publisher_key.clone() }
}

pub fn visit_insert_from_video(v: &VideoVisit) -> VisitInsert {
    visit("video", v.tab_id, &v.publisher_url, &v.publisher_key, &v.media_key, 0)
}

pub fn publisher_insert_from_channel(v: &ChannelVisit) -> PublisherInsert {
    PublisherInsert {
        publisher_key: v.publisher_key.clone(),
        channel_id: v.channel_id.clone(),
        name: v.title.clone(),
        url: v.url.clone(),
        favicon_url: v.fav_icon_url.clone(),
    }
}

pub fn visit_insert_from_channel(v: &ChannelVisit) -> VisitInsert {
    visit("channel", v.tab_id, &v.url, &v.publisher_key, "", 0)
}

pub fn publisher_insert_from_user(v: &UserVisit) -> PublisherInsert {
    PublisherInsert {
        publisher_key: v.publisher_key.clone(),
        channel_id: v.channel_id.clone(),
        name: v.title.clone(),
        url: v.url.clone(),
        favicon_url: String::new(),
    }
}

/// `None` when the user page carried no media key.
pub fn media_publisher_from_user(v: &UserVisit) -> Option<MediaPublisherInsert> {
    (!v.media_key.is_empty()).then(|| MediaPublisherInsert { media_key: v.media_key.clone(), publisher_key: v.publisher_key.clone() })
}

pub fn visit_insert_from_user(v: &UserVisit) -> VisitInsert {
    visit("user", v.tab_id, &v.url, &v.publisher_key, &v.media_key, 0)
}

pub fn publisher_insert_from_custom(v: &CustomVisit) -> PublisherInsert {
    PublisherInsert {
        publisher_key: v.publisher_key.clone(),
        channel_id: v.channel_id.clone(),
        name: v.title.clone(),
        url: v.url.clone(),
        favicon_url: v.fav_icon_url.clone(),
    }
}

pub fn visit_insert_from_custom(v: &CustomVisit) -> VisitInsert {
    visit("custom", v.tab_id, &v.url, &v.publisher_key, "", 0)
}

pub fn visit_insert_from_duration(u: &DurationUpdate) -> VisitInsert {
    visit("duration", u.tab_id, &u.url, &u.publisher_key, &u.media_key, u.duration)
}
