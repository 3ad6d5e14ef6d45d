//! Identifier derivation for YouTube media and publishers.
//!
//! Everything here is pure: URLs and page text in, keys and fields out.
//! Only [`publisher_name`] can fail.

use std::collections::HashMap;

use url::Url;

use crate::error::ResolveError;
use crate::extract::extract_data;

pub const MEDIA_TYPE: &str = "youtube";

const CHANNEL_ID_PATTERNS: [(&str, &str); 4] = [
    (r#""ucid":""#, "\""),
    (r#"HeaderRenderer":{"channelId":""#, "\""),
    (r#"<link rel="canonical" href="https://www.youtube.com/channel/"#, "\">"),
    (r#"browseEndpoint":{"browseId":""#, "\""),
];

const FAV_ICON_PATTERNS: [(&str, &str); 2] = [
    (r#""avatar":{"thumbnails":[{"url":""#, "\""),
    (r#""width":88,"height":88},{"url":""#, "\""),
];

/// Value of the `v` query parameter, or empty when absent or the URL is unparsable.
pub fn media_id_from_url(url: &str) -> String {
    query_param(url, "v").unwrap_or_default()
}

/// Value of the `docid` query parameter carried by watch-time telemetry.
pub fn media_id_from_parts(params: &HashMap<String, String>) -> String {
    params.get("docid").cloned().unwrap_or_default()
}

pub fn media_key(media_id: &str) -> String { format!("{MEDIA_TYPE}_{media_id}") }

pub fn video_url(media_id: &str) -> String { format!("https://www.youtube.com/watch?v={media_id}") }

pub fn publisher_key(channel_id: &str) -> String { format!("{MEDIA_TYPE}#channel:{channel_id}") }

pub fn channel_url(id: &str) -> String { format!("https://www.youtube.com/channel/{id}") }

/// Channel id from page text, trying the most reliable markers first.
pub fn channel_id(data: &str) -> String {
    first_match(data, &CHANNEL_ID_PATTERNS)
}

pub fn fav_icon_url(data: &str) -> String {
    first_match(data, &FAV_ICON_PATTERNS)
}

/// Publisher display name from the `"author":"…"` field.
///
/// The raw field is still JSON-escaped, so it is decoded by wrapping it in an
/// object literal and running it through the JSON parser.
pub fn publisher_name(data: &str) -> Result<String, ResolveError> {
    let raw = extract_data(data, r#""author":""#, "\"");
    if raw.is_empty() { return Ok(String::new()); }

    let wrapped = format!(r#"{{"publisher":"{raw}"}}"#);
    let mut object: HashMap<String, String> = serde_json::from_str(&wrapped).map_err(ResolveError::Extraction)?;
    Ok(object.remove("publisher").unwrap_or_default())
}

/// All query parameters of a URL, last value wins.
pub fn query_params(url: &str) -> HashMap<String, String> {
    Url::parse(url)
        .map(|u| u.query_pairs().into_owned().collect())
        .unwrap_or_default()
}

fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url).ok()?.query_pairs().find(|(k, _)| k == name).map(|(_, v)| v.into_owned())
}

fn first_match(data: &str, patterns: &[(&str, &str)]) -> String {
    patterns
        .iter()
        .map(|(after, until)| extract_data(data, after, until))
        .find(|m| !m.is_empty())
        .unwrap_or_default()
}
