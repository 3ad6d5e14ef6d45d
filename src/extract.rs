/// Return the text between the first `match_after` and the next `match_until`.
///
/// Best-effort scraping helper for fields embedded in raw HTML/JSON where a real
/// parser is not worth it. Never fails: a miss yields an empty string, and a
/// missing terminator runs the match to the end of `data`.
pub fn extract_data(data: &str, match_after: &str, match_until: &str) -> String {
    if data.len() < match_after.len() { return String::new(); }
    let Some(match_pos) = data.find(match_after) else { return String::new(); };

    let start = match_pos + match_after.len();
    let rest = &data[start..];
    match rest.find(match_until) {
        Some(0) if match_until.is_empty() => rest.to_string(),
        Some(0) => String::new(),
        Some(end) => rest[..end].to_string(),
        None => rest.to_string(),
    }
}
