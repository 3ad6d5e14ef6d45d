use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;

use crate::types::PublisherInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherInsert {
    pub publisher_key: String,
    pub channel_id: String,
    pub name: String,
    pub url: String,
    pub favicon_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPublisherInsert {
    pub media_key: String,
    pub publisher_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitInsert {
    pub id: String,
    pub kind: String, // "video" | "channel" | "user" | "custom" | "duration"
    pub tab_id: i64,
    pub url: String,
    pub publisher_key: String,
    pub media_key: String,
    pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRow {
    pub id: String,
    pub kind: String,
    pub tab_id: i64,
    pub url: String,
    pub publisher_key: String,
    pub media_key: String,
    pub duration: i64,
}

type PublisherTuple = (String, String, String, String, String);

fn publisher_from_tuple((publisher_key, name, url, favicon_url, channel_id): PublisherTuple) -> PublisherInfo {
    PublisherInfo { publisher_key, name, url, favicon_url, channel_id }
}

/// Empty incoming fields never clobber what is already stored.
pub async fn upsert_publisher(pool: &AnyPool, p: &PublisherInsert) -> Result<()> {
    sqlx::query(
        "INSERT INTO publishers(publisher_key, channel_id, name, url, favicon_url) VALUES(?, ?, ?, ?, ?)\n         ON CONFLICT(publisher_key) DO UPDATE SET\n           channel_id=COALESCE(NULLIF(excluded.channel_id, ''), publishers.channel_id),\n           name=COALESCE(NULLIF(excluded.name, ''), publishers.name),\n           url=COALESCE(NULLIF(excluded.url, ''), publishers.url),\n           favicon_url=COALESCE(NULLIF(excluded.favicon_url, ''), publishers.favicon_url),\n           updated_at=CURRENT_TIMESTAMP",
    )
    .bind(&p.publisher_key)
    .bind(&p.channel_id)
    .bind(&p.name)
    .bind(&p.url)
    .bind(&p.favicon_url)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_media_publisher(pool: &AnyPool, m: &MediaPublisherInsert) -> Result<()> {
    sqlx::query(
        "INSERT INTO media_publishers(media_key, publisher_key) VALUES(?, ?)\n         ON CONFLICT(media_key) DO UPDATE SET publisher_key=excluded.publisher_key, updated_at=CURRENT_TIMESTAMP",
    )
    .bind(&m.media_key)
    .bind(&m.publisher_key)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_visit(pool: &AnyPool, v: &VisitInsert) -> Result<()> {
    sqlx::query(
        "INSERT INTO visits(id, kind, tab_id, url, publisher_key, media_key, duration) VALUES(?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&v.id)
    .bind(&v.kind)
    .bind(v.tab_id)
    .bind(&v.url)
    .bind(&v.publisher_key)
    .bind(&v.media_key)
    .bind(v.duration)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_publisher(pool: &AnyPool, publisher_key: &str) -> Result<Option<PublisherInfo>> {
    let row = sqlx::query_as::<_, PublisherTuple>(
        "SELECT publisher_key, name, url, favicon_url, channel_id FROM publishers WHERE publisher_key = ?",
    )
    .bind(publisher_key)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(publisher_from_tuple))
}

pub async fn find_publisher_for_media(pool: &AnyPool, media_key: &str) -> Result<Option<PublisherInfo>> {
    let row = sqlx::query_as::<_, PublisherTuple>(
        "SELECT p.publisher_key, p.name, p.url, p.favicon_url, p.channel_id\n         FROM media_publishers m JOIN publishers p ON p.publisher_key = m.publisher_key\n         WHERE m.media_key = ?",
    )
    .bind(media_key)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(publisher_from_tuple))
}

pub async fn total_duration_for_media(pool: &AnyPool, media_key: &str) -> Result<i64> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT CAST(COALESCE(SUM(duration), 0) AS INTEGER) FROM visits WHERE media_key = ? AND kind = 'duration'",
    )
    .bind(media_key)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

pub async fn list_visits(pool: &AnyPool, limit: i64) -> Result<Vec<VisitRow>> {
    let rows = sqlx::query_as::<_, (String, String, i64, String, String, String, i64)>(
        "SELECT id, kind, tab_id, url, publisher_key, media_key, duration FROM visits ORDER BY created_at DESC, rowid DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, kind, tab_id, url, publisher_key, media_key, duration)| VisitRow { id, kind, tab_id, url, publisher_key, media_key, duration })
        .collect())
}
