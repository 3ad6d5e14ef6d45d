use anyhow::{Context, Result};
use sqlx::{any::AnyConnectOptions, AnyPool, ConnectOptions, migrate::Migrator};
use sqlx::any::AnyPoolOptions;
use std::{path::PathBuf, str::FromStr};
use std::sync::Once;
use tracing::debug;

use crate::dao;
use crate::mapping;
use crate::storage::MediaLedger;
use crate::types::{ChannelVisit, CustomVisit, DurationUpdate, LedgerStatus, PanelInfoRequest, PublisherInfo, UserVisit, VideoVisit};

// sqlx::any needs its drivers registered once per process
static INSTALL_DRIVERS: Once = Once::new();

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed [`MediaLedger`].
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    // None or blank falls back to a SQLite file in the user's data directory.
    pub async fn connect(database_url: Option<&str>) -> Result<Self> {
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let url = match database_url {
            Some(u) if !u.trim().is_empty() => u.to_string(),
            _ => default_sqlite_url()?,
        };

        let opts = AnyConnectOptions::from_str(&url)
            .with_context(|| format!("invalid database URL: {url}"))?
            .disable_statement_logging();

        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .with_context(|| format!("failed to connect to database: {url}"))?;

        debug!(%url, "ledger database connected");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        match MIGRATOR.run(&self.pool).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let msg = e.to_string();
                let looks_modified = msg.contains("was previously applied but has been modified");
                let duplicate_version = msg.contains("UNIQUE constraint failed: _sqlx_migrations.version");
                if looks_modified || duplicate_version {
                    let _ = sqlx::query("DELETE FROM _sqlx_migrations").execute(&self.pool).await;
                    MIGRATOR.run(&self.pool).await.context("running migrations after ledger reset")
                } else {
                    Err(e).context("running migrations")
                }
            }
        }
    }

    pub fn pool(&self) -> &AnyPool { &self.pool }
}

#[async_trait::async_trait]
impl MediaLedger for Database {
    async fn get_media_publisher_info(&self, media_key: &str) -> Result<(LedgerStatus, Option<PublisherInfo>)> {
        Ok(match dao::find_publisher_for_media(&self.pool, media_key).await? {
            Some(info) => (LedgerStatus::Ok, Some(info)),
            None => (LedgerStatus::NotFound, None),
        })
    }

    async fn save_media_visit_video(&self, visit: &VideoVisit) -> Result<()> {
        dao::upsert_publisher(&self.pool, &mapping::publisher_insert_from_video(visit)).await?;
        dao::upsert_media_publisher(&self.pool, &mapping::media_publisher_from_video(visit)).await?;
        dao::insert_visit(&self.pool, &mapping::visit_insert_from_video(visit)).await
    }

    async fn save_media_visit_channel(&self, visit: &ChannelVisit) -> Result<()> {
        dao::upsert_publisher(&self.pool, &mapping::publisher_insert_from_channel(visit)).await?;
        dao::insert_visit(&self.pool, &mapping::visit_insert_from_channel(visit)).await
    }

    async fn save_media_visit_user(&self, visit: &UserVisit) -> Result<()> {
        dao::upsert_publisher(&self.pool, &mapping::publisher_insert_from_user(visit)).await?;
        if let Some(link) = mapping::media_publisher_from_user(visit) {
            dao::upsert_media_publisher(&self.pool, &link).await?;
        }
        dao::insert_visit(&self.pool, &mapping::visit_insert_from_user(visit)).await
    }

    async fn save_media_visit_custom(&self, visit: &CustomVisit) -> Result<()> {
        dao::upsert_publisher(&self.pool, &mapping::publisher_insert_from_custom(visit)).await?;
        dao::insert_visit(&self.pool, &mapping::visit_insert_from_custom(visit)).await
    }

    async fn update_media_duration(&self, update: &DurationUpdate) -> Result<()> {
        dao::insert_visit(&self.pool, &mapping::visit_insert_from_duration(update)).await
    }

    async fn get_publisher_panel_info(&self, request: &PanelInfoRequest) -> Result<Option<PublisherInfo>> {
        dao::find_publisher(&self.pool, &request.publisher_key).await
    }
}

fn default_sqlite_url() -> Result<String> {
    let proj = crate::config::project_dirs()
        .context("unable to determine data directory for default sqlite path")?;
    let mut path: PathBuf = proj.data_dir().to_path_buf();
    std::fs::create_dir_all(&path).with_context(|| format!("creating data dir: {}", path.display()))?;
    path.push("mediavisit.db");

    let mut path_str = path.to_string_lossy().to_string();
    if path_str.contains(' ') { path_str = path_str.replace(' ', "%20"); }
    Ok(format!("sqlite://{path_str}?mode=rwc"))
}
