mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, PathKind};
use mediavisit::config::Config;
use mediavisit::dao;
use mediavisit::events::BrowserEvent;
use mediavisit::types::{ChannelPathData, CustomPathData, PathClassification, UserPathData, VideoPathData};
use mediavisit::MediaVisits;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.database { config.database_url = Some(db); }

    let mv = MediaVisits::connect(&config, true).await?;

    match cli.command {
        Commands::Visit { tab_id, window_id, kind, url, channel_id, publisher_key, title, fav_icon_url, media_key } => {
            let classification = match kind {
                PathKind::Video => PathClassification::Video(VideoPathData { url, channel_id, publisher_key, title }),
                PathKind::Channel => PathClassification::Channel(ChannelPathData { url, channel_id, publisher_key, fav_icon_url, title }),
                PathKind::User => PathClassification::User(UserPathData { url, channel_id, publisher_key, media_key, title }),
                PathKind::Custom => PathClassification::Custom(CustomPathData { url, channel_id, publisher_key, fav_icon_url, title }),
            };
            print_json(&mv.handle_navigation(&classification, window_id, tab_id).await?)?;
        }
        Commands::Watchtime { tab_id, url } => {
            print_json(&mv.handle_watchtime(tab_id, &url).await?)?;
        }
        Commands::Resolve { url, scrape } => {
            print_json(&mv.resolve(&url, scrape).await?)?;
        }
        Commands::Publisher { media_key } => {
            let (status, info) = mv.publisher_info(&media_key).await?;
            let duration = match mv.database() {
                Some(db) => dao::total_duration_for_media(db.pool(), &media_key).await?,
                None => 0,
            };
            print_json(&serde_json::json!({ "status": status.code(), "publisher": info, "duration": duration }))?;
        }
        Commands::Visits { limit } => {
            let db = mv.database().context("no sqlite ledger configured")?;
            for row in dao::list_visits(db.pool(), limit).await? {
                print_json(&row)?;
            }
        }
        Commands::Replay { file } => {
            let f = tokio::fs::File::open(&file).await.with_context(|| format!("opening {}", file.display()))?;
            let mut lines = BufReader::new(f).lines();
            let mut events = Vec::new();
            let mut lineno = 0usize;
            while let Some(line) = lines.next_line().await? {
                lineno += 1;
                if line.trim().is_empty() { continue; }
                let ev: BrowserEvent = serde_json::from_str(&line)
                    .with_context(|| format!("{}:{lineno}: invalid event", file.display()))?;
                events.push(ev);
            }
            for outcome in mv.run_events(events).await? {
                print_json(&outcome)?;
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
