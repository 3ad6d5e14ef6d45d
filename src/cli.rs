use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Drive the media visit core from the command line
#[derive(Parser)]
#[command(name = "mediavisit")]
#[command(about = "Resolve YouTube publishers and record media visits", long_about = None)]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Ledger database URL, overrides the config file
    #[arg(long, global = true)]
    pub database: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PathKind {
    Video,
    Channel,
    User,
    Custom,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dispatch one classified navigation
    Visit {
        #[arg(long, default_value_t = 0)]
        tab_id: u64,
        #[arg(long, default_value_t = 0)]
        window_id: u64,
        #[arg(value_enum)]
        kind: PathKind,
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "")]
        channel_id: String,
        #[arg(long, default_value = "")]
        publisher_key: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        fav_icon_url: String,
        #[arg(long, default_value = "")]
        media_key: String,
    },
    /// Dispatch one completed watch-time request
    Watchtime {
        #[arg(long, default_value_t = 0)]
        tab_id: u64,
        url: String,
    },
    /// Resolve a video URL's publisher without touching the ledger
    Resolve {
        url: String,
        /// Scrape the video page instead of asking oembed first
        #[arg(long)]
        scrape: bool,
    },
    /// Look up the cached publisher for a media key
    Publisher {
        media_key: String,
    },
    /// List the most recent ledger visits
    Visits {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Feed a JSON-lines file of browser events through the event loop
    Replay {
        file: PathBuf,
    },
}
