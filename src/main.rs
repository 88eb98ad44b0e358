//! qzsync: incremental Qzone photo album mirror.
//!
//! Walks the account's albums through the paginated photo API and streams
//! new items into per-album directories with bounded concurrency. A JSON
//! track file remembers each album's last-synced upstream timestamp, and a
//! newest-first resume boundary stops pagination as soon as a run reaches
//! content an earlier run already downloaded.

#![warn(clippy::all)]

mod cli;
mod config;
mod paths;
mod qzone;
mod retry;
mod scheduler;
mod source;
mod store;
mod sync;
mod track;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::qzone::QzoneClient;
use crate::retry::RetryConfig;
use crate::source::AlbumSource;
use crate::store::{FsMediaStore, MediaStore};
use crate::sync::engine::{AlbumSyncEngine, EngineConfig};
use crate::sync::SyncDriver;
use crate::track::TrackStore;

/// Print every album the account has, one page at a time.
async fn run_list_albums(source: &dyn AlbumSource, page_size: u64) -> anyhow::Result<()> {
    let mut offset = 0u64;
    println!("Albums:");
    loop {
        let page = source.list_albums(offset, page_size).await?;
        if page.is_empty() {
            break;
        }
        for album in &page {
            println!("  {} ({} items)", album.name, album.item_count);
        }
        offset += page_size;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let filter = cli.log_level.as_filter();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = Config::from_cli(cli)?;
    tracing::info!(
        uin = %config.uin,
        concurrency = config.concurrent,
        "starting qzsync"
    );

    let retry = RetryConfig {
        max_retries: config.max_retries,
        ..RetryConfig::default()
    };
    let client = QzoneClient::new(config.cookie.clone(), config.uin.clone(), retry)?;

    if config.list_albums {
        return run_list_albums(&client, config.page_size).await;
    }

    let source: Arc<dyn AlbumSource> = Arc::new(client);
    let media: Arc<dyn MediaStore> = Arc::new(FsMediaStore);

    media.ensure_dir(&config.save_root).await?;
    let mut track = TrackStore::load(config.save_root.join("track.json"))?;

    let engine = AlbumSyncEngine::new(
        Arc::clone(&source),
        media,
        EngineConfig {
            save_root: config.save_root.clone(),
            concurrent: config.concurrent,
            page_size: config.page_size,
            no_progress_bar: config.no_progress_bar,
        },
    );
    let driver = SyncDriver::new(source, engine, config.album_filter(), config.page_size);

    driver.run(&mut track).await
}
