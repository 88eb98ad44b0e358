use std::collections::HashSet;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::qzone::cookie::CookieJar;
use crate::sync::AlbumFilter;

/// Resolved application configuration, built once at startup and passed
/// down by value; no ambient globals.
#[derive(Debug, Clone)]
pub struct Config {
    pub cookie: CookieJar,
    pub uin: String,
    /// `<directory>/<uin>`; albums and the track file live underneath.
    pub save_root: PathBuf,
    pub albums: Vec<String>,
    pub concurrent: usize,
    pub page_size: u64,
    pub max_retries: u32,
    pub list_albums: bool,
    pub no_progress_bar: bool,
}

/// Expand ~ to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Config {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let cookie = CookieJar::parse(&cli.cookie);

        let uin = match cli.uin {
            Some(uin) => uin,
            None => cookie
                .uin()
                .map(str::to_string)
                .ok_or_else(|| {
                    anyhow::anyhow!("cookie does not contain ptui_loginuin; pass --uin")
                })?,
        };

        if cli.concurrent == 0 {
            anyhow::bail!("--concurrent must be at least 1");
        }
        if cli.page_size == 0 {
            anyhow::bail!("--page-size must be at least 1");
        }

        let save_root = expand_tilde(&cli.directory).join(&uin);

        Ok(Self {
            cookie,
            uin,
            save_root,
            albums: cli.albums,
            concurrent: cli.concurrent,
            page_size: cli.page_size,
            max_retries: cli.max_retries,
            list_albums: cli.list_albums,
            no_progress_bar: cli.no_progress_bar,
        })
    }

    /// Album selection predicate: the `--album` names, or everything when
    /// none were given.
    pub fn album_filter(&self) -> Box<AlbumFilter> {
        if self.albums.is_empty() {
            return Box::new(|_| true);
        }
        let names: HashSet<String> = self.albums.iter().cloned().collect();
        Box::new(move |album| names.contains(&album.name))
    }
}
