use clap::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "qzsync", about = "Incrementally download Qzone photo albums")]
pub struct Cli {
    /// Raw Cookie header captured from a logged-in Qzone browser session.
    /// Prefer the QZONE_COOKIE environment variable over the flag so the
    /// credential stays out of process listings.
    #[arg(long, env = "QZONE_COOKIE", hide_env_values = true)]
    pub cookie: String,

    /// Root directory albums are mirrored into (a per-account subdirectory
    /// is created underneath).
    #[arg(short = 'd', long, env = "QZONE_SAVE_PATH")]
    pub directory: String,

    /// QQ account id; taken from the cookie's ptui_loginuin when omitted.
    #[arg(long)]
    pub uin: Option<String>,

    /// Album(s) to sync; every album is synced when omitted.
    #[arg(short = 'a', long = "album")]
    pub albums: Vec<String>,

    /// List available albums and exit.
    #[arg(short = 'l', long)]
    pub list_albums: bool,

    /// Maximum concurrent downloads.
    #[arg(long, env = "QZONE_DOWNLOAD_CONCURRENT", default_value_t = 8)]
    pub concurrent: usize,

    /// Page size for album and item listings.
    #[arg(long, default_value_t = 20)]
    pub page_size: u64,

    /// Transport-level retries per request.
    #[arg(long, default_value_t = 5)]
    pub max_retries: u32,

    /// Log level (RUST_LOG overrides).
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Disable the progress bar.
    #[arg(long)]
    pub no_progress_bar: bool,
}
