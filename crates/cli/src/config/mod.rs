use clap::{Parser, Subcommand};
use engine::BadgePolicy;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/moneybox.toml";
const DEFAULT_CACHE_PATH: &str = "config/moneybox_cache.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote store base URL. Empty means local only.
    pub base_url: String,
    pub cache_path: String,
    pub remote_timeout_ms: u64,
    pub badge_policy: BadgePolicy,
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            cache_path: DEFAULT_CACHE_PATH.to_string(),
            remote_timeout_ms: 3_000,
            badge_policy: BadgePolicy::default(),
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn has_remote(&self) -> bool {
        !self.base_url.trim().is_empty()
    }
}

#[derive(Debug, Parser)]
#[command(name = "moneybox", about = "Track savings against a monthly goal")]
pub struct Args {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    config: Option<String>,
    /// Override remote base URL (e.g. http://127.0.0.1:3000). Pass an empty
    /// string to work offline.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Override the local cache file.
    #[arg(long, global = true)]
    cache_path: Option<String>,
    /// Override the timeout of remote calls, in milliseconds.
    #[arg(long, global = true)]
    remote_timeout_ms: Option<u64>,
    /// When milestone badges fire: `banded` or `crossing`.
    #[arg(long, global = true, value_parser = parse_badge_policy)]
    badge_policy: Option<BadgePolicy>,
    /// Override log level.
    #[arg(long, global = true)]
    level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// The password is never read from the command line.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and show its first month.
    Register {
        username: String,
        /// Monthly goal; 25000 when omitted.
        #[arg(long)]
        goal: Option<String>,
    },
    /// Save an amount for today.
    Save { username: String, amount: String },
    /// Show the dashboard.
    Status { username: String },
    /// Change the monthly goal.
    Goal { username: String, amount: String },
}

fn parse_badge_policy(raw: &str) -> std::result::Result<BadgePolicy, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "banded" => Ok(BadgePolicy::Banded),
        "crossing" => Ok(BadgePolicy::Crossing),
        other => Err(format!("unknown badge policy `{other}`")),
    }
}

/// File settings layered under `MONEYBOX_*` environment variables.
pub fn from_sources(config_path: &str) -> Result<AppConfig> {
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("MONEYBOX").try_parsing(true));
    Ok(builder.build()?.try_deserialize()?)
}

pub fn load(args: &Args) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut settings = from_sources(config_path)?;

    if let Some(base_url) = &args.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(cache_path) = &args.cache_path {
        settings.cache_path = cache_path.clone();
    }
    if let Some(timeout) = args.remote_timeout_ms {
        settings.remote_timeout_ms = timeout;
    }
    if let Some(policy) = args.badge_policy {
        settings.badge_policy = policy;
    }
    if let Some(level) = &args.level {
        settings.level = level.clone();
    }

    Ok(settings)
}
