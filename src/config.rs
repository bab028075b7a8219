// src/config.rs
//! Runtime configuration, read once from environment variables at startup.
//! Every knob is enumerated in README.md; call `dotenvy::dotenv()` before
//! `Config::from_env()` so a local `.env` works in development.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub chat_id: String,
    /// Public link rendered in the caption footer, e.g. "https://t.me/mychannel".
    pub channel_link: String,
    pub brand: String,

    pub freshness_window_secs: u64,
    /// Extended window tried once when the primary window yields nothing.
    pub fallback_window_secs: Option<u64>,
    pub max_posts_per_run: usize,
    pub caption_limit: usize,

    pub min_body_chars: usize,
    /// Minimum share of cyrillic letters in the body; 0.0 disables the check.
    pub cyrillic_ratio_min: f64,

    pub state_path: PathBuf,
    pub state_cap: usize,
    pub font_path: PathBuf,
    pub feeds_path: Option<PathBuf>,
    pub rewrite_rules_path: Option<PathBuf>,

    pub http_timeout_secs: u64,
    pub send_timeout_secs: u64,
    pub send_retries: u8,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("parsing ${key}={v:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bot_token = env_or("BOT_TOKEN", "").trim().to_string();
        let chat_id = env_or("CHANNEL_ID", "").trim().to_string();
        if bot_token.is_empty() || chat_id.is_empty() {
            bail!("BOT_TOKEN and CHANNEL_ID must be set");
        }

        let fallback_window_secs = match std::env::var("FALLBACK_WINDOW_SECS") {
            Ok(v) => Some(
                v.trim()
                    .parse::<u64>()
                    .with_context(|| format!("parsing $FALLBACK_WINDOW_SECS={v:?}"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            bot_token,
            chat_id,
            channel_link: env_or("CHANNEL_LINK", "https://t.me/usdtdollarm"),
            brand: env_or("BRAND", "USDT=Dollar"),
            freshness_window_secs: env_parse("FRESHNESS_WINDOW_SECS", 90 * 60)?,
            fallback_window_secs,
            max_posts_per_run: env_parse("MAX_POSTS_PER_RUN", 1usize)?,
            caption_limit: env_parse("CAPTION_LIMIT", 1024usize)?,
            // Calibrated to RSS description length (a few sentences), not
            // full article text.
            min_body_chars: env_parse("MIN_BODY_CHARS", 80usize)?,
            cyrillic_ratio_min: env_parse("CYR_RATIO_MIN", 0.5f64)?,
            state_path: PathBuf::from(env_or("STATE_PATH", "data/posted.json")),
            state_cap: env_parse("STATE_CAP", 5000usize)?,
            font_path: PathBuf::from(env_or("FONT_PATH", "data/DejaVuSans-Bold.ttf")),
            feeds_path: std::env::var("FEEDS_PATH").ok().map(PathBuf::from),
            rewrite_rules_path: std::env::var("REWRITE_RULES_PATH").ok().map(PathBuf::from),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", 12u64)?,
            send_timeout_secs: env_parse("SEND_TIMEOUT_SECS", 20u64)?,
            send_retries: env_parse("SEND_RETRIES", 3u8)?,
        })
    }
}
