//! Auto-poster — binary entrypoint.
//! One invocation is one run: fetch feeds, pick at most a handful of fresh
//! unpublished items, render a title card, publish to the channel, commit.
//! Scheduling (cron etc.) lives outside; runs must not overlap on the same
//! state file.

use anyhow::{Context, Result};
use tracing::Instrument;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use autoposter::config::Config;
use autoposter::ingest::feeds;
use autoposter::ingest::providers::rss::RssProvider;
use autoposter::ingest::types::SourceProvider;
use autoposter::pipeline::{ItemOutcome, Poster, PosterCfg};
use autoposter::publish::telegram::TelegramSender;
use autoposter::render::card::CardRenderer;
use autoposter::state::FilePublishedStore;
use autoposter::text::{IdentityRewrite, Rewrite, TableRewrite};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::from_env().context("loading configuration")?;

    let feed_urls = feeds::load_feeds(cfg.feeds_path.as_deref()).context("loading feed list")?;
    let timeout = std::time::Duration::from_secs(cfg.http_timeout_secs);
    let mut providers: Vec<Box<dyn SourceProvider>> = Vec::with_capacity(feed_urls.len());
    for url in &feed_urls {
        providers.push(Box::new(RssProvider::from_url(url, timeout)?));
    }

    let store = FilePublishedStore::open(&cfg.state_path, cfg.state_cap)
        .context("opening published state")?;

    let rewrite: Box<dyn Rewrite> = match &cfg.rewrite_rules_path {
        Some(p) => Box::new(TableRewrite::from_toml_path(p).context("loading rewrite rules")?),
        None => Box::new(IdentityRewrite),
    };

    let renderer = CardRenderer::from_font_path(&cfg.font_path, &cfg.brand)
        .context("loading card font")?;

    let delivery = TelegramSender::new(cfg.bot_token.clone(), cfg.chat_id.clone())
        .with_timeout(cfg.send_timeout_secs)
        .with_retries(cfg.send_retries);

    let mut poster = Poster::new(
        providers,
        Box::new(store),
        rewrite,
        Box::new(renderer),
        Box::new(delivery),
        PosterCfg {
            freshness_window_secs: cfg.freshness_window_secs,
            fallback_window_secs: cfg.fallback_window_secs,
            max_posts_per_run: cfg.max_posts_per_run,
            caption_limit: cfg.caption_limit,
            min_body_chars: cfg.min_body_chars,
            cyrillic_ratio_min: cfg.cyrillic_ratio_min,
            channel_link: cfg.channel_link.clone(),
            brand: cfg.brand.clone(),
        },
    );

    let report = poster
        .run_once()
        .instrument(tracing::info_span!("run"))
        .await
        .context("publishing run failed")?;

    for (id, outcome) in &report.outcomes {
        match outcome {
            ItemOutcome::Posted { message_id } => {
                tracing::info!(id = %id, message_id, "posted")
            }
            ItemOutcome::SkippedDuplicate => tracing::debug!(id = %id, "skipped: duplicate"),
            ItemOutcome::SkippedStale => tracing::debug!(id = %id, "skipped: stale"),
            ItemOutcome::SkippedQuality(r) => tracing::info!(id = %id, reason = %r, "skipped: quality"),
            ItemOutcome::SkippedError(r) => tracing::warn!(id = %id, reason = %r, "skipped: error"),
        }
    }
    for err in &report.source_errors {
        tracing::warn!(error = %err, "source skipped this run");
    }
    if report.posted == 0 {
        tracing::info!(used_fallback = report.used_fallback, "no suitable item this run");
    }

    Ok(())
}
