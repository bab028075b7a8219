// src/pipeline.rs
//! One publishing run: fetch → gate → render → send → commit. Sequential
//! and single-threaded on purpose; the published set is read once up front
//! and mutated write-through only after positive acks. Per-item failures
//! are collected as outcomes and never abort the run; the only run-fatal
//! condition is unreadable state, which halts before any send.

use anyhow::{Context, Result};

use crate::caption;
use crate::error::PostError;
use crate::ingest::gate::{gate, SkipReason};
use crate::ingest::types::{domain_of, CandidateItem, SourceProvider};
use crate::publish::Delivery;
use crate::render::card::{TITLE_BOX_H, TITLE_BOX_W, TITLE_MAX_LINES, TITLE_SIZES};
use crate::render::fitter::fit_title;
use crate::render::CardRender;
use crate::state::PublishedStore;
use crate::text::{self, Rewrite};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Posted { message_id: i64 },
    SkippedDuplicate,
    SkippedStale,
    /// Body failed the quality gate (too short, wrong language, no lead).
    SkippedQuality(String),
    /// Render or send failure; the item stays eligible for the next run.
    SkippedError(String),
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<(String, ItemOutcome)>,
    pub posted: usize,
    pub used_fallback: bool,
    /// Providers that failed this run (the run continued without them).
    pub source_errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PosterCfg {
    pub freshness_window_secs: u64,
    pub fallback_window_secs: Option<u64>,
    pub max_posts_per_run: usize,
    pub caption_limit: usize,
    pub min_body_chars: usize,
    pub cyrillic_ratio_min: f64,
    pub channel_link: String,
    pub brand: String,
}

pub struct Poster {
    providers: Vec<Box<dyn SourceProvider>>,
    store: Box<dyn PublishedStore>,
    rewrite: Box<dyn Rewrite>,
    renderer: Box<dyn CardRender + Send + Sync>,
    delivery: Box<dyn Delivery>,
    cfg: PosterCfg,
}

impl Poster {
    pub fn new(
        providers: Vec<Box<dyn SourceProvider>>,
        store: Box<dyn PublishedStore>,
        rewrite: Box<dyn Rewrite>,
        renderer: Box<dyn CardRender + Send + Sync>,
        delivery: Box<dyn Delivery>,
        cfg: PosterCfg,
    ) -> Self {
        Self {
            providers,
            store,
            rewrite,
            renderer,
            delivery,
            cfg,
        }
    }

    pub async fn run_once(&mut self) -> Result<RunReport> {
        // Unreadable state halts the run before any send: publishing
        // without dedup protection is worse than not publishing.
        let published = self.store.load().context("loading published state")?;

        let (candidates, source_errors) = crate::ingest::fetch_all(&self.providers).await;
        tracing::info!(
            candidates = candidates.len(),
            failed_sources = source_errors.len(),
            "fetched candidates"
        );

        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let gated = gate(
            candidates,
            now,
            self.cfg.freshness_window_secs,
            self.cfg.fallback_window_secs,
            &published,
        );

        let mut report = RunReport {
            used_fallback: gated.used_fallback,
            source_errors: source_errors.iter().map(|e| e.to_string()).collect(),
            ..RunReport::default()
        };
        for (id, reason) in &gated.skipped {
            let outcome = match reason {
                SkipReason::Stale => ItemOutcome::SkippedStale,
                SkipReason::Duplicate => ItemOutcome::SkippedDuplicate,
            };
            report.outcomes.push((id.clone(), outcome));
        }

        for item in &gated.fresh {
            if report.posted >= self.cfg.max_posts_per_run {
                break;
            }
            let outcome = self.process_item(item).await?;
            if matches!(outcome, ItemOutcome::Posted { .. }) {
                report.posted += 1;
            }
            tracing::info!(id = %item.id, outcome = ?outcome, title = %item.title, "item processed");
            report.outcomes.push((item.id.clone(), outcome));
        }

        Ok(report)
    }

    /// RENDERING + SENDING for one item. `Err` only for run-fatal commit
    /// failures; everything per-item comes back as an outcome.
    async fn process_item(&mut self, item: &CandidateItem) -> Result<ItemOutcome> {
        let full = text::drop_noise(&text::clean_html(&item.body));

        if full.chars().count() < self.cfg.min_body_chars {
            return Ok(ItemOutcome::SkippedQuality("body too short".into()));
        }
        if self.cfg.cyrillic_ratio_min > 0.0
            && text::cyrillic_ratio(&full) < self.cfg.cyrillic_ratio_min
        {
            return Ok(ItemOutcome::SkippedQuality("body not cyrillic enough".into()));
        }

        let (lead, details) = text::pick_lead_and_body(&full, &item.title, self.rewrite.as_ref(), 6);
        if lead.is_empty() {
            return Ok(ItemOutcome::SkippedQuality("no usable lead".into()));
        }

        let sections = caption::build_sections(
            &item.title,
            &lead,
            &details,
            &item.url,
            &domain_of(&item.url),
            &self.cfg.channel_link,
            &self.cfg.brand,
        );
        let caption = match caption::assemble(&sections, self.cfg.caption_limit) {
            Ok(c) => c,
            Err(e @ PostError::BudgetInfeasible { .. }) => {
                tracing::warn!(id = %item.id, error = %e, "caption budget infeasible");
                return Ok(ItemOutcome::SkippedError(e.to_string()));
            }
            Err(e) => return Ok(ItemOutcome::SkippedError(e.to_string())),
        };

        let fit = fit_title(
            self.renderer.as_ref(),
            &item.title,
            TITLE_SIZES,
            TITLE_BOX_W,
            TITLE_BOX_H,
            TITLE_MAX_LINES,
        );
        if fit.degraded {
            tracing::warn!(id = %item.id, "title fitting degraded to hard truncation");
        }

        let footer = format!(
            "source: {}  •  {}",
            domain_of(&item.url),
            format_event_time(item.published_at)
        );
        let image = match self.renderer.draw(&fit.lines, fit.font_size, &footer) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(id = %item.id, error = %e, "card rendering failed");
                return Ok(ItemOutcome::SkippedError(format!("render: {e}")));
            }
        };

        match self.delivery.send(&image, &caption).await {
            Ok(ack) => {
                // Write-through: a crash after this line cannot double-post.
                self.store
                    .commit(&item.id)
                    .context("committing published id")?;
                Ok(ItemOutcome::Posted {
                    message_id: ack.message_id,
                })
            }
            Err(e) => {
                tracing::warn!(id = %item.id, error = %e, "send failed, item stays eligible");
                Ok(ItemOutcome::SkippedError(e.to_string()))
            }
        }
    }
}

fn format_event_time(ts: u64) -> String {
    chrono::DateTime::from_timestamp(ts as i64, 0)
        .map(|dt| dt.format("%d.%m %H:%M").to_string())
        .unwrap_or_default()
}
