// src/ingest/gate.rs
//! Freshness + dedup gate. Pure and synchronous: no I/O, no clock reads —
//! `now` comes in as an argument so the whole thing is table-testable.

use std::collections::HashSet;

use crate::ingest::types::CandidateItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Stale,
    Duplicate,
}

#[derive(Debug, Default)]
pub struct GateResult {
    /// Publishable candidates, newest first.
    pub fresh: Vec<CandidateItem>,
    /// (id, reason) for everything gated out, in input order.
    pub skipped: Vec<(String, SkipReason)>,
    /// True when `fresh` only became non-empty via the fallback window.
    pub used_fallback: bool,
}

/// Keep items with `published_at >= now - window` whose id is not already
/// in `published`, newest first. When the primary window yields nothing and
/// a fallback window is configured, the filter is re-run once with the
/// extended window before giving up.
///
/// Duplicate wins over stale: an already-published item is reported as a
/// duplicate even if it has also aged out, because re-publishing it would
/// be the worse failure.
pub fn gate(
    items: Vec<CandidateItem>,
    now: u64,
    window_secs: u64,
    fallback_window_secs: Option<u64>,
    published: &HashSet<String>,
) -> GateResult {
    let mut result = run_window(&items, now, window_secs, published);
    if result.fresh.is_empty() {
        if let Some(fb) = fallback_window_secs {
            if fb > window_secs {
                let mut widened = run_window(&items, now, fb, published);
                if !widened.fresh.is_empty() {
                    widened.used_fallback = true;
                    result = widened;
                }
            }
        }
    }
    result.fresh.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    result
}

fn run_window(
    items: &[CandidateItem],
    now: u64,
    window_secs: u64,
    published: &HashSet<String>,
) -> GateResult {
    let cutoff = now.saturating_sub(window_secs);
    let mut out = GateResult::default();
    let mut seen_this_run: HashSet<&str> = HashSet::new();

    for item in items {
        if published.contains(&item.id) || !seen_this_run.insert(&item.id) {
            out.skipped.push((item.id.clone(), SkipReason::Duplicate));
            continue;
        }
        if item.published_at < cutoff {
            out.skipped.push((item.id.clone(), SkipReason::Stale));
            continue;
        }
        out.fresh.push(item.clone());
    }
    out
}
