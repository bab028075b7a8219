// src/ingest/mod.rs
pub mod feeds;
pub mod gate;
pub mod providers;
pub mod types;

use crate::error::PostError;
use crate::ingest::types::{CandidateItem, SourceProvider};

/// Fetch candidates from every provider. A failing provider is reported as
/// `SourceUnavailable` and skipped; it must never take the rest of the run
/// down with it.
pub async fn fetch_all(
    providers: &[Box<dyn SourceProvider>],
) -> (Vec<CandidateItem>, Vec<PostError>) {
    let mut raw = Vec::new();
    let mut errors = Vec::new();
    for p in providers {
        match p.fetch_candidates().await {
            Ok(mut v) => {
                tracing::debug!(provider = %p.name(), items = v.len(), "provider ok");
                raw.append(&mut v);
            }
            Err(e) => {
                let err = PostError::SourceUnavailable(format!("{}: {e:#}", p.name()));
                tracing::warn!(error = %err, "provider skipped");
                errors.push(err);
            }
        }
    }
    (raw, errors)
}
