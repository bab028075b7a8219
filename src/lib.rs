// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod caption;
pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod state;
pub mod text;

// ---- Re-exports for stable public API ----
pub use crate::error::PostError;
pub use crate::pipeline::{ItemOutcome, Poster, PosterCfg, RunReport};
