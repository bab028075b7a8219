// src/error.rs
use thiserror::Error;

/// Per-item failure taxonomy. Each variant is isolated to one candidate:
/// a failed item is skipped and the run continues with the next one.
#[derive(Debug, Error)]
pub enum PostError {
    /// Feed fetch or parse failed; the provider is skipped for this run.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The mandatory caption skeleton (labels + links with empty bodies)
    /// does not fit the limit. This is a configuration error, never an
    /// excuse to emit an over-limit caption.
    #[error("caption budget infeasible: mandatory skeleton is {skeleton} chars, limit is {limit}")]
    BudgetInfeasible { skeleton: usize, limit: usize },

    /// Transport/API error from the delivery channel. The item stays
    /// uncommitted and is retry-eligible on the next run.
    #[error("send failed: {0}")]
    SendFailed(String),
}
