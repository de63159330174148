//! Ingestion: per-chart file tailing, idempotent dedupe, and the
//! reorder-window unifier that produces a single globally-ordered event
//! stream from the raw JSONL feeds.

pub mod dedupe;
pub mod pipeline;
pub mod runner;
pub mod tail;
pub mod unifier;

pub use dedupe::DedupeWindow;
pub use pipeline::IngestionPipeline;
pub use runner::{run_chart_tail, ChartTailConfig, IoError};
pub use tail::{ChartTail, ChartTailStats};
pub use unifier::Unifier;
