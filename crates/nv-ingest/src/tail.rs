use crate::dedupe::DedupeWindow;
use chrono::{DateTime, Utc};
use nv_schemas::{Record, UnifiedEvent};
use std::collections::HashMap;

/// Counters surfaced by a `ChartTail` (spec §4.1 "Errors").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartTailStats {
    pub parse_errors: u64,
    pub unknown_type_count: u64,
    /// Non-monotonic `bar_index` observed for a symbol on this chart —
    /// accepted, but marks a `revision++` event (spec §4.1 "Errors").
    pub revisions: u64,
    pub dedupe_dropped: u64,
    pub accepted: u64,
}

/// Pure, synchronous per-chart cursor: parses one line at a time, applies
/// the dedupe window, and tracks `bar_index` monotonicity. The async file
/// driver in [`crate::runner`] wraps this with IO, rotation, and backoff.
pub struct ChartTail {
    chart_id: i32,
    dedupe: DedupeWindow,
    last_bar_index: HashMap<String, i64>,
    pub stats: ChartTailStats,
}

impl ChartTail {
    pub fn new(chart_id: i32, dedupe_window: usize) -> Self {
        Self {
            chart_id,
            dedupe: DedupeWindow::new(dedupe_window),
            last_bar_index: HashMap::new(),
            stats: ChartTailStats::default(),
        }
    }

    pub fn chart_id(&self) -> i32 {
        self.chart_id
    }

    /// Process one raw JSONL line. Returns `Some(UnifiedEvent)` for a new,
    /// non-duplicate, recognised record; `None` otherwise (the reason is
    /// reflected in `self.stats`).
    pub fn process_line(&mut self, line: &str, ingested_at: DateTime<Utc>) -> Option<UnifiedEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let record: Record = match Record::parse_line(line) {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.stats.unknown_type_count += 1;
                return None;
            }
            Err(e) => {
                tracing::warn!(chart_id = self.chart_id, error = %e, "malformed record line, skipping");
                self.stats.parse_errors += 1;
                return None;
            }
        };

        if !self.dedupe.insert(record.dedupe_key()) {
            self.stats.dedupe_dropped += 1;
            return None;
        }

        let symbol = record.header.symbol.clone();
        let idx = record.header.bar_index;
        match self.last_bar_index.get(&symbol) {
            Some(&last) if idx < last => {
                tracing::warn!(
                    chart_id = self.chart_id,
                    symbol = %symbol,
                    last,
                    got = idx,
                    "non-monotonic bar_index, accepting as revision"
                );
                self.stats.revisions += 1;
            }
            Some(&last) => {
                self.last_bar_index.insert(symbol.clone(), idx.max(last));
            }
            None => {
                self.last_bar_index.insert(symbol.clone(), idx);
            }
        }

        self.stats.accepted += 1;
        Some(UnifiedEvent::new(record, ingested_at))
    }
}
