use crate::engine::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use nv_ingest::{ChartTail, Unifier};
use nv_schemas::TradingDecision;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One chart's replay source: same dedupe semantics as the live
/// `ChartTailConfig`, minus the poll interval (replay reads whole files).
#[derive(Debug, Clone)]
pub struct ReplayChart {
    pub chart_id: i32,
    pub dedupe_window: usize,
}

impl ReplayChart {
    pub fn new(chart_id: i32) -> Self {
        Self { chart_id, dedupe_window: 10_000 }
    }
}

fn chart_file_path(dir: &Path, chart_id: i32, date: NaiveDate) -> PathBuf {
    dir.join(format!("chart_{chart_id}_{}.jsonl", date.format("%Y%m%d")))
}

/// Deterministic offline replay over historical per-chart files (spec §6
/// `replay` subcommand). Reuses the exact `ChartTail` parsing/dedupe and
/// `Unifier` total order the live pipeline uses, but synchronously: the
/// whole file is already on disk, so there is no reorder-window wait --
/// everything is immediately "ready" once unified.
///
/// Events are fed to `engine` using each event's own `event_timestamp()`
/// as `now`, so repeated runs over the same files produce byte-identical
/// decisions.
pub fn run_replay(
    engine: &mut Engine,
    chart_dir: &Path,
    charts: &[ReplayChart],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    sink: &mut dyn FnMut(&TradingDecision),
) {
    let mut unifier = Unifier::new(Duration::ZERO);
    let mut date = from.date_naive();
    let last_date = to.date_naive();

    loop {
        for chart in charts {
            let path = chart_file_path(chart_dir, chart.chart_id, date);
            let Ok(contents) = fs::read_to_string(&path) else {
                continue;
            };
            let mut tail = ChartTail::new(chart.chart_id, chart.dedupe_window);
            for line in contents.lines() {
                if let Some(event) = tail.process_line(line, Utc::now()) {
                    unifier.push(chart.chart_id, event);
                }
            }
        }
        if date >= last_date {
            break;
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    for event in unifier.drain_all() {
        let ts = event.event_timestamp();
        if ts < from || ts > to {
            continue;
        }
        engine.apply_event(&event, ts, sink);
    }
}
