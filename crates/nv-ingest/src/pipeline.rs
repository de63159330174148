use crate::runner::{run_chart_tail, ChartTailConfig};
use crate::unifier::Unifier;
use nv_schemas::UnifiedEvent;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Wires N per-chart tailing tasks into a single `Unifier`, draining it on a
/// fixed tick and forwarding globally-ordered events downstream (spec §5:
/// "per-chart tailing tasks feed a single merge task over a bounded
/// channel").
///
/// `raw_channel_capacity` bounds the per-pipeline inbound queue (spec §5:
/// "10,000 ingestion events"); once full, a slow chart tailer's `send`
/// simply awaits backpressure rather than dropping events.
pub struct IngestionPipeline {
    pub charts: Vec<ChartTailConfig>,
    pub raw_channel_capacity: usize,
    pub reorder_window: Duration,
    pub drain_tick: Duration,
}

impl IngestionPipeline {
    pub fn new(charts: Vec<ChartTailConfig>) -> Self {
        Self {
            charts,
            raw_channel_capacity: 10_000,
            reorder_window: Duration::from_millis(200),
            drain_tick: Duration::from_millis(50),
        }
    }

    /// Spawn one task per chart plus the merge task, returning a receiver
    /// of globally-ordered `UnifiedEvent`s. Dropping the returned
    /// `watch::Sender` (or sending `true`) begins a graceful shutdown: chart
    /// tasks stop polling for new lines, and the merge task force-drains
    /// whatever remains buffered before closing the output channel.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> mpsc::Receiver<UnifiedEvent> {
        let (raw_tx, mut raw_rx) = mpsc::channel::<(i32, UnifiedEvent)>(self.raw_channel_capacity);
        let (out_tx, out_rx) = mpsc::channel(self.raw_channel_capacity);

        for chart in self.charts {
            let tx = raw_tx.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(run_chart_tail(chart, tx, shutdown));
        }
        drop(raw_tx);

        let reorder_window = self.reorder_window;
        let drain_tick = self.drain_tick;
        let mut shutdown = shutdown;
        tokio::spawn(async move {
            let mut unifier = Unifier::new(reorder_window);
            let mut tick = tokio::time::interval(drain_tick);
            loop {
                tokio::select! {
                    maybe = raw_rx.recv() => {
                        match maybe {
                            Some((chart_id, event)) => unifier.push(chart_id, event),
                            None => break,
                        }
                    }
                    _ = tick.tick() => {
                        for event in unifier.drain_ready(chrono::Utc::now()) {
                            if out_tx.send(event).await.is_err() {
                                return;
                            }
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            for event in unifier.drain_all() {
                if out_tx.send(event).await.is_err() {
                    return;
                }
            }
        });

        out_rx
    }
}
