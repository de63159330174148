use chrono::{DateTime, Duration as ChronoDuration, Utc};
use nv_schemas::UnifiedEvent;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

/// Pure k-way merge across per-chart queues (spec §4.1 Unifier algorithm).
///
/// Each chart's queue is assumed to arrive in roughly timestamp order (the
/// source feed is append-only); the unifier does not require this globally,
/// only that within a single chart, records trail each other closely enough
/// that holding `reorder_window` worth of slack recovers the true order
/// across charts. Events older than `reorder_window` relative to `now` are
/// considered "ready" and drained in total order (`UnifiedEvent`'s `Ord`).
///
/// A chart with no new arrivals never blocks drainage of the others — there
/// is no wait-for-every-queue barrier, so a starved chart cannot stall the
/// merge (spec §4.1 "a starved queue must not block emission from others").
pub struct Unifier {
    reorder_window: ChronoDuration,
    queues: BTreeMap<i32, VecDeque<UnifiedEvent>>,
}

impl Unifier {
    pub fn new(reorder_window: Duration) -> Self {
        Self {
            reorder_window: ChronoDuration::from_std(reorder_window)
                .unwrap_or_else(|_| ChronoDuration::milliseconds(200)),
            queues: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, chart_id: i32, event: UnifiedEvent) {
        self.queues.entry(chart_id).or_default().push_back(event);
    }

    pub fn pending_len(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Drain every event whose timestamp is at least `reorder_window` old
    /// relative to `now`, in total order across all chart queues.
    pub fn drain_ready(&mut self, now: DateTime<Utc>) -> Vec<UnifiedEvent> {
        let cutoff = now - self.reorder_window;
        let mut out = Vec::new();
        loop {
            let mut best_chart: Option<i32> = None;
            for (&chart_id, queue) in self.queues.iter() {
                let Some(front) = queue.front() else { continue };
                if front.event_timestamp() > cutoff {
                    continue;
                }
                let take = match best_chart {
                    None => true,
                    Some(bc) => front < self.queues[&bc].front().expect("checked above"),
                };
                if take {
                    best_chart = Some(chart_id);
                }
            }
            match best_chart {
                Some(chart_id) => {
                    let event = self
                        .queues
                        .get_mut(&chart_id)
                        .expect("chart queue exists")
                        .pop_front()
                        .expect("front existed above");
                    out.push(event);
                }
                None => break,
            }
        }
        out
    }

    /// Force-drain everything regardless of age, used on shutdown so no
    /// buffered event is silently lost.
    pub fn drain_all(&mut self) -> Vec<UnifiedEvent> {
        self.drain_ready(Utc::now() + ChronoDuration::days(3650))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nv_schemas::{Record, RecordHeader, RecordPayload, TradePayload};

    fn event(chart: i32, symbol: &str, secs: i64, bar_index: i64) -> UnifiedEvent {
        let timestamp_secs = 1_700_000_000.0 + secs as f64;
        let record = Record {
            header: RecordHeader {
                symbol: symbol.to_string(),
                chart_id: chart,
                timestamp_secs,
                bar_index,
            },
            payload: RecordPayload::Trade(TradePayload {
                px: 1.0,
                vol: 1.0,
                seq: 0,
            }),
        };
        let ingested_at = record.header.timestamp();
        UnifiedEvent::new(record, ingested_at)
    }

    #[test]
    fn drains_nothing_within_the_reorder_window() {
        let mut u = Unifier::new(Duration::from_millis(200));
        let e = event(1, "ES", 0, 1);
        let now = e.event_timestamp();
        u.push(1, e);
        assert!(u.drain_ready(now).is_empty());
    }

    #[test]
    fn drains_in_cross_chart_timestamp_order_once_stable() {
        let mut u = Unifier::new(Duration::from_millis(200));
        let e1 = event(1, "ES", 0, 1);
        let e2 = event(2, "NQ", 1, 1);
        let e3 = event(1, "ES", 2, 2);
        let now = e3.event_timestamp() + ChronoDuration::milliseconds(300);
        u.push(1, e1.clone());
        u.push(2, e2.clone());
        u.push(1, e3.clone());
        let drained = u.drain_ready(now);
        assert_eq!(drained, vec![e1, e2, e3]);
    }

    #[test]
    fn starved_chart_does_not_block_drainage_of_others() {
        let mut u = Unifier::new(Duration::from_millis(200));
        let stale = event(1, "ES", 0, 1);
        let now = stale.event_timestamp() + ChronoDuration::milliseconds(300);
        u.push(1, stale.clone());
        // Chart 2 never receives anything — chart 1's ready event still drains.
        let drained = u.drain_ready(now);
        assert_eq!(drained, vec![stale]);
        assert_eq!(u.pending_len(), 0);
    }

    #[test]
    fn out_of_order_arrival_within_window_is_corrected() {
        let mut u = Unifier::new(Duration::from_millis(200));
        let early = event(1, "ES", 0, 1);
        let late = event(2, "NQ", 1, 1);
        let now = late.event_timestamp() + ChronoDuration::milliseconds(300);
        // Arrival order reversed relative to timestamp order.
        u.push(2, late.clone());
        u.push(1, early.clone());
        let drained = u.drain_ready(now);
        assert_eq!(drained, vec![early, late]);
    }
}
