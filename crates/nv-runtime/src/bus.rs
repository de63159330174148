use chrono::{DateTime, Utc};
use nv_schemas::{Bar, VixRegime};
use tokio::sync::broadcast;

/// Updates the `Engine` fans out as it folds the event stream, for anything
/// downstream that wants them without polling (the overview diagram's
/// EventBus, spec §4). A lagging or absent subscriber never blocks the
/// decision path -- `publish` ignores the no-receivers case, and a slow
/// subscriber simply misses events it falls behind on.
#[derive(Debug, Clone)]
pub enum BusEvent {
    BarClosed { symbol: String, bar: Box<Bar> },
    LevelsUpdated { symbol: String, at: DateTime<Utc> },
    VixUpdated { value: f64, regime: VixRegime, at: DateTime<Utc> },
}

pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: BusEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nv_schemas::{Bar, BarKey};

    fn bar() -> Bar {
        Bar::open_new(BarKey::new("ES", 0, 1), Utc::now(), 4500.0)
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new(8);
        bus.publish(BusEvent::BarClosed { symbol: "ES".into(), bar: Box::new(bar()) });
    }

    #[test]
    fn subscriber_receives_published_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(BusEvent::VixUpdated { value: 18.0, regime: VixRegime::Mid, at: Utc::now() });
        let received = rx.try_recv().expect("event should be queued");
        match received {
            BusEvent::VixUpdated { value, .. } => assert_eq!(value, 18.0),
            other => panic!("wrong event: {other:?}"),
        }
    }
}
