use chrono::{DateTime, Utc};
use nv_schemas::VixRegime;
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq)]
struct VixPoint {
    value: f64,
    regime: VixRegime,
    updated_at: DateTime<Utc>,
}

/// Latest VIX reading, shared read-mostly across analyzers (spec §4.4,
/// §4.7: regime gates the leadership thresholds, sizing caps, and execution
/// soft modifiers).
pub struct VixCache {
    inner: RwLock<Option<VixPoint>>,
}

impl Default for VixCache {
    fn default() -> Self {
        Self::new()
    }
}

impl VixCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    pub fn update(&self, value: f64, now: DateTime<Utc>) {
        let point = VixPoint {
            value,
            regime: VixRegime::from_value(value),
            updated_at: now,
        };
        *self.inner.write().expect("vix cache lock poisoned") = Some(point);
    }

    pub fn regime(&self) -> Option<VixRegime> {
        self.inner.read().expect("vix cache lock poisoned").map(|p| p.regime)
    }

    pub fn value(&self) -> Option<f64> {
        self.inner.read().expect("vix cache lock poisoned").map(|p| p.value)
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.inner
            .read()
            .expect("vix cache lock poisoned")
            .map(|p| p.updated_at)
    }
}
