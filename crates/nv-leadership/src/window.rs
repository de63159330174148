use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::VecDeque;

/// A time-bounded sample buffer: every `push` drops samples older than
/// `window` before inserting the new one.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    window: ChronoDuration,
    samples: VecDeque<(DateTime<Utc>, f64)>,
}

impl RollingWindow {
    pub fn new(window: ChronoDuration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    pub fn push(&mut self, ts: DateTime<Utc>, value: f64) {
        self.samples.push_back((ts, value));
        self.prune(ts);
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        while let Some(&(ts, _)) = self.samples.front() {
            if now - ts > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().map(|(_, v)| v).sum::<f64>() / self.samples.len() as f64)
    }

    pub fn stddev(&self) -> Option<f64> {
        let mean = self.mean()?;
        if self.samples.len() < 2 {
            return Some(0.0);
        }
        let variance = self.samples.iter().map(|(_, v)| (v - mean).powi(2)).sum::<f64>()
            / self.samples.len() as f64;
        Some(variance.sqrt())
    }

    /// z-score of the most recently pushed sample against this window's own
    /// distribution (0.0 when the window can't yet support a meaningful
    /// estimate, per spec §4.2's "insufficient history -> None/neutral"
    /// convention applied to momentum rather than bar features).
    pub fn latest_z(&self) -> f64 {
        let Some(&(_, latest)) = self.samples.back() else {
            return 0.0;
        };
        let Some(mean) = self.mean() else { return 0.0 };
        let std = self.stddev().unwrap_or(0.0);
        if std < 1e-9 {
            return 0.0;
        }
        (latest - mean) / std
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|(_, v)| *v)
    }
}

/// Pearson correlation between two equal-length series, aligned by index
/// (caller is responsible for time-aligning samples before calling this).
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let a = &a[a.len() - n..];
    let b = &b[b.len() - n..];
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a < 1e-12 || var_b < 1e-12 {
        return 0.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}
