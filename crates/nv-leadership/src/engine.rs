use crate::window::{pearson_correlation, RollingWindow};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use nv_schemas::LeadershipSnap;
use std::collections::VecDeque;

const HORIZONS: [(ChronoDuration, f64); 3] = [
    (ChronoDuration::seconds(3), 0.2),
    (ChronoDuration::seconds(30), 0.5),
    (ChronoDuration::seconds(300), 0.3),
];

struct SymbolSeries {
    prices: VecDeque<(DateTime<Utc>, f64)>,
    horizon_returns: [RollingWindow; 3],
}

impl SymbolSeries {
    fn new() -> Self {
        Self {
            prices: VecDeque::new(),
            horizon_returns: [
                RollingWindow::new(ChronoDuration::seconds(60)),
                RollingWindow::new(ChronoDuration::seconds(300)),
                RollingWindow::new(ChronoDuration::seconds(1800)),
            ],
        }
    }

    fn push(&mut self, ts: DateTime<Utc>, price: f64) {
        self.prices.push_back((ts, price));
        let keep_from = ts - ChronoDuration::seconds(301);
        while let Some(&(t, _)) = self.prices.front() {
            if t < keep_from {
                self.prices.pop_front();
            } else {
                break;
            }
        }
        for (i, (horizon, _weight)) in HORIZONS.iter().enumerate() {
            if let Some(r) = self.return_over(ts, *horizon) {
                self.horizon_returns[i].push(ts, r);
            }
        }
    }

    fn return_over(&self, now: DateTime<Utc>, horizon: ChronoDuration) -> Option<f64> {
        let cutoff = now - horizon;
        let latest = self.prices.back()?.1;
        let reference = self
            .prices
            .iter()
            .rev()
            .find(|(t, _)| *t <= cutoff)
            .map(|(_, p)| *p)?;
        if reference.abs() < 1e-9 {
            return None;
        }
        Some((latest - reference) / reference)
    }

    fn z_momentum(&self) -> f64 {
        self.horizon_returns
            .iter()
            .zip(HORIZONS.iter())
            .map(|(window, (_, weight))| weight * window.latest_z())
            .sum()
    }

    fn stddev_30s(&self) -> f64 {
        self.horizon_returns[1].stddev().unwrap_or(0.0)
    }

    fn returns_30s(&self) -> Vec<f64> {
        self.horizon_returns[1].values().collect()
    }
}

/// ES/NQ leadership: short-horizon z-momentum, relative volatility (beta),
/// and rolling correlation (spec §4.4).
pub struct LeadershipEngine {
    es: SymbolSeries,
    nq: SymbolSeries,
}

impl Default for LeadershipEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LeadershipEngine {
    pub fn new() -> Self {
        Self {
            es: SymbolSeries::new(),
            nq: SymbolSeries::new(),
        }
    }

    pub fn tick_es(&mut self, ts: DateTime<Utc>, price: f64) {
        self.es.push(ts, price);
    }

    pub fn tick_nq(&mut self, ts: DateTime<Utc>, price: f64) {
        self.nq.push(ts, price);
    }

    /// Current leadership snapshot: positive `ls` means NQ's weighted
    /// z-momentum currently outpaces ES's.
    pub fn snapshot(&self, now: DateTime<Utc>) -> LeadershipSnap {
        let z_es = self.es.z_momentum();
        let z_nq = self.nq.z_momentum();
        let beta = if self.es.stddev_30s() > 1e-9 {
            (self.nq.stddev_30s() / self.es.stddev_30s()).clamp(0.8, 1.6)
        } else {
            1.0
        };
        let rolling_corr_30s = pearson_correlation(&self.es.returns_30s(), &self.nq.returns_30s());
        LeadershipSnap {
            ls: z_nq - z_es,
            beta,
            rolling_corr_30s,
            updated_at: now,
        }
    }
}
