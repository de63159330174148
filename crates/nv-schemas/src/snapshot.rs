use crate::bar::{BarFeatures, NbcvFeatures, VwapBands};
use crate::levels::LevelSet;
use crate::vix::VixRegime;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// 30-minute volume profile summary: POC/VAH/VAL plus prominent nodes
/// filtered to within ±3% of spot (spec §4.2).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VolumeProfileSummary {
    pub vpoc: Option<f64>,
    pub vah: Option<f64>,
    pub val: Option<f64>,
    pub hvn: Vec<f64>,
    pub lvn: Vec<f64>,
}

/// ES-vs-NQ short-horizon leadership, produced by `nv-leadership`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LeadershipSnap {
    pub ls: f64,
    pub beta: f64,
    pub rolling_corr_30s: f64,
    pub updated_at: DateTime<Utc>,
}

impl LeadershipSnap {
    pub fn warmup(now: DateTime<Utc>) -> Self {
        Self {
            ls: 0.0,
            beta: 1.0,
            rolling_corr_30s: 0.0,
            updated_at: now,
        }
    }
}

/// Cooldown bookkeeping from the last stop-out, if any (spec §3, §4.7).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PriorTradeOutcome {
    pub last_stop_out_at: DateTime<Utc>,
    pub cooldown_remaining: Duration,
}

/// The immutable per-bar input to the decision pipeline (spec §3).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub now: DateTime<Utc>,
    pub symbol: String,
    /// Mid of last quote, or last trade if no quote within 500ms.
    pub price: f64,
    pub bar_features: BarFeatures,
    pub volume_profile: VolumeProfileSummary,
    pub level_set: LevelSet,
    pub vix_regime: VixRegime,
    pub vix_value: f64,
    pub leadership: LeadershipSnap,
    pub correlation_es_nq: f64,
    pub dealers_bias: f64,
    pub prior_trade_outcome: Option<PriorTradeOutcome>,
}

impl Snapshot {
    pub fn nbcv(&self) -> Option<NbcvFeatures> {
        self.bar_features.nbcv
    }

    pub fn vwap(&self) -> Option<VwapBands> {
        self.bar_features.vwap
    }
}
