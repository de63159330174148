use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identifies a bar: `(symbol, timeframe, bar_index)` per spec §3.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BarKey {
    pub symbol: String,
    pub timeframe_secs: i64,
    pub bar_index: i64,
}

impl BarKey {
    pub fn new(symbol: impl Into<String>, timeframe_secs: i64, bar_index: i64) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe_secs,
            bar_index,
        }
    }
}

/// VWAP plus its six bands (±1σ, ±2σ, ±3σ), read directly from `VWAP`
/// records when present, else approximated by the feature engine.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VwapBands {
    pub vwap: f64,
    pub up1: f64,
    pub dn1: f64,
    pub up2: f64,
    pub dn2: f64,
    pub up3: f64,
    pub dn3: f64,
}

/// Volume Value Area for one session: POC, VAH, VAL.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VvaLevels {
    pub vpoc: f64,
    pub vah: f64,
    pub val: f64,
}

/// Per-bar NBCV (Numbers Bars Calculated Values) footprint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NbcvFeatures {
    pub ask_volume: f64,
    pub bid_volume: f64,
    pub delta: f64,
    pub cumulative_delta: f64,
    pub trades: i64,
    /// -1, 0, or +1 per spec §3 invariant.
    pub pressure: i8,
    pub delta_ratio: f64,
}

impl NbcvFeatures {
    /// `delta_ratio = (ask_vol - bid_vol) / max(total_volume, 1)` (spec §3).
    pub fn compute_delta_ratio(ask_volume: f64, bid_volume: f64, total_volume: f64) -> f64 {
        (ask_volume - bid_volume) / total_volume.max(1.0)
    }

    /// NBCV invariant check: `ask_vol + bid_vol == total_volume ± 1`
    /// (integer rounding). Violation is a `DataQualityWarning`, never fatal.
    pub fn sum_is_consistent(&self, total_volume: f64) -> bool {
        (self.ask_volume + self.bid_volume - total_volume).abs() <= 1.0
    }
}

/// Feature values computed for a bar, valid as of bar close. Every field is
/// `Option` per spec §4.2: "feature values that cannot be computed
/// (insufficient history) are reported as `None`".
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BarFeatures {
    pub vwap: Option<VwapBands>,
    pub vva_current: Option<VvaLevels>,
    pub vva_previous: Option<VvaLevels>,
    pub nbcv: Option<NbcvFeatures>,
    pub atr: Option<f64>,
}

/// The aggregated OHLCV plus all feature values valid as of bar close.
///
/// A `Bar` is never mutated after finalization (spec §3); a late
/// non-monotonic `bar_index` for an already-finalized key forces a new
/// version with `revision` incremented rather than an in-place edit.
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub key: BarKey,
    pub end_ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub is_complete: bool,
    pub revision: u32,
    pub features: BarFeatures,
}

impl Bar {
    pub fn open_new(key: BarKey, end_ts: DateTime<Utc>, open_price: f64) -> Self {
        Self {
            key,
            end_ts,
            open: open_price,
            high: open_price,
            low: open_price,
            close: open_price,
            volume: 0,
            is_complete: false,
            revision: 0,
            features: BarFeatures::default(),
        }
    }

    pub fn apply_trade(&mut self, px: f64, vol_delta: i64) {
        self.high = self.high.max(px);
        self.low = self.low.min(px);
        self.close = px;
        self.volume += vol_delta;
    }
}
