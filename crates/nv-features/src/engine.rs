use crate::atr::WilderAtr;
use crate::price_tracker::PriceTracker;
use crate::vva_history::VvaHistory;
use nv_schemas::{
    Bar, BarFeatures, BarKey, NbcvFeatures, RecordPayload, UnifiedEvent, VolumeProfileSummary,
    VvaLevels, VwapBands,
};
use std::collections::HashMap;

#[derive(Default)]
struct SymbolState {
    current_bar: Option<Bar>,
    last_closed_bar: Option<Bar>,
    vwap: Option<VwapBands>,
    vva: VvaHistory,
    nbcv: Option<NbcvFeatures>,
    atr_override: Option<f64>,
    atr_fallback: WilderAtr,
    volume_profile: VolumeProfileSummary,
    price: PriceTracker,
}

/// Folds the unified event stream into per-symbol `Bar`s with their
/// attached feature set (spec §4.2).
///
/// One primary timeframe drives the decision bar series; records from other
/// chart timeframes only update the live feature caches (vwap/vva/nbcv/atr/
/// volume profile) that get attached to the next primary bar at close.
pub struct FeatureEngine {
    primary_chart_id: i32,
    atr_period: usize,
    symbols: HashMap<String, SymbolState>,
}

impl FeatureEngine {
    pub fn new(primary_chart_id: i32, atr_period: usize) -> Self {
        Self {
            primary_chart_id,
            atr_period,
            symbols: HashMap::new(),
        }
    }

    fn state_mut(&mut self, symbol: &str) -> &mut SymbolState {
        self.symbols.entry(symbol.to_string()).or_insert_with(|| SymbolState {
            atr_fallback: WilderAtr::new(self.atr_period),
            ..Default::default()
        })
    }

    /// The most recently closed bar for `symbol`, if any.
    pub fn latest_bar(&self, symbol: &str) -> Option<&Bar> {
        self.symbols.get(symbol).and_then(|s| s.last_closed_bar.as_ref())
    }

    pub fn volume_profile(&self, symbol: &str) -> VolumeProfileSummary {
        self.symbols
            .get(symbol)
            .map(|s| s.volume_profile.clone())
            .unwrap_or_default()
    }

    pub fn current_price(&self, symbol: &str, now: chrono::DateTime<chrono::Utc>) -> Option<f64> {
        self.symbols.get(symbol).and_then(|s| s.price.current_price(now))
    }

    /// Apply one globally-ordered event, returning the freshly closed `Bar`
    /// if this event completed the primary bar.
    pub fn apply(&mut self, event: &UnifiedEvent) -> Option<Bar> {
        let symbol = event.symbol().to_string();
        let chart_id = event.chart_id();
        let bar_index = event.bar_index();
        let ts = event.event_timestamp();

        match &event.record.payload {
            RecordPayload::BaseBar(p) if chart_id == self.primary_chart_id => {
                let closed = {
                    let state = self.state_mut(&symbol);
                    let atr_value = match state.atr_override.take() {
                        Some(v) => Some(v),
                        None => state.atr_fallback.update(p.h, p.l, p.c),
                    };

                    let key = BarKey::new(symbol.clone(), 0, bar_index);
                    let mut bar = Bar::open_new(key, ts, p.o);
                    bar.high = p.h;
                    bar.low = p.l;
                    bar.close = p.c;
                    bar.volume = p.v;
                    bar.is_complete = true;
                    bar.features = BarFeatures {
                        vwap: state.vwap,
                        vva_current: state.vva.current(),
                        vva_previous: state.vva.previous(),
                        nbcv: state.nbcv,
                        atr: atr_value,
                    };

                    state.price.record_trade(p.c, ts);
                    state.current_bar = Some(bar.clone());
                    state.last_closed_bar = Some(bar.clone());
                    bar
                };
                Some(closed)
            }
            RecordPayload::BaseBar(_) => None,
            RecordPayload::Trade(p) => {
                let state = self.state_mut(&symbol);
                state.price.record_trade(p.px, ts);
                if let Some(bar) = state.current_bar.as_mut() {
                    if !bar.is_complete {
                        bar.apply_trade(p.px, p.vol.round() as i64);
                    }
                }
                None
            }
            RecordPayload::Quote(p) => {
                self.state_mut(&symbol).price.record_quote(p.bid, p.ask, ts);
                None
            }
            RecordPayload::Vwap(p) => {
                self.state_mut(&symbol).vwap = Some(VwapBands {
                    vwap: p.vwap,
                    up1: p.up1,
                    dn1: p.dn1,
                    up2: p.up2,
                    dn2: p.dn2,
                    up3: p.up3,
                    dn3: p.dn3,
                });
                None
            }
            RecordPayload::Vva(p) => {
                self.state_mut(&symbol).vva.record(
                    VvaLevels {
                        vpoc: p.vpoc,
                        vah: p.vah,
                        val: p.val,
                    },
                    ts,
                );
                None
            }
            RecordPayload::Nbcv(p) => {
                let delta_ratio =
                    NbcvFeatures::compute_delta_ratio(p.ask_volume, p.bid_volume, p.total_volume);
                let features = NbcvFeatures {
                    ask_volume: p.ask_volume,
                    bid_volume: p.bid_volume,
                    delta: p.delta,
                    cumulative_delta: p.cumulative_delta,
                    trades: p.trades,
                    pressure: p.pressure.clamp(-1, 1) as i8,
                    delta_ratio,
                };
                if !features.sum_is_consistent(p.total_volume) {
                    tracing::warn!(
                        symbol = %symbol,
                        ask = p.ask_volume,
                        bid = p.bid_volume,
                        total = p.total_volume,
                        "nbcv ask+bid does not reconcile with total volume"
                    );
                }
                self.state_mut(&symbol).nbcv = Some(features);
                None
            }
            RecordPayload::AtrBar(p) => {
                self.state_mut(&symbol).atr_override = Some(p.atr);
                None
            }
            RecordPayload::VolumeProfile(p) => {
                let state = self.state_mut(&symbol);
                let spot = state.price.current_price(ts).unwrap_or(p.vpoc);
                let band = (spot * 0.03).abs();
                let filter = |nodes: &[f64]| -> Vec<f64> {
                    nodes
                        .iter()
                        .copied()
                        .filter(|&px| (px - spot).abs() <= band)
                        .collect()
                };
                state.volume_profile = VolumeProfileSummary {
                    vpoc: Some(p.vpoc),
                    vah: Some(p.vah),
                    val: Some(p.val),
                    hvn: filter(&p.hvn),
                    lvn: filter(&p.lvn),
                };
                None
            }
            RecordPayload::CumulativeDelta(_)
            | RecordPayload::Correlation(_)
            | RecordPayload::MenthorQLevels(_)
            | RecordPayload::VixPoint(_)
            | RecordPayload::DepthLevel(_)
            | RecordPayload::Pvwap(_) => None,
        }
    }
}
