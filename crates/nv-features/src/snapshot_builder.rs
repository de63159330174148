use crate::engine::FeatureEngine;
use chrono::{DateTime, Utc};
use nv_schemas::{LeadershipSnap, LevelSet, PriorTradeOutcome, Snapshot, VixRegime};

/// Composes the immutable per-bar `Snapshot` from the feature engine plus
/// the other shared decision-time state (spec §3, §4.2 "SnapshotBuilder").
pub struct SnapshotBuilder<'a> {
    engine: &'a FeatureEngine,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(engine: &'a FeatureEngine) -> Self {
        Self { engine }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
        level_set: LevelSet,
        vix_regime: VixRegime,
        vix_value: f64,
        leadership: LeadershipSnap,
        correlation_es_nq: f64,
        dealers_bias: f64,
        prior_trade_outcome: Option<PriorTradeOutcome>,
    ) -> Option<Snapshot> {
        let bar = self.engine.latest_bar(symbol)?;
        let price = self.engine.current_price(symbol, now).unwrap_or(bar.close);
        Some(Snapshot {
            now,
            symbol: symbol.to_string(),
            price,
            bar_features: bar.features.clone(),
            volume_profile: self.engine.volume_profile(symbol),
            level_set,
            vix_regime,
            vix_value,
            leadership,
            correlation_es_nq,
            dealers_bias,
            prior_trade_outcome,
        })
    }
}
