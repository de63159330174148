use crate::bus::{BusEvent, EventBus};
use crate::risk::RiskState;
use chrono::{DateTime, Utc};
use nv_config::{Config, ConfigError};
use nv_execution::{candidate_side, DecisionEngine};
use nv_features::{FeatureEngine, SnapshotBuilder};
use nv_ingest::{ChartTailConfig, IngestionPipeline};
use nv_leadership::{gate_for_es, LeadershipEngine, LeadershipGate};
use nv_levels::{LevelStore, StalenessLimits, VixCache};
use nv_schemas::{Action, Bar, RecordPayload, TradingDecision, UnifiedEvent, VixRegime};
use nv_strategy::{BattleNavaleAnalyzer, MenthorQDistanceAnalyzer, StructureAnalyzer};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch};

/// Composes every sub-crate into the single decision loop the CLI drives
/// (spec §2 overview diagram). One `Engine` instance trades one symbol
/// (`ES`) while tracking a peer symbol (`NQ`) purely for leadership.
///
/// `primary_chart_id` is the chart whose `basedata` records close the
/// traded symbol's decision bars; spec §6 fixes only the VIX chart
/// (chart 8) and leaves basedata chart numbering to the deployment, so the
/// caller supplies it explicitly.
pub struct Engine {
    config: Config,
    symbol: String,
    peer_symbol: String,
    tick_size: f64,
    pattern_lookback: usize,
    feature_engine: FeatureEngine,
    level_store: LevelStore,
    vix_cache: VixCache,
    leadership_engine: LeadershipEngine,
    mq_analyzer: MenthorQDistanceAnalyzer,
    bn_analyzer: BattleNavaleAnalyzer,
    structure_analyzer: StructureAnalyzer,
    decision_engine: DecisionEngine,
    risk: RiskState,
    staleness_limits: StalenessLimits,
    bar_history: VecDeque<Bar>,
    correlation_es_nq: f64,
    /// Options-derived dealer positioning bias, `Snapshot.dealers_bias`
    /// (spec §3). No wire `RecordPayload` variant carries it -- the closed
    /// record set has no dealer-bias type -- so this never moves off its
    /// default; see DESIGN.md.
    dealers_bias: f64,
    bus: EventBus,
    soft_deadline: Duration,
    hard_deadline: Duration,
}

impl Engine {
    pub fn new(
        config: Config,
        symbol: impl Into<String>,
        peer_symbol: impl Into<String>,
        primary_chart_id: i32,
        atr_period: usize,
    ) -> Result<Self, ConfigError> {
        let symbol = symbol.into();
        let tick_size = config.tick_size(&symbol)?;
        let pattern_lookback = config.battle_navale.pattern_lookback_bars;
        let decision_engine = DecisionEngine::new(&config, tick_size);
        let mq_analyzer = MenthorQDistanceAnalyzer::new(config.tolerances.clone());
        let bn_analyzer = BattleNavaleAnalyzer::new(config.battle_navale);
        let risk = RiskState::new(&config.risk);
        let staleness_limits = StalenessLimits::from_config(&config.staleness);

        Ok(Self {
            peer_symbol: peer_symbol.into(),
            tick_size,
            pattern_lookback,
            feature_engine: FeatureEngine::new(primary_chart_id, atr_period),
            level_store: LevelStore::new(),
            vix_cache: VixCache::new(),
            leadership_engine: LeadershipEngine::new(),
            mq_analyzer,
            bn_analyzer,
            structure_analyzer: StructureAnalyzer::new(),
            decision_engine,
            risk,
            staleness_limits,
            bar_history: VecDeque::with_capacity(pattern_lookback),
            correlation_es_nq: 0.0,
            dealers_bias: 0.0,
            bus: EventBus::default(),
            soft_deadline: Duration::from_millis(50),
            hard_deadline: Duration::from_millis(200),
            config,
            symbol,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.bus.subscribe()
    }

    pub fn record_trade_outcome(&mut self, outcome: crate::risk::TradeOutcome, pnl: f64, now: DateTime<Utc>) {
        self.risk.record_outcome(outcome, pnl, now);
    }

    /// Current Snapshot for `inspect snapshot`, if at least one bar has
    /// closed for the traded symbol.
    pub fn current_snapshot(&self, now: DateTime<Utc>) -> Option<nv_schemas::Snapshot> {
        let level_set = (*self.level_store.snapshot(&self.symbol)).clone();
        let vix_regime = self.vix_cache.regime().unwrap_or(VixRegime::Mid);
        let vix_value = self.vix_cache.value().unwrap_or(0.0);
        let leadership = self.leadership_engine.snapshot(now);
        let prior_trade_outcome = self.risk.prior_trade_outcome(now);
        SnapshotBuilder::new(&self.feature_engine).build(
            &self.symbol,
            now,
            level_set,
            vix_regime,
            vix_value,
            leadership,
            self.correlation_es_nq,
            self.dealers_bias,
            prior_trade_outcome,
        )
    }

    /// Apply one globally-ordered event: feed it through the feature
    /// engine, update the ambient state no analyzer reads from the event
    /// stream directly (levels, VIX, correlation), tick leadership off any
    /// price-affecting event regardless of which chart gates bar-closing,
    /// and run a decision cycle whenever the traded symbol's bar closes.
    pub fn apply_event(&mut self, event: &UnifiedEvent, now: DateTime<Utc>, sink: &mut dyn FnMut(&TradingDecision)) {
        let symbol = event.symbol().to_string();

        match &event.record.payload {
            RecordPayload::MenthorQLevels(payload) => {
                if let Some(spot) = self.feature_engine.current_price(&symbol, now) {
                    self.level_store.upsert(&symbol, payload, spot, now, &self.staleness_limits);
                    self.bus.publish(BusEvent::LevelsUpdated { symbol: symbol.clone(), at: now });
                }
            }
            RecordPayload::VixPoint(payload) => {
                self.vix_cache.update(payload.last, now);
                self.bus.publish(BusEvent::VixUpdated {
                    value: payload.last,
                    regime: VixRegime::from_value(payload.last),
                    at: now,
                });
            }
            RecordPayload::Correlation(payload) => {
                self.correlation_es_nq = payload.value;
            }
            _ => {}
        }

        let closed = self.feature_engine.apply(event);

        if let Some(price) = self.feature_engine.current_price(&symbol, now) {
            if symbol == self.symbol {
                self.leadership_engine.tick_es(now, price);
            } else if symbol == self.peer_symbol {
                self.leadership_engine.tick_nq(now, price);
            }
        }

        if let Some(bar) = closed {
            if symbol == self.symbol {
                self.bus.publish(BusEvent::BarClosed { symbol: symbol.clone(), bar: Box::new(bar.clone()) });
                if self.bar_history.len() == self.pattern_lookback {
                    self.bar_history.pop_front();
                }
                self.bar_history.push_back(bar);
                self.run_decision_cycle(now, sink);
            }
        }
    }

    fn run_decision_cycle(&mut self, now: DateTime<Utc>, sink: &mut dyn FnMut(&TradingDecision)) {
        self.level_store.refresh_staleness(&self.symbol, now, &self.staleness_limits);
        let Some(snapshot) = self.current_snapshot(now) else {
            return;
        };

        let nbcv_delta_ratio = snapshot.nbcv().map(|n| n.delta_ratio);
        let bars: Vec<Bar> = self.bar_history.iter().cloned().collect();
        let mq = self.mq_analyzer.analyze(&snapshot, self.tick_size);
        let bn = self.bn_analyzer.analyze(&bars, nbcv_delta_ratio);

        let structure_score = self.structure_analyzer.analyze(&snapshot).score;
        let candidate = candidate_side(&self.config.weights, &mq, &bn, structure_score);
        let gate = gate_for_es(
            candidate,
            snapshot.leadership,
            snapshot.vix_regime,
            &self.config.thresholds.leadership_by_vix,
            &self.config.thresholds.correlation_floor_by_vix,
        );
        let leadership_reason = match &gate {
            LeadershipGate::Veto { reason } => (*reason).to_string(),
            LeadershipGate::Aligned { .. } => "leadership_aligned".to_string(),
            LeadershipGate::Neutral => "leadership_neutral".to_string(),
        };

        let started = Instant::now();
        let mut decision = self.decision_engine.decide(&snapshot, &mq, &bn, &gate, &leadership_reason);
        let elapsed = started.elapsed();

        if elapsed > self.hard_deadline {
            tracing::warn!(elapsed_ms = elapsed.as_millis() as u64, symbol = %self.symbol, "decision deadline exceeded, forcing NO_TRADE");
            decision.action = Action::NoTrade;
            decision.quality = None;
            decision.size_multiplier = 0.0;
            decision.level = None;
            decision.eul = None;
            decision.rationale.clear();
            decision.blocked_by = vec!["deadline_exceeded".to_string()];
        } else if elapsed > self.soft_deadline {
            tracing::warn!(elapsed_ms = elapsed.as_millis() as u64, symbol = %self.symbol, "decision cycle exceeded soft deadline");
        }

        self.risk.enforce(&mut decision, now);

        debug_assert!(decision.invariants_hold(), "TradingDecision invariant violated");
        sink(&decision);
    }

    /// Spawn the ingestion pipeline and the decision loop as background
    /// tasks, returning a handle to stop and await them (spec §5: task
    /// supervision via a shared `watch<bool>` shutdown signal).
    pub fn run(
        mut self,
        charts: Vec<ChartTailConfig>,
        mut sink: Box<dyn FnMut(&TradingDecision) + Send>,
    ) -> EngineHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut rx = IngestionPipeline::new(charts).spawn(shutdown_rx);

        let join = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let now = Utc::now();
                self.apply_event(&event, now, &mut *sink);
            }
        });

        EngineHandle { shutdown_tx, join }
    }
}

/// Handle to a running `Engine::run` task: `stop()` begins graceful
/// shutdown, `join()` awaits the decision loop draining and exiting.
pub struct EngineHandle {
    shutdown_tx: watch::Sender<bool>,
    join: tokio::task::JoinHandle<()>,
}

impl EngineHandle {
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn join(self) {
        let _ = self.join.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nv_schemas::{BaseBarPayload, Record, RecordHeader, RecordPayload as RP};

    fn engine() -> Engine {
        let mut config = Config::default();
        config.symbol_specs.insert("ES".into(), nv_config::SymbolSpec { tick_size: 0.25, session_windows: vec![] });
        config.symbol_specs.insert("NQ".into(), nv_config::SymbolSpec { tick_size: 0.25, session_windows: vec![] });
        Engine::new(config, "ES", "NQ", 1, 14).unwrap()
    }

    fn basedata(symbol: &str, chart: i32, idx: i64, ts_offset: f64, close: f64) -> UnifiedEvent {
        let record = Record {
            header: RecordHeader {
                symbol: symbol.to_string(),
                chart_id: chart,
                timestamp_secs: 1_700_000_000.0 + ts_offset,
                bar_index: idx,
            },
            payload: RP::BaseBar(BaseBarPayload { o: close - 1.0, h: close + 1.0, l: close - 1.0, c: close, v: 100 }),
        };
        UnifiedEvent::new(record, Utc::now())
    }

    #[test]
    fn bar_close_on_primary_chart_runs_a_decision_cycle() {
        let mut engine = engine();
        let mut decisions = Vec::new();
        let mut sink = |d: &TradingDecision| decisions.push(d.clone());

        engine.apply_event(&basedata("ES", 1, 1, 0.0, 4500.0), Utc::now(), &mut sink);
        assert_eq!(decisions.len(), 1);
        assert!(decisions[0].invariants_hold());
    }

    #[test]
    fn non_primary_chart_does_not_trigger_a_decision() {
        let mut engine = engine();
        let mut decisions = Vec::new();
        let mut sink = |d: &TradingDecision| decisions.push(d.clone());

        engine.apply_event(&basedata("ES", 2, 1, 0.0, 4500.0), Utc::now(), &mut sink);
        assert!(decisions.is_empty());
    }

    #[test]
    fn peer_symbol_bars_feed_leadership_without_closing_es_bars() {
        let mut engine = engine();
        let mut sink = |_: &TradingDecision| {};
        engine.apply_event(&basedata("NQ", 1, 1, 0.0, 15800.0), Utc::now(), &mut sink);
        assert!(engine.feature_engine.current_price("NQ", Utc::now()).is_some());
        assert!(engine.bar_history.is_empty());
    }
}
