//! Numbered invariants from spec §8 that aren't already pinned down by one
//! of the lettered scenarios: bounded score, the EXTREME size cap, EUL
//! ordering, and the risk_ticks floor.

use chrono::Utc;
use nv_config::{Config, SizingConfig};
use nv_execution::{ordering_holds, DecisionEngine, EulCalculator};
use nv_leadership::LeadershipGate;
use nv_schemas::{Action, BarFeatures, LeadershipSnap, LevelSet, Side, Snapshot, VixRegime};
use nv_strategy::{BattleNavaleOutput, MenthorQDistanceOutput};

fn snapshot(vix_regime: VixRegime, dealers_bias: f64) -> Snapshot {
    Snapshot {
        now: Utc::now(),
        symbol: "ES".into(),
        price: 4500.0,
        bar_features: BarFeatures {
            atr: Some(5.0),
            ..Default::default()
        },
        volume_profile: Default::default(),
        level_set: LevelSet::new("ES"),
        vix_regime,
        vix_value: 18.0,
        leadership: LeadershipSnap::warmup(Utc::now()),
        correlation_es_nq: 0.7,
        dealers_bias,
        prior_trade_outcome: None,
    }
}

fn maxed_long() -> (MenthorQDistanceOutput, BattleNavaleOutput) {
    let mq = MenthorQDistanceOutput {
        score: 1.0,
        side: Some(Side::Long),
        anchor: None,
        rationale: vec![],
    };
    let bn = BattleNavaleOutput {
        pattern_score: 1.0,
        of_score: 1.0,
        side: Some(Side::Long),
        pattern: Some("double_ask"),
        confidence: 1.0,
        rationale: vec![],
    };
    (mq, bn)
}

#[test]
fn emitted_score_is_always_within_unit_range() {
    let engine = DecisionEngine::new(&Config::default(), 0.25);
    for regime in [VixRegime::Low, VixRegime::Mid, VixRegime::High, VixRegime::Extreme] {
        let snap = snapshot(regime, 0.9);
        let (mq, bn) = maxed_long();
        let decision = engine.decide(&snap, &mq, &bn, &LeadershipGate::Aligned { bonus_factor: 1.05 }, "aligned");
        assert!((0.0..=1.0).contains(&decision.score), "score {} out of range for {:?}", decision.score, regime);
    }
}

#[test]
fn extreme_regime_never_exceeds_the_quarter_size_cap() {
    let engine = DecisionEngine::new(&Config::default(), 0.25);
    let snap = snapshot(VixRegime::Extreme, 0.9);
    let (mq, bn) = maxed_long();
    let decision = engine.decide(&snap, &mq, &bn, &LeadershipGate::Aligned { bonus_factor: 1.05 }, "aligned");
    assert!(decision.action == Action::NoTrade || decision.size_multiplier <= 0.25 + 1e-9);
}

#[test]
fn eul_ordering_holds_for_both_sides_across_regimes() {
    let calc = EulCalculator::new(SizingConfig::default(), 0.25);
    for regime in [VixRegime::Low, VixRegime::Mid, VixRegime::High, VixRegime::Extreme] {
        let levels = LevelSet::new("ES");
        let long_eul = calc.compute(4500.0, Side::Long, Some(6.0), regime, &levels);
        let short_eul = calc.compute(4500.0, Side::Short, Some(6.0), regime, &levels);
        assert!(ordering_holds(&long_eul, Side::Long));
        assert!(ordering_holds(&short_eul, Side::Short));
        assert!(long_eul.risk_ticks >= SizingConfig::default().min_stop_ticks);
        assert!(short_eul.risk_ticks >= SizingConfig::default().min_stop_ticks);
    }
}
