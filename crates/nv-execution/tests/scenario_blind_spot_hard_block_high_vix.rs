//! Scenario B: an otherwise strong long setup is hard-blocked because a
//! blind-spot level sits inside the (tighter, HIGH-vix) proximity band.

use chrono::Utc;
use nv_config::Config;
use nv_execution::DecisionEngine;
use nv_leadership::LeadershipGate;
use nv_schemas::{
    Action, BarFeatures, LeadershipSnap, LevelEntry, LevelName, LevelSet, Side, Snapshot, StalenessClass,
    VixRegime,
};
use nv_strategy::{BattleNavaleOutput, LevelAnchor, MenthorQDistanceOutput};

#[test]
fn blind_spot_within_high_vix_band_blocks_an_otherwise_strong_long() {
    let mut level_set = LevelSet::new("ES");
    let name = LevelName::new("blind_spot_3");
    level_set.levels.insert(
        name.as_str().to_string(),
        LevelEntry {
            class: name.classify().unwrap(),
            name,
            price: 4510.50, // 2 ticks away at 0.25, inside the 7.5-tick HIGH-vix band
            updated_at: Utc::now(),
            staleness: StalenessClass::Fresh,
        },
    );

    let snap = Snapshot {
        now: Utc::now(),
        symbol: "ES".into(),
        price: 4510.00,
        bar_features: BarFeatures {
            atr: Some(5.0),
            ..Default::default()
        },
        volume_profile: Default::default(),
        level_set,
        vix_regime: VixRegime::High,
        vix_value: 28.0,
        leadership: LeadershipSnap::warmup(Utc::now()),
        correlation_es_nq: 0.7,
        dealers_bias: 0.0,
        prior_trade_outcome: None,
    };

    let mq = MenthorQDistanceOutput {
        score: 0.87,
        side: Some(Side::Long),
        anchor: Some(LevelAnchor {
            name: "put_support_0dte".into(),
            class: nv_schemas::LevelClass::PutSupport0dte,
            price: 4509.80,
            distance_ticks: 0.8,
        }),
        rationale: vec!["strong long anchor".into()],
    };
    let bn = BattleNavaleOutput {
        pattern_score: 0.7,
        of_score: 0.8,
        side: Some(Side::Long),
        pattern: Some("double_ask"),
        confidence: 0.8,
        rationale: vec![],
    };

    let engine = DecisionEngine::new(&Config::default(), 0.25);
    let decision = engine.decide(&snap, &mq, &bn, &LeadershipGate::Aligned { bonus_factor: 1.05 }, "aligned");

    assert_eq!(decision.action, Action::NoTrade);
    assert_eq!(decision.blocked_by, vec!["blind_spot_proximity".to_string()]);
    assert!(decision.eul.is_none());
    assert!(decision.invariants_hold());
}
