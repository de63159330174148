//! Scenario C: leadership strongly opposes the candidate direction, vetoing
//! an otherwise tradeable setup regardless of score.

use chrono::Utc;
use nv_config::Config;
use nv_execution::DecisionEngine;
use nv_leadership::LeadershipGate;
use nv_schemas::{Action, BarFeatures, LeadershipSnap, LevelSet, Side, Snapshot, VixRegime};
use nv_strategy::{BattleNavaleOutput, MenthorQDistanceOutput};

#[test]
fn leadership_hard_opposed_vetoes_the_trade() {
    let snap = Snapshot {
        now: Utc::now(),
        symbol: "ES".into(),
        price: 4520.00,
        bar_features: BarFeatures {
            atr: Some(5.0),
            ..Default::default()
        },
        volume_profile: Default::default(),
        level_set: LevelSet::new("ES"),
        vix_regime: VixRegime::Mid,
        vix_value: 18.0,
        leadership: LeadershipSnap::warmup(Utc::now()),
        correlation_es_nq: 0.7,
        dealers_bias: 0.0,
        prior_trade_outcome: None,
    };

    let mq = MenthorQDistanceOutput {
        score: -0.75,
        side: Some(Side::Short),
        anchor: None,
        rationale: vec!["call_resistance proximity".into()],
    };
    let bn = BattleNavaleOutput {
        pattern_score: -0.6,
        of_score: -0.7,
        side: Some(Side::Short),
        pattern: Some("rouge_sous_verte"),
        confidence: 0.7,
        rationale: vec![],
    };

    let engine = DecisionEngine::new(&Config::default(), 0.25);
    let decision = engine.decide(
        &snap,
        &mq,
        &bn,
        &LeadershipGate::Veto { reason: "leadership_hard_opposed" },
        "opposed",
    );

    assert_eq!(decision.action, Action::NoTrade);
    assert_eq!(decision.blocked_by, vec!["leadership_hard_opposed".to_string()]);
    assert!(decision.invariants_hold());
}
