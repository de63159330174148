//! Scenario A: MenthorQ and orderflow both point long near a support-class
//! level, with leadership and dealers-bias also aligned -- the decision
//! should clear every gate and come out as a sized GO_LONG.

use chrono::Utc;
use nv_config::Config;
use nv_execution::{ordering_holds, DecisionEngine};
use nv_leadership::LeadershipGate;
use nv_schemas::{
    Action, BarFeatures, LeadershipSnap, LevelEntry, LevelName, LevelSet, NbcvFeatures, Quality, Side,
    Snapshot, StalenessClass, VixRegime,
};
use nv_strategy::{BattleNavaleOutput, MenthorQDistanceAnalyzer};

fn snapshot() -> Snapshot {
    let mut level_set = LevelSet::new("ES");
    let name = LevelName::new("put_support_0dte");
    level_set.levels.insert(
        name.as_str().to_string(),
        LevelEntry {
            class: name.classify().unwrap(),
            name,
            price: 4498.00,
            updated_at: Utc::now(),
            staleness: StalenessClass::Fresh,
        },
    );

    Snapshot {
        now: Utc::now(),
        symbol: "ES".into(),
        price: 4497.80,
        bar_features: BarFeatures {
            atr: Some(6.0),
            ..Default::default()
        },
        volume_profile: Default::default(),
        level_set,
        vix_regime: VixRegime::Low,
        vix_value: 13.0,
        leadership: LeadershipSnap::warmup(Utc::now()),
        correlation_es_nq: 0.80,
        dealers_bias: 0.40,
        prior_trade_outcome: None,
    }
}

#[test]
fn aligned_long_setup_clears_every_gate() {
    let mut snap = snapshot();
    snap.bar_features.nbcv = Some(NbcvFeatures {
        ask_volume: 620.0,
        bid_volume: 380.0,
        delta: 240.0,
        cumulative_delta: 120.0,
        trades: 340,
        pressure: 1,
        delta_ratio: NbcvFeatures::compute_delta_ratio(620.0, 380.0, 1000.0),
    });

    let mq_analyzer = MenthorQDistanceAnalyzer::new(nv_config::TolerancesConfig::default());
    let mq = mq_analyzer.analyze(&snap, 0.25);
    assert_eq!(mq.side, Some(Side::Long));

    let bn = BattleNavaleOutput {
        pattern_score: 0.70,
        of_score: 0.80,
        side: Some(Side::Long),
        pattern: Some("double_ask"),
        confidence: 0.8,
        rationale: vec!["structure aligned long".into()],
    };

    let engine = DecisionEngine::new(&Config::default(), 0.25);
    let decision = engine.decide(
        &snap,
        &mq,
        &bn,
        &LeadershipGate::Aligned { bonus_factor: 1.05 },
        "aligned",
    );

    assert_eq!(decision.action, Action::GoLong);
    assert!(decision.score > 0.0 && decision.score <= 1.0);
    assert!(matches!(decision.quality, Some(Quality::Premium) | Some(Quality::Strong)));
    assert!(decision.size_multiplier > 0.0);
    let eul = decision.eul.expect("a cleared trade must carry an eul");
    assert!(ordering_holds(&eul, Side::Long));
    assert!(decision.invariants_hold());
}
