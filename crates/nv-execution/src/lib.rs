//! Signal fusion, hard-block/soft-modifier risk gating, and stop/target
//! sizing -- the final stage before a `TradingDecision` is emitted (spec
//! §4.7-§4.9).

pub mod eul;
pub mod execution_rules;
pub mod fuser;

pub use eul::{ordering_holds, EulCalculator};
pub use execution_rules::{ExecutionRules, SoftModifier};
pub use fuser::{candidate_side, mia_component, mia_gate_passes, FusionResult, SignalFuser};

use nv_config::{Config, ThresholdsConfig, VixCaps};
use nv_leadership::LeadershipGate;
use nv_schemas::{Action, DecisionLevel as Level, LeadershipInfo, Side, Snapshot, TradingDecision, VixRegime};
use nv_strategy::{BattleNavaleOutput, MenthorQDistanceOutput, StructureAnalyzer};

/// Wires `SignalFuser`, `ExecutionRules`, and `EulCalculator` into a single
/// per-bar decision, applying the hard-block checks before fusion is even
/// allowed to pick a side (spec §4.7 runs first, §4.8 and §4.9 only apply
/// to trades that clear it).
pub struct DecisionEngine {
    fuser: SignalFuser,
    rules: ExecutionRules,
    eul: EulCalculator,
    structure: StructureAnalyzer,
    thresholds: ThresholdsConfig,
    vix_caps: VixCaps,
    tick_size: f64,
}

impl DecisionEngine {
    pub fn new(config: &Config, tick_size: f64) -> Self {
        Self {
            fuser: SignalFuser::new(
                config.weights.clone(),
                config.thresholds.clone(),
                config.sizing.vix_caps,
                config.execution_rules.allow_weak,
            ),
            rules: ExecutionRules::new(config.execution_rules),
            eul: EulCalculator::new(config.sizing.clone(), tick_size),
            structure: StructureAnalyzer::new(),
            thresholds: config.thresholds.clone(),
            vix_caps: config.sizing.vix_caps,
            tick_size,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn decide(
        &self,
        snapshot: &Snapshot,
        mq: &MenthorQDistanceOutput,
        bn: &BattleNavaleOutput,
        leadership_gate: &LeadershipGate,
        leadership_reason: &str,
    ) -> TradingDecision {
        let nbcv_delta_ratio = snapshot.nbcv().map(|n| n.delta_ratio);
        let structure = self.structure.analyze(snapshot);

        let fusion = self.fuser.fuse(
            mq,
            bn,
            structure.score,
            nbcv_delta_ratio,
            leadership_gate,
            snapshot.vix_regime,
        );

        let leadership = LeadershipInfo {
            ls: snapshot.leadership.ls,
            beta: snapshot.leadership.beta,
            corr_30s: snapshot.leadership.rolling_corr_30s,
            reason: leadership_reason.to_string(),
        };

        let Some(side) = fusion.side else {
            return self.no_trade(snapshot, fusion, leadership, vec!["score_too_weak".into()]);
        };

        let mia_passes = mia_gate_passes(nbcv_delta_ratio, side, &self.thresholds);
        if let Some(reason) = self.rules.hard_block(
            snapshot,
            side,
            self.tick_size,
            mq.anchor.as_ref(),
            leadership_gate,
            mia_passes,
        ) {
            return self.no_trade(snapshot, fusion, leadership, vec![reason.to_string()]);
        }

        let Some(quality) = fusion.quality else {
            return self.no_trade(snapshot, fusion, leadership, vec!["quality_below_entry".into()]);
        };

        let soft_mods = self.rules.soft_modifiers(snapshot, side, self.tick_size);
        let mut size_multiplier = soft_mods.iter().fold(quality.size_multiplier(), |acc, m| acc * m.multiplier);
        if snapshot.vix_regime == VixRegime::Extreme {
            // The EXTREME vix cap doubles as an absolute ceiling on position
            // size, not just a score dampener (spec §8 invariant 5).
            size_multiplier = size_multiplier.min(self.vix_caps.for_regime(VixRegime::Extreme));
        }

        let atr = snapshot.bar_features.atr;
        let eul = self.eul.compute(snapshot.price, side, atr, snapshot.vix_regime, &snapshot.level_set);

        let level = mq.anchor.as_ref().map(|a| Level {
            name: a.name.clone(),
            price: a.price,
            class: format!("{:?}", a.class),
        });

        let mut rationale = fusion.rationale.clone();
        rationale.extend(structure.rationale.iter().cloned());
        rationale.extend(soft_mods.iter().map(|m| m.reason.to_string()));

        TradingDecision {
            timestamp: snapshot.now,
            symbol: snapshot.symbol.clone(),
            action: if side == Side::Long { Action::GoLong } else { Action::GoShort },
            score: fusion.score.abs(),
            components: fusion.components,
            modifiers: fusion.modifiers,
            quality: Some(quality),
            size_multiplier,
            leadership,
            level,
            eul: Some(eul),
            rationale,
            blocked_by: vec![],
        }
    }

    fn no_trade(
        &self,
        snapshot: &Snapshot,
        fusion: FusionResult,
        leadership: LeadershipInfo,
        blocked_by: Vec<String>,
    ) -> TradingDecision {
        TradingDecision {
            timestamp: snapshot.now,
            symbol: snapshot.symbol.clone(),
            action: Action::NoTrade,
            score: fusion.score.abs(),
            components: fusion.components,
            modifiers: fusion.modifiers,
            quality: None,
            size_multiplier: 0.0,
            leadership,
            level: None,
            eul: None,
            rationale: vec![],
            blocked_by,
        }
    }
}
