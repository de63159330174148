use nv_config::{ThresholdsConfig, VixCaps, WeightsConfig};
use nv_leadership::LeadershipGate;
use nv_schemas::{Components, Modifiers, Quality, Side, VixRegime};
use nv_strategy::{BattleNavaleOutput, MenthorQDistanceOutput};

/// MIA (orderflow imbalance) component: non-zero only once the NBCV delta
/// ratio crosses one of the configured long/short thresholds (spec §4.8
/// step 1). This is reported on `Components.mia` for observability but is
/// never part of the weighted sum -- it gates the trade in `ExecutionRules`
/// instead.
pub fn mia_component(delta_ratio: Option<f64>, thresholds: &ThresholdsConfig) -> f64 {
    match delta_ratio {
        Some(dr) if dr >= thresholds.mia_long => dr.clamp(-1.0, 1.0),
        Some(dr) if dr <= thresholds.mia_short => dr.clamp(-1.0, 1.0),
        _ => 0.0,
    }
}

/// Whether the MIA gate passes for a candidate trade direction.
pub fn mia_gate_passes(delta_ratio: Option<f64>, side: Side, thresholds: &ThresholdsConfig) -> bool {
    match side {
        Side::Long => delta_ratio.is_some_and(|d| d >= thresholds.mia_long),
        Side::Short => delta_ratio.is_some_and(|d| d <= thresholds.mia_short),
    }
}

fn quality_bucket(abs_score: f64, t: &ThresholdsConfig, allow_weak: bool) -> Option<Quality> {
    if abs_score >= t.premium {
        Some(Quality::Premium)
    } else if abs_score >= t.strong {
        Some(Quality::Strong)
    } else if abs_score >= t.good {
        Some(Quality::Good)
    } else if allow_weak && abs_score >= t.entry {
        Some(Quality::Weak)
    } else {
        None
    }
}

/// The directional bias of the raw (pre-modulation) weighted sum, computed
/// independently of `SignalFuser::fuse` so callers can gate leadership
/// (spec §4.4 step 5) before the leadership gate itself becomes an input
/// to fusion. `structure_score` is the fusion-level VWAP/VVA/correlation
/// composite (spec §4.8 step 1), not `BattleNavaleOutput::pattern_score`.
pub fn candidate_side(
    weights: &WeightsConfig,
    mq: &MenthorQDistanceOutput,
    bn: &BattleNavaleOutput,
    structure_score: f64,
) -> Side {
    let raw = weights.mq * mq.score + weights.of * bn.of_score + weights.structure * structure_score;
    if raw > 0.0 {
        Side::Long
    } else {
        Side::Short
    }
}

/// Continuous counterpart to `mia_gate_passes` used for score modulation
/// (spec §4.8 step 2): full conviction when the gate would pass, dampened
/// otherwise. The hard gate itself still runs in `ExecutionRules`.
fn mia_modulator(delta_ratio: Option<f64>, side: Side, thresholds: &ThresholdsConfig) -> f64 {
    if mia_gate_passes(delta_ratio, side, thresholds) {
        1.0
    } else {
        0.8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusionResult {
    pub score: f64,
    pub components: Components,
    pub modifiers: Modifiers,
    pub side: Option<Side>,
    pub quality: Option<Quality>,
    pub rationale: Vec<String>,
}

/// Combines the MenthorQ-Distance and BattleNavale analyzer outputs into a
/// single directional score and quality bucket (spec §4.8).
pub struct SignalFuser {
    weights: WeightsConfig,
    thresholds: ThresholdsConfig,
    vix_caps: VixCaps,
    allow_weak: bool,
}

impl SignalFuser {
    pub fn new(weights: WeightsConfig, thresholds: ThresholdsConfig, vix_caps: VixCaps, allow_weak: bool) -> Self {
        Self {
            weights,
            thresholds,
            vix_caps,
            allow_weak,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fuse(
        &self,
        mq: &MenthorQDistanceOutput,
        bn: &BattleNavaleOutput,
        structure_score: f64,
        nbcv_delta_ratio: Option<f64>,
        leadership_gate: &LeadershipGate,
        vix_regime: VixRegime,
    ) -> FusionResult {
        let mia = mia_component(nbcv_delta_ratio, &self.thresholds);
        let raw = self.weights.mq * mq.score + self.weights.of * bn.of_score + self.weights.structure * structure_score;

        let tentative_side = if raw > 0.0 {
            Side::Long
        } else {
            Side::Short
        };

        let vix_mult = self.vix_caps.for_regime(vix_regime);
        let leader_bonus = match leadership_gate {
            LeadershipGate::Aligned { bonus_factor } => *bonus_factor,
            _ => 1.0,
        };
        let mia_mult = mia_modulator(nbcv_delta_ratio, tentative_side, &self.thresholds);

        let modulated = (raw * vix_mult * mia_mult * leader_bonus).clamp(-1.0, 1.0);
        let side = if modulated.abs() < 1e-9 { None } else if modulated > 0.0 { Some(Side::Long) } else { Some(Side::Short) };
        let quality = quality_bucket(modulated.abs(), &self.thresholds, self.allow_weak);

        let mut rationale = Vec::new();
        rationale.extend(mq.rationale.iter().cloned());
        rationale.extend(bn.rationale.iter().cloned());

        FusionResult {
            score: modulated,
            components: Components {
                mq: mq.score,
                of: bn.of_score,
                structure: structure_score,
                mia,
            },
            modifiers: Modifiers {
                vix_mult,
                mia_mult,
                leader_bonus,
            },
            side,
            quality,
            rationale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mq(score: f64) -> MenthorQDistanceOutput {
        MenthorQDistanceOutput {
            score,
            side: None,
            anchor: None,
            rationale: vec!["mq".into()],
        }
    }

    fn bn(structure: f64, of: f64) -> BattleNavaleOutput {
        BattleNavaleOutput {
            pattern_score: structure,
            of_score: of,
            side: None,
            pattern: None,
            confidence: 0.5,
            rationale: vec!["bn".into()],
        }
    }

    #[test]
    fn score_is_always_bounded() {
        let fuser = SignalFuser::new(WeightsConfig::default(), ThresholdsConfig::default(), VixCaps::default(), false);
        let result = fuser.fuse(&mq(1.0), &bn(1.0, 1.0), 1.0, Some(1.0), &LeadershipGate::Aligned { bonus_factor: 1.3 }, VixRegime::Low);
        assert!(result.score <= 1.0 && result.score >= -1.0);
    }

    #[test]
    fn extreme_vix_caps_score_magnitude() {
        let fuser = SignalFuser::new(WeightsConfig::default(), ThresholdsConfig::default(), VixCaps::default(), false);
        let result = fuser.fuse(&mq(1.0), &bn(1.0, 1.0), 1.0, None, &LeadershipGate::Neutral, VixRegime::Extreme);
        assert!(result.score.abs() <= VixCaps::default().extreme + 1e-9);
    }

    #[test]
    fn candidate_side_follows_the_dominant_weighted_input() {
        let weights = WeightsConfig::default();
        assert_eq!(candidate_side(&weights, &mq(0.9), &bn(0.1, 0.1), 0.1), Side::Long);
        assert_eq!(candidate_side(&weights, &mq(-0.9), &bn(-0.1, -0.1), -0.1), Side::Short);
    }

    #[test]
    fn failing_mia_gate_dampens_but_does_not_flip_the_score() {
        let fuser = SignalFuser::new(WeightsConfig::default(), ThresholdsConfig::default(), VixCaps::default(), false);
        let with_mia = fuser.fuse(&mq(0.9), &bn(0.2, 0.2), 0.2, Some(1.0), &LeadershipGate::Neutral, VixRegime::Low);
        let without_mia = fuser.fuse(&mq(0.9), &bn(0.2, 0.2), 0.2, None, &LeadershipGate::Neutral, VixRegime::Low);
        assert!(without_mia.modifiers.mia_mult < with_mia.modifiers.mia_mult);
        assert!(without_mia.score.abs() < with_mia.score.abs());
    }

    #[test]
    fn weak_quality_only_granted_when_allowed() {
        let mut t = ThresholdsConfig::default();
        t.entry = 0.60;
        t.good = 0.70;
        let below_good_above_entry = 0.65;
        assert_eq!(quality_bucket(below_good_above_entry, &t, false), None);
        assert_eq!(quality_bucket(below_good_above_entry, &t, true), Some(Quality::Weak));
    }
}
