use nv_config::ExecutionRulesConfig;
use nv_leadership::LeadershipGate;
use nv_schemas::{LevelClass, Side, Snapshot, StalenessClass, VixRegime};
use nv_strategy::LevelAnchor;
use std::time::Duration;

/// Ordered hard-block / soft-modifier evaluation, mirroring a risk gate:
/// checks run in priority order and the first hard block wins (spec §4.7).
pub struct ExecutionRules {
    cfg: ExecutionRulesConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftModifier {
    pub multiplier: f64,
    pub reason: &'static str,
}

impl ExecutionRules {
    pub fn new(cfg: ExecutionRulesConfig) -> Self {
        Self { cfg }
    }

    /// Returns `Some(reason)` for the first hard block that fires, else
    /// `None` to proceed.
    pub fn hard_block(
        &self,
        snapshot: &Snapshot,
        side: Side,
        tick_size: f64,
        mq_anchor: Option<&LevelAnchor>,
        leadership_gate: &LeadershipGate,
        mia_gate_passes: bool,
    ) -> Option<&'static str> {
        if let Some(reason) = self.blind_spot_hard_block(snapshot, tick_size) {
            return Some(reason);
        }
        if let Some(anchor) = mq_anchor {
            if let Some(entry) = snapshot.level_set.get(&anchor.name) {
                if entry.staleness == StalenessClass::Expired {
                    return Some("anchor_level_expired");
                }
            }
        }
        if let Some(outcome) = snapshot.prior_trade_outcome {
            if outcome.cooldown_remaining > Duration::ZERO {
                return Some("cooldown_active");
            }
        }
        if let LeadershipGate::Veto { reason } = leadership_gate {
            return Some(reason);
        }
        if !mia_gate_passes {
            return Some("mia_gate_failed");
        }
        let _ = side;
        None
    }

    fn blind_spot_hard_block(&self, snapshot: &Snapshot, tick_size: f64) -> Option<&'static str> {
        if tick_size <= 0.0 {
            return None;
        }
        let threshold = if snapshot.vix_regime >= VixRegime::High {
            self.cfg.blind_spot_hard_block_ticks_high_vol
        } else {
            self.cfg.blind_spot_hard_block_ticks
        };
        let nearest = snapshot
            .level_set
            .non_expired()
            .filter(|e| e.class == LevelClass::BlindSpot)
            .map(|e| (e.price - snapshot.price).abs() / tick_size)
            .fold(f64::INFINITY, f64::min);
        if nearest <= threshold {
            Some("blind_spot_proximity")
        } else {
            None
        }
    }

    /// Soft modifiers (spec §4.7): each independently scales the fused
    /// score rather than blocking the trade outright.
    pub fn soft_modifiers(&self, snapshot: &Snapshot, side: Side, tick_size: f64) -> Vec<SoftModifier> {
        let mut mods = Vec::new();

        if tick_size > 0.0 {
            let near_gamma_wall = snapshot
                .level_set
                .non_expired()
                .filter(|e| e.class == LevelClass::GammaWall0dte)
                .any(|e| (e.price - snapshot.price).abs() / tick_size <= self.cfg.gamma_wall_soft_multiplier);
            if near_gamma_wall {
                mods.push(SoftModifier {
                    multiplier: 0.5,
                    reason: "near_gamma_wall",
                });
            }

            let adverse_swing = snapshot
                .level_set
                .non_expired()
                .filter(|e| e.class == LevelClass::Swing)
                .any(|e| {
                    let adverse = (side == Side::Long && e.price < snapshot.price)
                        || (side == Side::Short && e.price > snapshot.price);
                    adverse && (e.price - snapshot.price).abs() / tick_size <= self.cfg.swing_adverse_ticks
                });
            if adverse_swing {
                mods.push(SoftModifier {
                    multiplier: 0.7,
                    reason: "adverse_swing_nearby",
                });
            }
        }

        if snapshot.dealers_bias.abs() >= self.cfg.dealers_bias_threshold
            && snapshot.dealers_bias.signum() != side.sign()
        {
            mods.push(SoftModifier {
                multiplier: 0.8,
                reason: "dealers_bias_opposed",
            });
        }

        mods
    }
}
