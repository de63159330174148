use nv_config::{CorrelationFloorByVix, LeadershipByVix};
use nv_schemas::{LeadershipSnap, Side, VixRegime};

/// Outcome of gating a candidate trade against the current ES/NQ leadership
/// state (spec §4.4 step 5).
#[derive(Debug, Clone, PartialEq)]
pub enum LeadershipGate {
    /// Leadership strongly agrees with the trade direction; apply the
    /// regime's bonus factor to the structure score.
    Aligned { bonus_factor: f64 },
    /// Leadership is inconclusive; no modifier either way.
    Neutral,
    /// Hard veto: correlation too low to trust leadership, or leadership
    /// strongly opposes the trade direction.
    Veto { reason: &'static str },
}

/// Gate an ES trade candidate against the current leadership snapshot.
pub fn gate_for_es(
    side: Side,
    snap: LeadershipSnap,
    regime: VixRegime,
    thresholds: &LeadershipByVix,
    correlation_floor: &CorrelationFloorByVix,
) -> LeadershipGate {
    let floor = correlation_floor.for_regime(regime);
    if snap.rolling_corr_30s.abs() < floor {
        return LeadershipGate::Veto {
            reason: "correlation_below_floor",
        };
    }

    let t = thresholds.for_regime(regime);
    let signed_ls = snap.ls * side.sign();

    if signed_ls <= -t.hard {
        return LeadershipGate::Veto {
            reason: "leadership_hard_opposed",
        };
    }
    if signed_ls >= t.hard {
        return LeadershipGate::Aligned {
            bonus_factor: t.bonus_factor,
        };
    }
    if signed_ls.abs() >= t.soft {
        // Soft agreement or disagreement: not strong enough either way to
        // move the score, but not vetoed either.
        return LeadershipGate::Neutral;
    }
    LeadershipGate::Neutral
}
