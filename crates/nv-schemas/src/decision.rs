use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final pipeline action for one decision cycle (spec §6 wire schema).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "GO_LONG")]
    GoLong,
    #[serde(rename = "GO_SHORT")]
    GoShort,
    #[serde(rename = "NO_TRADE")]
    NoTrade,
}

/// Quality bucket assigned by the fuser (spec §4.8).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "PREMIUM")]
    Premium,
    #[serde(rename = "STRONG")]
    Strong,
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "WEAK")]
    Weak,
}

impl Quality {
    /// Multiplicative size scaling per quality bucket (spec §4.8).
    pub fn size_multiplier(self) -> f64 {
        match self {
            Quality::Premium => 2.0,
            Quality::Strong => 1.5,
            Quality::Good => 1.0,
            Quality::Weak => 0.5,
        }
    }
}

/// The three fused score components plus the MIA gate score, each in
/// `[-1, +1]` before fusion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub mq: f64,
    pub of: f64,
    pub structure: f64,
    pub mia: f64,
}

/// Multiplicative modulators applied to `final_score` (spec §4.8 step 2).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub vix_mult: f64,
    pub mia_mult: f64,
    pub leader_bonus: f64,
}

/// Leadership inputs surfaced on the decision for observability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeadershipInfo {
    pub ls: f64,
    pub beta: f64,
    #[serde(rename = "corr_30s")]
    pub corr_30s: f64,
    pub reason: String,
}

/// The MenthorQ level the decision anchored on, if any.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub price: f64,
    pub class: String,
}

/// Entry / Stop (unfavorable exit) / Target price triplet (spec §4.9).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Eul {
    pub entry: f64,
    pub stop: f64,
    pub target1: f64,
    pub target2: f64,
    pub risk_ticks: f64,
}

/// The TradingDecision output stream schema (spec §6).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradingDecision {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub action: Action,
    pub score: f64,
    pub components: Components,
    pub modifiers: Modifiers,
    pub quality: Option<Quality>,
    pub size_multiplier: f64,
    pub leadership: LeadershipInfo,
    pub level: Option<Level>,
    pub eul: Option<Eul>,
    pub rationale: Vec<String>,
    pub blocked_by: Vec<String>,
}

impl TradingDecision {
    /// Every `NO_TRADE` decision must carry a non-empty `blocked_by` (spec
    /// §7 "User-visible behavior"). Every emitted trade must carry a
    /// non-empty rationale.
    pub fn invariants_hold(&self) -> bool {
        match self.action {
            Action::NoTrade => !self.blocked_by.is_empty(),
            Action::GoLong | Action::GoShort => !self.rationale.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TradingDecision {
        TradingDecision {
            timestamp: Utc::now(),
            symbol: "ES".into(),
            action: Action::NoTrade,
            score: 0.0,
            components: Components {
                mq: 0.0,
                of: 0.0,
                structure: 0.0,
                mia: 0.0,
            },
            modifiers: Modifiers {
                vix_mult: 1.0,
                mia_mult: 1.0,
                leader_bonus: 1.0,
            },
            quality: None,
            size_multiplier: 0.0,
            leadership: LeadershipInfo {
                ls: 0.0,
                beta: 1.0,
                corr_30s: 0.0,
                reason: "warmup".into(),
            },
            level: None,
            eul: None,
            rationale: vec![],
            blocked_by: vec!["cooldown_active".into()],
        }
    }

    #[test]
    fn round_trips_through_json() {
        let d = sample();
        let json = serde_json::to_string(&d).unwrap();
        let back: TradingDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }

    #[test]
    fn action_wire_values_match_spec() {
        assert_eq!(serde_json::to_string(&Action::GoLong).unwrap(), "\"GO_LONG\"");
        assert_eq!(serde_json::to_string(&Action::GoShort).unwrap(), "\"GO_SHORT\"");
        assert_eq!(serde_json::to_string(&Action::NoTrade).unwrap(), "\"NO_TRADE\"");
    }

    #[test]
    fn no_trade_without_blocked_by_violates_invariant() {
        let mut d = sample();
        d.blocked_by.clear();
        assert!(!d.invariants_hold());
    }
}
