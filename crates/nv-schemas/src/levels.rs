use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// The enumerated MenthorQ level classes, used to look up proximity
/// tolerances (nv-strategy) and staleness limits (nv-levels).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LevelClass {
    GammaWall0dte,
    CallSupport0dte,
    PutSupport0dte,
    CallResistance,
    PutSupport,
    Hvl,
    Gex,
    BlindSpot,
    Swing,
}

impl LevelClass {
    /// Default staleness limit per spec §3 ("gamma: 30 min; blind spots: 20
    /// min; swings: 2h — treat as configurable"). Callers needing
    /// configurability should go through `nv-config`'s `TolerancesConfig`
    /// instead of this default.
    pub fn default_staleness_limit(self) -> Duration {
        match self {
            LevelClass::GammaWall0dte
            | LevelClass::CallSupport0dte
            | LevelClass::PutSupport0dte
            | LevelClass::CallResistance
            | LevelClass::PutSupport
            | LevelClass::Hvl
            | LevelClass::Gex => Duration::from_secs(30 * 60),
            LevelClass::BlindSpot => Duration::from_secs(20 * 60),
            LevelClass::Swing => Duration::from_secs(2 * 60 * 60),
        }
    }
}

/// A single named MenthorQ level, e.g. `gex_3` or `swing_12`. The full
/// enumeration in spec §3 is: `call_resistance`, `put_support`, `hvl`,
/// `gamma_wall_0dte`, `call_support_0dte`, `put_support_0dte`,
/// `gex_1..gex_10`, `blind_spot_1..blind_spot_10`, `swing_1..swing_60`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LevelName(pub String);

impl LevelName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify a level name into its `LevelClass`. Unknown/malformed names
    /// return `None`; callers drop such levels with a warning rather than
    /// guessing a class.
    pub fn classify(&self) -> Option<LevelClass> {
        let n = self.0.as_str();
        match n {
            "call_resistance" => Some(LevelClass::CallResistance),
            "put_support" => Some(LevelClass::PutSupport),
            "hvl" => Some(LevelClass::Hvl),
            "gamma_wall_0dte" => Some(LevelClass::GammaWall0dte),
            "call_support_0dte" => Some(LevelClass::CallSupport0dte),
            "put_support_0dte" => Some(LevelClass::PutSupport0dte),
            _ if n.starts_with("gex_") => Some(LevelClass::Gex),
            _ if n.starts_with("blind_spot_") => Some(LevelClass::BlindSpot),
            _ if n.starts_with("swing_") => Some(LevelClass::Swing),
            _ => None,
        }
    }
}

/// Freshness classification for a level (spec §3).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum StalenessClass {
    Fresh,
    Stale,
    Expired,
}

/// One upserted MenthorQ level with its freshness.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelEntry {
    pub name: LevelName,
    pub class: LevelClass,
    pub price: f64,
    pub updated_at: DateTime<Utc>,
    pub staleness: StalenessClass,
}

/// Per-symbol mapping from level name to its current entry. Immutable once
/// handed to a `Snapshot` — `nv-levels::LevelStore` clones this on read.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LevelSet {
    pub symbol: String,
    pub levels: BTreeMap<String, LevelEntry>,
}

impl LevelSet {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            levels: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&LevelEntry> {
        self.levels.get(name)
    }

    pub fn non_expired(&self) -> impl Iterator<Item = &LevelEntry> {
        self.levels
            .values()
            .filter(|l| l.staleness != StalenessClass::Expired)
    }
}
