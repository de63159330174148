use nv_config::StalenessConfig;
use nv_schemas::LevelClass;
use std::time::Duration;

/// Per-class staleness limits, overridable from `nv-config`'s
/// `StalenessConfig` (spec §3: "treat as configurable"). Falls back to
/// `LevelClass::default_staleness_limit` for any class not explicitly
/// supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StalenessLimits {
    pub gamma: Duration,
    pub blind_spot: Duration,
    pub swing: Duration,
}

impl Default for StalenessLimits {
    fn default() -> Self {
        Self {
            gamma: LevelClass::GammaWall0dte.default_staleness_limit(),
            blind_spot: LevelClass::BlindSpot.default_staleness_limit(),
            swing: LevelClass::Swing.default_staleness_limit(),
        }
    }
}

impl StalenessLimits {
    pub fn limit_for(&self, class: LevelClass) -> Duration {
        match class {
            LevelClass::BlindSpot => self.blind_spot,
            LevelClass::Swing => self.swing,
            _ => self.gamma,
        }
    }

    pub fn from_config(cfg: &StalenessConfig) -> Self {
        Self {
            gamma: Duration::from_secs(cfg.gamma_minutes * 60),
            blind_spot: Duration::from_secs(cfg.blind_spot_minutes * 60),
            swing: Duration::from_secs(cfg.swing_minutes * 60),
        }
    }
}
