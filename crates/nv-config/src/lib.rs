pub mod layering;
pub mod types;

pub use layering::{load_layered, LoadedConfig};
pub use types::{
    BattleNavaleConfig, Config, ConfigError, CorrelationFloorByVix, ExecutionRulesConfig,
    IngestionConfig, LeadershipByVix, LeadershipRegimeThresholds, RiskConfig, SizingConfig,
    StalenessConfig, StopAtrK, SymbolSpec, ThresholdsConfig, TolerancesConfig, VixCaps,
    WeightsConfig,
};

use anyhow::{Context, Result};
use std::path::Path;

/// Load + merge config documents, deserialize into [`Config`], and
/// validate. This is the one entry point the CLI (`run`/`replay`) uses.
pub fn load_config<P: AsRef<Path>>(paths: &[P]) -> Result<(Config, LoadedConfig)> {
    let loaded = load_layered(paths)?;
    let cfg: Config = serde_json::from_value(loaded.config_json.clone())
        .context("config document does not match the expected schema")?;
    cfg.validate().context("config validation failed")?;
    Ok((cfg, loaded))
}
