//! Typed configuration matching spec §6 "Configuration".
//!
//! Every field has a spec-documented default so a minimal (even empty)
//! config file still produces a runnable pipeline; overrides come from the
//! layered YAML/JSON documents loaded by [`crate::layering`].

use nv_schemas::VixRegime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub tick_size: f64,
    #[serde(default)]
    pub session_windows: Vec<String>,
}

impl Default for SymbolSpec {
    fn default() -> Self {
        Self {
            tick_size: 0.25,
            session_windows: Vec::new(),
        }
    }
}

/// MenthorQ class → proximity tolerance in ticks (spec §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TolerancesConfig {
    pub gamma_wall: f64,
    pub hvl: f64,
    pub gex: f64,
    pub blind_spots: f64,
    pub swing: f64,
}

impl Default for TolerancesConfig {
    fn default() -> Self {
        Self {
            gamma_wall: 3.0,
            hvl: 5.0,
            gex: 5.0,
            blind_spots: 4.0,
            swing: 8.0,
        }
    }
}

/// Per-VIX-regime leadership gate thresholds (spec §4.4 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadershipRegimeThresholds {
    pub soft: f64,
    pub hard: f64,
    pub bonus_factor: f64,
    pub extra_of_confirms: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadershipByVix {
    pub low: LeadershipRegimeThresholds,
    pub mid: LeadershipRegimeThresholds,
    pub high: LeadershipRegimeThresholds,
    pub extreme: LeadershipRegimeThresholds,
}

impl Default for LeadershipByVix {
    fn default() -> Self {
        Self {
            low: LeadershipRegimeThresholds {
                soft: 0.50,
                hard: 1.40,
                bonus_factor: 1.05,
                extra_of_confirms: 0,
            },
            mid: LeadershipRegimeThresholds {
                soft: 0.50,
                hard: 1.30,
                bonus_factor: 1.05,
                extra_of_confirms: 0,
            },
            high: LeadershipRegimeThresholds {
                soft: 0.50,
                hard: 1.10,
                bonus_factor: 1.00,
                extra_of_confirms: 1,
            },
            extreme: LeadershipRegimeThresholds {
                soft: 0.40,
                hard: 1.00,
                bonus_factor: 1.00,
                extra_of_confirms: 1,
            },
        }
    }
}

/// Minimum rolling 30s ES/NQ correlation required for the leadership gate
/// to fire at all (spec §4.4: "correlation too low" veto), keyed by regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationFloorByVix {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
    pub extreme: f64,
}

impl Default for CorrelationFloorByVix {
    fn default() -> Self {
        // Spec §4.9 does not pin exact floors per regime; conservative
        // defaults tighten as volatility rises, mirroring the tightening
        // hard-leadership thresholds in `LeadershipByVix`.
        Self {
            low: 0.20,
            mid: 0.25,
            high: 0.35,
            extreme: 0.40,
        }
    }
}

impl LeadershipByVix {
    pub fn for_regime(&self, regime: VixRegime) -> LeadershipRegimeThresholds {
        match regime {
            VixRegime::Low => self.low,
            VixRegime::Mid => self.mid,
            VixRegime::High => self.high,
            VixRegime::Extreme => self.extreme,
        }
    }
}

impl CorrelationFloorByVix {
    pub fn for_regime(&self, regime: VixRegime) -> f64 {
        match regime {
            VixRegime::Low => self.low,
            VixRegime::Mid => self.mid,
            VixRegime::High => self.high,
            VixRegime::Extreme => self.extreme,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    pub mia_long: f64,
    pub mia_short: f64,
    pub entry: f64,
    pub premium: f64,
    pub strong: f64,
    pub good: f64,
    pub correlation_floor_by_vix: CorrelationFloorByVix,
    pub leadership_by_vix: LeadershipByVix,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            mia_long: 0.20,
            mia_short: -0.20,
            entry: 0.70,
            premium: 0.85,
            strong: 0.75,
            good: 0.70,
            correlation_floor_by_vix: CorrelationFloorByVix::default(),
            leadership_by_vix: LeadershipByVix::default(),
        }
    }
}

/// Fusion weights (spec §4.8 step 1). Must sum to 1.0; validated by
/// [`super::Config::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightsConfig {
    pub mq: f64,
    pub of: f64,
    pub structure: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            mq: 0.55,
            of: 0.30,
            structure: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VixCaps {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
    pub extreme: f64,
}

impl VixCaps {
    pub fn for_regime(&self, regime: VixRegime) -> f64 {
        match regime {
            VixRegime::Low => self.low,
            VixRegime::Mid => self.mid,
            VixRegime::High => self.high,
            VixRegime::Extreme => self.extreme,
        }
    }
}

impl Default for VixCaps {
    fn default() -> Self {
        Self {
            low: 1.0,
            mid: 0.6,
            high: 0.4,
            extreme: 0.25,
        }
    }
}

/// Stop-distance ATR multiplier `k` by VIX regime (spec §4.9: "k ∈ {0.8,
/// 1.2, 1.6} by vix_regime"). Spec §4.9 gives three values for four
/// regimes; LOW and MID share the tightest multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopAtrK {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
    pub extreme: f64,
}

impl StopAtrK {
    pub fn for_regime(&self, regime: VixRegime) -> f64 {
        match regime {
            VixRegime::Low => self.low,
            VixRegime::Mid => self.mid,
            VixRegime::High => self.high,
            VixRegime::Extreme => self.extreme,
        }
    }
}

impl Default for StopAtrK {
    fn default() -> Self {
        Self {
            low: 0.8,
            mid: 0.8,
            high: 1.2,
            extreme: 1.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingConfig {
    pub vix_caps: VixCaps,
    pub stop_atr_k: StopAtrK,
    pub min_stop_ticks: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            vix_caps: VixCaps::default(),
            stop_atr_k: StopAtrK::default(),
            min_stop_ticks: 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub cooldown_after_stop_secs: u64,
    pub daily_loss_limit: Option<f64>,
    pub daily_trades_limit: Option<u32>,
    pub max_consecutive_losses: Option<u32>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            cooldown_after_stop_secs: 15 * 60,
            daily_loss_limit: None,
            daily_trades_limit: None,
            max_consecutive_losses: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionConfig {
    #[serde(default = "default_chart_dir")]
    pub chart_dir: String,
    #[serde(default = "default_reorder_window_ms")]
    pub reorder_window_ms: u64,
    #[serde(default = "default_dedupe_window")]
    pub dedupe_window: usize,
    #[serde(default = "default_rotate_on_date_change")]
    pub rotate_on_date_change: bool,
}

fn default_chart_dir() -> String {
    "./charts".to_string()
}

fn default_reorder_window_ms() -> u64 {
    200
}

fn default_dedupe_window() -> usize {
    10_000
}

fn default_rotate_on_date_change() -> bool {
    true
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            chart_dir: "./charts".to_string(),
            reorder_window_ms: 200,
            dedupe_window: 10_000,
            rotate_on_date_change: true,
        }
    }
}

/// Staleness limits for MenthorQ level classes (spec §3, "treat as
/// configurable").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StalenessConfig {
    pub gamma_minutes: u64,
    pub blind_spot_minutes: u64,
    pub swing_minutes: u64,
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            gamma_minutes: 30,
            blind_spot_minutes: 20,
            swing_minutes: 120,
        }
    }
}

/// Parameters for the hard-block / soft-modifier execution rules (spec
/// §4.7) not already covered by `tolerances`, `sizing`, or `risk`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRulesConfig {
    pub blind_spot_hard_block_ticks: f64,
    pub blind_spot_hard_block_ticks_high_vol: f64,
    pub gamma_wall_soft_multiplier: f64,
    pub swing_adverse_ticks: f64,
    pub dealers_bias_threshold: f64,
    pub wide_spread_multiplier: f64,
    pub allow_weak: bool,
}

impl Default for ExecutionRulesConfig {
    fn default() -> Self {
        Self {
            blind_spot_hard_block_ticks: 5.0,
            blind_spot_hard_block_ticks_high_vol: 7.5,
            gamma_wall_soft_multiplier: 2.0,
            swing_adverse_ticks: 8.0,
            dealers_bias_threshold: 0.3,
            wide_spread_multiplier: 2.0,
            allow_weak: false,
        }
    }
}

/// BattleNavale-specific knobs (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleNavaleConfig {
    pub pattern_lookback_bars: usize,
    pub premium_threshold: f64,
    pub rouge_sous_verte_cap: f64,
}

impl Default for BattleNavaleConfig {
    fn default() -> Self {
        Self {
            pattern_lookback_bars: 20,
            premium_threshold: 0.75,
            rouge_sous_verte_cap: 0.55,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub symbol_specs: BTreeMap<String, SymbolSpec>,
    #[serde(default)]
    pub tolerances: TolerancesConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub staleness: StalenessConfig,
    #[serde(default)]
    pub execution_rules: ExecutionRulesConfig,
    #[serde(default)]
    pub battle_navale: BattleNavaleConfig,
}

/// Config-level validation failures. Always a `ConfigError` in spec §7
/// terms — fatal at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    WeightsDoNotSumToOne { sum: f64 },
    UnknownSymbol { symbol: String },
    NonPositiveTickSize { symbol: String, tick_size: f64 },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::WeightsDoNotSumToOne { sum } => {
                write!(f, "fusion weights must sum to 1.0, got {sum}")
            }
            ConfigError::UnknownSymbol { symbol } => {
                write!(f, "no symbol_specs entry for symbol '{symbol}'")
            }
            ConfigError::NonPositiveTickSize { symbol, tick_size } => {
                write!(f, "symbol '{symbol}' has non-positive tick_size {tick_size}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.weights.mq + self.weights.of + self.weights.structure;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightsDoNotSumToOne { sum });
        }
        for (symbol, spec) in &self.symbol_specs {
            if spec.tick_size <= 0.0 {
                return Err(ConfigError::NonPositiveTickSize {
                    symbol: symbol.clone(),
                    tick_size: spec.tick_size,
                });
            }
        }
        Ok(())
    }

    pub fn tick_size(&self, symbol: &str) -> Result<f64, ConfigError> {
        self.symbol_specs
            .get(symbol)
            .map(|s| s.tick_size)
            .ok_or_else(|| ConfigError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }
}
