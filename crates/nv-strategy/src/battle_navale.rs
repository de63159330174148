use nv_config::BattleNavaleConfig;
use nv_schemas::{Bar, Side};

/// The closed set of named candle/orderflow patterns scanned on the current
/// bar (spec §4.5 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    RougeSousVerte,
    LongDownUpBar,
    LongUpDownBar,
    ColorDownSetting,
    ColorUpSetting,
    DoubleAsk,
    DoubleBid,
    NoPattern,
}

impl Pattern {
    fn base_strength(self) -> f64 {
        match self {
            Pattern::RougeSousVerte => 0.9,
            Pattern::LongDownUpBar | Pattern::LongUpDownBar => 0.8,
            Pattern::DoubleAsk | Pattern::DoubleBid => 0.7,
            Pattern::ColorDownSetting | Pattern::ColorUpSetting => 0.6,
            Pattern::NoPattern => 0.0,
        }
    }

    /// Only `rouge_sous_verte` carries the premium-gating behavior spelled
    /// out in spec §4.5 step 4; the others are scored but don't gate.
    fn required_for_premium(self) -> bool {
        matches!(self, Pattern::RougeSousVerte)
    }
}

struct PatternSignal {
    pattern: Pattern,
    side: Side,
    strength: f64,
}

fn is_green(bar: &Bar) -> bool {
    bar.close >= bar.open
}

fn nested_within(inner: &Bar, outer: &Bar) -> bool {
    inner.high <= outer.high && inner.low >= outer.low
}

fn upper_wick(bar: &Bar) -> f64 {
    bar.high - bar.open.max(bar.close)
}

fn lower_wick(bar: &Bar) -> f64 {
    bar.open.min(bar.close) - bar.low
}

/// A bar that pushed down then reversed hard into a green close -- a long
/// lower wick with the body resolving bullish.
fn is_long_down_up_bar(bar: &Bar) -> bool {
    let range = bar.high - bar.low;
    range > 0.0 && is_green(bar) && lower_wick(bar) >= range * 0.4
}

/// Mirror of `is_long_down_up_bar`: a long upper wick resolving bearish.
fn is_long_up_down_bar(bar: &Bar) -> bool {
    let range = bar.high - bar.low;
    range > 0.0 && !is_green(bar) && upper_wick(bar) >= range * 0.4
}

/// `n` consecutive bars of the same color ending at the window's last bar.
fn same_color_run(bars: &[Bar], green: bool) -> usize {
    bars.iter().rev().take_while(|b| is_green(b) == green).count()
}

const SETTING_RUN_LEN: usize = 3;

/// Dispatch over the recent window, evaluated in priority order; the first
/// match wins (spec §4.5 step 1 lists the set but not an explicit priority,
/// so the most specific two-bar reversal patterns are checked first).
fn detect_pattern(bars: &[Bar]) -> Option<PatternSignal> {
    let last = bars.last()?;
    let prev = if bars.len() >= 2 { Some(&bars[bars.len() - 2]) } else { None };

    if let Some(prev) = prev {
        if !is_green(prev) && is_green(last) && nested_within(last, prev) {
            return Some(PatternSignal {
                pattern: Pattern::RougeSousVerte,
                side: Side::Short,
                strength: Pattern::RougeSousVerte.base_strength(),
            });
        }
    }

    if is_long_down_up_bar(last) {
        return Some(PatternSignal {
            pattern: Pattern::LongDownUpBar,
            side: Side::Long,
            strength: Pattern::LongDownUpBar.base_strength(),
        });
    }
    if is_long_up_down_bar(last) {
        return Some(PatternSignal {
            pattern: Pattern::LongUpDownBar,
            side: Side::Short,
            strength: Pattern::LongUpDownBar.base_strength(),
        });
    }

    if let Some(nbcv) = last.features.nbcv {
        if bars.len() >= 2 {
            let prev_nbcv = bars[bars.len() - 2].features.nbcv;
            if nbcv.pressure == 1 && prev_nbcv.is_some_and(|p| p.pressure == 1) {
                return Some(PatternSignal {
                    pattern: Pattern::DoubleAsk,
                    side: Side::Long,
                    strength: Pattern::DoubleAsk.base_strength(),
                });
            }
            if nbcv.pressure == -1 && prev_nbcv.is_some_and(|p| p.pressure == -1) {
                return Some(PatternSignal {
                    pattern: Pattern::DoubleBid,
                    side: Side::Short,
                    strength: Pattern::DoubleBid.base_strength(),
                });
            }
        }
    }

    if bars.len() >= SETTING_RUN_LEN {
        let window = &bars[bars.len() - SETTING_RUN_LEN..];
        if same_color_run(window, false) == SETTING_RUN_LEN {
            return Some(PatternSignal {
                pattern: Pattern::ColorDownSetting,
                side: Side::Short,
                strength: Pattern::ColorDownSetting.base_strength(),
            });
        }
        if same_color_run(window, true) == SETTING_RUN_LEN {
            return Some(PatternSignal {
                pattern: Pattern::ColorUpSetting,
                side: Side::Long,
                strength: Pattern::ColorUpSetting.base_strength(),
            });
        }
    }

    None
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattleNavaleOutput {
    /// Pattern-detection component, in `[-1, +1]` (spec §4.5 step 1). Not to
    /// be confused with the fusion-level `structure_score` (spec §4.8 step
    /// 1), which is a VWAP/VVA/correlation composite computed elsewhere.
    pub pattern_score: f64,
    /// Vikings-vs-Defenders orderflow component, in `[-1, +1]`.
    pub of_score: f64,
    pub side: Option<Side>,
    pub pattern: Option<&'static str>,
    pub confidence: f64,
    pub rationale: Vec<String>,
}

impl BattleNavaleOutput {
    fn flat() -> Self {
        Self {
            pattern_score: 0.0,
            of_score: 0.0,
            side: None,
            pattern: None,
            confidence: 0.0,
            rationale: vec!["insufficient bar history for pattern detection".to_string()],
        }
    }
}

fn pattern_name(p: Pattern) -> &'static str {
    match p {
        Pattern::RougeSousVerte => "rouge_sous_verte",
        Pattern::LongDownUpBar => "long_down_up_bar",
        Pattern::LongUpDownBar => "long_up_down_bar",
        Pattern::ColorDownSetting => "color_down_setting",
        Pattern::ColorUpSetting => "color_up_setting",
        Pattern::DoubleAsk => "double_ask",
        Pattern::DoubleBid => "double_bid",
        Pattern::NoPattern => "none",
    }
}

/// Orderflow pattern analyzer: combines the candle/volume pattern dispatch
/// table with the NBCV-derived "Vikings vs Defenders" pressure composite
/// (spec §4.5).
pub struct BattleNavaleAnalyzer {
    config: BattleNavaleConfig,
}

impl BattleNavaleAnalyzer {
    pub fn new(config: BattleNavaleConfig) -> Self {
        Self { config }
    }

    /// `bars` is the most recent closed bars, oldest first, already capped
    /// to `pattern_lookback_bars` by the caller.
    pub fn analyze(&self, bars: &[Bar], nbcv_delta_ratio: Option<f64>) -> BattleNavaleOutput {
        if bars.len() < 2 {
            return BattleNavaleOutput::flat();
        }

        let Some(signal) = detect_pattern(bars) else {
            return BattleNavaleOutput::flat();
        };

        let mut pattern_score = signal.strength * signal.side.sign();

        // Rouge-sous-verte rule (spec §4.5 step 4): an intended LONG without
        // this pattern present and below premium confidence is capped.
        if signal.side == Side::Long && !signal.pattern.required_for_premium() {
            pattern_score = pattern_score.clamp(
                -self.config.rouge_sous_verte_cap,
                self.config.rouge_sous_verte_cap,
            );
        }

        // Vikings (buy-side aggression) vs Defenders (sell-side aggression):
        // the NBCV delta ratio directly expresses who is winning the bar.
        let of_score = nbcv_delta_ratio.unwrap_or(0.0).clamp(-1.0, 1.0);

        let agreement = matches!(
            (signal.side, of_score.partial_cmp(&0.0)),
            (Side::Long, Some(std::cmp::Ordering::Greater)) | (Side::Short, Some(std::cmp::Ordering::Less))
        );
        let confidence = if agreement { (signal.strength + of_score.abs()) / 2.0 } else { signal.strength * 0.5 };

        BattleNavaleOutput {
            pattern_score,
            of_score,
            side: Some(signal.side),
            pattern: Some(pattern_name(signal.pattern)),
            confidence: confidence.clamp(0.0, 1.0),
            rationale: vec![format!(
                "pattern={} side={} of_score={:.2}",
                pattern_name(signal.pattern),
                signal.side,
                of_score
            )],
        }
    }

    /// Composite score blending pattern and orderflow components (spec
    /// §4.5 step 3: "0.55 pattern / 0.45 orderflow").
    pub fn composite(&self, output: &BattleNavaleOutput) -> f64 {
        (0.55 * output.pattern_score + 0.45 * output.of_score).clamp(-1.0, 1.0)
    }

    pub fn premium_threshold(&self) -> f64 {
        self.config.premium_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nv_schemas::{BarKey, NbcvFeatures};

    fn bar(open: f64, high: f64, low: f64, close: f64, volume: i64) -> Bar {
        let mut b = Bar::open_new(BarKey::new("ES", 0, 1), Utc::now(), open);
        b.high = high;
        b.low = low;
        b.close = close;
        b.volume = volume;
        b.is_complete = true;
        b
    }

    fn bar_with_pressure(open: f64, high: f64, low: f64, close: f64, pressure: i8) -> Bar {
        let mut b = bar(open, high, low, close, 100);
        b.features.nbcv = Some(NbcvFeatures {
            ask_volume: if pressure >= 0 { 60.0 } else { 40.0 },
            bid_volume: if pressure >= 0 { 40.0 } else { 60.0 },
            delta: 0.0,
            cumulative_delta: 0.0,
            trades: 10,
            pressure,
            delta_ratio: 0.0,
        });
        b
    }

    #[test]
    fn too_few_bars_is_flat() {
        let analyzer = BattleNavaleAnalyzer::new(BattleNavaleConfig::default());
        let out = analyzer.analyze(&[bar(1.0, 2.0, 0.5, 1.5, 10)], None);
        assert_eq!(out.pattern_score, 0.0);
    }

    #[test]
    fn rouge_sous_verte_detected_on_red_inside_green() {
        let analyzer = BattleNavaleAnalyzer::new(BattleNavaleConfig::default());
        let green = bar(4500.0, 4510.0, 4498.0, 4508.0, 100);
        let red_inside = bar(4507.0, 4505.0, 4501.0, 4502.0, 80);
        let out = analyzer.analyze(&[green, red_inside], Some(-0.4));
        assert_eq!(out.pattern, Some("rouge_sous_verte"));
        assert_eq!(out.side, Some(Side::Short));
    }

    #[test]
    fn long_down_up_bar_detected_on_lower_wick_reversal() {
        let analyzer = BattleNavaleAnalyzer::new(BattleNavaleConfig::default());
        let setup = bar(4500.0, 4502.0, 4498.0, 4501.0, 50);
        // Deep lower wick, closes green near the high.
        let reversal = bar(4498.0, 4499.5, 4490.0, 4499.0, 120);
        let out = analyzer.analyze(&[setup, reversal], None);
        assert_eq!(out.pattern, Some("long_down_up_bar"));
        assert_eq!(out.side, Some(Side::Long));
    }

    #[test]
    fn long_up_down_bar_is_not_capped_since_cap_only_applies_to_longs() {
        let analyzer = BattleNavaleAnalyzer::new(BattleNavaleConfig::default());
        let setup = bar(4500.0, 4502.0, 4498.0, 4501.0, 50);
        let reversal = bar(4502.0, 4510.0, 4501.5, 4502.5, 120);
        let out = analyzer.analyze(&[setup, reversal], None);
        assert_eq!(out.pattern, Some("long_up_down_bar"));
        assert_eq!(out.side, Some(Side::Short));
        assert!(out.pattern_score < 0.0);
    }

    #[test]
    fn non_rouge_long_pattern_is_capped_at_configured_ceiling() {
        let analyzer = BattleNavaleAnalyzer::new(BattleNavaleConfig::default());
        let setup = bar(4500.0, 4502.0, 4498.0, 4501.0, 50);
        let reversal = bar(4498.0, 4499.5, 4490.0, 4499.0, 120);
        let out = analyzer.analyze(&[setup, reversal], None);
        assert!(out.pattern_score <= BattleNavaleConfig::default().rouge_sous_verte_cap + 1e-9);
    }

    #[test]
    fn double_ask_detected_on_two_consecutive_ask_dominant_bars() {
        let analyzer = BattleNavaleAnalyzer::new(BattleNavaleConfig::default());
        let first = bar_with_pressure(4500.0, 4501.0, 4499.5, 4500.5, 1);
        let second = bar_with_pressure(4500.5, 4501.5, 4500.0, 4501.0, 1);
        let out = analyzer.analyze(&[first, second], Some(0.3));
        assert_eq!(out.pattern, Some("double_ask"));
        assert_eq!(out.side, Some(Side::Long));
    }

    #[test]
    fn color_down_setting_detected_on_three_consecutive_red_bars() {
        let analyzer = BattleNavaleAnalyzer::new(BattleNavaleConfig::default());
        let bars = vec![
            bar(4505.0, 4506.0, 4503.0, 4504.0, 50),
            bar(4504.0, 4504.5, 4501.0, 4502.0, 50),
            bar(4502.0, 4502.5, 4499.0, 4500.0, 50),
        ];
        let out = analyzer.analyze(&bars, None);
        assert_eq!(out.pattern, Some("color_down_setting"));
        assert_eq!(out.side, Some(Side::Short));
    }

    #[test]
    fn composite_blends_pattern_and_orderflow() {
        let analyzer = BattleNavaleAnalyzer::new(BattleNavaleConfig::default());
        let out = BattleNavaleOutput {
            pattern_score: 0.5,
            of_score: -0.5,
            side: Some(Side::Long),
            pattern: Some("double_ask"),
            confidence: 0.6,
            rationale: vec![],
        };
        let composite = analyzer.composite(&out);
        assert!((composite - (0.55 * 0.5 + 0.45 * -0.5)).abs() < 1e-9);
    }
}
