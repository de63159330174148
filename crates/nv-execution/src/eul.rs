use nv_config::SizingConfig;
use nv_schemas::{Eul, LevelSet, Side, VixRegime};
use nv_strategy::side_for_class;

/// Non-expired level prices carrying `desired` side bias (spec §4.6 step 4
/// naming), nearest-to-`entry` first.
fn levels_biased_toward(level_set: &LevelSet, desired: Side, entry: f64) -> Vec<f64> {
    let mut prices: Vec<(f64, f64)> = level_set
        .non_expired()
        .filter(|e| side_for_class(e.class) == Some(desired))
        .map(|e| ((e.price - entry).abs(), e.price))
        .collect();
    prices.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    prices.into_iter().map(|(_, p)| p).collect()
}

/// Computes the Entry/Unfavorable-exit/target Levels triplet (spec §4.9).
pub struct EulCalculator {
    sizing: SizingConfig,
    tick_size: f64,
}

impl EulCalculator {
    pub fn new(sizing: SizingConfig, tick_size: f64) -> Self {
        Self { sizing, tick_size }
    }

    /// `atr` is the current Wilder ATR for the symbol; `None` drops branch
    /// (b) from the stop calculation. `level_set` supplies the same-side and
    /// adverse MenthorQ levels for the stop and target caps (spec §4.9).
    pub fn compute(&self, entry: f64, side: Side, atr: Option<f64>, vix_regime: VixRegime, level_set: &LevelSet) -> Eul {
        let k = self.sizing.stop_atr_k.for_regime(vix_regime);

        // (a) opposite side of the nearest same-side level, minus 1 tick.
        let same_side_distance = levels_biased_toward(level_set, side, entry).first().map(|&level_price| {
            let opposite_side_price = match side {
                Side::Long => level_price - self.tick_size,
                Side::Short => level_price + self.tick_size,
            };
            (entry - opposite_side_price).abs()
        });

        // (b) entry +/- k * ATR.
        let atr_distance = atr.map(|a| a * k);

        // (c) a minimum of `min_stop_ticks` distance.
        let min_distance = self.sizing.min_stop_ticks * self.tick_size;

        let stop_distance = [same_side_distance, atr_distance, Some(min_distance)]
            .into_iter()
            .flatten()
            .fold(0.0, f64::max);

        let adverse = levels_biased_toward(level_set, side.opposite(), entry);

        // target1 capped at 1 tick short of the nearest adverse level.
        let target1_distance = match adverse.first() {
            Some(&adverse_price) => {
                let cap = ((entry - adverse_price).abs() - self.tick_size).max(0.0);
                stop_distance.min(cap)
            }
            None => stop_distance,
        };

        // target2 capped at the next (second-nearest) adverse level.
        let target2_distance = match adverse.get(1) {
            Some(&adverse_price) => (2.0 * stop_distance).min((entry - adverse_price).abs()),
            None => 2.0 * stop_distance,
        };

        let (stop, target1, target2) = match side {
            Side::Long => (
                entry - stop_distance,
                entry + target1_distance,
                entry + target2_distance,
            ),
            Side::Short => (
                entry + stop_distance,
                entry - target1_distance,
                entry - target2_distance,
            ),
        };

        Eul {
            entry,
            stop,
            target1,
            target2,
            risk_ticks: stop_distance / self.tick_size,
        }
    }
}

/// `true` if `eul` obeys the ordering invariant for `side` (spec §4.9:
/// LONG requires `stop < entry < target1 < target2`, SHORT the mirror).
pub fn ordering_holds(eul: &Eul, side: Side) -> bool {
    match side {
        Side::Long => eul.stop < eul.entry && eul.entry < eul.target1 && eul.target1 < eul.target2,
        Side::Short => eul.target2 < eul.target1 && eul.target1 < eul.entry && eul.entry < eul.stop,
    }
}
