use nv_config::TolerancesConfig;
use nv_schemas::{LevelClass, LevelEntry, Side, Snapshot};

/// The MenthorQ level a decision anchored on, with its distance at the time
/// of the read.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelAnchor {
    pub name: String,
    pub class: LevelClass,
    pub price: f64,
    pub distance_ticks: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenthorQDistanceOutput {
    /// In `[-1, +1]`; sign is the directional bias, magnitude is strength.
    pub score: f64,
    pub side: Option<Side>,
    pub anchor: Option<LevelAnchor>,
    pub rationale: Vec<String>,
}

impl MenthorQDistanceOutput {
    fn flat() -> Self {
        Self {
            score: 0.0,
            side: None,
            anchor: None,
            rationale: vec!["no level within tolerance".to_string()],
        }
    }
}

/// Priority order when multiple non-expired levels are within tolerance
/// (spec §4.6 step 3: "gamma_wall_0dte > call/put_support_0dte >
/// call/put_wall > gex_1..3 > hvl > swing").
const PRIORITY: [LevelClass; 9] = [
    LevelClass::GammaWall0dte,
    LevelClass::CallSupport0dte,
    LevelClass::PutSupport0dte,
    LevelClass::CallResistance,
    LevelClass::PutSupport,
    LevelClass::Gex,
    LevelClass::Hvl,
    LevelClass::BlindSpot,
    LevelClass::Swing,
];

/// Side bias from level naming (spec §4.6 step 4): call/resistance levels
/// are a ceiling (SHORT bias), put/support levels are a floor (LONG bias).
/// `None` for classes the name rule doesn't cover -- caller falls back to
/// price position.
pub fn side_for_class(class: LevelClass) -> Option<Side> {
    match class {
        LevelClass::CallResistance => Some(Side::Short),
        LevelClass::PutSupport | LevelClass::CallSupport0dte | LevelClass::PutSupport0dte => Some(Side::Long),
        LevelClass::GammaWall0dte | LevelClass::Hvl | LevelClass::Gex | LevelClass::BlindSpot | LevelClass::Swing => {
            None
        }
    }
}

fn class_weight(class: LevelClass) -> f64 {
    match class {
        LevelClass::GammaWall0dte => 1.0,
        LevelClass::CallSupport0dte | LevelClass::PutSupport0dte => 0.9,
        LevelClass::CallResistance | LevelClass::PutSupport => 0.8,
        LevelClass::Hvl => 0.7,
        LevelClass::Gex => 0.6,
        LevelClass::BlindSpot => 0.5,
        LevelClass::Swing => 0.4,
    }
}

/// Scores proximity to the nearest in-tolerance MenthorQ level as a
/// mean-reversion signal: a level acts as a magnet/pivot, so price sitting
/// just below it biases long (toward the level) and just above biases
/// short, scaled by how deep inside the tolerance band the price sits.
pub struct MenthorQDistanceAnalyzer {
    tolerances: TolerancesConfig,
}

impl MenthorQDistanceAnalyzer {
    pub fn new(tolerances: TolerancesConfig) -> Self {
        Self { tolerances }
    }

    fn tolerance_ticks(&self, class: LevelClass) -> f64 {
        match class {
            LevelClass::GammaWall0dte => self.tolerances.gamma_wall,
            LevelClass::Hvl => self.tolerances.hvl,
            LevelClass::Gex => self.tolerances.gex,
            LevelClass::BlindSpot => self.tolerances.blind_spots,
            LevelClass::Swing => self.tolerances.swing,
            LevelClass::CallSupport0dte
            | LevelClass::PutSupport0dte
            | LevelClass::CallResistance
            | LevelClass::PutSupport => self.tolerances.gamma_wall,
        }
    }

    pub fn analyze(&self, snapshot: &Snapshot, tick_size: f64) -> MenthorQDistanceOutput {
        if tick_size <= 0.0 {
            return MenthorQDistanceOutput::flat();
        }

        let mut best: Option<(usize, &LevelEntry, f64)> = None;
        for entry in snapshot.level_set.non_expired() {
            let tol = self.tolerance_ticks(entry.class);
            if tol <= 0.0 {
                continue;
            }
            let distance_ticks = (entry.price - snapshot.price).abs() / tick_size;
            if distance_ticks > tol {
                continue;
            }
            let priority = PRIORITY.iter().position(|&c| c == entry.class).unwrap_or(PRIORITY.len());
            let better = match best {
                None => true,
                Some((best_priority, best_entry, best_dist)) => {
                    priority < best_priority
                        || (priority == best_priority && distance_ticks < best_dist)
                        || (priority == best_priority
                            && (distance_ticks - best_dist).abs() < 1e-9
                            && entry.price < best_entry.price)
                }
            };
            if better {
                best = Some((priority, entry, distance_ticks));
            }
        }

        let Some((_, entry, distance_ticks)) = best else {
            return MenthorQDistanceOutput::flat();
        };

        let tol = self.tolerance_ticks(entry.class);
        let proximity = (1.0 - distance_ticks / tol).clamp(0.0, 1.0);
        let side = side_for_class(entry.class)
            .unwrap_or_else(|| if snapshot.price <= entry.price { Side::Long } else { Side::Short });
        let score = (class_weight(entry.class) * proximity * side.sign()).clamp(-1.0, 1.0);

        MenthorQDistanceOutput {
            score,
            side: Some(side),
            anchor: Some(LevelAnchor {
                name: entry.name.as_str().to_string(),
                class: entry.class,
                price: entry.price,
                distance_ticks,
            }),
            rationale: vec![format!(
                "within {distance_ticks:.1} ticks of {} ({:.1} tol)",
                entry.name.as_str(),
                tol
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nv_schemas::{LeadershipSnap, LevelName, LevelSet, StalenessClass, VixRegime};

    fn snapshot_with_level(price: f64, name: &str, level_price: f64) -> Snapshot {
        let mut level_set = LevelSet::new("ES");
        let level_name = LevelName::new(name);
        let class = level_name.classify().unwrap();
        level_set.levels.insert(
            name.to_string(),
            LevelEntry {
                name: level_name,
                class,
                price: level_price,
                updated_at: Utc::now(),
                staleness: StalenessClass::Fresh,
            },
        );
        Snapshot {
            now: Utc::now(),
            symbol: "ES".into(),
            price,
            bar_features: Default::default(),
            volume_profile: Default::default(),
            level_set,
            vix_regime: VixRegime::Mid,
            vix_value: 18.0,
            leadership: LeadershipSnap::warmup(Utc::now()),
            correlation_es_nq: 0.8,
            dealers_bias: 0.0,
            prior_trade_outcome: None,
        }
    }

    #[test]
    fn no_nearby_level_yields_flat_score() {
        let analyzer = MenthorQDistanceAnalyzer::new(TolerancesConfig::default());
        let snap = snapshot_with_level(4500.0, "gamma_wall_0dte", 4600.0);
        let out = analyzer.analyze(&snap, 0.25);
        assert_eq!(out.score, 0.0);
        assert!(out.anchor.is_none());
    }

    #[test]
    fn price_below_level_within_tolerance_biases_long() {
        let analyzer = MenthorQDistanceAnalyzer::new(TolerancesConfig::default());
        // 1 tick below gamma_wall_0dte, well inside the 3-tick tolerance.
        let snap = snapshot_with_level(4499.75, "gamma_wall_0dte", 4500.0);
        let out = analyzer.analyze(&snap, 0.25);
        assert_eq!(out.side, Some(Side::Long));
        assert!(out.score > 0.0);
    }

    #[test]
    fn price_above_level_within_tolerance_biases_short() {
        let analyzer = MenthorQDistanceAnalyzer::new(TolerancesConfig::default());
        let snap = snapshot_with_level(4500.25, "gamma_wall_0dte", 4500.0);
        let out = analyzer.analyze(&snap, 0.25);
        assert_eq!(out.side, Some(Side::Short));
        assert!(out.score < 0.0);
    }

    #[test]
    fn higher_priority_class_wins_over_closer_lower_priority_one() {
        let analyzer = MenthorQDistanceAnalyzer::new(TolerancesConfig::default());
        let mut snap = snapshot_with_level(4500.0, "gamma_wall_0dte", 4500.5);
        let swing_name = LevelName::new("swing_1");
        snap.level_set.levels.insert(
            "swing_1".to_string(),
            LevelEntry {
                name: swing_name.clone(),
                class: swing_name.classify().unwrap(),
                price: 4500.1,
                updated_at: Utc::now(),
                staleness: StalenessClass::Fresh,
            },
        );
        let out = analyzer.analyze(&snap, 0.25);
        assert_eq!(out.anchor.unwrap().class, LevelClass::GammaWall0dte);
    }

    #[test]
    fn call_resistance_biases_short_even_just_below_price() {
        // Price sitting just under a call resistance would bias long under
        // pure price-position logic; the name mapping overrides that to short.
        let analyzer = MenthorQDistanceAnalyzer::new(TolerancesConfig::default());
        let snap = snapshot_with_level(4499.75, "call_resistance", 4500.0);
        let out = analyzer.analyze(&snap, 0.25);
        assert_eq!(out.side, Some(Side::Short));
        assert!(out.score < 0.0);
    }

    #[test]
    fn put_support_biases_long_even_just_above_price() {
        let analyzer = MenthorQDistanceAnalyzer::new(TolerancesConfig::default());
        let snap = snapshot_with_level(4500.25, "put_support", 4500.0);
        let out = analyzer.analyze(&snap, 0.25);
        assert_eq!(out.side, Some(Side::Long));
        assert!(out.score > 0.0);
    }
}
