use crate::staleness::StalenessLimits;
use chrono::{DateTime, Utc};
use nv_schemas::{LevelEntry, LevelName, LevelSet, MenthorQLevelsPayload, StalenessClass};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Single-writer-per-symbol, many-reader level cache. Readers get an `Arc`
/// snapshot that never mutates underneath them — a concurrent `upsert`
/// builds a new `LevelSet` and swaps the pointer rather than mutating in
/// place (spec §5: "atomic snapshot reads, copy-on-write" for shared
/// decision-time state).
pub struct LevelStore {
    inner: RwLock<HashMap<String, Arc<LevelSet>>>,
}

impl Default for LevelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Current level set for `symbol`. Never blocks on a writer for more
    /// than the duration of a pointer swap.
    pub fn snapshot(&self, symbol: &str) -> Arc<LevelSet> {
        self.inner
            .read()
            .expect("level store lock poisoned")
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Arc::new(LevelSet::new(symbol)))
    }

    /// Apply a fresh MenthorQ payload: classify and price-sanity-check every
    /// named level, then recompute staleness for the whole set against
    /// `now`. Levels whose name doesn't classify, or whose price falls
    /// outside `[0.5*spot, 2*spot]` (spec §3 "price sanity check"), are
    /// dropped with a warning rather than stored.
    pub fn upsert(
        &self,
        symbol: &str,
        payload: &MenthorQLevelsPayload,
        spot: f64,
        now: DateTime<Utc>,
        limits: &StalenessLimits,
    ) {
        let current = self.snapshot(symbol);
        let mut levels = (*current).clone();
        levels.symbol = symbol.to_string();

        let incoming = payload
            .gamma
            .iter()
            .chain(payload.blind_spots.iter())
            .chain(payload.swing.iter());

        for (name, &price) in incoming {
            let level_name = LevelName::new(name.clone());
            let Some(class) = level_name.classify() else {
                tracing::warn!(symbol, name, "unclassifiable MenthorQ level name, dropping");
                continue;
            };
            if !price_is_sane(price, spot) {
                tracing::warn!(symbol, name, price, spot, "MenthorQ level fails price sanity check, dropping");
                continue;
            }
            levels.levels.insert(
                name.clone(),
                LevelEntry {
                    name: level_name,
                    class,
                    price,
                    updated_at: now,
                    staleness: StalenessClass::Fresh,
                },
            );
        }

        reclassify_staleness(&mut levels, now, limits);
        self.inner
            .write()
            .expect("level store lock poisoned")
            .insert(symbol.to_string(), Arc::new(levels));
    }

    /// Recompute staleness against the clock without any new data (called
    /// on a timer so levels age out even between MenthorQ updates).
    pub fn refresh_staleness(&self, symbol: &str, now: DateTime<Utc>, limits: &StalenessLimits) {
        let current = self.snapshot(symbol);
        let mut levels = (*current).clone();
        reclassify_staleness(&mut levels, now, limits);
        self.inner
            .write()
            .expect("level store lock poisoned")
            .insert(symbol.to_string(), Arc::new(levels));
    }
}

fn price_is_sane(price: f64, spot: f64) -> bool {
    if spot <= 0.0 || price <= 0.0 {
        return false;
    }
    price >= 0.5 * spot && price <= 2.0 * spot
}

fn reclassify_staleness(levels: &mut LevelSet, now: DateTime<Utc>, limits: &StalenessLimits) {
    for entry in levels.levels.values_mut() {
        let age = (now - entry.updated_at)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        let limit = limits.limit_for(entry.class);
        entry.staleness = if age <= limit {
            StalenessClass::Fresh
        } else if age <= limit * 2 {
            StalenessClass::Stale
        } else {
            StalenessClass::Expired
        };
    }
}
