use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// Tracks the inputs to `Snapshot::price` (spec §3: "mid of last quote, or
/// last trade if no quote within 500ms").
#[derive(Debug, Clone, Default)]
pub struct PriceTracker {
    last_quote_mid: Option<(f64, DateTime<Utc>)>,
    last_trade: Option<(f64, DateTime<Utc>)>,
}

impl PriceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_quote(&mut self, bid: f64, ask: f64, ts: DateTime<Utc>) {
        self.last_quote_mid = Some(((bid + ask) / 2.0, ts));
    }

    pub fn record_trade(&mut self, price: f64, ts: DateTime<Utc>) {
        self.last_trade = Some((price, ts));
    }

    /// Resolve the current reference price as of `now`.
    pub fn current_price(&self, now: DateTime<Utc>) -> Option<f64> {
        match self.last_quote_mid {
            Some((mid, ts)) if now - ts <= ChronoDuration::milliseconds(500) => Some(mid),
            _ => self.last_trade.map(|(px, _)| px).or(self.last_quote_mid.map(|(mid, _)| mid)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_fresh_quote_mid() {
        let mut t = PriceTracker::new();
        let now = Utc::now();
        t.record_quote(100.0, 102.0, now);
        t.record_trade(99.0, now - ChronoDuration::seconds(1));
        assert_eq!(t.current_price(now), Some(101.0));
    }

    #[test]
    fn falls_back_to_trade_when_quote_stale() {
        let mut t = PriceTracker::new();
        let now = Utc::now();
        t.record_quote(100.0, 102.0, now - ChronoDuration::seconds(2));
        t.record_trade(103.5, now - ChronoDuration::milliseconds(100));
        assert_eq!(t.current_price(now), Some(103.5));
    }

    #[test]
    fn falls_back_to_stale_quote_when_no_trade_exists() {
        let mut t = PriceTracker::new();
        let now = Utc::now();
        t.record_quote(100.0, 102.0, now - ChronoDuration::seconds(5));
        assert_eq!(t.current_price(now), Some(101.0));
    }
}
