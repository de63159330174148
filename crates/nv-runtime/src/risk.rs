use chrono::{DateTime, NaiveDate, Utc};
use nv_config::RiskConfig;
use nv_schemas::{Action, PriorTradeOutcome, TradingDecision};
use std::time::Duration;

/// Result of a closed trade, reported by the caller once a fill is known
/// (order execution itself is out of scope, spec §1 Non-goals).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOutcome {
    Win,
    StopOut,
}

/// Account-level risk bookkeeping: the `risk` config block (spec §6) was
/// otherwise unconsumed anywhere in the decision path. `cooldown_after_stop_secs`
/// feeds `Snapshot.prior_trade_outcome`, which `nv-execution`'s hard-block
/// chain already checks; the daily/consecutive-loss limits are enforced
/// here as a final override layered on top of that decision, since they are
/// session-level state the per-bar execution rules have no way to see.
pub struct RiskState {
    cooldown: Duration,
    daily_loss_limit: Option<f64>,
    daily_trades_limit: Option<u32>,
    max_consecutive_losses: Option<u32>,
    last_stop_out_at: Option<DateTime<Utc>>,
    consecutive_losses: u32,
    trading_day: Option<NaiveDate>,
    trades_today: u32,
    pnl_today: f64,
}

impl RiskState {
    pub fn new(cfg: &RiskConfig) -> Self {
        Self {
            cooldown: Duration::from_secs(cfg.cooldown_after_stop_secs),
            daily_loss_limit: cfg.daily_loss_limit,
            daily_trades_limit: cfg.daily_trades_limit,
            max_consecutive_losses: cfg.max_consecutive_losses,
            last_stop_out_at: None,
            consecutive_losses: 0,
            trading_day: None,
            trades_today: 0,
            pnl_today: 0.0,
        }
    }

    /// Cooldown state for `Snapshot.prior_trade_outcome`; `None` once no
    /// stop-out has happened yet, or the cooldown has fully elapsed.
    pub fn prior_trade_outcome(&self, now: DateTime<Utc>) -> Option<PriorTradeOutcome> {
        let last = self.last_stop_out_at?;
        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        let remaining = self.cooldown.saturating_sub(elapsed);
        Some(PriorTradeOutcome {
            last_stop_out_at: last,
            cooldown_remaining: remaining,
        })
    }

    fn roll_day(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if self.trading_day != Some(today) {
            self.trading_day = Some(today);
            self.trades_today = 0;
            self.pnl_today = 0.0;
        }
    }

    /// Record a closed trade's outcome. Wins reset the consecutive-loss
    /// counter; stop-outs start the cooldown clock and extend it.
    pub fn record_outcome(&mut self, outcome: TradeOutcome, pnl: f64, now: DateTime<Utc>) {
        self.roll_day(now);
        self.trades_today += 1;
        self.pnl_today += pnl;
        match outcome {
            TradeOutcome::StopOut => {
                self.last_stop_out_at = Some(now);
                self.consecutive_losses += 1;
            }
            TradeOutcome::Win => {
                self.consecutive_losses = 0;
            }
        }
    }

    /// Override an otherwise-trade-eligible decision to `NO_TRADE` if a
    /// session-level limit has tripped. Applied after `DecisionEngine::decide`
    /// rather than inside it -- these limits are account state, not a
    /// function of the current bar.
    pub fn enforce(&mut self, decision: &mut TradingDecision, now: DateTime<Utc>) {
        self.roll_day(now);
        if decision.action == Action::NoTrade {
            return;
        }
        let reason = if self.daily_trades_limit.is_some_and(|limit| self.trades_today >= limit) {
            Some("daily_trades_limit_reached")
        } else if self.daily_loss_limit.is_some_and(|limit| self.pnl_today <= -limit.abs()) {
            Some("daily_loss_limit_reached")
        } else if self.max_consecutive_losses.is_some_and(|max| self.consecutive_losses >= max) {
            Some("max_consecutive_losses_reached")
        } else {
            None
        };

        if let Some(reason) = reason {
            decision.action = Action::NoTrade;
            decision.quality = None;
            decision.size_multiplier = 0.0;
            decision.level = None;
            decision.eul = None;
            decision.rationale.clear();
            decision.blocked_by = vec![reason.to_string()];
        }
    }
}
