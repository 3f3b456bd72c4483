use rust_decimal::Decimal;
use scalp_core::config::ExitConfig;
use scalp_core::events::{ClosedTrade, ExitReason, Fill, Greeks, OptionSnapshot, PositionSide};
use scalp_expiry::ExpiryPolicy;
use serde::Serialize;

use crate::error::TradeError;
use crate::trade::{Trade, TradeStatus};
use crate::triggers::{self, TriggerContext};

/// Aggregate results over the session's closed trades.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate_pct: f64,
    pub total_pnl: Decimal,
    pub avg_pnl: Decimal,
    pub total_costs: Decimal,
}

/// Owns every trade for its open lifetime.
///
/// Trades move `Open -> Closed` exactly once; a closed trade is only ever
/// seen again as a read-only [`ClosedTrade`] snapshot. Single-threaded by
/// design; the orchestrator feeds one tick at a time.
pub struct TradeManager {
    max_concurrent: usize,
    exit_config: ExitConfig,
    active: Vec<Trade>,
    closed: Vec<ClosedTrade>,
    trade_counter: u32,
}

impl TradeManager {
    #[must_use]
    pub fn new(max_concurrent: usize, exit_config: ExitConfig) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            exit_config,
            active: Vec::new(),
            closed: Vec::new(),
            trade_counter: 0,
        }
    }

    /// Opens a trade from a broker fill (price/quantity ground truth).
    ///
    /// # Errors
    ///
    /// [`TradeError::ConcurrentPositionLimit`] at capacity,
    /// [`TradeError::PositionAlreadyOpen`] when the symbol already has an
    /// open position (no averaging in).
    pub fn open(
        &mut self,
        symbol: &str,
        side: PositionSide,
        fill: &Fill,
        entry_greeks: Greeks,
        open_interest: i64,
    ) -> Result<String, TradeError> {
        if self.active.len() >= self.max_concurrent {
            return Err(TradeError::ConcurrentPositionLimit {
                max: self.max_concurrent,
            });
        }
        if self.active.iter().any(|t| t.symbol == symbol) {
            return Err(TradeError::PositionAlreadyOpen {
                symbol: symbol.to_string(),
            });
        }

        self.trade_counter += 1;
        let id = format!(
            "{}_{:03}",
            fill.timestamp.format("%Y%m%d_%H%M%S"),
            self.trade_counter
        );

        let trade = Trade::open(
            id.clone(),
            symbol.to_string(),
            side,
            fill,
            entry_greeks,
            open_interest,
            self.exit_config.gamma_window,
        );

        tracing::info!(
            id = %trade.id,
            symbol,
            ?side,
            entry_price = %trade.entry_price,
            quantity = trade.quantity,
            "trade opened"
        );
        self.active.push(trade);

        Ok(id)
    }

    /// Folds a snapshot into the trade and evaluates the exit chain.
    ///
    /// Returns the first firing exit reason, if any. The caller must act on
    /// a returned reason before feeding this trade another tick.
    pub fn update(
        &mut self,
        id: &str,
        snapshot: &OptionSnapshot,
        policy: Option<&ExpiryPolicy>,
    ) -> Result<Option<ExitReason>, TradeError> {
        let Some(trade) = self.active.iter_mut().find(|t| t.id == id) else {
            return Err(self.missing(id));
        };

        trade.apply_snapshot(snapshot);

        let reason = triggers::evaluate(&TriggerContext {
            trade,
            config: &self.exit_config,
            policy,
        });

        if let Some(reason) = reason {
            tracing::info!(
                id = %trade.id,
                %reason,
                pnl = %trade.unrealized_pnl,
                pnl_pct = %trade.pnl_percent(),
                held_secs = trade.time_in_trade_secs,
                "exit trigger fired"
            );
        }

        Ok(reason)
    }

    /// Transitions the trade to its terminal state and returns the journal
    /// snapshot.
    ///
    /// # Errors
    ///
    /// [`TradeError::AlreadyClosed`] on a repeated close.
    pub fn close(
        &mut self,
        id: &str,
        exit_fill: &Fill,
        reason: ExitReason,
    ) -> Result<ClosedTrade, TradeError> {
        let Some(index) = self.active.iter().position(|t| t.id == id) else {
            return Err(self.missing(id));
        };

        let mut trade = self.active.swap_remove(index);
        trade.status = TradeStatus::Closed;
        let closed = trade.into_closed(exit_fill, reason);

        tracing::info!(
            id = %closed.id,
            reason = %closed.exit_reason,
            realized_pnl = %closed.realized_pnl,
            pnl_pct = %closed.pnl_percent,
            duration_secs = closed.duration_secs,
            "trade closed"
        );

        self.closed.push(closed.clone());
        Ok(closed)
    }

    fn missing(&self, id: &str) -> TradeError {
        if self.closed.iter().any(|t| t.id == id) {
            TradeError::AlreadyClosed { id: id.to_string() }
        } else {
            TradeError::UnknownTrade { id: id.to_string() }
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Trade> {
        self.active.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn active_trades(&self) -> &[Trade] {
        &self.active
    }

    #[must_use]
    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed
    }

    #[must_use]
    pub fn has_open_position(&self) -> bool {
        !self.active.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let total = self.closed.len();
        if total == 0 {
            return SessionStats::default();
        }

        let wins = self
            .closed
            .iter()
            .filter(|t| t.realized_pnl > Decimal::ZERO)
            .count();
        let losses = self
            .closed
            .iter()
            .filter(|t| t.realized_pnl < Decimal::ZERO)
            .count();
        let total_pnl: Decimal = self.closed.iter().map(|t| t.realized_pnl).sum();
        let total_costs: Decimal = self.closed.iter().map(|t| t.costs).sum();
        let avg_pnl = total_pnl / Decimal::from(total as u64);

        SessionStats {
            total,
            wins,
            losses,
            win_rate_pct: wins as f64 / total as f64 * 100.0,
            total_pnl,
            avg_pnl: avg_pnl.round_dp(2),
            total_costs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use scalp_core::events::OrderSide;
    use scalp_expiry::derive_policy;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 10, 10, 0, 0).unwrap()
    }

    fn greeks() -> Greeks {
        Greeks {
            delta: 0.55,
            gamma: 0.015,
            theta: -0.05,
            vega: 0.12,
            implied_volatility: 30.0,
        }
    }

    fn fill(price: Decimal, quantity: u32, at: DateTime<Utc>) -> Fill {
        Fill {
            order_id: "ord-1".to_string(),
            symbol: "NIFTY24600CE".to_string(),
            side: OrderSide::Buy,
            quantity,
            price,
            commission: Decimal::ZERO,
            timestamp: at,
        }
    }

    fn snapshot(price: Decimal, greeks: Greeks, oi: i64, at: DateTime<Utc>) -> OptionSnapshot {
        OptionSnapshot {
            symbol: "NIFTY24600CE".to_string(),
            timestamp: at,
            price,
            greeks,
            open_interest: oi,
        }
    }

    /// Expiry-day policy: hold window [20, 300], 3% stop. The 7% target
    /// comes from the default `ExitConfig`.
    fn scalp_policy() -> ExpiryPolicy {
        derive_policy(0)
    }

    fn manager() -> TradeManager {
        TradeManager::new(1, ExitConfig::default())
    }

    fn open_at_150(manager: &mut TradeManager) -> String {
        manager
            .open(
                "NIFTY24600CE",
                PositionSide::Long,
                &fill(dec!(150), 30, t0()),
                greeks(),
                50_000,
            )
            .unwrap()
    }

    #[test]
    fn second_open_hits_concurrent_limit() {
        let mut manager = manager();
        open_at_150(&mut manager);
        let err = manager
            .open(
                "NIFTY24500PE",
                PositionSide::Long,
                &fill(dec!(90), 75, t0()),
                greeks(),
                10_000,
            )
            .unwrap_err();
        assert_eq!(err, TradeError::ConcurrentPositionLimit { max: 1 });
    }

    #[test]
    fn averaging_into_an_open_symbol_is_rejected() {
        let mut manager = TradeManager::new(2, ExitConfig::default());
        open_at_150(&mut manager);
        let err = manager
            .open(
                "NIFTY24600CE",
                PositionSide::Long,
                &fill(dec!(151), 30, t0()),
                greeks(),
                50_000,
            )
            .unwrap_err();
        assert!(matches!(err, TradeError::PositionAlreadyOpen { .. }));
    }

    #[test]
    fn update_recomputes_pnl_and_duration() {
        let mut manager = manager();
        let id = open_at_150(&mut manager);

        let at = t0() + Duration::seconds(45);
        let reason = manager
            .update(&id, &snapshot(dec!(152), greeks(), 50_000, at), None)
            .unwrap();
        assert!(reason.is_none());

        let trade = manager.get(&id).unwrap();
        assert_eq!(trade.unrealized_pnl, dec!(60));
        assert_eq!(trade.time_in_trade_secs, 45);
        assert_eq!(trade.prev_price, dec!(150));
    }

    #[test]
    fn max_hold_forces_exit_even_when_target_is_also_hit() {
        let mut manager = manager();
        let id = open_at_150(&mut manager);

        // +7.3% AND past max hold: the forced time exit must win.
        let at = t0() + Duration::seconds(301);
        let reason = manager
            .update(
                &id,
                &snapshot(dec!(161), greeks(), 50_000, at),
                Some(&scalp_policy()),
            )
            .unwrap();
        assert_eq!(reason, Some(ExitReason::TimeForcedProfit));
    }

    #[test]
    fn max_hold_at_a_loss_is_a_forced_loss_exit() {
        let mut manager = manager();
        let id = open_at_150(&mut manager);

        let at = t0() + Duration::seconds(301);
        let reason = manager
            .update(
                &id,
                &snapshot(dec!(149), greeks(), 50_000, at),
                Some(&scalp_policy()),
            )
            .unwrap();
        assert_eq!(reason, Some(ExitReason::TimeForcedLoss));
    }

    #[test]
    fn early_target_fires_after_min_hold() {
        let mut manager = manager();
        let id = open_at_150(&mut manager);

        // In profit but below target, inside min hold: stay in the trade.
        let at = t0() + Duration::seconds(15);
        let reason = manager
            .update(
                &id,
                &snapshot(dec!(155), greeks(), 50_000, at),
                Some(&scalp_policy()),
            )
            .unwrap();
        assert!(reason.is_none());

        // t=120s, +7.3%: opportunistic time-based target.
        let at = t0() + Duration::seconds(120);
        let reason = manager
            .update(
                &id,
                &snapshot(dec!(161), greeks(), 50_000, at),
                Some(&scalp_policy()),
            )
            .unwrap();
        assert_eq!(reason, Some(ExitReason::TimeBasedTarget));
    }

    #[test]
    fn hard_stop_uses_policy_percent() {
        let mut manager = manager();
        let id = open_at_150(&mut manager);

        // -3.3% breaches the expiry-day 3% stop.
        let at = t0() + Duration::seconds(60);
        let reason = manager
            .update(
                &id,
                &snapshot(dec!(145), greeks(), 50_000, at),
                Some(&scalp_policy()),
            )
            .unwrap();
        assert_eq!(reason, Some(ExitReason::HardStopLoss));
    }

    #[test]
    fn hard_stop_falls_back_to_config_default_without_policy() {
        let mut manager = manager();
        let id = open_at_150(&mut manager);

        // -7.33% breaches the default 7% stop.
        let at = t0() + Duration::seconds(60);
        let reason = manager
            .update(&id, &snapshot(dec!(139), greeks(), 50_000, at), None)
            .unwrap();
        assert_eq!(reason, Some(ExitReason::HardStopLoss));
    }

    #[test]
    fn target_hit_without_policy() {
        let mut manager = manager();
        let id = open_at_150(&mut manager);

        let at = t0() + Duration::seconds(60);
        let reason = manager
            .update(&id, &snapshot(dec!(161), greeks(), 50_000, at), None)
            .unwrap();
        assert_eq!(reason, Some(ExitReason::TargetHit));
    }

    #[test]
    fn delta_weakness_exits_when_conviction_erodes() {
        let mut manager = manager();
        let id = open_at_150(&mut manager);

        // |delta| down 20% from entry, price barely moved.
        let weak = Greeks {
            delta: 0.44,
            ..greeks()
        };
        let at = t0() + Duration::seconds(60);
        let reason = manager
            .update(&id, &snapshot(dec!(150.2), weak, 50_000, at), None)
            .unwrap();
        assert_eq!(reason, Some(ExitReason::DeltaWeakness));
    }

    #[test]
    fn gamma_rollover_exits_after_peak() {
        let mut exit_config = ExitConfig::default();
        exit_config.gamma_window = 3;
        let mut manager = TradeManager::new(1, exit_config);
        let id = open_at_150(&mut manager);

        let path = [0.018, 0.022, 0.010, 0.006];
        let mut fired = None;
        for (i, gamma) in path.iter().enumerate() {
            let at = t0() + Duration::seconds(30 * (i as i64 + 1));
            let greeks = Greeks {
                gamma: *gamma,
                ..greeks()
            };
            fired = manager
                .update(&id, &snapshot(dec!(150), greeks, 50_000, at), None)
                .unwrap();
            if fired.is_some() {
                break;
            }
        }
        assert_eq!(fired, Some(ExitReason::GammaRollover));
    }

    #[test]
    fn theta_damage_exits_on_decay_past_threshold() {
        let mut manager = manager();
        let id = open_at_150(&mut manager);

        let decayed = Greeks {
            theta: -0.12,
            ..greeks()
        };
        let at = t0() + Duration::seconds(60);
        let reason = manager
            .update(&id, &snapshot(dec!(150), decayed, 50_000, at), None)
            .unwrap();
        assert_eq!(reason, Some(ExitReason::ThetaDamage));
    }

    #[test]
    fn iv_crush_requires_a_stalled_price() {
        let mut manager = manager();
        let id = open_at_150(&mut manager);

        let crushed = Greeks {
            implied_volatility: 28.0,
            ..greeks()
        };

        // IV -6.7% but price moved: not a crush exit.
        let at = t0() + Duration::seconds(30);
        let reason = manager
            .update(&id, &snapshot(dec!(153), crushed, 50_000, at), None)
            .unwrap();
        assert!(reason.is_none());

        // IV -6.7% with price pinned near entry: crush.
        let at = t0() + Duration::seconds(60);
        let reason = manager
            .update(&id, &snapshot(dec!(150.1), crushed, 50_000, at), None)
            .unwrap();
        assert_eq!(reason, Some(ExitReason::IvCrush));
    }

    #[test]
    fn oi_surge_with_flat_price_is_a_trap_exit() {
        let mut manager = manager();
        let id = open_at_150(&mut manager);

        let at = t0() + Duration::seconds(30);
        let reason = manager
            .update(&id, &snapshot(dec!(150.1), greeks(), 50_500, at), None)
            .unwrap();
        assert_eq!(reason, Some(ExitReason::OiPriceMismatch));
    }

    #[test]
    fn close_realizes_pnl_and_is_terminal() {
        let mut manager = manager();
        let id = open_at_150(&mut manager);

        let at = t0() + Duration::seconds(120);
        manager
            .update(
                &id,
                &snapshot(dec!(161), greeks(), 50_000, at),
                Some(&scalp_policy()),
            )
            .unwrap();

        let exit_fill = Fill {
            side: OrderSide::Sell,
            ..fill(dec!(161), 30, at)
        };
        let closed = manager
            .close(&id, &exit_fill, ExitReason::TimeBasedTarget)
            .unwrap();
        assert_eq!(closed.realized_pnl, dec!(330));
        assert_eq!(closed.duration_secs, 120);
        assert_eq!(closed.exit_reason, ExitReason::TimeBasedTarget);
        assert!(!manager.has_open_position());

        // Second close and further updates both surface the terminal state.
        let err = manager
            .close(&id, &exit_fill, ExitReason::TimeBasedTarget)
            .unwrap_err();
        assert_eq!(err, TradeError::AlreadyClosed { id: id.clone() });
        let err = manager
            .update(&id, &snapshot(dec!(161), greeks(), 50_000, at), None)
            .unwrap_err();
        assert_eq!(err, TradeError::AlreadyClosed { id });
    }

    #[test]
    fn unknown_trade_is_distinguished_from_closed() {
        let mut manager = manager();
        let err = manager
            .update(
                "nope",
                &snapshot(dec!(150), greeks(), 50_000, t0()),
                None,
            )
            .unwrap_err();
        assert_eq!(
            err,
            TradeError::UnknownTrade {
                id: "nope".to_string()
            }
        );
    }

    #[test]
    fn short_side_profits_from_falling_premium() {
        let mut manager = manager();
        let id = manager
            .open(
                "NIFTY24600CE",
                PositionSide::Short,
                &fill(dec!(150), 30, t0()),
                greeks(),
                50_000,
            )
            .unwrap();

        let at = t0() + Duration::seconds(30);
        manager
            .update(&id, &snapshot(dec!(145), greeks(), 50_000, at), None)
            .unwrap();
        assert_eq!(manager.get(&id).unwrap().unrealized_pnl, dec!(150));
    }

    #[test]
    fn stats_aggregate_closed_trades() {
        let mut manager = TradeManager::new(2, ExitConfig::default());

        let win_id = manager
            .open(
                "NIFTY24600CE",
                PositionSide::Long,
                &fill(dec!(150), 30, t0()),
                greeks(),
                50_000,
            )
            .unwrap();
        let loss_id = manager
            .open(
                "NIFTY24500PE",
                PositionSide::Long,
                &fill(dec!(100), 75, t0()),
                greeks(),
                20_000,
            )
            .unwrap();

        let at = t0() + Duration::seconds(90);
        manager
            .close(
                &win_id,
                &Fill {
                    side: OrderSide::Sell,
                    ..fill(dec!(161), 30, at)
                },
                ExitReason::TargetHit,
            )
            .unwrap();
        manager
            .close(
                &loss_id,
                &Fill {
                    side: OrderSide::Sell,
                    symbol: "NIFTY24500PE".to_string(),
                    ..fill(dec!(96), 75, at)
                },
                ExitReason::HardStopLoss,
            )
            .unwrap();

        let stats = manager.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 1);
        assert!((stats.win_rate_pct - 50.0).abs() < f64::EPSILON);
        assert_eq!(stats.total_pnl, dec!(30)); // +330 - 300
    }
}
