//! The prioritized exit trigger chain.
//!
//! Capital-protection truncation (time backstop, hard stop-loss) must
//! dominate opportunistic profit-taking, which in turn dominates the softer
//! Greek-quality signals, since otherwise a slowly-decaying soft signal could
//! delay a mandatory exit near expiry. Evaluation is an early-exit walk over
//! an ordered slice of pure predicates; lower-priority triggers are never
//! consulted once one fires.

use rust_decimal::Decimal;
use scalp_core::config::ExitConfig;
use scalp_core::events::ExitReason;
use scalp_expiry::ExpiryPolicy;

use crate::trade::Trade;

pub struct TriggerContext<'a> {
    pub trade: &'a Trade,
    pub config: &'a ExitConfig,
    pub policy: Option<&'a ExpiryPolicy>,
}

type Trigger = fn(&TriggerContext) -> Option<ExitReason>;

const TRIGGERS: &[Trigger] = &[
    max_hold_exceeded,
    min_hold_target,
    hard_stop_loss,
    profit_target,
    delta_weakness,
    gamma_rollover,
    theta_damage,
    iv_crush,
    oi_price_mismatch,
];

/// Walks the chain in priority order, returning the first firing reason.
#[must_use]
pub fn evaluate(ctx: &TriggerContext) -> Option<ExitReason> {
    TRIGGERS.iter().find_map(|trigger| trigger(ctx))
}

/// 1. Max hold exceeded: exit regardless of P&L. The hard backstop.
fn max_hold_exceeded(ctx: &TriggerContext) -> Option<ExitReason> {
    let policy = ctx.policy?;
    if ctx.trade.time_in_trade_secs > i64::from(policy.max_hold_secs) {
        return Some(if ctx.trade.unrealized_pnl > Decimal::ZERO {
            ExitReason::TimeForcedProfit
        } else {
            ExitReason::TimeForcedLoss
        });
    }
    None
}

/// 2. Min hold elapsed, in profit, and the early target is reached.
fn min_hold_target(ctx: &TriggerContext) -> Option<ExitReason> {
    let policy = ctx.policy?;
    if ctx.trade.time_in_trade_secs > i64::from(policy.min_hold_secs)
        && ctx.trade.unrealized_pnl > Decimal::ZERO
        && ctx.trade.pnl_percent() >= ctx.config.profit_target_pct
    {
        return Some(ExitReason::TimeBasedTarget);
    }
    None
}

/// 3. Hard stop-loss against the policy's (or configured default) percent.
fn hard_stop_loss(ctx: &TriggerContext) -> Option<ExitReason> {
    let stop_pct = ctx
        .policy
        .map_or(ctx.config.hard_stop_loss_pct, |p| p.hard_stop_loss_pct);
    if ctx.trade.pnl_percent() <= -stop_pct {
        return Some(ExitReason::HardStopLoss);
    }
    None
}

/// 4. Profit target.
fn profit_target(ctx: &TriggerContext) -> Option<ExitReason> {
    if ctx.trade.pnl_percent() >= ctx.config.profit_target_pct {
        return Some(ExitReason::TargetHit);
    }
    None
}

/// 5. |delta| degraded past the threshold: directional conviction is gone.
fn delta_weakness(ctx: &TriggerContext) -> Option<ExitReason> {
    let entry_delta = ctx.trade.entry_greeks.delta.abs();
    if entry_delta < f64::EPSILON {
        return None;
    }
    let degradation = ctx.trade.current_greeks.delta.abs() / entry_delta;
    if degradation < 1.0 - ctx.config.delta_weakness_pct / 100.0 {
        return Some(ExitReason::DeltaWeakness);
    }
    None
}

/// 6. Gamma crossed from rising to falling.
fn gamma_rollover(ctx: &TriggerContext) -> Option<ExitReason> {
    let sensitivity = ctx.policy.map_or(1.0, |p| p.gamma_exit_sensitivity);
    if ctx
        .trade
        .gamma_detector
        .rolled_over(ctx.config.gamma_drop_pct, sensitivity)
    {
        return Some(ExitReason::GammaRollover);
    }
    None
}

/// 7. Theta has decayed by more than the absolute threshold since entry.
fn theta_damage(ctx: &TriggerContext) -> Option<ExitReason> {
    let decay = ctx.trade.entry_greeks.theta - ctx.trade.current_greeks.theta;
    if decay > ctx.config.theta_damage_threshold {
        return Some(ExitReason::ThetaDamage);
    }
    None
}

/// 8. IV collapsed since entry while the premium went nowhere.
fn iv_crush(ctx: &TriggerContext) -> Option<ExitReason> {
    let entry_iv = ctx.trade.entry_greeks.implied_volatility;
    if entry_iv < f64::EPSILON {
        return None;
    }
    let change_pct =
        (ctx.trade.current_greeks.implied_volatility - entry_iv) / entry_iv * 100.0;
    let price_move = (ctx.trade.current_price - ctx.trade.entry_price).abs();
    if change_pct <= -ctx.config.iv_crush_pct && price_move < ctx.config.flat_price_threshold {
        return Some(ExitReason::IvCrush);
    }
    None
}

/// 9. OI built up sharply since the previous tick while price stayed flat:
/// the classic trap footprint.
fn oi_price_mismatch(ctx: &TriggerContext) -> Option<ExitReason> {
    let oi_change = ctx.trade.current_open_interest - ctx.trade.prev_open_interest;
    let price_move = (ctx.trade.current_price - ctx.trade.prev_price).abs();
    if oi_change > ctx.config.oi_surge_threshold && price_move < ctx.config.flat_price_threshold {
        return Some(ExitReason::OiPriceMismatch);
    }
    None
}
