use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use scalp_core::config::GovernorConfig;
use serde::Serialize;

use crate::error::GovernorError;

/// What armed the kill switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HaltReason {
    DailyLossFloor,
    DailyTradeCap,
    DailyProfitTarget,
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DailyLossFloor => write!(f, "daily loss floor breached"),
            Self::DailyTradeCap => write!(f, "daily trade cap reached"),
            Self::DailyProfitTarget => write!(f, "daily profit target reached"),
        }
    }
}

/// Why an entry was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    KillSwitch(HaltReason),
    TradeCapReached { max: u32 },
    CoolingDown { until: DateTime<Utc> },
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KillSwitch(reason) => write!(f, "kill switch active: {reason}"),
            Self::TradeCapReached { max } => write!(f, "daily trade cap of {max} reached"),
            Self::CoolingDown { until } => write!(f, "cooling down after losses until {until}"),
        }
    }
}

/// Outcome of the pre-entry gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDecision {
    Allowed,
    Blocked(BlockReason),
}

impl EntryDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Point-in-time view of the day's risk state, for logging and reporting.
#[derive(Debug, Clone, Serialize)]
pub struct RiskMetrics {
    pub realized_pnl_today: Decimal,
    pub trades_opened_today: u32,
    pub consecutive_losses: u32,
    pub kill_switch: Option<HaltReason>,
    pub cooling_down: bool,
}

/// Session-scoped capital preservation.
///
/// The kill switch is sticky: once armed it stays armed until the next
/// session reset, no matter how well later trades go. The consecutive-loss
/// cooldown is the soft gate; it expires on its own or can be cleared
/// manually, and never arms the kill switch.
#[derive(Debug, Clone)]
pub struct DailyRiskGovernor {
    config: GovernorConfig,
    realized_pnl_today: Decimal,
    trades_opened_today: u32,
    consecutive_losses: u32,
    kill_switch: Option<HaltReason>,
    cooldown_until: Option<DateTime<Utc>>,
}

impl DailyRiskGovernor {
    /// # Errors
    ///
    /// [`GovernorError::InvalidConfig`] when a cap or floor is non-positive.
    pub fn new(config: GovernorConfig) -> Result<Self, GovernorError> {
        if config.daily_loss_floor <= Decimal::ZERO {
            return Err(GovernorError::InvalidConfig(
                "daily_loss_floor must be a positive magnitude".to_string(),
            ));
        }
        if config.max_trades_per_day == 0 {
            return Err(GovernorError::InvalidConfig(
                "max_trades_per_day must be at least 1".to_string(),
            ));
        }
        if config.consecutive_loss_limit == 0 {
            return Err(GovernorError::InvalidConfig(
                "consecutive_loss_limit must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            config,
            realized_pnl_today: Decimal::ZERO,
            trades_opened_today: 0,
            consecutive_losses: 0,
            kill_switch: None,
            cooldown_until: None,
        })
    }

    /// Pre-entry gate, consulted before any sizing or signal work.
    #[must_use]
    pub fn can_open_trade(&self, now: DateTime<Utc>) -> EntryDecision {
        if let Some(reason) = self.kill_switch {
            return EntryDecision::Blocked(BlockReason::KillSwitch(reason));
        }
        if self.trades_opened_today >= self.config.max_trades_per_day {
            return EntryDecision::Blocked(BlockReason::TradeCapReached {
                max: self.config.max_trades_per_day,
            });
        }
        if let Some(until) = self.cooldown_until {
            if now < until {
                return EntryDecision::Blocked(BlockReason::CoolingDown { until });
            }
        }
        EntryDecision::Allowed
    }

    /// Counts an opened trade; reaching the daily cap arms the kill switch.
    pub fn record_open(&mut self) {
        self.trades_opened_today += 1;
        if self.trades_opened_today >= self.config.max_trades_per_day {
            self.arm_kill_switch(HaltReason::DailyTradeCap);
        }
    }

    /// Folds a realized result into the day's state.
    pub fn record_close(&mut self, realized_pnl: Decimal, now: DateTime<Utc>) {
        self.realized_pnl_today += realized_pnl;

        if realized_pnl < Decimal::ZERO {
            self.consecutive_losses += 1;
            if self.consecutive_losses >= self.config.consecutive_loss_limit {
                let until = now + Duration::seconds(self.config.cooldown_secs as i64);
                self.cooldown_until = Some(until);
                tracing::warn!(
                    losses = self.consecutive_losses,
                    %until,
                    "consecutive-loss cooldown started"
                );
            }
        } else {
            self.consecutive_losses = 0;
        }

        if self.realized_pnl_today <= -self.config.daily_loss_floor {
            self.arm_kill_switch(HaltReason::DailyLossFloor);
        }
        if let Some(target) = self.config.daily_profit_target {
            if self.realized_pnl_today >= target {
                self.arm_kill_switch(HaltReason::DailyProfitTarget);
            }
        }

        tracing::info!(
            trade_pnl = %realized_pnl,
            daily_pnl = %self.realized_pnl_today,
            consecutive_losses = self.consecutive_losses,
            "close recorded"
        );
    }

    fn arm_kill_switch(&mut self, reason: HaltReason) {
        if self.kill_switch.is_none() {
            self.kill_switch = Some(reason);
            tracing::warn!(%reason, "kill switch armed for the rest of the session");
        }
    }

    /// Manual override for the soft cooldown gate only.
    pub fn clear_cooldown(&mut self) {
        if self.cooldown_until.take().is_some() {
            tracing::info!("cooldown cleared manually");
        }
    }

    /// Fresh state for the next trading session.
    pub fn reset_session(&mut self) {
        self.realized_pnl_today = Decimal::ZERO;
        self.trades_opened_today = 0;
        self.consecutive_losses = 0;
        self.kill_switch = None;
        self.cooldown_until = None;
        tracing::info!("daily risk state reset");
    }

    #[must_use]
    pub fn kill_switch_active(&self) -> bool {
        self.kill_switch.is_some()
    }

    #[must_use]
    pub fn metrics(&self) -> RiskMetrics {
        RiskMetrics {
            realized_pnl_today: self.realized_pnl_today,
            trades_opened_today: self.trades_opened_today,
            consecutive_losses: self.consecutive_losses,
            kill_switch: self.kill_switch,
            cooling_down: self.cooldown_until.is_some(),
        }
    }
}
