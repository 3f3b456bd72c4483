use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option sensitivity measures delivered with every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub implied_volatility: f64,
}

/// Per-tick market snapshot for a single option contract.
///
/// The data collaborator must hand the engine a snapshot it trusts: stale or
/// Greek-less ticks are skipped upstream, never filled with placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSnapshot {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub greeks: Greeks,
    pub open_interest: i64,
}

/// Direction of the premium position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// P&L for a move from `entry` to `current`, sign-adjusted for the side.
    #[must_use]
    pub fn pnl(&self, entry: Decimal, current: Decimal, quantity: u32) -> Decimal {
        let per_unit = match self {
            Self::Long => current - entry,
            Self::Short => entry - current,
        };
        per_unit * Decimal::from(quantity)
    }
}

/// Directional entry signal from the upstream signal producer.
///
/// How the signal is derived is opaque to this crate; only its shape matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySignal {
    pub symbol: String,
    pub side: PositionSide,
    pub strength: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u32,
    /// None places a market order.
    pub limit_price: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

/// Broker confirmation. Fill price and quantity are ground truth and may
/// differ from what was requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u32,
    pub price: Decimal,
    pub commission: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Why a trade was closed. Ordered here roughly by urgency; the actual
/// priority lives in the lifecycle trigger chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Max hold time exceeded while profitable.
    TimeForcedProfit,
    /// Max hold time exceeded at a loss. The hard backstop near expiry.
    TimeForcedLoss,
    /// Min hold elapsed and the early profit target was reached.
    TimeBasedTarget,
    HardStopLoss,
    TargetHit,
    /// Directional conviction eroded: |delta| degraded past the threshold.
    DeltaWeakness,
    /// Gamma crossed from rising to falling.
    GammaRollover,
    /// Time decay since entry exceeded the threshold.
    ThetaDamage,
    /// Implied volatility collapsed while the premium stalled.
    IvCrush,
    /// Open interest built up without a commensurate price move.
    OiPriceMismatch,
}

impl ExitReason {
    /// True for the capital-protection exits that fire regardless of P&L.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        matches!(
            self,
            Self::TimeForcedProfit | Self::TimeForcedLoss | Self::HardStopLoss
        )
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::TimeForcedProfit => "time_forced_profit",
            Self::TimeForcedLoss => "time_forced_loss",
            Self::TimeBasedTarget => "time_based_target",
            Self::HardStopLoss => "hard_stop_loss",
            Self::TargetHit => "target_hit",
            Self::DeltaWeakness => "delta_weakness",
            Self::GammaRollover => "gamma_rollover",
            Self::ThetaDamage => "theta_damage",
            Self::IvCrush => "iv_crush",
            Self::OiPriceMismatch => "oi_price_mismatch",
        };
        write!(f, "{tag}")
    }
}

/// Read-only snapshot of a finished trade, handed to the journal collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub id: String,
    pub symbol: String,
    pub side: PositionSide,
    pub quantity: u32,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub duration_secs: i64,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub realized_pnl: Decimal,
    pub pnl_percent: Decimal,
    /// Commissions and fees across both fills.
    pub costs: Decimal,
    pub net_pnl: Decimal,
    pub exit_reason: ExitReason,
    pub entry_greeks: Greeks,
    pub exit_greeks: Greeks,
    pub entry_open_interest: i64,
    pub exit_open_interest: i64,
}

impl ClosedTrade {
    /// Folds total round-trip costs into the record.
    pub fn apply_costs(&mut self, costs: Decimal) {
        self.costs = costs;
        self.net_pnl = self.realized_pnl - costs;
    }
}
