use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
///
/// Every section has sensible scalping defaults so a partial TOML file works.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub exit: ExitConfig,
    #[serde(default)]
    pub governor: GovernorConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub underlying: String,
    /// Contract expiry for the session's instruments.
    pub expiry_date: NaiveDate,
    /// Units per lot; orders are always whole lots.
    pub lot_size: u32,
    pub capital: Decimal,
    pub max_concurrent_positions: usize,
    /// Reject snapshots older than this before they reach the core.
    pub max_snapshot_age_secs: u64,
    /// Wall-clock freshness gate; off for deterministic replays.
    pub enforce_freshness: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            underlying: "NIFTY".to_string(),
            expiry_date: NaiveDate::from_ymd_opt(2026, 8, 11).unwrap_or_default(),
            lot_size: 75,
            capital: dec!(100000),
            max_concurrent_positions: 1,
            max_snapshot_age_secs: 5,
            enforce_freshness: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Fraction of capital risked per trade when no expiry policy applies.
    pub default_risk_per_trade: Decimal,
    /// Skip the trade when the stop sits further than this from entry (%).
    pub max_stop_distance_pct: Decimal,
    /// Absolute cap on units per trade, applied after lot rounding.
    pub max_position_units: u32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            default_risk_per_trade: dec!(0.02),
            max_stop_distance_pct: dec!(10),
            max_position_units: 750,
        }
    }
}

/// Thresholds for the exit trigger chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitConfig {
    /// Profit target as % of entry premium.
    pub profit_target_pct: Decimal,
    /// Stop-loss % used when no expiry policy is supplied.
    pub hard_stop_loss_pct: Decimal,
    /// Exit when |delta| degrades by more than this % from entry.
    pub delta_weakness_pct: f64,
    /// Smoothing window (ticks) for the gamma peak detector.
    pub gamma_window: usize,
    /// Exit when smoothed gamma falls this % below its running peak.
    pub gamma_drop_pct: f64,
    /// Exit when theta has decayed by more than this absolute amount.
    pub theta_damage_threshold: f64,
    /// Exit when IV has dropped more than this % since entry.
    pub iv_crush_pct: f64,
    /// OI build-up (contracts since previous tick) that flags a trap.
    pub oi_surge_threshold: i64,
    /// Premium move below this counts as "price went nowhere".
    pub flat_price_threshold: Decimal,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            profit_target_pct: dec!(7),
            hard_stop_loss_pct: dec!(7),
            delta_weakness_pct: 15.0,
            gamma_window: 5,
            gamma_drop_pct: 20.0,
            theta_damage_threshold: 0.05,
            iv_crush_pct: 5.0,
            oi_surge_threshold: 100,
            flat_price_threshold: dec!(0.5),
        }
    }
}

/// Daily capital-preservation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Loss magnitude that arms the kill switch for the rest of the session.
    pub daily_loss_floor: Decimal,
    pub max_trades_per_day: u32,
    /// Consecutive losses that start the soft cooldown.
    pub consecutive_loss_limit: u32,
    pub cooldown_secs: u64,
    /// Optional daily profit target; reaching it also halts the session.
    pub daily_profit_target: Option<Decimal>,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            daily_loss_floor: dec!(3000),
            max_trades_per_day: 5,
            consecutive_loss_limit: 2,
            cooldown_secs: 900,
            daily_profit_target: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub slippage_bps: Decimal,
    pub commission_per_lot: Decimal,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            slippage_bps: dec!(5),
            commission_per_lot: dec!(20),
        }
    }
}
