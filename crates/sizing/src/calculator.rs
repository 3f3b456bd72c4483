use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use scalp_core::config::SizingConfig;
use scalp_core::events::PositionSide;
use scalp_expiry::ExpiryPolicy;
use serde::{Deserialize, Serialize};

use crate::error::SizingError;

/// Inputs for one sizing decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRequest {
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub target_price: Decimal,
    /// Absolute currency amount the account is willing to lose on this trade.
    pub risk_budget: Decimal,
}

/// Sizing result. `quantity` is always a whole number of lots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    pub quantity: u32,
    pub num_lots: u32,
    pub lot_size: u32,
    pub capital_allocated: Decimal,
    pub max_loss_amount: Decimal,
    pub risk_reward_ratio: Decimal,
}

/// Stop/target/quantity recommendation derived from an expiry policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizedTrade {
    pub stop_price: Decimal,
    pub target_price: Decimal,
    pub size: PositionSize,
}

/// Converts a risk budget into a tradable quantity.
///
/// Deterministic and side-effect free; holds the account capital and lot
/// conventions so call sites only supply per-trade prices.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    capital: Decimal,
    lot_size: u32,
    config: SizingConfig,
}

impl PositionSizer {
    pub fn new(
        capital: Decimal,
        lot_size: u32,
        config: SizingConfig,
    ) -> Result<Self, SizingError> {
        if capital <= Decimal::ZERO {
            return Err(SizingError::InvalidParameters(
                "capital must be positive".to_string(),
            ));
        }
        if lot_size == 0 {
            return Err(SizingError::InvalidParameters(
                "lot size must be at least 1".to_string(),
            ));
        }
        if config.default_risk_per_trade <= Decimal::ZERO
            || config.default_risk_per_trade > Decimal::ONE
        {
            return Err(SizingError::InvalidParameters(
                "default_risk_per_trade must be in (0, 1]".to_string(),
            ));
        }
        Ok(Self {
            capital,
            lot_size,
            config,
        })
    }

    /// Absolute risk budget for one trade. A supplied policy overrides the
    /// configured default risk fraction.
    #[must_use]
    pub fn risk_budget(&self, policy: Option<&ExpiryPolicy>) -> Decimal {
        let risk_fraction = policy
            .map(|p| p.risk_per_trade)
            .unwrap_or(self.config.default_risk_per_trade);
        self.capital * risk_fraction
    }

    /// Core calculation: `risk_budget / |entry - stop|`, scaled by the
    /// policy's size factor and floored to whole lots.
    ///
    /// # Errors
    ///
    /// [`SizingError::ZeroRiskDistance`] when entry equals stop,
    /// [`SizingError::StopTooWide`] when the stop sits beyond the configured
    /// distance limit, and [`SizingError::QuantityRoundsToZero`] when the
    /// budget cannot buy a single lot; the caller must skip the trade rather
    /// than trade zero units.
    pub fn size(
        &self,
        request: &SizeRequest,
        policy: Option<&ExpiryPolicy>,
    ) -> Result<PositionSize, SizingError> {
        if request.entry_price <= Decimal::ZERO {
            return Err(SizingError::InvalidParameters(
                "entry price must be positive".to_string(),
            ));
        }

        let risk_distance = (request.entry_price - request.stop_price).abs();
        if risk_distance.is_zero() {
            return Err(SizingError::ZeroRiskDistance);
        }

        let distance_pct = risk_distance / request.entry_price * Decimal::ONE_HUNDRED;
        if distance_pct > self.config.max_stop_distance_pct {
            tracing::warn!(%distance_pct, "stop too wide, trade skipped");
            return Err(SizingError::StopTooWide {
                distance_pct,
                max_pct: self.config.max_stop_distance_pct,
            });
        }

        let raw_quantity = request.risk_budget / risk_distance;
        let scaled = match policy {
            Some(p) => raw_quantity * p.position_size_factor,
            None => raw_quantity,
        };

        let lot_size_dec = Decimal::from(self.lot_size);
        let num_lots = (scaled / lot_size_dec)
            .floor()
            .to_u32()
            .unwrap_or(0);
        if num_lots == 0 {
            return Err(SizingError::QuantityRoundsToZero {
                raw_quantity: scaled,
                lot_size: self.lot_size,
            });
        }

        let max_lots = self.config.max_position_units / self.lot_size;
        let num_lots = num_lots.min(max_lots.max(1));
        let quantity = num_lots * self.lot_size;
        let quantity_dec = Decimal::from(quantity);

        let max_loss_amount = quantity_dec * risk_distance;
        let capital_allocated = request.entry_price * quantity_dec;
        let reward = (request.target_price - request.entry_price).abs() * quantity_dec;
        let risk_reward_ratio = if max_loss_amount.is_zero() {
            Decimal::ZERO
        } else {
            reward / max_loss_amount
        };

        tracing::info!(
            quantity,
            num_lots,
            max_loss = %max_loss_amount,
            risk_reward = %risk_reward_ratio,
            "position sized"
        );

        Ok(PositionSize {
            quantity,
            num_lots,
            lot_size: self.lot_size,
            capital_allocated,
            max_loss_amount,
            risk_reward_ratio,
        })
    }

    /// Builds stop and target from the policy's stop-loss percent (1:2
    /// risk/reward) and sizes the trade with the policy's risk budget.
    pub fn recommend(
        &self,
        entry_price: Decimal,
        side: PositionSide,
        policy: &ExpiryPolicy,
    ) -> Result<SizedTrade, SizingError> {
        let stop_fraction = policy.hard_stop_loss_pct / Decimal::ONE_HUNDRED;
        let (stop_price, target_price) = match side {
            PositionSide::Long => (
                entry_price * (Decimal::ONE - stop_fraction),
                entry_price * (Decimal::ONE + stop_fraction + stop_fraction),
            ),
            PositionSide::Short => (
                entry_price * (Decimal::ONE + stop_fraction),
                entry_price * (Decimal::ONE - stop_fraction - stop_fraction),
            ),
        };

        let request = SizeRequest {
            entry_price,
            stop_price,
            target_price,
            risk_budget: self.risk_budget(Some(policy)),
        };
        let size = self.size(&request, Some(policy))?;

        Ok(SizedTrade {
            stop_price,
            target_price,
            size,
        })
    }
}
