use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use scalp_core::events::{ClosedTrade, ExitReason, Fill, Greeks, OptionSnapshot, PositionSide};

/// Smoothed local-maximum detector for gamma.
///
/// Keeps a short rolling window of gamma samples; once the window is full,
/// a rollover is a smoothed value falling a configured fraction below the
/// running smoothed peak. The expiry policy's sensitivity divides the
/// required drop, so exits fire sooner near expiry.
#[derive(Debug, Clone)]
pub struct GammaPeakDetector {
    window: VecDeque<f64>,
    capacity: usize,
    peak: f64,
}

impl GammaPeakDetector {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            peak: 0.0,
        }
    }

    pub fn observe(&mut self, gamma: f64) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(gamma);
        let smoothed = self.smoothed();
        if smoothed > self.peak {
            self.peak = smoothed;
        }
    }

    #[must_use]
    pub fn smoothed(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    /// True once gamma has crossed from rising to falling. Needs a full
    /// window of observations before it can fire.
    #[must_use]
    pub fn rolled_over(&self, drop_pct: f64, sensitivity: f64) -> bool {
        if self.window.len() < self.capacity || self.peak <= 0.0 {
            return false;
        }
        let required_drop = (drop_pct / 100.0) / sensitivity.max(f64::EPSILON);
        self.smoothed() <= self.peak * (1.0 - required_drop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStatus {
    Open,
    Closed,
}

/// One open position. Mutated on every tick while open; converted into an
/// immutable [`ClosedTrade`] snapshot at close.
///
/// `entry_greeks` is frozen at open and never overwritten; every Greek
/// exit trigger compares the live snapshot against it.
#[derive(Debug, Clone)]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    pub side: PositionSide,
    pub status: TradeStatus,
    pub entry_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub quantity: u32,
    pub entry_commission: Decimal,
    pub entry_greeks: Greeks,
    pub entry_open_interest: i64,
    pub current_price: Decimal,
    pub current_greeks: Greeks,
    pub current_open_interest: i64,
    /// Previous tick's values, for momentum-style comparisons.
    pub prev_price: Decimal,
    pub prev_open_interest: i64,
    pub unrealized_pnl: Decimal,
    pub time_in_trade_secs: i64,
    pub last_update: DateTime<Utc>,
    pub gamma_detector: GammaPeakDetector,
}

impl Trade {
    pub(crate) fn open(
        id: String,
        symbol: String,
        side: PositionSide,
        fill: &Fill,
        entry_greeks: Greeks,
        open_interest: i64,
        gamma_window: usize,
    ) -> Self {
        let mut gamma_detector = GammaPeakDetector::new(gamma_window);
        gamma_detector.observe(entry_greeks.gamma);

        Self {
            id,
            symbol,
            side,
            status: TradeStatus::Open,
            entry_time: fill.timestamp,
            entry_price: fill.price,
            quantity: fill.quantity,
            entry_commission: fill.commission,
            entry_greeks,
            entry_open_interest: open_interest,
            current_price: fill.price,
            current_greeks: entry_greeks,
            current_open_interest: open_interest,
            prev_price: fill.price,
            prev_open_interest: open_interest,
            unrealized_pnl: Decimal::ZERO,
            time_in_trade_secs: 0,
            last_update: fill.timestamp,
            gamma_detector,
        }
    }

    /// Folds a fresh market snapshot into the trade: rotates the previous
    /// tick, recomputes P&L and time in trade.
    pub(crate) fn apply_snapshot(&mut self, snapshot: &OptionSnapshot) {
        self.prev_price = self.current_price;
        self.prev_open_interest = self.current_open_interest;

        self.current_price = snapshot.price;
        self.current_greeks = snapshot.greeks;
        self.current_open_interest = snapshot.open_interest;
        self.gamma_detector.observe(snapshot.greeks.gamma);

        self.unrealized_pnl = self
            .side
            .pnl(self.entry_price, self.current_price, self.quantity);
        self.time_in_trade_secs = (snapshot.timestamp - self.entry_time).num_seconds();
        self.last_update = snapshot.timestamp;
    }

    /// Unrealized P&L as % of the entry cost basis.
    #[must_use]
    pub fn pnl_percent(&self) -> Decimal {
        let basis = self.entry_price * Decimal::from(self.quantity);
        if basis.is_zero() {
            return Decimal::ZERO;
        }
        self.unrealized_pnl / basis * Decimal::ONE_HUNDRED
    }

    pub(crate) fn into_closed(self, exit_fill: &Fill, reason: ExitReason) -> ClosedTrade {
        let realized_pnl = self
            .side
            .pnl(self.entry_price, exit_fill.price, self.quantity);
        let basis = self.entry_price * Decimal::from(self.quantity);
        let pnl_percent = if basis.is_zero() {
            Decimal::ZERO
        } else {
            realized_pnl / basis * Decimal::ONE_HUNDRED
        };
        let costs = self.entry_commission + exit_fill.commission;

        ClosedTrade {
            id: self.id,
            symbol: self.symbol,
            side: self.side,
            quantity: self.quantity,
            entry_time: self.entry_time,
            exit_time: exit_fill.timestamp,
            duration_secs: (exit_fill.timestamp - self.entry_time).num_seconds(),
            entry_price: self.entry_price,
            exit_price: exit_fill.price,
            realized_pnl,
            pnl_percent,
            costs,
            net_pnl: realized_pnl - costs,
            exit_reason: reason,
            entry_greeks: self.entry_greeks,
            exit_greeks: self.current_greeks,
            entry_open_interest: self.entry_open_interest,
            exit_open_interest: self.current_open_interest,
        }
    }
}
