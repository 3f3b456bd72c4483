use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Immutable risk/sizing/timing policy for a given expiry proximity.
///
/// Caution strictly increases closer to expiry: `position_size_factor`,
/// `risk_per_trade`, and `max_hold_secs` never increase as `days_to_expiry`
/// decreases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpiryPolicy {
    pub days_to_expiry: u32,
    /// Scales the raw sized quantity, in (0, 1].
    pub position_size_factor: Decimal,
    /// Fraction of capital risked per trade, in (0, 1].
    pub risk_per_trade: Decimal,
    /// Stop-loss as % of entry premium.
    pub hard_stop_loss_pct: Decimal,
    /// Profitable exits are allowed only after this many seconds.
    pub min_hold_secs: u32,
    /// Hard cap on time in trade, profitable or not.
    pub max_hold_secs: u32,
    /// Scales how often the orchestrator attempts entries.
    pub entry_frequency_factor: Decimal,
    /// Tightens the gamma rollover detector (>1 exits sooner).
    pub gamma_exit_sensitivity: f64,
}

/// Maps days-to-expiry to the applicable policy tier.
///
/// Pure and total: negative input clamps to 0, anything past the last
/// configured tier falls back to the normal tier.
#[must_use]
pub fn derive_policy(days_to_expiry: i64) -> ExpiryPolicy {
    let days = days_to_expiry.max(0);

    match days {
        0 => ExpiryPolicy {
            days_to_expiry: 0,
            position_size_factor: dec!(0.30),
            risk_per_trade: dec!(0.005),
            hard_stop_loss_pct: dec!(3),
            min_hold_secs: 20,
            max_hold_secs: 300,
            entry_frequency_factor: dec!(0.2),
            gamma_exit_sensitivity: 2.0,
        },
        1 => ExpiryPolicy {
            days_to_expiry: 1,
            position_size_factor: dec!(0.50),
            risk_per_trade: dec!(0.010),
            hard_stop_loss_pct: dec!(4),
            min_hold_secs: 20,
            max_hold_secs: 600,
            entry_frequency_factor: dec!(0.5),
            gamma_exit_sensitivity: 1.5,
        },
        2 | 3 => ExpiryPolicy {
            days_to_expiry: days as u32,
            position_size_factor: dec!(0.70),
            risk_per_trade: dec!(0.015),
            hard_stop_loss_pct: dec!(5),
            min_hold_secs: 20,
            max_hold_secs: 900,
            entry_frequency_factor: dec!(0.8),
            gamma_exit_sensitivity: 1.2,
        },
        _ => ExpiryPolicy {
            days_to_expiry: days as u32,
            position_size_factor: dec!(1.00),
            risk_per_trade: dec!(0.020),
            hard_stop_loss_pct: dec!(6),
            min_hold_secs: 20,
            max_hold_secs: 3600,
            entry_frequency_factor: dec!(1.0),
            gamma_exit_sensitivity: 1.0,
        },
    }
}

/// Expiry bookkeeping for a contract relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryInfo {
    pub expiry_date: NaiveDate,
    pub days_to_expiry: i64,
    pub is_expiry_day: bool,
    pub is_expiry_week: bool,
}

impl ExpiryInfo {
    #[must_use]
    pub fn at(expiry_date: NaiveDate, now: DateTime<Utc>) -> Self {
        let days_to_expiry = (expiry_date - now.date_naive()).num_days();
        Self {
            expiry_date,
            days_to_expiry,
            is_expiry_day: days_to_expiry <= 0,
            is_expiry_week: days_to_expiry <= 3,
        }
    }

    #[must_use]
    pub fn policy(&self) -> ExpiryPolicy {
        derive_policy(self.days_to_expiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn expiry_day_tier() {
        let policy = derive_policy(0);
        assert_eq!(policy.position_size_factor, dec!(0.30));
        assert_eq!(policy.risk_per_trade, dec!(0.005));
        assert_eq!(policy.hard_stop_loss_pct, dec!(3));
        assert_eq!(policy.min_hold_secs, 20);
        assert_eq!(policy.max_hold_secs, 300);
    }

    #[test]
    fn last_day_before_expiry_tier() {
        let policy = derive_policy(1);
        assert_eq!(policy.position_size_factor, dec!(0.50));
        assert_eq!(policy.hard_stop_loss_pct, dec!(4));
        assert_eq!(policy.max_hold_secs, 600);
    }

    #[test]
    fn expiry_week_tier_covers_two_and_three_days() {
        for days in [2, 3] {
            let policy = derive_policy(days);
            assert_eq!(policy.position_size_factor, dec!(0.70));
            assert_eq!(policy.risk_per_trade, dec!(0.015));
            assert_eq!(policy.max_hold_secs, 900);
        }
    }

    #[test]
    fn four_days_and_beyond_fall_back_to_normal_tier() {
        for days in [4, 5, 10, 45, 365] {
            let policy = derive_policy(days);
            assert_eq!(policy.position_size_factor, dec!(1.00));
            assert_eq!(policy.risk_per_trade, dec!(0.020));
            assert_eq!(policy.hard_stop_loss_pct, dec!(6));
        }
    }

    #[test]
    fn negative_days_clamp_to_expiry_day() {
        assert_eq!(derive_policy(-3), derive_policy(0));
    }

    #[test]
    fn caution_never_decreases_toward_expiry() {
        let tiers: Vec<ExpiryPolicy> = [0, 1, 2, 4].iter().map(|&d| derive_policy(d)).collect();
        for pair in tiers.windows(2) {
            assert!(pair[0].position_size_factor <= pair[1].position_size_factor);
            assert!(pair[0].risk_per_trade <= pair[1].risk_per_trade);
            assert!(pair[0].max_hold_secs <= pair[1].max_hold_secs);
            assert!(pair[0].entry_frequency_factor <= pair[1].entry_frequency_factor);
            assert!(pair[0].gamma_exit_sensitivity >= pair[1].gamma_exit_sensitivity);
        }
    }

    #[test]
    fn expiry_info_flags() {
        let expiry = NaiveDate::from_ymd_opt(2026, 8, 11).unwrap();

        let on_expiry = Utc.with_ymd_and_hms(2026, 8, 11, 9, 30, 0).unwrap();
        let info = ExpiryInfo::at(expiry, on_expiry);
        assert_eq!(info.days_to_expiry, 0);
        assert!(info.is_expiry_day);
        assert!(info.is_expiry_week);

        let week_before = Utc.with_ymd_and_hms(2026, 8, 9, 9, 30, 0).unwrap();
        let info = ExpiryInfo::at(expiry, week_before);
        assert_eq!(info.days_to_expiry, 2);
        assert!(!info.is_expiry_day);
        assert!(info.is_expiry_week);

        let far_out = Utc.with_ymd_and_hms(2026, 7, 1, 9, 30, 0).unwrap();
        let info = ExpiryInfo::at(expiry, far_out);
        assert!(!info.is_expiry_week);
        assert_eq!(info.policy(), derive_policy(41));
    }
}
