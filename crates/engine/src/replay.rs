use std::collections::{HashMap, VecDeque};
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use scalp_core::events::{EntrySignal, Greeks, OptionSnapshot, PositionSide};
use scalp_core::traits::{EntrySignalSource, MarketDataSource};
use serde::Deserialize;

/// One row of a recorded tick tape. The optional `signal` column carries
/// entry marks produced upstream (`long` / `short`).
#[derive(Debug, Clone, Deserialize)]
pub struct TapeRow {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub price: Decimal,
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub implied_volatility: f64,
    pub open_interest: i64,
    pub signal: Option<String>,
}

impl TapeRow {
    fn snapshot(&self) -> OptionSnapshot {
        OptionSnapshot {
            symbol: self.symbol.clone(),
            timestamp: self.timestamp,
            price: self.price,
            greeks: Greeks {
                delta: self.delta,
                gamma: self.gamma,
                theta: self.theta,
                vega: self.vega,
                implied_volatility: self.implied_volatility,
            },
            open_interest: self.open_interest,
        }
    }

    fn signal_side(&self) -> Option<PositionSide> {
        match self.signal.as_deref() {
            Some("long") => Some(PositionSide::Long),
            Some("short") => Some(PositionSide::Short),
            _ => None,
        }
    }
}

/// Reads a CSV tick tape into rows.
pub fn load_tape(path: &Path) -> Result<Vec<TapeRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open tape {}", path.display()))?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row.context("malformed tape row")?);
    }
    tracing::info!(rows = rows.len(), path = %path.display(), "tape loaded");
    Ok(rows)
}

/// Feeds recorded snapshots one at a time.
pub struct ReplayDataSource {
    rows: VecDeque<TapeRow>,
}

impl ReplayDataSource {
    #[must_use]
    pub fn new(rows: Vec<TapeRow>) -> Self {
        Self { rows: rows.into() }
    }
}

#[async_trait]
impl MarketDataSource for ReplayDataSource {
    async fn next_snapshot(&mut self) -> Result<Option<OptionSnapshot>> {
        Ok(self.rows.pop_front().map(|row| row.snapshot()))
    }
}

/// Replays the tape's entry marks keyed by tick timestamp.
pub struct TapeSignalSource {
    marks: HashMap<DateTime<Utc>, PositionSide>,
}

impl TapeSignalSource {
    #[must_use]
    pub fn new(rows: &[TapeRow]) -> Self {
        let marks = rows
            .iter()
            .filter_map(|row| row.signal_side().map(|side| (row.timestamp, side)))
            .collect();
        Self { marks }
    }
}

#[async_trait]
impl EntrySignalSource for TapeSignalSource {
    async fn poll(&mut self, snapshot: &OptionSnapshot) -> Result<Option<EntrySignal>> {
        Ok(self
            .marks
            .get(&snapshot.timestamp)
            .map(|side| EntrySignal {
                symbol: snapshot.symbol.clone(),
                side: *side,
                strength: 1.0,
                timestamp: snapshot.timestamp,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAPE: &str = "\
timestamp,symbol,price,delta,gamma,theta,vega,implied_volatility,open_interest,signal
2026-08-10T10:00:00Z,NIFTY24600CE,150,0.55,0.015,-0.05,0.12,30.0,50000,long
2026-08-10T10:00:30Z,NIFTY24600CE,152,0.56,0.016,-0.05,0.12,30.0,50000,
";

    fn rows() -> Vec<TapeRow> {
        csv::Reader::from_reader(TAPE.as_bytes())
            .deserialize()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[tokio::test]
    async fn replay_yields_rows_in_order_then_ends() {
        let mut source = ReplayDataSource::new(rows());
        let first = source.next_snapshot().await.unwrap().unwrap();
        assert_eq!(first.symbol, "NIFTY24600CE");
        assert_eq!(first.greeks.delta, 0.55);
        let second = source.next_snapshot().await.unwrap().unwrap();
        assert!(second.timestamp > first.timestamp);
        assert!(source.next_snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn signal_marks_replay_on_their_tick_only() {
        let rows = rows();
        let mut signals = TapeSignalSource::new(&rows);

        let marked = signals.poll(&rows[0].snapshot()).await.unwrap();
        assert!(matches!(
            marked,
            Some(EntrySignal {
                side: PositionSide::Long,
                ..
            })
        ));

        let unmarked = signals.poll(&rows[1].snapshot()).await.unwrap();
        assert!(unmarked.is_none());
    }
}
