use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use scalp_core::config::AppConfig;
use scalp_core::events::{OptionSnapshot, OrderRequest, OrderSide, PositionSide};
use scalp_core::traits::{EntrySignalSource, ExecutionHandler, MarketDataSource, TradeJournal};
use scalp_expiry::{ExpiryInfo, ExpiryPolicy};
use scalp_lifecycle::{SessionStats, TradeManager};
use scalp_risk::{DailyRiskGovernor, EntryDecision};
use scalp_sizing::PositionSizer;

/// Drives the decision core over a sequential stream of snapshots.
///
/// One logical tick at a time: open trades are re-evaluated first and any
/// exit decision is acted on immediately; only a flat book considers a new
/// entry. All blocking I/O lives behind the collaborator traits.
pub struct ScalpEngine<D, S, E, J>
where
    D: MarketDataSource,
    S: EntrySignalSource,
    E: ExecutionHandler,
    J: TradeJournal,
{
    data: D,
    signals: S,
    execution: E,
    journal: J,
    config: AppConfig,
    sizer: PositionSizer,
    manager: TradeManager,
    governor: DailyRiskGovernor,
    /// Accumulates the policy's entry-frequency factor; an entry spends one
    /// whole credit, so near expiry only a fraction of signals get through.
    entry_credit: Decimal,
    last_tick: Option<DateTime<Utc>>,
}

impl<D, S, E, J> ScalpEngine<D, S, E, J>
where
    D: MarketDataSource,
    S: EntrySignalSource,
    E: ExecutionHandler,
    J: TradeJournal,
{
    pub fn new(
        config: AppConfig,
        data: D,
        signals: S,
        execution: E,
        journal: J,
    ) -> Result<Self> {
        let sizer = PositionSizer::new(
            config.session.capital,
            config.session.lot_size,
            config.sizing.clone(),
        )
        .context("invalid sizing configuration")?;
        let manager = TradeManager::new(
            config.session.max_concurrent_positions,
            config.exit.clone(),
        );
        let governor = DailyRiskGovernor::new(config.governor.clone())
            .context("invalid governor configuration")?;

        Ok(Self {
            data,
            signals,
            execution,
            journal,
            config,
            sizer,
            manager,
            governor,
            entry_credit: Decimal::ZERO,
            last_tick: None,
        })
    }

    /// Consumes the data source to exhaustion and returns session stats.
    pub async fn run(&mut self) -> Result<SessionStats> {
        tracing::info!(
            underlying = %self.config.session.underlying,
            expiry = %self.config.session.expiry_date,
            capital = %self.config.session.capital,
            "scalp engine started"
        );

        while let Some(snapshot) = self.data.next_snapshot().await? {
            self.on_tick(snapshot).await?;
        }

        let stats = self.manager.stats();
        let risk = self.governor.metrics();
        tracing::info!(
            trades = stats.total,
            wins = stats.wins,
            losses = stats.losses,
            total_pnl = %stats.total_pnl,
            kill_switch = risk.kill_switch.is_some(),
            "session finished"
        );
        Ok(stats)
    }

    async fn on_tick(&mut self, snapshot: OptionSnapshot) -> Result<()> {
        if !self.accept(&snapshot) {
            return Ok(());
        }
        self.last_tick = Some(snapshot.timestamp);

        let policy =
            ExpiryInfo::at(self.config.session.expiry_date, snapshot.timestamp).policy();

        // Exit decisions first; a returned reason is acted on before this
        // trade sees another tick.
        let open_ids: Vec<String> = self
            .manager
            .active_trades()
            .iter()
            .filter(|t| t.symbol == snapshot.symbol)
            .map(|t| t.id.clone())
            .collect();
        for id in open_ids {
            if let Some(reason) = self.manager.update(&id, &snapshot, Some(&policy))? {
                self.close_trade(&id, &snapshot, reason).await?;
            }
        }

        if self.manager.has_open_position() {
            return Ok(());
        }
        self.try_enter(&snapshot, &policy).await
    }

    /// Caller-side data-quality contract: out-of-order ticks are dropped,
    /// and (live only) snapshots past the staleness threshold never reach
    /// the core. Placeholder Greeks are never substituted.
    fn accept(&self, snapshot: &OptionSnapshot) -> bool {
        if let Some(last) = self.last_tick {
            if snapshot.timestamp < last {
                tracing::warn!(
                    symbol = %snapshot.symbol,
                    tick = %snapshot.timestamp,
                    %last,
                    "out-of-order tick dropped"
                );
                return false;
            }
        }
        if self.config.session.enforce_freshness {
            let age = Utc::now() - snapshot.timestamp;
            if age > Duration::seconds(self.config.session.max_snapshot_age_secs as i64) {
                tracing::warn!(
                    symbol = %snapshot.symbol,
                    age_secs = age.num_seconds(),
                    "stale snapshot dropped"
                );
                return false;
            }
        }
        true
    }

    async fn try_enter(
        &mut self,
        snapshot: &OptionSnapshot,
        policy: &ExpiryPolicy,
    ) -> Result<()> {
        match self.governor.can_open_trade(snapshot.timestamp) {
            EntryDecision::Allowed => {}
            EntryDecision::Blocked(reason) => {
                tracing::info!(%reason, "entry gate closed");
                return Ok(());
            }
        }

        let Some(signal) = self.signals.poll(snapshot).await? else {
            return Ok(());
        };

        self.entry_credit += policy.entry_frequency_factor;
        if self.entry_credit < Decimal::ONE {
            tracing::info!(
                days_to_expiry = policy.days_to_expiry,
                "signal skipped by expiry entry throttle"
            );
            return Ok(());
        }
        self.entry_credit -= Decimal::ONE;

        let sized = match self.sizer.recommend(snapshot.price, signal.side, policy) {
            Ok(sized) => sized,
            Err(err) => {
                // Input-validation failure: skip this attempt, never retry.
                tracing::warn!(%err, "entry skipped by sizing");
                return Ok(());
            }
        };

        let order = OrderRequest {
            symbol: snapshot.symbol.clone(),
            side: open_side(signal.side),
            quantity: sized.size.quantity,
            limit_price: Some(snapshot.price),
            timestamp: snapshot.timestamp,
        };
        let fill = self.execution.execute(order).await?;

        let id = self.manager.open(
            &snapshot.symbol,
            signal.side,
            &fill,
            snapshot.greeks,
            snapshot.open_interest,
        )?;
        self.governor.record_open();
        tracing::info!(
            %id,
            stop = %sized.stop_price,
            target = %sized.target_price,
            quantity = fill.quantity,
            "entered position"
        );
        Ok(())
    }

    async fn close_trade(
        &mut self,
        id: &str,
        snapshot: &OptionSnapshot,
        reason: scalp_core::events::ExitReason,
    ) -> Result<()> {
        let (side, quantity) = {
            let trade = self
                .manager
                .get(id)
                .ok_or_else(|| anyhow::anyhow!("trade {id} vanished before close"))?;
            (trade.side, trade.quantity)
        };

        let order = OrderRequest {
            symbol: snapshot.symbol.clone(),
            side: close_side(side),
            quantity,
            limit_price: Some(snapshot.price),
            timestamp: snapshot.timestamp,
        };
        let fill = self.execution.execute(order).await?;

        let closed = self.manager.close(id, &fill, reason)?;
        self.governor
            .record_close(closed.realized_pnl, fill.timestamp);
        self.journal.record(&closed).await?;
        Ok(())
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.manager.stats()
    }

    #[must_use]
    pub fn risk_metrics(&self) -> scalp_risk::RiskMetrics {
        self.governor.metrics()
    }
}

fn open_side(side: PositionSide) -> OrderSide {
    match side {
        PositionSide::Long => OrderSide::Buy,
        PositionSide::Short => OrderSide::Sell,
    }
}

fn close_side(side: PositionSide) -> OrderSide {
    match side {
        PositionSide::Long => OrderSide::Sell,
        PositionSide::Short => OrderSide::Buy,
    }
}
