use chrono::NaiveDate;
use scalp_core::config::AppConfig;
use scalp_engine::{
    load_tape, LogJournal, ReplayDataSource, ScalpEngine, SimulatedExecutionHandler,
    TapeSignalSource,
};

#[tokio::test]
async fn paper_session_over_recorded_tape() {
    let tape_path = std::path::Path::new("tests/data/sample_tape.csv");
    let rows = load_tape(tape_path).expect("failed to load tape");

    let mut config = AppConfig::default();
    // Ten days out: normal-tier policy, every signal eligible.
    config.session.expiry_date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();

    let signals = TapeSignalSource::new(&rows);
    let execution = SimulatedExecutionHandler::new(&config.execution, config.session.lot_size);
    let mut engine = ScalpEngine::new(
        config,
        ReplayDataSource::new(rows),
        signals,
        execution,
        LogJournal,
    )
    .expect("engine construction failed");

    let stats = engine.run().await.expect("session failed");

    // The tape carries one winning scalp (+7.3% target) and one stopped-out
    // loser (-7.3% against a 6% stop).
    assert_eq!(stats.total, 2);
    assert_eq!(stats.wins, 1);
    assert_eq!(stats.losses, 1);
    assert!(stats.total_costs > rust_decimal::Decimal::ZERO);

    let risk = engine.risk_metrics();
    assert_eq!(risk.trades_opened_today, 2);
    assert!(risk.kill_switch.is_none());
}
