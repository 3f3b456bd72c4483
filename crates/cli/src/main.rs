use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scalp_core::ConfigLoader;
use scalp_engine::{
    LogJournal, ReplayDataSource, ScalpEngine, SimulatedExecutionHandler, TapeSignalSource,
};
use scalp_expiry::derive_policy;

#[derive(Parser)]
#[command(name = "scalp")]
#[command(about = "Expiry-aware options scalp engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a paper session over a recorded tick tape
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// CSV tick tape (price, Greeks, OI, entry marks)
        #[arg(short, long)]
        tape: PathBuf,
    },
    /// Print the expiry policy for a given days-to-expiry
    Policy {
        /// Days until contract expiration
        #[arg(long)]
        days: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Run { config, tape } => run_paper_session(&config, &tape).await?,
        Commands::Policy { days } => print_policy(days),
    }

    Ok(())
}

async fn run_paper_session(config_path: &str, tape_path: &PathBuf) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    let rows = scalp_engine::load_tape(tape_path)?;

    let signals = TapeSignalSource::new(&rows);
    let execution = SimulatedExecutionHandler::new(&config.execution, config.session.lot_size);
    let mut engine = ScalpEngine::new(
        config,
        ReplayDataSource::new(rows),
        signals,
        execution,
        LogJournal,
    )?;

    let stats = engine.run().await?;
    let risk = engine.risk_metrics();

    println!("trades        : {}", stats.total);
    println!("wins / losses : {} / {}", stats.wins, stats.losses);
    println!("win rate      : {:.1}%", stats.win_rate_pct);
    println!("gross P&L     : {}", stats.total_pnl);
    println!("costs         : {}", stats.total_costs);
    println!("daily P&L     : {}", risk.realized_pnl_today);
    if let Some(reason) = risk.kill_switch {
        println!("halted        : {reason}");
    }

    Ok(())
}

fn print_policy(days: i64) {
    let policy = derive_policy(days);
    println!("days to expiry     : {}", policy.days_to_expiry);
    println!("size factor        : {}", policy.position_size_factor);
    println!("risk per trade     : {}", policy.risk_per_trade);
    println!("hard stop loss     : {}%", policy.hard_stop_loss_pct);
    println!(
        "hold window        : [{}s, {}s]",
        policy.min_hold_secs, policy.max_hold_secs
    );
    println!("entry frequency    : {}", policy.entry_frequency_factor);
    println!("gamma sensitivity  : {}", policy.gamma_exit_sensitivity);
}
