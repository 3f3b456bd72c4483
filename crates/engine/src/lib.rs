//! Tick-driven orchestration.
//!
//! Wires the four decision components (expiry policy, sizing, lifecycle,
//! governor) to the collaborator traits and drives them one snapshot at a
//! time. Ships a simulated execution handler, a replayable tick tape, and a
//! log-backed journal for paper sessions.

pub mod engine;
pub mod execution;
pub mod journal;
pub mod replay;

pub use engine::ScalpEngine;
pub use execution::SimulatedExecutionHandler;
pub use journal::LogJournal;
pub use replay::{load_tape, ReplayDataSource, TapeRow, TapeSignalSource};
